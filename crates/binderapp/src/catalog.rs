//! Card catalog lookup.
//!
//! The engine never talks to a remote catalog. Commands that need card data
//! (add, fill, price refresh) take a [`CatalogProvider`]; the planner and the
//! committer never see one.
//!
//! [`StaticCatalog`] is the bundled provider: an in-memory map that can be
//! loaded from a JSON array of [`CatalogCard`] records:
//!
//! ```json
//! [
//!   { "catalog_id": "lea-161", "name": "Lightning Bolt", "price_cents": 45000 }
//! ]
//! ```

use crate::error::{BinderError, Result};
use crate::model::CatalogCard;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

pub trait CatalogProvider {
    /// Card data for `catalog_id`, or [`BinderError::CatalogNotFound`].
    fn lookup(&self, catalog_id: &str) -> Result<CatalogCard>;
}

#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    entries: HashMap<String, CatalogCard>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, card: CatalogCard) {
        self.entries.insert(card.catalog_id.clone(), card);
    }

    pub fn with(mut self, card: CatalogCard) -> Self {
        self.insert(card);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let cards: Vec<CatalogCard> = serde_json::from_str(content)?;
        let mut catalog = Self::new();
        for card in cards {
            catalog.insert(card);
        }
        Ok(catalog)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        debug!(path = %path.display(), entries = catalog.len(), "loaded catalog");
        Ok(catalog)
    }
}

impl CatalogProvider for StaticCatalog {
    fn lookup(&self, catalog_id: &str) -> Result<CatalogCard> {
        self.entries
            .get(catalog_id)
            .cloned()
            .ok_or_else(|| BinderError::CatalogNotFound(catalog_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_hit_and_miss() {
        let catalog = StaticCatalog::new().with(CatalogCard::new("lea-161", "Lightning Bolt"));
        assert_eq!(catalog.lookup("lea-161").unwrap().name, "Lightning Bolt");
        assert!(matches!(
            catalog.lookup("nope"),
            Err(BinderError::CatalogNotFound(_))
        ));
    }

    #[test]
    fn test_from_json_with_optional_fields() {
        let catalog = StaticCatalog::from_json_str(
            r#"[
                {"catalog_id": "a", "name": "Alpha", "price_cents": 150},
                {"catalog_id": "b", "name": "Beta",
                 "image_uris": ["front.png", "back.png"],
                 "set_code": "lea", "collector_number": "12",
                 "purchase_link": "https://shop.example/b"}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup("a").unwrap().price_cents, Some(150));
        let beta = catalog.lookup("b").unwrap();
        assert_eq!(beta.image_uris.len(), 2);
        assert_eq!(beta.price_cents, None);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            StaticCatalog::from_json_str("{not json"),
            Err(BinderError::Serialization(_))
        ));
    }
}
