//! SQLite-backed [`DataStore`].
//!
//! Slot uniqueness is a real `UNIQUE (binder_id, position_index)` index, which
//! SQLite checks at the end of every statement. Scopes run as `IMMEDIATE`
//! transactions: the write lock is taken up front, so a concurrent reader sees
//! the binder either before or after a batch, never between its two phases.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

use super::{DataStore, Transaction};
use crate::error::{BinderError, Result};
use crate::model::{Binder, Card, Layout};
use crate::slot::SlotIndex;

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS binders (
        id                   TEXT PRIMARY KEY,
        owner_id             TEXT NOT NULL,
        name                 TEXT NOT NULL,
        layout               TEXT NOT NULL,
        gray_out_unpurchased INTEGER NOT NULL DEFAULT 0,
        created_at           TEXT NOT NULL,
        updated_at           TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_binders_owner ON binders(owner_id);

    CREATE TABLE IF NOT EXISTS cards (
        id               TEXT PRIMARY KEY,
        binder_id        TEXT NOT NULL REFERENCES binders(id) ON DELETE CASCADE,
        catalog_id       TEXT NOT NULL,
        position_index   INTEGER NOT NULL,
        name             TEXT NOT NULL,
        image_uris       TEXT NOT NULL DEFAULT '[]',
        set_code         TEXT NOT NULL DEFAULT '',
        collector_number TEXT NOT NULL DEFAULT '',
        price_cents      INTEGER,
        purchased        INTEGER NOT NULL DEFAULT 0,
        purchase_link    TEXT,
        created_at       TEXT NOT NULL,
        updated_at       TEXT NOT NULL,
        UNIQUE (binder_id, position_index)
    );

    CREATE TABLE IF NOT EXISTS settings (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

const CARD_COLUMNS: &str = "id, binder_id, catalog_id, position_index, name, image_uris, \
     set_code, collector_number, price_cents, purchased, purchase_link, created_at, updated_at";

const BINDER_COLUMNS: &str =
    "id, owner_id, name, layout, gray_out_unpurchased, created_at, updated_at";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

impl DataStore for SqliteStore {
    fn get_binder(&self, id: &Uuid) -> Result<Binder> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {BINDER_COLUMNS} FROM binders WHERE id = ?1"),
                [id.to_string()],
                map_binder_row,
            )
            .optional()?;
        match row {
            Some(row) => binder_from_row(row),
            None => Err(BinderError::BinderNotFound(id.to_string())),
        }
    }

    fn list_binders(&self, owner_id: &str) -> Result<Vec<Binder>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BINDER_COLUMNS} FROM binders WHERE owner_id = ?1 ORDER BY created_at, name"
        ))?;
        let rows = stmt
            .query_map([owner_id], map_binder_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(binder_from_row).collect()
    }

    fn save_binder(&mut self, binder: &Binder) -> Result<()> {
        self.conn.execute(
            "INSERT INTO binders
                (id, owner_id, name, layout, gray_out_unpurchased, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                owner_id = excluded.owner_id,
                name = excluded.name,
                layout = excluded.layout,
                gray_out_unpurchased = excluded.gray_out_unpurchased,
                updated_at = excluded.updated_at",
            params![
                binder.id.to_string(),
                binder.owner_id,
                binder.name,
                binder.layout.tag(),
                binder.gray_out_unpurchased,
                binder.created_at.to_rfc3339(),
                binder.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn delete_binder(&mut self, id: &Uuid) -> Result<Vec<Card>> {
        let tx = self.conn.transaction()?;
        let removed = list_cards_in(&tx, id)?;
        let deleted = tx.execute("DELETE FROM binders WHERE id = ?1", [id.to_string()])?;
        if deleted == 0 {
            return Err(BinderError::BinderNotFound(id.to_string()));
        }
        tx.commit()?;
        Ok(removed)
    }

    fn get_card(&self, id: &Uuid) -> Result<Card> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1"),
                [id.to_string()],
                map_card_row,
            )
            .optional()?;
        match row {
            Some(row) => card_from_row(row),
            None => Err(BinderError::CardNotFound(*id)),
        }
    }

    fn list_cards(&self, binder_id: &Uuid) -> Result<Vec<Card>> {
        list_cards_in(&self.conn, binder_id)
    }

    fn default_layout(&self) -> Result<Option<Layout>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = 'default_layout'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        value.map(|tag| tag.parse()).transpose()
    }

    fn set_default_layout(&mut self, layout: Layout) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES ('default_layout', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [layout.tag()],
        )?;
        Ok(())
    }

    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Dropping `tx` without commit rolls back
        let out = {
            let mut scope = SqliteTx { tx: &tx };
            match f(&mut scope) {
                Ok(out) => out,
                Err(e) => {
                    warn!(error = %e, "rolling back aborted scope");
                    return Err(e);
                }
            }
        };

        let parked: i64 = tx.query_row(
            "SELECT COUNT(*) FROM cards WHERE position_index < 0",
            [],
            |row| row.get(0),
        )?;
        if parked > 0 {
            return Err(BinderError::Store(format!(
                "{} card(s) left on placeholder positions",
                parked
            )));
        }

        tx.commit()?;
        Ok(out)
    }
}

struct SqliteTx<'a> {
    tx: &'a rusqlite::Transaction<'a>,
}

impl SqliteTx<'_> {
    fn binder_of(&self, card_id: &Uuid) -> Result<Option<Uuid>> {
        let binder: Option<String> = self
            .tx
            .query_row(
                "SELECT binder_id FROM cards WHERE id = ?1",
                [card_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        binder.map(|id| parse_uuid(&id)).transpose()
    }
}

impl Transaction for SqliteTx<'_> {
    fn save_card(&mut self, card: &Card) -> Result<()> {
        let binder_exists: bool = self.tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM binders WHERE id = ?1)",
            [card.binder_id.to_string()],
            |row| row.get(0),
        )?;
        if !binder_exists {
            return Err(BinderError::BinderNotFound(card.binder_id.to_string()));
        }
        if let Some(current) = self.binder_of(&card.id)? {
            if current != card.binder_id {
                return Err(BinderError::InvalidInput(format!(
                    "card {} cannot change binders",
                    card.id
                )));
            }
        }

        let position = card.position_index.as_position();
        self.tx
            .execute(
                &format!(
                    "INSERT INTO cards ({CARD_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                     ON CONFLICT(id) DO UPDATE SET
                        catalog_id = excluded.catalog_id,
                        position_index = excluded.position_index,
                        name = excluded.name,
                        image_uris = excluded.image_uris,
                        set_code = excluded.set_code,
                        collector_number = excluded.collector_number,
                        price_cents = excluded.price_cents,
                        purchased = excluded.purchased,
                        purchase_link = excluded.purchase_link,
                        updated_at = excluded.updated_at"
                ),
                params![
                    card.id.to_string(),
                    card.binder_id.to_string(),
                    card.catalog_id,
                    position,
                    card.name,
                    serde_json::to_string(&card.image_uris)?,
                    card.set_code,
                    card.collector_number,
                    card.price_cents,
                    card.purchased,
                    card.purchase_link,
                    card.created_at.to_rfc3339(),
                    card.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| conflict_or(e, card.binder_id, position))?;
        Ok(())
    }

    fn write_position(&mut self, card_id: &Uuid, position: i64) -> Result<()> {
        let binder_id = self
            .binder_of(card_id)?
            .ok_or(BinderError::CardNotFound(*card_id))?;
        self.tx
            .execute(
                "UPDATE cards SET position_index = ?1, updated_at = ?2 WHERE id = ?3",
                params![position, Utc::now().to_rfc3339(), card_id.to_string()],
            )
            .map_err(|e| conflict_or(e, binder_id, position))?;
        Ok(())
    }

    fn delete_card(&mut self, card_id: &Uuid) -> Result<()> {
        let deleted = self
            .tx
            .execute("DELETE FROM cards WHERE id = ?1", [card_id.to_string()])?;
        if deleted == 0 {
            return Err(BinderError::CardNotFound(*card_id));
        }
        Ok(())
    }

    fn touch_binder(&mut self, binder_id: &Uuid) -> Result<()> {
        let updated = self.tx.execute(
            "UPDATE binders SET updated_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), binder_id.to_string()],
        )?;
        if updated == 0 {
            return Err(BinderError::BinderNotFound(binder_id.to_string()));
        }
        Ok(())
    }
}

fn conflict_or(e: rusqlite::Error, binder_id: Uuid, position: i64) -> BinderError {
    if let rusqlite::Error::SqliteFailure(ref err, _) = e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            return BinderError::SlotConflict {
                binder_id,
                position,
            };
        }
    }
    BinderError::Database(e)
}

fn list_cards_in(conn: &Connection, binder_id: &Uuid) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CARD_COLUMNS} FROM cards WHERE binder_id = ?1 ORDER BY position_index"
    ))?;
    let rows = stmt
        .query_map([binder_id.to_string()], map_card_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter().map(card_from_row).collect()
}

type BinderRow = (String, String, String, String, bool, String, String);

fn map_binder_row(row: &rusqlite::Row) -> rusqlite::Result<BinderRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn binder_from_row(
    (id, owner_id, name, layout, gray_out_unpurchased, created_at, updated_at): BinderRow,
) -> Result<Binder> {
    Ok(Binder {
        id: parse_uuid(&id)?,
        owner_id,
        name,
        layout: layout.parse()?,
        gray_out_unpurchased,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

type CardRow = (
    String,
    String,
    String,
    i64,
    String,
    String,
    String,
    String,
    Option<u32>,
    bool,
    Option<String>,
    String,
    String,
);

fn map_card_row(row: &rusqlite::Row) -> rusqlite::Result<CardRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
    ))
}

fn card_from_row(
    (
        id,
        binder_id,
        catalog_id,
        position,
        name,
        image_uris,
        set_code,
        collector_number,
        price_cents,
        purchased,
        purchase_link,
        created_at,
        updated_at,
    ): CardRow,
) -> Result<Card> {
    let position_index = SlotIndex::from_position(position).ok_or_else(|| {
        BinderError::Store(format!("card {} is stored at invalid position {}", id, position))
    })?;
    Ok(Card {
        id: parse_uuid(&id)?,
        binder_id: parse_uuid(&binder_id)?,
        catalog_id,
        position_index,
        name,
        image_uris: serde_json::from_str(&image_uris)?,
        set_code,
        collector_number,
        price_cents,
        purchased,
        purchase_link,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| BinderError::Store(format!("bad id '{}': {}", raw, e)))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| BinderError::Store(format!("bad timestamp '{}': {}", raw, e)))
}
