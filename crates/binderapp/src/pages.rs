//! # Pages and Spreads
//!
//! Binders are browsed page by page, like the physical thing. This module maps
//! slot indexes onto pages for a given [`Layout`]; it keeps no state and reads
//! nothing from storage, so it can be called on every render.
//!
//! ## Page Count
//!
//! A binder always shows an even number of pages, and never fewer than two:
//!
//! ```text
//! needed      = ceil((max_index + 1) / slots_per_page)   (0 for an empty binder)
//! total_pages = max(2, needed rounded up to even)
//! ```
//!
//! ## Spreads
//!
//! On wide screens pages are shown in two-page spreads. Page 0 is a right-hand
//! page, so the first view is half empty:
//!
//! ```text
//! view 0:  [    ] [ p0 ]
//! view 1:  [ p1 ] [ p2 ]
//! view 2:  [ p3 ] [ p4 ]
//! ```
//!
//! [`ViewMode::Single`] shows one page per view instead.

use serde::Serialize;
use std::ops::Range;

use crate::model::Layout;
use crate::slot::SlotIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLayout {
    pub layout: Layout,
    pub slots_per_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Spread,
    Single,
}

/// One screenful: a left and/or right page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct View {
    pub left: Option<u32>,
    pub right: Option<u32>,
}

pub fn derive(layout: Layout, max_occupied: Option<SlotIndex>) -> PageLayout {
    let slots_per_page = layout.slots_per_page();
    let needed = match max_occupied {
        Some(max) => (u64::from(max.get()) + 1).div_ceil(u64::from(slots_per_page)),
        None => 0,
    };
    let even = needed + needed % 2;
    let total_pages = u32::try_from(even.max(2)).unwrap_or(u32::MAX - 1);

    PageLayout {
        layout,
        slots_per_page,
        total_pages,
    }
}

impl PageLayout {
    pub fn page_of(&self, slot: SlotIndex) -> u32 {
        slot.get() / self.slots_per_page
    }

    /// Slots shown on `page`, as a half-open range of raw indexes.
    pub fn slot_range(&self, page: u32) -> Range<u64> {
        let start = u64::from(page) * u64::from(self.slots_per_page);
        start..start + u64::from(self.slots_per_page)
    }

    /// Zero-based (row, column) of `slot` on its page.
    pub fn position_on_page(&self, slot: SlotIndex) -> (u32, u32) {
        let offset = slot.get() % self.slots_per_page;
        let width = self.layout.width();
        (offset / width, offset % width)
    }

    pub fn total_slots(&self) -> u64 {
        u64::from(self.total_pages) * u64::from(self.slots_per_page)
    }

    pub fn views(&self, mode: ViewMode) -> Vec<View> {
        match mode {
            ViewMode::Single => (0..self.total_pages)
                .map(|page| View {
                    left: None,
                    right: Some(page),
                })
                .collect(),
            ViewMode::Spread => {
                let mut views = vec![View {
                    left: None,
                    right: Some(0),
                }];
                let mut left = 1;
                while left < self.total_pages {
                    let right = left + 1;
                    views.push(View {
                        left: Some(left),
                        right: (right < self.total_pages).then_some(right),
                    });
                    left += 2;
                }
                views
            }
        }
    }

    /// Index of the view that shows `page`.
    pub fn view_of_page(&self, page: u32, mode: ViewMode) -> u32 {
        match mode {
            ViewMode::Single => page,
            ViewMode::Spread => page.div_ceil(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_binder_has_two_pages() {
        let pages = derive(Layout::ThreeByThree, None);
        assert_eq!(pages.slots_per_page, 9);
        assert_eq!(pages.total_pages, 2);
    }

    #[test]
    fn test_ten_cards_in_3x3_fit_two_pages() {
        let pages = derive(Layout::ThreeByThree, Some(SlotIndex::new(9)));
        assert_eq!(pages.slots_per_page, 9);
        assert_eq!(pages.total_pages, 2);
    }

    #[test]
    fn test_page_count_rounds_up_to_even() {
        // 19 slots need 3 pages of 9, shown as 4
        let pages = derive(Layout::ThreeByThree, Some(SlotIndex::new(18)));
        assert_eq!(pages.total_pages, 4);
        // exactly 4 pages of 4
        let pages = derive(Layout::TwoByTwo, Some(SlotIndex::new(15)));
        assert_eq!(pages.total_pages, 4);
        let pages = derive(Layout::TwoByTwo, Some(SlotIndex::new(16)));
        assert_eq!(pages.total_pages, 6);
    }

    #[test]
    fn test_derive_is_idempotent() {
        let a = derive(Layout::FourByThree, Some(SlotIndex::new(40)));
        let b = derive(Layout::FourByThree, Some(SlotIndex::new(40)));
        assert_eq!(a, b);
        assert_eq!(a.total_pages, 4);
    }

    #[test]
    fn test_slot_to_page_mapping() {
        let pages = derive(Layout::FourByThree, Some(SlotIndex::new(30)));
        assert_eq!(pages.page_of(SlotIndex::new(11)), 0);
        assert_eq!(pages.page_of(SlotIndex::new(12)), 1);
        assert_eq!(pages.slot_range(2), 24..36);
        assert_eq!(pages.position_on_page(SlotIndex::new(17)), (1, 1));
    }

    #[test]
    fn test_spread_views_book_convention() {
        let pages = derive(Layout::TwoByTwo, Some(SlotIndex::new(12)));
        assert_eq!(pages.total_pages, 4);
        let views = pages.views(ViewMode::Spread);
        assert_eq!(
            views,
            vec![
                View { left: None, right: Some(0) },
                View { left: Some(1), right: Some(2) },
                View { left: Some(3), right: None },
            ]
        );
        assert_eq!(pages.view_of_page(0, ViewMode::Spread), 0);
        assert_eq!(pages.view_of_page(2, ViewMode::Spread), 1);
        assert_eq!(pages.view_of_page(3, ViewMode::Spread), 2);
    }

    #[test]
    fn test_single_views() {
        let pages = derive(Layout::ThreeByThree, None);
        assert_eq!(pages.views(ViewMode::Single).len(), 2);
    }
}
