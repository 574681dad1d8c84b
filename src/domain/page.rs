// src/domain/page.rs

use serde::Serialize;

use crate::domain::listing::Listing;

/// One page of a filtered result set.
///
/// `total` always counts the full filtered set, not the slice; a page past
/// the end carries an empty `listings` with the same `total`.
#[derive(Debug, Serialize)]
pub struct PageResult {
    pub listings: Vec<Listing>,
    pub total: i64,
    pub page: u32,
}

impl PageResult {
    pub fn empty(page: u32) -> Self {
        Self {
            listings: Vec::new(),
            total: 0,
            page,
        }
    }
}

/// Page numbers are 1-indexed; anything below 1 is treated as page 1 and
/// anything past u32 saturates instead of wrapping.
pub fn clamp_page(page: i64) -> u32 {
    if page < 1 {
        1
    } else {
        u32::try_from(page).unwrap_or(u32::MAX)
    }
}

/// Row offset for a 1-indexed page.
pub fn page_offset(page: u32, page_size: u32) -> i64 {
    (page as i64 - 1) * page_size as i64
}
