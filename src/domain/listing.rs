// src/domain/listing.rs

use chrono::NaiveDateTime;
use serde::Serialize;

/// Which replicated feed a listing came from. Internal only: callers always
/// see the same `Listing` shape regardless of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// MLS replication table (typed columns).
    Mls,
    /// Secondary brokerage feed (JSON-encoded sub-fields).
    Broker,
    /// Manually curated off-market set.
    OffMarket,
}

/// A scheduled open-house window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenHouse {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub comments: Option<String>,
}

/// The canonical listing shape every read path returns.
///
/// Both feed schemas (and the off-market table) converge on this struct; it
/// is a read-only snapshot materialized per request, never mutated or cached.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    // Identity
    pub id: i64,
    /// External listing number, unique within its source feed.
    pub listing_number: String,

    // Classification
    pub status: String,
    pub property_type: Option<String>,
    pub property_sub_type: Option<String>,

    // Location
    pub city: Option<String>,
    pub area: Option<String>,
    pub subdivision: Option<String>,
    pub address: Option<String>,

    // Numeric facts
    pub list_price: Option<i64>,
    pub beds: Option<i64>,
    pub baths: Option<f64>,
    pub sqft: Option<i64>,

    // Media, already deduplicated and normalized to absolute HTTPS
    pub photos: Vec<String>,
    pub videos: Vec<String>,
    pub virtual_tours: Vec<String>,

    pub remarks: Option<String>,

    // Agent / office association
    pub agent_id: Option<String>,
    pub co_agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub office_name: Option<String>,
    pub agent_license: Option<String>,
    pub office_address: Option<String>,
    pub cross_mls_numbers: Vec<String>,

    // Temporal facts
    pub list_date: Option<NaiveDateTime>,
    pub status_change_date: Option<NaiveDateTime>,
    pub open_houses: Vec<OpenHouse>,

    #[serde(skip)]
    pub source: SourceKind,
}

impl Listing {
    /// Key used when merging the two feeds: listing numbers arrive with
    /// inconsistent casing and stray whitespace across sources.
    pub fn merge_key(&self) -> String {
        normalize_listing_number(&self.listing_number)
    }
}

pub fn normalize_listing_number(raw: &str) -> String {
    raw.trim().to_uppercase()
}
