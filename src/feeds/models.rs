use chrono::NaiveDateTime;
use serde::Deserialize;

// Raw rows as they come off the two replicated feed tables. Everything the
// upstream might omit is Option; validation happens in the normalizer.

/// Row from `mls_listings` (primary feed, typed columns).
#[derive(Debug, Clone)]
pub struct MlsRow {
    pub id: i64,
    pub listing_number: String,
    pub status: String,
    pub property_type: Option<String>,
    pub property_sub_type: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    pub subdivision: Option<String>,
    pub address: Option<String>,
    pub list_price: Option<i64>,
    pub beds: Option<i64>,
    pub baths: Option<f64>,
    pub sqft: Option<i64>,
    /// Comma-separated URL list, straight from the replication feed.
    pub photos: Option<String>,
    pub remarks: Option<String>,
    pub agent_id: Option<String>,
    pub co_agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub office_name: Option<String>,
    pub list_date: Option<NaiveDateTime>,
    pub status_change_date: Option<NaiveDateTime>,
    /// JSON window list, parsed defensively by the normalizer.
    pub open_houses: Option<String>,
}

/// Row from `broker_listings` (secondary feed). Several sub-fields arrive as
/// JSON-encoded strings inside otherwise-typed columns.
#[derive(Debug, Clone)]
pub struct BrokerRow {
    pub id: i64,
    pub listing_number: String,
    pub status: String,
    pub property_type: Option<String>,
    pub property_sub_type: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    pub subdivision: Option<String>,
    pub address: Option<String>,
    pub list_price: Option<i64>,
    pub beds: Option<i64>,
    pub baths: Option<f64>,
    pub sqft: Option<i64>,
    pub agent_id: Option<String>,
    pub co_agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub office_name: Option<String>,
    pub list_date: Option<NaiveDateTime>,
    pub status_change_date: Option<NaiveDateTime>,
    pub remarks_json: Option<String>,
    pub media_json: Option<String>,
    pub license_json: Option<String>,
    pub office_address_json: Option<String>,
    pub cross_mls_json: Option<String>,
}

/// Row from `off_market_listings` (curated set).
#[derive(Debug, Clone)]
pub struct OffMarketRow {
    pub id: i64,
    pub title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub list_price: Option<i64>,
    pub beds: Option<i64>,
    pub baths: Option<f64>,
    pub sqft: Option<i64>,
    pub photos: Option<String>,
    pub remarks: Option<String>,
    pub agent_name: Option<String>,
}

// JSON sub-shapes inside the broker feed's string columns.

#[derive(Debug, Deserialize)]
pub struct RemarkVariant {
    #[serde(rename = "type")]
    pub remark_type: Option<String>,
    pub remark: Option<String>,
    pub remark_html: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MediaItem {
    pub format: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LicenseInfo {
    pub number: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OfficeAddress {
    pub line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenHouseWindow {
    pub start: Option<String>,
    pub end: Option<String>,
    pub comments: Option<String>,
}
