// src/feeds/normalize.rs

use chrono::{DateTime, NaiveDateTime};
use url::Url;

use crate::domain::listing::{Listing, OpenHouse, SourceKind};
use crate::feeds::models::{
    BrokerRow, MediaItem, MlsRow, OffMarketRow, OpenHouseWindow, RemarkVariant,
};

// Converts heterogeneous raw feed rows into the one canonical `Listing`
// shape. This sits between the replicated feed schemas and everything
// downstream: a malformed sub-field degrades to a best-effort value, it
// never drops the record or fails the page.

const PERSONAL_PROFILE: &str = "Personal Profile";

pub fn from_mls(row: MlsRow) -> Listing {
    let photos = dedupe_urls(
        row.photos
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    );

    let open_houses = row
        .open_houses
        .as_deref()
        .map(parse_open_houses)
        .unwrap_or_default();

    Listing {
        id: row.id,
        listing_number: row.listing_number,
        status: row.status,
        property_type: row.property_type,
        property_sub_type: row.property_sub_type,
        city: row.city,
        area: row.area,
        subdivision: row.subdivision,
        address: row.address,
        list_price: row.list_price,
        beds: row.beds,
        baths: row.baths,
        sqft: row.sqft,
        photos,
        videos: Vec::new(),
        virtual_tours: Vec::new(),
        remarks: row.remarks,
        agent_id: row.agent_id,
        co_agent_id: row.co_agent_id,
        agent_name: row.agent_name,
        office_name: row.office_name,
        agent_license: None,
        office_address: None,
        cross_mls_numbers: Vec::new(),
        list_date: row.list_date,
        status_change_date: row.status_change_date,
        open_houses,
        source: SourceKind::Mls,
    }
}

pub fn from_broker(row: BrokerRow) -> Listing {
    let remarks = row.remarks_json.as_deref().and_then(|s| parse_remarks(s, false));
    let (photos, videos, virtual_tours) = row
        .media_json
        .as_deref()
        .map(partition_media)
        .unwrap_or_default();
    let agent_license = row.license_json.as_deref().and_then(parse_license);
    let office_address = row
        .office_address_json
        .as_deref()
        .and_then(parse_office_address);
    let cross_mls_numbers = row
        .cross_mls_json
        .as_deref()
        .map(parse_cross_mls)
        .unwrap_or_default();

    Listing {
        id: row.id,
        listing_number: row.listing_number,
        status: row.status,
        property_type: row.property_type,
        property_sub_type: row.property_sub_type,
        city: row.city,
        area: row.area,
        subdivision: row.subdivision,
        address: row.address,
        list_price: row.list_price,
        beds: row.beds,
        baths: row.baths,
        sqft: row.sqft,
        photos,
        videos,
        virtual_tours,
        remarks,
        agent_id: row.agent_id,
        co_agent_id: row.co_agent_id,
        agent_name: row.agent_name,
        office_name: row.office_name,
        agent_license,
        office_address,
        cross_mls_numbers,
        list_date: row.list_date,
        status_change_date: row.status_change_date,
        open_houses: Vec::new(),
        source: SourceKind::Broker,
    }
}

pub fn from_off_market(row: OffMarketRow) -> Listing {
    let photos = dedupe_urls(
        row.photos
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    );

    Listing {
        id: row.id,
        listing_number: format!("OM-{}", row.id),
        status: "Off Market".to_string(),
        property_type: None,
        property_sub_type: None,
        city: row.city,
        area: None,
        subdivision: row.title,
        address: row.address,
        list_price: row.list_price,
        beds: row.beds,
        baths: row.baths,
        sqft: row.sqft,
        photos,
        videos: Vec::new(),
        virtual_tours: Vec::new(),
        remarks: row.remarks,
        agent_id: None,
        co_agent_id: None,
        agent_name: row.agent_name,
        office_name: None,
        agent_license: None,
        office_address: None,
        cross_mls_numbers: Vec::new(),
        list_date: None,
        status_change_date: None,
        open_houses: Vec::new(),
        source: SourceKind::OffMarket,
    }
}

/// Picks the display remark from the broker feed's variant list.
///
/// Preference order: the "Personal Profile" variant if present, otherwise
/// the first variant. Within a variant the HTML body wins over plain text
/// unless `prefer_plain` is set. An unparseable payload is returned as-is:
/// a slightly wrong display value beats a failed page.
pub fn parse_remarks(raw: &str, prefer_plain: bool) -> Option<String> {
    let variants: Vec<RemarkVariant> = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            return Some(trimmed.to_string());
        }
    };

    let chosen = variants
        .iter()
        .find(|v| v.remark_type.as_deref() == Some(PERSONAL_PROFILE))
        .or_else(|| variants.first())?;

    let html = chosen.remark_html.as_deref().filter(|s| !s.is_empty());
    let plain = chosen.remark.as_deref().filter(|s| !s.is_empty());

    let text = if prefer_plain {
        plain.or(html)
    } else {
        html.or(plain)
    };
    text.map(|s| s.to_string())
}

/// Partitions a media payload into photo / video / 3D-tour buckets by its
/// `format` discriminator. Unrecognized formats are dropped from all three.
pub fn partition_media(raw: &str) -> (Vec<String>, Vec<String>, Vec<String>) {
    let items: Vec<MediaItem> = match serde_json::from_str(raw) {
        Ok(items) => items,
        Err(_) => {
            // Raw-fallback: some older rows hold a bare URL instead of JSON.
            let trimmed = raw.trim();
            if trimmed.starts_with("http") || trimmed.starts_with("//") {
                return (vec![normalize_url(trimmed)], Vec::new(), Vec::new());
            }
            return (Vec::new(), Vec::new(), Vec::new());
        }
    };

    let mut photos = Vec::new();
    let mut videos = Vec::new();
    let mut tours = Vec::new();

    for item in items {
        let url = match item.url.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() => normalize_url(u),
            _ => continue,
        };
        match item.format.as_deref().map(str::to_lowercase).as_deref() {
            Some("image") | Some("photo") => photos.push(url),
            Some("video") => videos.push(url),
            Some("3dtour") | Some("3d_tour") | Some("tour") => tours.push(url),
            _ => {} // unrecognized format: not surfaced, not an error
        }
    }

    (dedupe_urls(photos.into_iter()), videos, tours)
}

fn parse_license(raw: &str) -> Option<String> {
    match serde_json::from_str::<crate::feeds::models::LicenseInfo>(raw) {
        Ok(info) => info.number.filter(|n| !n.is_empty()),
        Err(_) => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

fn parse_office_address(raw: &str) -> Option<String> {
    match serde_json::from_str::<crate::feeds::models::OfficeAddress>(raw) {
        Ok(addr) => {
            let parts: Vec<String> = [addr.line, addr.city, addr.state, addr.zip]
                .into_iter()
                .flatten()
                .filter(|p| !p.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Err(_) => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}

fn parse_cross_mls(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(numbers) => numbers
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Parses the JSON open-house window list. Windows without a parseable start
/// time are dropped; a malformed payload yields an empty list.
pub fn parse_open_houses(raw: &str) -> Vec<OpenHouse> {
    let windows: Vec<OpenHouseWindow> = match serde_json::from_str(raw) {
        Ok(w) => w,
        Err(_) => return Vec::new(),
    };

    windows
        .into_iter()
        .filter_map(|w| {
            let start = parse_feed_datetime(w.start.as_deref()?)?;
            Some(OpenHouse {
                start,
                end: w.end.as_deref().and_then(parse_feed_datetime),
                comments: w.comments.filter(|c| !c.is_empty()),
            })
        })
        .collect()
}

/// The feeds disagree on datetime formats; accept the common ones.
pub fn parse_feed_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

/// Upgrades feed media URLs to absolute HTTPS:
/// protocol-relative `//host/...` gets the scheme, a bare host/path gets a
/// full prefix, already-absolute URLs pass through unchanged.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("//") {
        return format!("https://{rest}");
    }
    // `Url::parse` alone is too permissive: `cdn.example.com:8080/a.jpg`
    // parses with "cdn.example.com" as its scheme.
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => trimmed.to_string(),
        _ => format!("https://{trimmed}"),
    }
}

fn dedupe_urls(urls: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for url in urls {
        let url = normalize_url(&url);
        if seen.insert(url.clone()) {
            out.push(url);
        }
    }
    out
}
