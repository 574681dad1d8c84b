use crate::domain::filter::{ListingQuery, SortOrder};
use crate::engine::Engine;
use crate::errors::ServerError;
use crate::responses::{json_response, ResultResp};
use astra::Request;
use serde_json::json;
use std::collections::HashMap;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_CAP: u32 = 12;

pub fn handle(req: Request, engine: &Engine) -> ResultResp {
    let method = req.method().as_str();
    let path = req.uri().path().to_string();
    let params = parse_query(&req);

    match (method, path.as_str()) {
        ("GET", "/") => json_response(&json!({
            "service": "listing_engine",
            "status": "ok"
        })),

        ("GET", "/search") => {
            let query = parse_listing_query(&params);
            let page = engine.search(query, page_param(&params), page_size_param(&params))?;
            json_response(&page)
        }

        ("GET", "/sold") => {
            let query = parse_listing_query(&params);
            let page = engine.sold_search(query, page_param(&params), page_size_param(&params))?;
            json_response(&page)
        }

        ("GET", "/featured") => {
            let cities = list_param(&params, "city");
            let limit = cap_param(&params, "limit");
            let listings = engine.featured_high_priced(cities, limit)?;
            let total = listings.len();
            json_response(&json!({
                "listings": listings,
                "total": total
            }))
        }

        ("GET", "/open-houses") => {
            let limit = cap_param(&params, "limit");
            let listings = engine.open_houses(limit)?;
            let total = listings.len();
            json_response(&json!({
                "listings": listings,
                "total": total
            }))
        }

        ("GET", "/team/listings") => {
            let page = engine.team_listings(page_param(&params), page_size_param(&params))?;
            json_response(&page)
        }

        ("GET", "/off-market") => {
            let listings = engine.off_market_listings()?;
            let total = listings.len();
            json_response(&json!({
                "listings": listings,
                "total": total
            }))
        }

        ("GET", _) => {
            // /agents/{id}/listings
            if let Some(agent_id) = agent_path_id(&path) {
                let buckets = engine.agent_listings(
                    &agent_id,
                    params.get("sold_agent_id").map(String::as_str),
                    cap_param(&params, "active_limit"),
                    cap_param(&params, "sold_limit"),
                )?;
                let active_total = buckets.active.len();
                let sold_total = buckets.sold.len();
                return json_response(&json!({
                    "active": { "listings": buckets.active, "total": active_total },
                    "sold": { "listings": buckets.sold, "total": sold_total }
                }));
            }
            Err(ServerError::NotFound)
        }

        _ => Err(ServerError::NotFound),
    }
}

fn agent_path_id(path: &str) -> Option<String> {
    let id = path.strip_prefix("/agents/")?.strip_suffix("/listings")?;
    if id.is_empty() || id.contains('/') {
        return None;
    }
    Some(id.to_string())
}

/// Builds the caller filter set from the query string. Anything missing or
/// malformed simply does not filter; bad numbers are ignored rather than
/// rejected.
fn parse_listing_query(params: &HashMap<String, String>) -> ListingQuery {
    ListingQuery {
        statuses: list_param(params, "status"),
        property_types: list_param(params, "type"),
        property_sub_types: list_param(params, "subtype"),
        cities: list_param(params, "city"),
        excluded_statuses: list_param(params, "exclude_status"),
        excluded_property_types: list_param(params, "exclude_type"),
        excluded_property_sub_types: list_param(params, "exclude_subtype"),
        min_price: int_param(params, "min_price"),
        max_price: int_param(params, "max_price"),
        min_beds: int_param(params, "beds"),
        min_baths: float_param(params, "baths"),
        keyword: params
            .get("q")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        agent_id: None,
        sort: SortOrder::parse(params.get("sort").map(String::as_str).unwrap_or("")),
    }
}

/// Comma-separated multi-value param: `city=Aspen,Basalt`.
fn list_param(params: &HashMap<String, String>, key: &str) -> Vec<String> {
    params
        .get(key)
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn int_param(params: &HashMap<String, String>, key: &str) -> Option<i64> {
    params.get(key).and_then(|v| v.parse().ok())
}

fn float_param(params: &HashMap<String, String>, key: &str) -> Option<f64> {
    params.get(key).and_then(|v| v.parse().ok())
}

/// 1-indexed page number; absent or unparseable normalizes to 1.
fn page_param(params: &HashMap<String, String>) -> i64 {
    params
        .get("page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
}

fn page_size_param(params: &HashMap<String, String>) -> u32 {
    params
        .get("per_page")
        .and_then(|v| v.parse().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE)
}

fn cap_param(params: &HashMap<String, String>, key: &str) -> u32 {
    params
        .get(key)
        .and_then(|v| v.parse().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(DEFAULT_CAP)
        .min(MAX_PAGE_SIZE)
}

fn parse_query(req: &astra::Request) -> HashMap<String, String> {
    let mut map = HashMap::new();

    if let Some(q) = req.uri().query() {
        for pair in q.split('&') {
            let mut parts = pair.splitn(2, '=');
            if let (Some(k), Some(v)) = (parts.next(), parts.next()) {
                map.insert(k.to_string(), decode_component(v));
            }
        }
    }

    map
}

/// Minimal percent-decoding for query values (city names carry spaces).
fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
