use crate::cms::CmsClient;
use crate::db::connection::{init_db, Database};
use crate::engine::Engine;
use rusqlite::params;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Returns a fresh test database using the production schema
pub fn make_db(tag: &str) -> Database {
    let path = std::env::temp_dir().join(format!(
        "listing_engine_{}_{}.sqlite",
        tag,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let db = Database::new(path);
    init_db(&db, "sql/schema.sql").expect("Failed to initialize DB");
    db
}

/// Engine wired to a CMS address nothing listens on: every config fetch
/// fails fast and fails open, so tests exercise the default rules.
pub fn make_engine(db: Database) -> Engine {
    let cms = CmsClient::new("http://127.0.0.1:1").expect("client build failed");
    Engine::new(db, cms, Duration::from_secs(300))
}

pub struct MlsSeed {
    pub id: i64,
    pub number: String,
    pub status: &'static str,
    pub property_type: &'static str,
    pub sub_type: Option<&'static str>,
    pub city: &'static str,
    pub address: &'static str,
    pub price: i64,
    pub beds: i64,
    pub baths: f64,
    pub agent_id: Option<&'static str>,
    pub agent_name: Option<&'static str>,
    pub office: Option<&'static str>,
    pub list_date: &'static str,
    pub photos: Option<&'static str>,
    pub open_houses: Option<&'static str>,
    pub next_open_house: Option<&'static str>,
}

impl Default for MlsSeed {
    fn default() -> Self {
        Self {
            id: 1,
            number: "Q1000".to_string(),
            status: "Active",
            property_type: "Residential",
            sub_type: None,
            city: "Aspen",
            address: "100 Main St",
            price: 1_000_000,
            beds: 3,
            baths: 2.0,
            agent_id: None,
            agent_name: None,
            office: None,
            list_date: "2026-08-01 10:00:00",
            photos: None,
            open_houses: None,
            next_open_house: None,
        }
    }
}

pub fn insert_mls(db: &Database, seed: &MlsSeed) {
    db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO mls_listings (
                id, listing_number, status, property_type, property_sub_type,
                city, address, list_price, beds, baths,
                agent_id, agent_name, office_name,
                list_date, photos, open_houses, next_open_house_start
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                seed.id,
                seed.number,
                seed.status,
                seed.property_type,
                seed.sub_type,
                seed.city,
                seed.address,
                seed.price,
                seed.beds,
                seed.baths,
                seed.agent_id,
                seed.agent_name,
                seed.office,
                seed.list_date,
                seed.photos,
                seed.open_houses,
                seed.next_open_house,
            ],
        )
        .map_err(|e| crate::errors::ServerError::DbError(e.to_string()))?;
        Ok(())
    })
    .expect("insert_mls failed");
}

pub struct BrokerSeed {
    pub id: i64,
    pub number: &'static str,
    pub status: &'static str,
    pub city: &'static str,
    pub price: i64,
    pub agent_id: Option<&'static str>,
    pub agent_name: Option<&'static str>,
    pub office: Option<&'static str>,
    pub list_date: &'static str,
    pub remarks_json: Option<&'static str>,
    pub media_json: Option<&'static str>,
}

impl Default for BrokerSeed {
    fn default() -> Self {
        Self {
            id: 1,
            number: "B2000",
            status: "Active",
            city: "Aspen",
            price: 900_000,
            agent_id: None,
            agent_name: None,
            office: None,
            list_date: "2026-07-15 10:00:00",
            remarks_json: None,
            media_json: None,
        }
    }
}

pub fn insert_broker(db: &Database, seed: &BrokerSeed) {
    db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO broker_listings (
                id, listing_number, status, city, list_price,
                agent_id, agent_name, office_name,
                list_date, remarks_json, media_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                seed.id,
                seed.number,
                seed.status,
                seed.city,
                seed.price,
                seed.agent_id,
                seed.agent_name,
                seed.office,
                seed.list_date,
                seed.remarks_json,
                seed.media_json,
            ],
        )
        .map_err(|e| crate::errors::ServerError::DbError(e.to_string()))?;
        Ok(())
    })
    .expect("insert_broker failed");
}

pub fn insert_off_market(db: &Database, id: i64, title: &str, published: bool) {
    db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO off_market_listings (id, title, address, city, list_price, published, created_at)
            VALUES (?1, ?2, '500 Hidden Ln', 'Aspen', 5000000, ?3, '2026-06-01 09:00:00')
            "#,
            params![id, title, published as i64],
        )
        .map_err(|e| crate::errors::ServerError::DbError(e.to_string()))?;
        Ok(())
    })
    .expect("insert_off_market failed");
}
