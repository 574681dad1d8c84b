use crate::db::connection::Database;
use crate::errors::ServerError;
use crate::feeds::models::OffMarketRow;

/// Reads the curated off-market set. The `published` flag gates every row
/// unconditionally: unpublished entries never leave the store layer, no
/// override. MLS configuration rules do not apply here — off-market listings
/// are outside the MLS config's scope by definition.
pub fn published_off_market(db: &Database) -> Result<Vec<OffMarketRow>, ServerError> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(
                r#"
                SELECT
                    id,            -- 0
                    title,         -- 1
                    address,       -- 2
                    city,          -- 3
                    list_price,    -- 4
                    beds,          -- 5
                    baths,         -- 6
                    sqft,          -- 7
                    photos,        -- 8
                    remarks,       -- 9
                    agent_name     -- 10
                FROM off_market_listings
                WHERE published = 1
                ORDER BY created_at DESC, id DESC
                "#,
            )
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(OffMarketRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    address: row.get(2)?,
                    city: row.get(3)?,
                    list_price: row.get(4)?,
                    beds: row.get(5)?,
                    baths: row.get(6)?,
                    sqft: row.get(7)?,
                    photos: row.get(8)?,
                    remarks: row.get(9)?,
                    agent_name: row.get(10)?,
                })
            })
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}
