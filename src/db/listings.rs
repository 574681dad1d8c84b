use crate::db::connection::Database;
use crate::domain::filter::FilterSpec;
use crate::errors::ServerError;
use crate::feeds::models::{BrokerRow, MlsRow};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Row};

// Query execution over the two feed tables. The WHERE clause is built once
// from the FilterSpec and shared by the COUNT and the page query, so total
// and slice always describe the same filtered set. Totals come from
// COUNT(*): the store counts, we never fetch all rows to count in memory.

const MLS_COLUMNS: &str = "\
    id, listing_number, status, property_type, property_sub_type, \
    city, area, subdivision, address, \
    list_price, beds, baths, sqft, \
    photos, remarks, \
    agent_id, co_agent_id, agent_name, office_name, \
    list_date, status_change_date, open_houses";

const BROKER_COLUMNS: &str = "\
    id, listing_number, status, property_type, property_sub_type, \
    city, area, subdivision, address, \
    list_price, beds, baths, sqft, \
    agent_id, co_agent_id, agent_name, office_name, \
    list_date, status_change_date, \
    remarks_json, media_json, license_json, office_address_json, cross_mls_json";

/// Renders the spec into a WHERE body plus its positional params.
/// Returns "1 = 1" for an unrestricted spec so callers can always splice it.
pub fn build_where(spec: &FilterSpec) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if spec.match_nothing {
        // The merge already proved nothing can match (empty allowlist
        // intersection, empty team). Still valid SQL, still zero rows.
        return ("0 = 1".to_string(), params);
    }

    push_in(&mut clauses, &mut params, "status", &spec.statuses);
    push_in(&mut clauses, &mut params, "property_type", &spec.property_types);
    push_in(
        &mut clauses,
        &mut params,
        "property_sub_type",
        &spec.property_sub_types,
    );
    push_in(&mut clauses, &mut params, "city", &spec.cities);

    push_not_in(
        &mut clauses,
        &mut params,
        "status",
        spec.excluded_statuses.iter(),
    );
    push_not_in(
        &mut clauses,
        &mut params,
        "property_type",
        spec.excluded_property_types.iter(),
    );
    push_not_in(
        &mut clauses,
        &mut params,
        "property_sub_type",
        spec.excluded_property_sub_types.iter(),
    );

    if let Some(min) = spec.min_price {
        clauses.push("list_price >= ?".to_string());
        params.push(Value::Integer(min));
    }
    if let Some(max) = spec.max_price {
        clauses.push("list_price <= ?".to_string());
        params.push(Value::Integer(max));
    }
    if let Some(beds) = spec.min_beds {
        clauses.push("beds >= ?".to_string());
        params.push(Value::Integer(beds));
    }
    if let Some(baths) = spec.min_baths {
        clauses.push("baths >= ?".to_string());
        params.push(Value::Real(baths));
    }

    if let Some(kw) = spec.keyword.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        clauses.push(
            "(address LIKE ? ESCAPE '\\' OR listing_number LIKE ? ESCAPE '\\')".to_string(),
        );
        // LIKE metacharacters in the keyword are literal text to the caller.
        let escaped = kw
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");
        params.push(Value::Text(pattern.clone()));
        params.push(Value::Text(pattern));
    }

    if let Some(agent) = spec.agent_id.as_deref().filter(|s| !s.is_empty()) {
        clauses.push("(agent_id = ? OR co_agent_id = ?)".to_string());
        params.push(Value::Text(agent.to_string()));
        params.push(Value::Text(agent.to_string()));
    }

    if let Some(team) = &spec.team {
        // Disjunctive on purpose: the same team member may show up under a
        // different id, name, or office depending on the feed.
        let mut branches: Vec<String> = Vec::new();
        if !team.agent_ids.is_empty() {
            branches.push(in_clause("agent_id", team.agent_ids.len()));
            params.extend(team.agent_ids.iter().map(|v| Value::Text(v.clone())));
            branches.push(in_clause("co_agent_id", team.agent_ids.len()));
            params.extend(team.agent_ids.iter().map(|v| Value::Text(v.clone())));
        }
        if !team.agent_names.is_empty() {
            branches.push(in_clause("agent_name", team.agent_names.len()));
            params.extend(team.agent_names.iter().map(|v| Value::Text(v.clone())));
        }
        if !team.office_names.is_empty() {
            branches.push(in_clause("office_name", team.office_names.len()));
            params.extend(team.office_names.iter().map(|v| Value::Text(v.clone())));
        }
        clauses.push(format!("({})", branches.join(" OR ")));
    }

    if let Some(after) = spec.open_house_after {
        clauses.push("next_open_house_start >= ?".to_string());
        params.push(Value::Text(after.format("%Y-%m-%d %H:%M:%S").to_string()));
    }

    if clauses.is_empty() {
        ("1 = 1".to_string(), params)
    } else {
        (clauses.join(" AND "), params)
    }
}

fn in_clause(column: &str, n: usize) -> String {
    let marks = vec!["?"; n].join(", ");
    format!("{column} IN ({marks})")
}

fn push_in(clauses: &mut Vec<String>, params: &mut Vec<Value>, column: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    clauses.push(in_clause(column, values.len()));
    params.extend(values.iter().map(|v| Value::Text(v.clone())));
}

fn push_not_in<'a>(
    clauses: &mut Vec<String>,
    params: &mut Vec<Value>,
    column: &str,
    values: impl Iterator<Item = &'a String>,
) {
    let values: Vec<&String> = values.collect();
    if values.is_empty() {
        return;
    }
    let marks = vec!["?"; values.len()].join(", ");
    // NULL columns are not members of the excluded set.
    clauses.push(format!("({column} IS NULL OR {column} NOT IN ({marks}))"));
    params.extend(values.into_iter().map(|v| Value::Text(v.clone())));
}

/// Total size of the filtered set in the primary feed, counted by SQLite.
pub fn count_mls(db: &Database, spec: &FilterSpec) -> Result<i64, ServerError> {
    if spec.match_nothing {
        return Ok(0);
    }
    let (where_sql, params) = build_where(spec);
    db.with_conn(|conn| {
        conn.query_row(
            &format!("SELECT COUNT(*) FROM mls_listings WHERE {where_sql}"),
            params_from_iter(params.iter()),
            |row| row.get::<_, i64>(0),
        )
        .map_err(|e| ServerError::DbError(e.to_string()))
    })
}

/// One sorted page of primary-feed rows.
pub fn page_mls(
    db: &Database,
    spec: &FilterSpec,
    limit: i64,
    offset: i64,
) -> Result<Vec<MlsRow>, ServerError> {
    if spec.match_nothing {
        return Ok(Vec::new());
    }
    let (where_sql, mut params) = build_where(spec);
    params.push(Value::Integer(limit));
    params.push(Value::Integer(offset));

    let sql = format!(
        "SELECT {MLS_COLUMNS} FROM mls_listings WHERE {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
        spec.sort.sql()
    );

    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(params.iter()), map_mls_row)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}

/// Matching rows from the secondary brokerage feed, capped. Used by the
/// cross-feed paths (agent pages, team roster) before the primary-wins merge.
pub fn fetch_broker(
    db: &Database,
    spec: &FilterSpec,
    limit: i64,
) -> Result<Vec<BrokerRow>, ServerError> {
    if spec.match_nothing {
        return Ok(Vec::new());
    }
    let (where_sql, mut params) = build_where(spec);
    params.push(Value::Integer(limit));

    let sql = format!(
        "SELECT {BROKER_COLUMNS} FROM broker_listings WHERE {where_sql} ORDER BY {} LIMIT ?",
        spec.sort.sql()
    );

    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(params.iter()), map_broker_row)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}

/// Pointer into one of the two feed tables, produced by the store-side merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergedRef {
    Mls(i64),
    Broker(i64),
}

// UPPER(TRIM(...)) mirrors Listing::merge_key; listing numbers are ASCII.
const MERGE_KEY_SQL: &str = "UPPER(TRIM(listing_number))";

/// Size of the cross-feed union for one spec, counted by SQLite. Listings
/// present in both feeds count once: UNION deduplicates on the merge key.
pub fn count_merged(db: &Database, spec: &FilterSpec) -> Result<i64, ServerError> {
    if spec.match_nothing {
        return Ok(0);
    }
    let (where_sql, params) = build_where(spec);
    let sql = format!(
        "SELECT COUNT(*) FROM ( \
             SELECT {MERGE_KEY_SQL} FROM mls_listings WHERE {where_sql} \
             UNION \
             SELECT {MERGE_KEY_SQL} FROM broker_listings WHERE {where_sql} \
         )"
    );
    // The WHERE body runs once per feed, so its params go in twice.
    let mut all = params.clone();
    all.extend(params);

    db.with_conn(|conn| {
        conn.query_row(&sql, params_from_iter(all.iter()), |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|e| ServerError::DbError(e.to_string()))
    })
}

/// One sorted page of the cross-feed merge, as feed/rowid pointers. Grouping
/// on the merge key with MIN(feed) makes the primary feed win a conflict;
/// SQLite takes the bare columns from the row holding that minimum.
pub fn page_merged(
    db: &Database,
    spec: &FilterSpec,
    limit: i64,
    offset: i64,
) -> Result<Vec<MergedRef>, ServerError> {
    if spec.match_nothing {
        return Ok(Vec::new());
    }
    let (where_sql, params) = build_where(spec);
    let sql = format!(
        "SELECT MIN(feed) AS feed, id FROM ( \
             SELECT 0 AS feed, id, {MERGE_KEY_SQL} AS merge_no, list_price, list_date \
             FROM mls_listings WHERE {where_sql} \
             UNION ALL \
             SELECT 1, id, {MERGE_KEY_SQL}, list_price, list_date \
             FROM broker_listings WHERE {where_sql} \
         ) GROUP BY merge_no ORDER BY {} LIMIT ? OFFSET ?",
        spec.sort.sql()
    );
    let mut all = params.clone();
    all.extend(params);
    all.push(Value::Integer(limit));
    all.push(Value::Integer(offset));

    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(all.iter()), |row| {
                let feed: i64 = row.get(0)?;
                let id: i64 = row.get(1)?;
                Ok(if feed == 0 {
                    MergedRef::Mls(id)
                } else {
                    MergedRef::Broker(id)
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

/// Primary-feed rows for a set of ids, in no particular order.
pub fn mls_by_ids(db: &Database, ids: &[i64]) -> Result<Vec<MlsRow>, ServerError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {MLS_COLUMNS} FROM mls_listings WHERE {}",
        in_clause("id", ids.len())
    );
    let params: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();

    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), map_mls_row)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}

/// Secondary-feed rows for a set of ids, in no particular order.
pub fn broker_by_ids(db: &Database, ids: &[i64]) -> Result<Vec<BrokerRow>, ServerError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {BROKER_COLUMNS} FROM broker_listings WHERE {}",
        in_clause("id", ids.len())
    );
    let params: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();

    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), map_broker_row)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
        }
        Ok(out)
    })
}

fn map_mls_row(row: &Row) -> rusqlite::Result<MlsRow> {
    Ok(MlsRow {
        id: row.get(0)?,
        listing_number: row.get(1)?,
        status: row.get(2)?,
        property_type: row.get(3)?,
        property_sub_type: row.get(4)?,
        city: row.get(5)?,
        area: row.get(6)?,
        subdivision: row.get(7)?,
        address: row.get(8)?,
        list_price: row.get(9)?,
        beds: row.get(10)?,
        baths: row.get(11)?,
        sqft: row.get(12)?,
        photos: row.get(13)?,
        remarks: row.get(14)?,
        agent_id: row.get(15)?,
        co_agent_id: row.get(16)?,
        agent_name: row.get(17)?,
        office_name: row.get(18)?,
        list_date: row.get(19)?,
        status_change_date: row.get(20)?,
        open_houses: row.get(21)?,
    })
}

fn map_broker_row(row: &Row) -> rusqlite::Result<BrokerRow> {
    Ok(BrokerRow {
        id: row.get(0)?,
        listing_number: row.get(1)?,
        status: row.get(2)?,
        property_type: row.get(3)?,
        property_sub_type: row.get(4)?,
        city: row.get(5)?,
        area: row.get(6)?,
        subdivision: row.get(7)?,
        address: row.get(8)?,
        list_price: row.get(9)?,
        beds: row.get(10)?,
        baths: row.get(11)?,
        sqft: row.get(12)?,
        agent_id: row.get(13)?,
        co_agent_id: row.get(14)?,
        agent_name: row.get(15)?,
        office_name: row.get(16)?,
        list_date: row.get(17)?,
        status_change_date: row.get(18)?,
        remarks_json: row.get(19)?,
        media_json: row.get(20)?,
        license_json: row.get(21)?,
        office_address_json: row.get(22)?,
        cross_mls_json: row.get(23)?,
    })
}
