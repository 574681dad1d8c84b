// src/engine.rs
//
// The read engine: resolves rules, builds the filter spec, runs the store
// queries, merges feeds where a path spans both, and shapes the output as
// canonical listings. Stateless per request apart from the short-TTL rules
// cache; store failures propagate, they are never retried here.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::cms::roster::{self, TeamMember};
use crate::cms::{CmsClient, RulesCache};
use crate::db::listings::MergedRef;
use crate::db::{listings, off_market, Database};
use crate::domain::filter::{FilterSpec, ListingQuery, SortOrder, TeamScope};
use crate::domain::listing::Listing;
use crate::domain::page::{clamp_page, page_offset, PageResult};
use crate::domain::rules::{RuleSet, DEFAULT_EXCLUDED_STATUSES};
use crate::errors::ServerError;
use crate::feeds::normalize;

/// Statuses treated as "on the market" by the featured carousel.
const ACTIVE_EQUIVALENT_STATUSES: &[&str] = &["Active", "Active Under Contract", "Pending"];

/// Active and sold buckets for a per-agent listing page, each independently
/// capped.
#[derive(Debug, Serialize)]
pub struct AgentListings {
    pub active: Vec<Listing>,
    pub sold: Vec<Listing>,
}

pub struct Engine {
    db: Database,
    cms: CmsClient,
    rules: RulesCache,
}

impl Engine {
    pub fn new(db: Database, cms: CmsClient, rules_ttl: Duration) -> Self {
        Self {
            db,
            cms,
            rules: RulesCache::new(rules_ttl),
        }
    }

    /// Public search: caller filters merged with the configured rules and
    /// the unconditional defaults (no Commercial Sale, no Closed/Sold).
    pub fn search(
        &self,
        query: ListingQuery,
        page: i64,
        page_size: u32,
    ) -> Result<PageResult, ServerError> {
        let rules = self.rules.resolve(&self.cms).with_defaults();
        let spec = FilterSpec::build(query, &rules, None);
        self.page_primary(&spec, page, page_size)
    }

    /// Explicit sold path: the only way to see Closed/Sold inventory.
    pub fn sold_search(
        &self,
        mut query: ListingQuery,
        page: i64,
        page_size: u32,
    ) -> Result<PageResult, ServerError> {
        if query.statuses.is_empty() {
            query.statuses = DEFAULT_EXCLUDED_STATUSES
                .iter()
                .map(|s| s.to_string())
                .collect();
        }
        let rules = self.rules.resolve(&self.cms).with_defaults().allowing_sold();
        let spec = FilterSpec::build(query, &rules, None);
        self.page_primary(&spec, page, page_size)
    }

    /// Newest high-priced listings for the given cities, for the featured
    /// carousel. Status restricted to the active-equivalent set, price
    /// descending, capped.
    pub fn featured_high_priced(
        &self,
        cities: Vec<String>,
        limit: u32,
    ) -> Result<Vec<Listing>, ServerError> {
        let query = ListingQuery {
            statuses: ACTIVE_EQUIVALENT_STATUSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cities,
            sort: SortOrder::PriceDesc,
            ..ListingQuery::default()
        };
        let rules = self.rules.resolve(&self.cms).with_defaults();
        let spec = FilterSpec::build(query, &rules, None);

        let rows = listings::page_mls(&self.db, &spec, limit as i64, 0)?;
        Ok(rows.into_iter().map(normalize::from_mls).collect())
    }

    /// Listings with a future open-house window, soonest first.
    /// Status-independent: only the configured exclusions and the type
    /// defaults apply, not the sold-status defaults.
    pub fn open_houses(&self, limit: u32) -> Result<Vec<Listing>, ServerError> {
        let rules = self.rules.resolve(&self.cms).with_defaults().allowing_sold();
        let mut spec = FilterSpec::build(ListingQuery::default(), &rules, None);
        spec.open_house_after = Some(Utc::now().naive_utc());
        spec.sort = SortOrder::OpenHouseSoonest;

        let rows = listings::page_mls(&self.db, &spec, limit as i64, 0)?;
        Ok(rows.into_iter().map(normalize::from_mls).collect())
    }

    /// Per-agent listing page: active and sold buckets, aggregated across
    /// both feeds. `sold_agent_id` covers rosters where sold inventory is
    /// attributed under a different id.
    pub fn agent_listings(
        &self,
        agent_id: &str,
        sold_agent_id: Option<&str>,
        active_cap: u32,
        sold_cap: u32,
    ) -> Result<AgentListings, ServerError> {
        let rules = self.rules.resolve(&self.cms);

        let active_query = ListingQuery {
            agent_id: Some(agent_id.to_string()),
            ..ListingQuery::default()
        };
        let active_spec = FilterSpec::build(active_query, &rules.clone().with_defaults(), None);
        let active = self.merged_listings(&active_spec, active_cap as usize)?;

        let sold_query = ListingQuery {
            agent_id: Some(sold_agent_id.unwrap_or(agent_id).to_string()),
            statuses: DEFAULT_EXCLUDED_STATUSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ..ListingQuery::default()
        };
        let sold_spec = FilterSpec::build(sold_query, &rules.with_defaults().allowing_sold(), None);
        let sold = self.merged_listings(&sold_spec, sold_cap as usize)?;

        Ok(AgentListings { active, sold })
    }

    /// "Our team" page: every listing attributable to a roster member,
    /// across both feeds, paginated. Rules and roster are independent
    /// fetches, so they run concurrently and join before the build.
    pub fn team_listings(&self, page: i64, page_size: u32) -> Result<PageResult, ServerError> {
        let (rules, roster_result) = std::thread::scope(|s| {
            let rules_handle = s.spawn(|| self.rules.resolve(&self.cms));
            let roster_handle = s.spawn(|| roster::fetch_roster(&self.cms));
            (
                rules_handle.join().map_err(|_| ServerError::InternalError),
                roster_handle.join().map_err(|_| ServerError::InternalError),
            )
        });
        let rules = rules?;
        let members: Vec<TeamMember> = roster_result?
            .map_err(|e| ServerError::Upstream(format!("Team roster fetch failed: {e}")))?;

        let scope = roster::scope_from_roster(&members);
        self.team_page(scope, rules.with_defaults(), page, page_size)
    }

    /// Core of the team path, split out so it can run without a CMS.
    /// Count and page both come from the store-side union of the two feeds,
    /// so the total covers the whole filtered set no matter its size.
    pub fn team_page(
        &self,
        scope: TeamScope,
        rules: RuleSet,
        page: i64,
        page_size: u32,
    ) -> Result<PageResult, ServerError> {
        let page = clamp_page(page);
        let spec = FilterSpec::build(ListingQuery::default(), &rules, Some(scope));
        if spec.match_nothing {
            return Ok(PageResult::empty(page));
        }

        let total = listings::count_merged(&self.db, &spec)?;
        let refs = listings::page_merged(
            &self.db,
            &spec,
            page_size as i64,
            page_offset(page, page_size),
        )?;

        Ok(PageResult {
            listings: self.hydrate(refs)?,
            total,
            page,
        })
    }

    /// The curated off-market set. No pagination (bounded set), no MLS
    /// rules; the published gate is enforced by the store query.
    pub fn off_market_listings(&self) -> Result<Vec<Listing>, ServerError> {
        let rows = off_market::published_off_market(&self.db)?;
        Ok(rows.into_iter().map(normalize::from_off_market).collect())
    }

    /// Count + slice over the primary feed, both from the same spec so the
    /// pair can never disagree.
    fn page_primary(
        &self,
        spec: &FilterSpec,
        page: i64,
        page_size: u32,
    ) -> Result<PageResult, ServerError> {
        let page = clamp_page(page);
        let total = listings::count_mls(&self.db, spec)?;
        let rows = listings::page_mls(
            &self.db,
            spec,
            page_size as i64,
            page_offset(page, page_size),
        )?;

        Ok(PageResult {
            listings: rows.into_iter().map(normalize::from_mls).collect(),
            total,
            page,
        })
    }

    /// Union of both feeds for one spec, keyed by normalized listing number.
    /// The primary feed's record wins on conflict and nothing is counted
    /// twice.
    fn merged_listings(
        &self,
        spec: &FilterSpec,
        cap: usize,
    ) -> Result<Vec<Listing>, ServerError> {
        let primary = listings::page_mls(&self.db, spec, cap as i64, 0)?;
        let secondary = listings::fetch_broker(&self.db, spec, cap as i64)?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut merged: Vec<Listing> = Vec::new();

        for row in primary {
            let listing = normalize::from_mls(row);
            if seen.insert(listing.merge_key()) {
                merged.push(listing);
            }
        }
        for row in secondary {
            let listing = normalize::from_broker(row);
            if seen.insert(listing.merge_key()) {
                merged.push(listing);
            }
        }

        sort_listings(&mut merged, spec.sort);
        merged.truncate(cap);
        Ok(merged)
    }

    /// Fetches and normalizes the rows behind one page of merge pointers,
    /// preserving the store's ordering.
    fn hydrate(&self, refs: Vec<MergedRef>) -> Result<Vec<Listing>, ServerError> {
        let mls_ids: Vec<i64> = refs
            .iter()
            .filter_map(|r| match r {
                MergedRef::Mls(id) => Some(*id),
                MergedRef::Broker(_) => None,
            })
            .collect();
        let broker_ids: Vec<i64> = refs
            .iter()
            .filter_map(|r| match r {
                MergedRef::Broker(id) => Some(*id),
                MergedRef::Mls(_) => None,
            })
            .collect();

        let mut mls: HashMap<i64, Listing> = listings::mls_by_ids(&self.db, &mls_ids)?
            .into_iter()
            .map(normalize::from_mls)
            .map(|l| (l.id, l))
            .collect();
        let mut broker: HashMap<i64, Listing> = listings::broker_by_ids(&self.db, &broker_ids)?
            .into_iter()
            .map(normalize::from_broker)
            .map(|l| (l.id, l))
            .collect();

        let mut out = Vec::with_capacity(refs.len());
        for r in refs {
            let listing = match r {
                MergedRef::Mls(id) => mls.remove(&id),
                MergedRef::Broker(id) => broker.remove(&id),
            };
            if let Some(l) = listing {
                out.push(l);
            }
        }
        Ok(out)
    }
}

/// In-memory counterpart of the SQL sort, used after a cross-feed merge.
/// Same total order, same larger-id-first tie-break.
pub fn sort_listings(listings: &mut [Listing], sort: SortOrder) {
    listings.sort_by(|a, b| compare_listings(a, b, sort));
}

fn compare_listings(a: &Listing, b: &Listing, sort: SortOrder) -> Ordering {
    let ord = match sort {
        SortOrder::Newest => b.list_date.cmp(&a.list_date),
        SortOrder::PriceDesc => b.list_price.cmp(&a.list_price),
        SortOrder::PriceAsc => a.list_price.cmp(&b.list_price),
        SortOrder::OpenHouseSoonest => {
            let a_start = a.open_houses.iter().map(|o| o.start).min();
            let b_start = b.open_houses.iter().map(|o| o.start).min();
            a_start.cmp(&b_start)
        }
    };
    ord.then_with(|| b.id.cmp(&a.id))
}
