// src/domain/filter.rs
//
// The query builder: merges caller-supplied filters with the resolved rule
// set (and optionally a team scope) into one immutable filter specification.
// The merge order is fixed so the same inputs always produce the same spec.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::domain::rules::RuleSet;

/// Caller-selectable sort orders. Every order carries an explicit internal-id
/// tie-break so pagination is stable across identical queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// List date descending, newest first.
    #[default]
    Newest,
    PriceDesc,
    PriceAsc,
    /// Soonest open house first. Not caller-selectable; used by the
    /// open-house read path.
    OpenHouseSoonest,
}

impl SortOrder {
    /// Unknown sort keys normalize to the default rather than erroring.
    pub fn parse(key: &str) -> SortOrder {
        match key {
            "newest" => SortOrder::Newest,
            "price" | "price_desc" => SortOrder::PriceDesc,
            "price_asc" => SortOrder::PriceAsc,
            _ => SortOrder::Newest,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Newest => "list_date DESC, id DESC",
            SortOrder::PriceDesc => "list_price DESC, id DESC",
            SortOrder::PriceAsc => "list_price ASC, id DESC",
            SortOrder::OpenHouseSoonest => "next_open_house_start ASC, id DESC",
        }
    }
}

/// Membership sets gathered from the team roster. A listing belongs to the
/// team if its agent id, agent name, OR office name matches: the same team
/// member is attributed inconsistently across feeds, so the three tests are
/// disjunctive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamScope {
    pub agent_ids: BTreeSet<String>,
    pub agent_names: BTreeSet<String>,
    pub office_names: BTreeSet<String>,
}

impl TeamScope {
    pub fn is_empty(&self) -> bool {
        self.agent_ids.is_empty() && self.agent_names.is_empty() && self.office_names.is_empty()
    }
}

/// Filters as the caller supplied them, before any rules are applied.
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    pub statuses: Vec<String>,
    pub property_types: Vec<String>,
    pub property_sub_types: Vec<String>,
    pub cities: Vec<String>,
    /// Caller-declared exclusions. Unioned with the rule exclusions, never
    /// replacing them.
    pub excluded_statuses: Vec<String>,
    pub excluded_property_types: Vec<String>,
    pub excluded_property_sub_types: Vec<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_beds: Option<i64>,
    pub min_baths: Option<f64>,
    /// Substring match against address or listing number.
    pub keyword: Option<String>,
    pub agent_id: Option<String>,
    pub sort: SortOrder,
}

/// The merged, immutable specification the store layer executes.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub statuses: Vec<String>,
    pub excluded_statuses: BTreeSet<String>,
    pub property_types: Vec<String>,
    pub excluded_property_types: BTreeSet<String>,
    pub property_sub_types: Vec<String>,
    pub excluded_property_sub_types: BTreeSet<String>,
    /// Effective city filter after the allowlist merge. Empty means no
    /// city restriction (unless `match_nothing` is set).
    pub cities: Vec<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_beds: Option<i64>,
    pub min_baths: Option<f64>,
    pub keyword: Option<String>,
    pub agent_id: Option<String>,
    pub team: Option<TeamScope>,
    pub open_house_after: Option<NaiveDateTime>,
    /// Set when the merge proved no listing can match (empty allowlist
    /// intersection, empty team scope). Not an error: yields a valid empty
    /// result set.
    pub match_nothing: bool,
    pub sort: SortOrder,
}

impl FilterSpec {
    /// Deterministic merge, in order:
    /// 1. caller equality/range filters verbatim;
    /// 2. caller exclusions unioned with the rule exclusions;
    /// 3. allowed-cities allowlist constrains or intersects the city filter;
    /// 4. team scope added as a disjunctive membership group.
    pub fn build(query: ListingQuery, rules: &RuleSet, team: Option<TeamScope>) -> FilterSpec {
        let mut spec = FilterSpec {
            statuses: query.statuses,
            property_types: query.property_types,
            property_sub_types: query.property_sub_types,
            min_price: query.min_price,
            max_price: query.max_price,
            min_beds: query.min_beds,
            min_baths: query.min_baths,
            keyword: query.keyword,
            agent_id: query.agent_id,
            sort: query.sort,
            ..FilterSpec::default()
        };

        spec.excluded_statuses = rules.excluded_statuses.clone();
        spec.excluded_statuses.extend(query.excluded_statuses);
        spec.excluded_property_types = rules.excluded_property_types.clone();
        spec.excluded_property_types
            .extend(query.excluded_property_types);
        spec.excluded_property_sub_types = rules.excluded_property_sub_types.clone();
        spec.excluded_property_sub_types
            .extend(query.excluded_property_sub_types);

        if rules.allowed_cities.is_empty() {
            spec.cities = query.cities;
        } else if query.cities.is_empty() {
            spec.cities = rules.allowed_cities.iter().cloned().collect();
        } else {
            // Intersection. A caller asking only for non-allowed cities gets
            // an empty result, not an error.
            spec.cities = query
                .cities
                .into_iter()
                .filter(|c| rules.allowed_cities.contains(c))
                .collect();
            if spec.cities.is_empty() {
                spec.match_nothing = true;
            }
        }

        if let Some(scope) = team {
            // A configured team with zero eligible members means zero
            // listings, not "no team filter".
            if scope.is_empty() {
                spec.match_nothing = true;
            } else {
                spec.team = Some(scope);
            }
        }

        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_with_cities(cities: &[&str]) -> RuleSet {
        let mut rules = RuleSet::empty();
        for c in cities {
            rules.allowed_cities.insert((*c).to_string());
        }
        rules
    }

    #[test]
    fn caller_filters_pass_through_verbatim() {
        let query = ListingQuery {
            statuses: vec!["Active".to_string()],
            min_price: Some(500_000),
            min_beds: Some(3),
            keyword: Some("Main St".to_string()),
            ..ListingQuery::default()
        };
        let spec = FilterSpec::build(query, &RuleSet::empty(), None);

        assert_eq!(spec.statuses, vec!["Active"]);
        assert_eq!(spec.min_price, Some(500_000));
        assert_eq!(spec.min_beds, Some(3));
        assert_eq!(spec.keyword.as_deref(), Some("Main St"));
        assert!(!spec.match_nothing);
    }

    #[test]
    fn rule_exclusions_union_with_caller_filters() {
        let mut rules = RuleSet::empty();
        rules.excluded_property_types.insert("Fractional".to_string());
        let rules = rules.with_defaults();

        let query = ListingQuery {
            property_types: vec!["Residential".to_string()],
            ..ListingQuery::default()
        };
        let spec = FilterSpec::build(query, &rules, None);

        // Caller equality filter survives; exclusions are added, not swapped.
        assert_eq!(spec.property_types, vec!["Residential"]);
        assert!(spec.excluded_property_types.contains("Fractional"));
        assert!(spec.excluded_property_types.contains("Commercial Sale"));
        assert!(spec.excluded_statuses.contains("Closed"));
        assert!(spec.excluded_statuses.contains("Sold"));
    }

    #[test]
    fn caller_exclusions_union_with_rule_exclusions() {
        let mut rules = RuleSet::empty();
        rules.excluded_statuses.insert("Withdrawn".to_string());
        let rules = rules.with_defaults();

        let query = ListingQuery {
            excluded_statuses: vec!["Expired".to_string()],
            excluded_property_types: vec!["Timeshare".to_string()],
            ..ListingQuery::default()
        };
        let spec = FilterSpec::build(query, &rules, None);

        // Both sources of exclusion survive side by side.
        assert!(spec.excluded_statuses.contains("Expired"));
        assert!(spec.excluded_statuses.contains("Withdrawn"));
        assert!(spec.excluded_statuses.contains("Closed"));
        assert!(spec.excluded_property_types.contains("Timeshare"));
        assert!(spec.excluded_property_types.contains("Commercial Sale"));
    }

    #[test]
    fn allowlist_applies_when_caller_names_no_city() {
        let rules = rules_with_cities(&["Aspen", "Basalt"]);
        let spec = FilterSpec::build(ListingQuery::default(), &rules, None);

        assert_eq!(spec.cities, vec!["Aspen", "Basalt"]);
        assert!(!spec.match_nothing);
    }

    #[test]
    fn allowlist_intersects_caller_cities() {
        let rules = rules_with_cities(&["Aspen", "Basalt"]);
        let query = ListingQuery {
            cities: vec!["Basalt".to_string(), "Denver".to_string()],
            ..ListingQuery::default()
        };
        let spec = FilterSpec::build(query, &rules, None);

        assert_eq!(spec.cities, vec!["Basalt"]);
        assert!(!spec.match_nothing);
    }

    #[test]
    fn empty_allowlist_intersection_matches_nothing() {
        let rules = rules_with_cities(&["Aspen", "Basalt"]);
        let query = ListingQuery {
            cities: vec!["Denver".to_string()],
            ..ListingQuery::default()
        };
        let spec = FilterSpec::build(query, &rules, None);

        assert!(spec.match_nothing);
    }

    #[test]
    fn empty_team_scope_matches_nothing() {
        let spec = FilterSpec::build(
            ListingQuery::default(),
            &RuleSet::empty(),
            Some(TeamScope::default()),
        );
        assert!(spec.match_nothing);
        assert!(spec.team.is_none());
    }

    #[test]
    fn populated_team_scope_is_kept() {
        let mut scope = TeamScope::default();
        scope.agent_ids.insert("A100".to_string());
        let spec = FilterSpec::build(ListingQuery::default(), &RuleSet::empty(), Some(scope));

        assert!(!spec.match_nothing);
        assert!(spec.team.is_some());
    }

    #[test]
    fn unknown_sort_key_falls_back_to_newest() {
        assert_eq!(SortOrder::parse("relevance"), SortOrder::Newest);
        assert_eq!(SortOrder::parse("price"), SortOrder::PriceDesc);
        assert_eq!(SortOrder::parse("price_asc"), SortOrder::PriceAsc);
    }
}
