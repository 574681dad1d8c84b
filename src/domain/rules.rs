// src/domain/rules.rs

use std::collections::BTreeSet;

/// Property types that are never shown, regardless of what the CMS
/// configuration says.
pub const DEFAULT_EXCLUDED_PROPERTY_TYPES: &[&str] = &["Commercial Sale"];

/// Statuses hidden from the default public views. Callers that need sold
/// inventory go through the explicit sold path, which strips exactly these.
pub const DEFAULT_EXCLUDED_STATUSES: &[&str] = &["Closed", "Sold"];

/// The CMS toggle lists, resolved to plain value sets.
///
/// Each field is independently optional: an empty set means "no restriction
/// of this kind". Raw toggle lists never travel past the resolver boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub excluded_property_types: BTreeSet<String>,
    pub excluded_property_sub_types: BTreeSet<String>,
    pub allowed_cities: BTreeSet<String>,
    pub excluded_statuses: BTreeSet<String>,
}

impl RuleSet {
    /// An unrestricted rule set. This is also the fail-open result when the
    /// configuration cannot be fetched: listings stay visible on a transient
    /// config outage.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Layers the unconditional defaults on top of whatever the CMS
    /// configured. This is the only place the defaults are merged, so the
    /// composition order stays auditable.
    pub fn with_defaults(mut self) -> Self {
        for t in DEFAULT_EXCLUDED_PROPERTY_TYPES {
            self.excluded_property_types.insert((*t).to_string());
        }
        for s in DEFAULT_EXCLUDED_STATUSES {
            self.excluded_statuses.insert((*s).to_string());
        }
        self
    }

    /// Variant for the explicit sold path: removes the default status
    /// exclusions while keeping anything the CMS itself excluded.
    pub fn allowing_sold(mut self) -> Self {
        for s in DEFAULT_EXCLUDED_STATUSES {
            self.excluded_statuses.remove(*s);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_layer_on_top_of_configured_rules() {
        let mut rules = RuleSet::empty();
        rules.excluded_property_types.insert("Timeshare".to_string());

        let rules = rules.with_defaults();
        assert!(rules.excluded_property_types.contains("Commercial Sale"));
        assert!(rules.excluded_property_types.contains("Timeshare"));
        assert!(rules.excluded_statuses.contains("Closed"));
        assert!(rules.excluded_statuses.contains("Sold"));
    }

    #[test]
    fn allowing_sold_strips_only_the_defaults() {
        let mut rules = RuleSet::empty();
        rules.excluded_statuses.insert("Withdrawn".to_string());

        let rules = rules.with_defaults().allowing_sold();
        assert!(!rules.excluded_statuses.contains("Closed"));
        assert!(!rules.excluded_statuses.contains("Sold"));
        assert!(rules.excluded_statuses.contains("Withdrawn"));
    }

    #[test]
    fn empty_rule_set_has_no_restrictions() {
        let rules = RuleSet::empty();
        assert!(rules.excluded_property_types.is_empty());
        assert!(rules.excluded_property_sub_types.is_empty());
        assert!(rules.allowed_cities.is_empty());
        assert!(rules.excluded_statuses.is_empty());
    }
}
