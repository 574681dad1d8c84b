// cms/config.rs
//
// The MLS configuration document and its resolver. The CMS stores three
// toggle lists (property types, property subtypes, cities) plus an optional
// statuses list; each entry is `{value, enabled}` and only enabled entries
// count. Raw toggle lists stop here: everything downstream sees a RuleSet.

use serde::Deserialize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::cms::client::CmsClient;
use crate::domain::rules::RuleSet;

const CONFIG_PATH: &str = "/api/mls-configuration";

#[derive(Debug, Deserialize)]
pub struct ToggleEntry {
    pub value: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct MlsConfigDoc {
    #[serde(default)]
    pub excluded_property_types: Vec<ToggleEntry>,
    #[serde(default)]
    pub excluded_property_sub_types: Vec<ToggleEntry>,
    #[serde(default)]
    pub allowed_cities: Vec<ToggleEntry>,
    #[serde(default)]
    pub excluded_statuses: Vec<ToggleEntry>,
}

impl MlsConfigDoc {
    /// Reduces the toggle lists to plain value sets, keeping only flagged
    /// entries. The unconditional defaults are layered on later, in the
    /// engine, so a fetch failure can fail open to a genuinely empty set.
    pub fn resolve(self) -> RuleSet {
        fn flagged(entries: Vec<ToggleEntry>) -> impl Iterator<Item = String> {
            entries
                .into_iter()
                .filter(|e| e.enabled)
                .map(|e| e.value.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let mut rules = RuleSet::empty();
        rules.excluded_property_types = flagged(self.excluded_property_types).collect();
        rules.excluded_property_sub_types = flagged(self.excluded_property_sub_types).collect();
        rules.allowed_cities = flagged(self.allowed_cities).collect();
        rules.excluded_statuses = flagged(self.excluded_statuses).collect();
        rules
    }
}

struct CachedRules {
    rules: RuleSet,
    fetched_at: Instant,
}

/// Short-TTL cache around the resolved rule set. Read-mostly and eventually
/// consistent: a stale entry is served until the TTL lapses, and a failed
/// refresh fails open to "show everything" instead of hiding the site's
/// primary content on a transient CMS outage.
pub struct RulesCache {
    inner: RwLock<Option<CachedRules>>,
    ttl: Duration,
}

impl RulesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(None),
            ttl,
        }
    }

    pub fn resolve(&self, cms: &CmsClient) -> RuleSet {
        if let Ok(guard) = self.inner.read() {
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    return cached.rules.clone();
                }
            }
        }

        let rules = match cms.get_json::<MlsConfigDoc>(CONFIG_PATH) {
            Ok(doc) => doc.resolve(),
            Err(e) => {
                // Fail open: an unreachable CMS must not blank the search.
                eprintln!("MLS configuration fetch failed, showing everything: {e}");
                RuleSet::empty()
            }
        };

        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(CachedRules {
                rules: rules.clone(),
                fetched_at: Instant::now(),
            });
        }

        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_flagged_entries_resolve() {
        let doc: MlsConfigDoc = serde_json::from_str(
            r#"{
                "excluded_property_types": [
                    {"value": "Timeshare", "enabled": true},
                    {"value": "Residential", "enabled": false}
                ],
                "allowed_cities": [
                    {"value": "Aspen", "enabled": true},
                    {"value": "Basalt", "enabled": true},
                    {"value": "Denver", "enabled": false}
                ]
            }"#,
        )
        .unwrap();

        let rules = doc.resolve();
        assert!(rules.excluded_property_types.contains("Timeshare"));
        assert!(!rules.excluded_property_types.contains("Residential"));
        assert_eq!(
            rules.allowed_cities.iter().cloned().collect::<Vec<_>>(),
            vec!["Aspen", "Basalt"]
        );
        // Defaults are the engine's concern, not the document's.
        assert!(!rules.excluded_property_types.contains("Commercial Sale"));
        assert!(rules.excluded_statuses.is_empty());
    }

    #[test]
    fn missing_lists_resolve_to_empty_sets() {
        let doc: MlsConfigDoc = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.resolve(), RuleSet::empty());
    }

    #[test]
    fn unreachable_cms_fails_open_to_empty_rules() {
        // Nothing listens on this port; the fetch fails fast and the cache
        // must hand back the unrestricted rule set, not an error.
        let cms = CmsClient::new("http://127.0.0.1:1").unwrap();
        let cache = RulesCache::new(Duration::from_secs(60));

        let rules = cache.resolve(&cms);
        assert_eq!(rules, RuleSet::empty());
    }
}
