// cms/roster.rs
//
// The "our team" roster lives in the CMS. Each member carries a display
// name, an MLS agent id, and optionally a second id used for sold-listing
// attribution plus an office name. The roster reduces to a TeamScope of
// three membership sets; the membership tests are disjunctive because the
// feeds attribute the same person inconsistently.

use serde::Deserialize;

use crate::cms::client::{CmsClient, CmsError};
use crate::domain::filter::TeamScope;

const ROSTER_PATH: &str = "/api/team-roster";

#[derive(Debug, Deserialize)]
pub struct TeamMember {
    pub name: Option<String>,
    pub agent_id: Option<String>,
    pub sold_agent_id: Option<String>,
    pub office: Option<String>,
}

pub fn fetch_roster(cms: &CmsClient) -> Result<Vec<TeamMember>, CmsError> {
    cms.get_json(ROSTER_PATH)
}

pub fn scope_from_roster(members: &[TeamMember]) -> TeamScope {
    let mut scope = TeamScope::default();
    for m in members {
        for id in [m.agent_id.as_deref(), m.sold_agent_id.as_deref()]
            .into_iter()
            .flatten()
        {
            let id = id.trim();
            if !id.is_empty() {
                scope.agent_ids.insert(id.to_string());
            }
        }
        if let Some(name) = m.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            scope.agent_names.insert(name.to_string());
        }
        if let Some(office) = m.office.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            scope.office_names.insert(office.to_string());
        }
    }
    scope
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, id: &str, sold: Option<&str>, office: Option<&str>) -> TeamMember {
        TeamMember {
            name: Some(name.to_string()),
            agent_id: Some(id.to_string()),
            sold_agent_id: sold.map(String::from),
            office: office.map(String::from),
        }
    }

    #[test]
    fn roster_reduces_to_three_membership_sets() {
        let members = vec![
            member("Jane Smith", "A100", Some("A100S"), Some("Summit Realty")),
            member("Bob Jones", "B200", None, Some("Summit Realty")),
        ];
        let scope = scope_from_roster(&members);

        assert!(scope.agent_ids.contains("A100"));
        assert!(scope.agent_ids.contains("A100S"));
        assert!(scope.agent_ids.contains("B200"));
        assert!(scope.agent_names.contains("Jane Smith"));
        assert_eq!(scope.office_names.len(), 1);
    }

    #[test]
    fn empty_roster_yields_empty_scope() {
        let scope = scope_from_roster(&[]);
        assert!(scope.is_empty());
    }

    #[test]
    fn sold_attribution_id_joins_the_agent_id_set() {
        let members = vec![member("Jane", "A100", Some("A100S"), None)];
        let scope = scope_from_roster(&members);
        assert_eq!(scope.agent_ids.len(), 2);
    }
}
