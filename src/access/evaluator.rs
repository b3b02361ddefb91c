//! Domain membership evaluation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::DomainStore;

/// Is the active domain among the allowed ones?
///
/// An empty, non-negated set allows everything. Without an active domain
/// nothing is a member, so only a negated check passes.
pub fn evaluate<S: AsRef<str>>(
    allowed_domain_ids: &[S],
    is_negated: bool,
    active_domain_id: Option<&str>,
) -> bool {
    if allowed_domain_ids.is_empty() && !is_negated {
        return true;
    }
    let member = active_domain_id
        .map(|active| allowed_domain_ids.iter().any(|id| id.as_ref() == active))
        .unwrap_or(false);
    member != is_negated
}

/// Reusable "active domain is / is not one of" condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainCondition {
    pub domains: BTreeSet<String>,
    pub negate: bool,
}

impl DomainCondition {
    pub fn new<I, S>(domains: I, negate: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            negate,
        }
    }

    pub fn evaluate(&self, active_domain_id: Option<&str>) -> bool {
        let ids: Vec<&str> = self.domains.iter().map(String::as_str).collect();
        evaluate(&ids, self.negate, active_domain_id)
    }

    /// Human-readable summary using domain labels in sort order.
    pub fn summary(&self, store: &DomainStore) -> String {
        let labels: Vec<String> = store
            .load_options_list()
            .into_iter()
            .filter(|(id, _)| self.domains.contains(id))
            .map(|(_, label)| label)
            .collect();
        let list = labels.join(", ");
        if self.negate {
            format!("Active domain is not {}", list)
        } else {
            format!("Active domain is {}", list)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainValues;

    #[test]
    fn test_empty_set() {
        let none: [&str; 0] = [];
        assert!(evaluate(&none, false, Some("a")));
        assert!(evaluate(&none, false, None));
        assert!(evaluate(&none, true, Some("a")));
    }

    #[test]
    fn test_membership_and_negation() {
        let allowed = ["a", "b"];
        assert!(evaluate(&allowed, false, Some("a")));
        assert!(!evaluate(&allowed, false, Some("c")));
        assert!(!evaluate(&allowed, true, Some("a")));
        assert!(evaluate(&allowed, true, Some("c")));
        assert!(!evaluate(&allowed, false, None));
        assert!(evaluate(&allowed, true, None));
    }

    #[test]
    fn test_condition_summary() {
        let store = DomainStore::new();
        store.create(DomainValues::new("example.com").with_id("a").with_name("Example"), None).unwrap();
        store.create(DomainValues::new("one.example.com").with_id("b").with_name("One"), None).unwrap();

        let condition = DomainCondition::new(["b", "a"], false);
        assert!(condition.evaluate(Some("b")));
        assert_eq!(condition.summary(&store), "Active domain is Example, One");

        let negated = DomainCondition::new(["b"], true);
        assert!(!negated.evaluate(Some("b")));
        assert_eq!(negated.summary(&store), "Active domain is not One");
    }
}
