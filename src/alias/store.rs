//! Alias record store.
//!
//! # Responsibilities
//! - Hold alias records in creation order
//! - Environment-scoped hostname matching (first created wins)
//! - Property queries used by the admin API (list, bulk delete)
//!
//! # Design Decisions
//! - Same snapshot/writer model as the domain store
//! - Pattern overlap is not rejected; only identical patterns collide
//! - Target domain existence is checked by the registry, not here

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::alias::pattern::AliasPattern;
use crate::alias::types::{
    AliasError, AliasFilter, AliasPatch, AliasRecord, AliasResult, AliasValues,
    DEFAULT_ENVIRONMENT,
};
use crate::domain::hostname::machine_name;
use crate::domain::DomainRecord;

#[derive(Debug, Clone)]
struct Entry {
    record: AliasRecord,
    pattern: AliasPattern,
}

#[derive(Debug, Default)]
pub struct AliasStore {
    entries: ArcSwap<Vec<Entry>>,
    writer: Mutex<()>,
}

impl AliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.entries.load().len()
    }

    /// All aliases in creation order.
    pub fn all(&self) -> Vec<AliasRecord> {
        self.entries.load().iter().map(|e| e.record.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<AliasRecord> {
        self.entries
            .load()
            .iter()
            .find(|e| e.record.id == id)
            .map(|e| e.record.clone())
    }

    /// Find an alias by its literal pattern (case-insensitive), in any environment.
    pub fn find_by_pattern(&self, pattern: &str) -> Option<AliasRecord> {
        let key = AliasPattern::parse(pattern).ok()?.key();
        self.entries
            .load()
            .iter()
            .find(|e| e.pattern.key() == key)
            .map(|e| e.record.clone())
    }

    pub fn load_by_environment(&self, environment: &str) -> Vec<AliasRecord> {
        self.load_by_filter(&AliasFilter {
            environment: Some(environment.to_string()),
            ..Default::default()
        })
    }

    /// Aliases that point at `domain` within `environment`.
    pub fn load_by_environment_match(
        &self,
        domain: &DomainRecord,
        environment: &str,
    ) -> Vec<AliasRecord> {
        self.load_by_filter(&AliasFilter {
            domain_id: Some(domain.id.clone()),
            environment: Some(environment.to_string()),
            ..Default::default()
        })
    }

    pub fn load_by_filter(&self, filter: &AliasFilter) -> Vec<AliasRecord> {
        self.entries
            .load()
            .iter()
            .filter(|e| filter.matches(&e.record))
            .map(|e| e.record.clone())
            .collect()
    }

    /// First alias in `environment` whose pattern matches `hostname`.
    pub fn match_hostname(&self, hostname: &str, environment: &str) -> Option<AliasRecord> {
        self.entries
            .load()
            .iter()
            .find(|e| e.record.environment == environment && e.pattern.matches(hostname))
            .map(|e| e.record.clone())
    }

    /// Every alias in `environment` matching `hostname`, in creation order.
    pub fn matches(&self, hostname: &str, environment: &str) -> Vec<AliasRecord> {
        self.entries
            .load()
            .iter()
            .filter(|e| e.record.environment == environment && e.pattern.matches(hostname))
            .map(|e| e.record.clone())
            .collect()
    }

    /// Hostname a domain answers to in `environment`, via its first exact alias.
    pub fn environment_hostname(&self, domain: &DomainRecord, environment: &str) -> Option<String> {
        self.load_by_environment_match(domain, environment)
            .into_iter()
            .find(|a| !a.is_wildcard())
            .map(|a| a.pattern)
    }

    pub fn create(&self, values: AliasValues) -> AliasResult<AliasRecord> {
        let pattern = AliasPattern::parse(&values.pattern)?;
        let environment = values
            .environment
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        self.write(|entries| {
            ensure_unique_pattern(entries, None, &pattern, &values.pattern, &environment)?;

            let id = match values.id {
                Some(ref id) if !id.trim().is_empty() => id.trim().to_string(),
                _ => unique_id(entries, machine_name(&values.pattern)),
            };
            if entries.iter().any(|e| e.record.id == id) {
                return Err(AliasError::DuplicateId(id));
            }

            let record = AliasRecord {
                id,
                domain_id: values.domain_id.clone(),
                pattern: values.pattern.trim().to_string(),
                environment: environment.clone(),
                redirect: values.redirect.filter(|code| *code > 0),
            };
            entries.push(Entry {
                record: record.clone(),
                pattern: pattern.clone(),
            });
            tracing::debug!(
                alias_id = %record.id,
                pattern = %record.pattern,
                domain_id = %record.domain_id,
                environment = %record.environment,
                "Alias created"
            );
            Ok(record)
        })
    }

    pub fn update(&self, id: &str, patch: AliasPatch) -> AliasResult<AliasRecord> {
        let new_pattern = match patch.pattern {
            Some(ref p) => Some((p.trim().to_string(), AliasPattern::parse(p)?)),
            None => None,
        };

        self.write(|entries| {
            let index = entries
                .iter()
                .position(|e| e.record.id == id)
                .ok_or_else(|| AliasError::NotFound(id.to_string()))?;

            let environment = patch
                .environment
                .clone()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| entries[index].record.environment.clone());
            let (raw, pattern) = match new_pattern {
                Some(ref np) => (np.0.clone(), np.1.clone()),
                None => (
                    entries[index].record.pattern.clone(),
                    entries[index].pattern.clone(),
                ),
            };
            ensure_unique_pattern(entries, Some(index), &pattern, &raw, &environment)?;

            let entry = &mut entries[index];
            entry.record.pattern = raw;
            entry.pattern = pattern;
            entry.record.environment = environment;
            if let Some(ref domain_id) = patch.domain_id {
                entry.record.domain_id = domain_id.clone();
            }
            if let Some(redirect) = patch.redirect {
                entry.record.redirect = (redirect > 0).then_some(redirect);
            }
            Ok(entry.record.clone())
        })
    }

    pub fn delete(&self, id: &str) -> AliasResult<AliasRecord> {
        self.write(|entries| {
            let index = entries
                .iter()
                .position(|e| e.record.id == id)
                .ok_or_else(|| AliasError::NotFound(id.to_string()))?;
            Ok(entries.remove(index).record)
        })
    }

    /// Delete every alias of `domain_id` that also matches `filter`.
    pub fn delete_bulk(&self, domain_id: &str, filter: &AliasFilter) -> Vec<AliasRecord> {
        let filter = AliasFilter {
            domain_id: Some(domain_id.to_string()),
            ..filter.clone()
        };
        let result: AliasResult<Vec<AliasRecord>> = self.write(|entries| {
            let (removed, kept): (Vec<Entry>, Vec<Entry>) =
                entries.drain(..).partition(|e| filter.matches(&e.record));
            *entries = kept;
            Ok(removed.into_iter().map(|e| e.record).collect())
        });
        result.unwrap_or_default()
    }

    fn write<T>(&self, f: impl FnOnce(&mut Vec<Entry>) -> AliasResult<T>) -> AliasResult<T> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries: Vec<Entry> = self.entries.load().as_ref().clone();
        let out = f(&mut entries)?;
        self.entries.store(Arc::new(entries));
        Ok(out)
    }
}

fn ensure_unique_pattern(
    entries: &[Entry],
    skip: Option<usize>,
    pattern: &AliasPattern,
    raw: &str,
    environment: &str,
) -> AliasResult<()> {
    let key = pattern.key();
    let collides = entries.iter().enumerate().any(|(i, e)| {
        Some(i) != skip && e.record.environment == environment && e.pattern.key() == key
    });
    if collides {
        return Err(AliasError::DuplicatePattern {
            pattern: raw.trim().to_string(),
            environment: environment.to_string(),
        });
    }
    Ok(())
}

/// Same pattern in another environment yields the same machine name; suffix it.
fn unique_id(entries: &[Entry], base: String) -> String {
    if !entries.iter().any(|e| e.record.id == base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !entries.iter().any(|e| e.record.id == *candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainStore, DomainValues};

    fn domains() -> DomainStore {
        let store = DomainStore::new();
        for host in ["example.com", "one.example.com", "two.example.com"] {
            store.create(DomainValues::new(host), None).unwrap();
        }
        store
    }

    #[test]
    fn test_environment_loaders() {
        let domains = domains();
        let aliases = AliasStore::new();
        let patterns = ["*.example.com", "four.example.com", "five.example.com"];
        for (domain, pattern) in domains.list_sorted().iter().zip(patterns) {
            aliases
                .create(AliasValues::new(&domain.id, pattern).with_environment("local"))
                .unwrap();
        }
        assert_eq!(aliases.load_by_environment("local").len(), 3);

        let two = domains.get("two_example_com").unwrap();
        let matches = aliases.load_by_environment_match(&two, "local");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].pattern, "five.example.com");

        aliases
            .update(
                &matches[0].id,
                AliasPatch {
                    environment: Some("testing".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(aliases.load_by_environment("local").len(), 2);
        assert!(aliases.load_by_environment_match(&two, "local").is_empty());

        let one = domains.get("one_example_com").unwrap();
        let matches = aliases.load_by_environment_match(&one, "local");
        assert_eq!(matches[0].pattern, "four.example.com");
        assert_eq!(
            aliases.environment_hostname(&one, "local").as_deref(),
            Some("four.example.com")
        );
    }

    #[test]
    fn test_match_restricted_to_environment() {
        let aliases = AliasStore::new();
        aliases
            .create(AliasValues::new("b", "*.example.com").with_environment("local"))
            .unwrap();
        assert!(aliases.match_hostname("sub.example.com", "default").is_none());
        assert_eq!(
            aliases.match_hostname("sub.example.com", "local").unwrap().domain_id,
            "b"
        );
    }

    #[test]
    fn test_first_created_wins() {
        let aliases = AliasStore::new();
        aliases.create(AliasValues::new("b", "*.example.com")).unwrap();
        aliases.create(AliasValues::new("c", "sub.example.*")).unwrap();
        let found = aliases.match_hostname("sub.example.com", "default").unwrap();
        assert_eq!(found.domain_id, "b");
        assert_eq!(aliases.matches("sub.example.com", "default").len(), 2);
    }

    #[test]
    fn test_duplicate_pattern_per_environment() {
        let aliases = AliasStore::new();
        aliases.create(AliasValues::new("b", "alias.example.com")).unwrap();
        let err = aliases
            .create(AliasValues::new("c", "ALIAS.example.com"))
            .unwrap_err();
        assert!(matches!(err, AliasError::DuplicatePattern { .. }));

        // same pattern in another environment is fine and gets a distinct id
        let other = aliases
            .create(AliasValues::new("c", "alias.example.com").with_environment("local"))
            .unwrap();
        assert_eq!(other.id, "alias_example_com_2");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let aliases = AliasStore::new();
        assert!(matches!(
            aliases.create(AliasValues::new("b", "*.*.example.com")),
            Err(AliasError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_delete_bulk() {
        let aliases = AliasStore::new();
        aliases.create(AliasValues::new("b", "a.example.com").with_environment("local")).unwrap();
        aliases.create(AliasValues::new("b", "b.example.com").with_redirect(301)).unwrap();
        aliases.create(AliasValues::new("b", "c.example.com")).unwrap();
        aliases.create(AliasValues::new("c", "d.example.com").with_environment("local")).unwrap();

        let removed = aliases.delete_bulk(
            "b",
            &AliasFilter {
                environment: Some("local".into()),
                ..Default::default()
            },
        );
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].pattern, "a.example.com");

        let removed = aliases.delete_bulk(
            "b",
            &AliasFilter {
                redirect: Some(301),
                ..Default::default()
            },
        );
        assert_eq!(removed.len(), 1);
        assert_eq!(aliases.count(), 2);

        let removed = aliases.delete_bulk("b", &AliasFilter::default());
        assert_eq!(removed.len(), 1);
        assert_eq!(aliases.all()[0].domain_id, "c");
    }

    #[test]
    fn test_update_and_delete() {
        let aliases = AliasStore::new();
        let alias = aliases.create(AliasValues::new("b", "test.example.com")).unwrap();
        assert_eq!(alias.environment, "default");
        let updated = aliases
            .update(
                &alias.id,
                AliasPatch {
                    pattern: Some("test2.example.com".into()),
                    redirect: Some(302),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.pattern, "test2.example.com");
        assert_eq!(updated.redirect, Some(302));
        assert!(aliases.find_by_pattern("TEST2.example.com").is_some());
        assert!(aliases.match_hostname("test.example.com", "default").is_none());

        aliases.delete(&alias.id).unwrap();
        assert_eq!(aliases.delete(&alias.id).unwrap_err(), AliasError::NotFound(alias.id));
    }
}
