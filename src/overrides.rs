//! Per-domain configuration overrides.
//!
//! # Responsibilities
//! - Store override objects keyed by domain, language and config name
//! - Resolve the effective object for the active domain
//!
//! # Design Decisions
//! - Keys follow `domain.config.{domain}.{langcode}.{name}` and
//!   `domain.config.{domain}.{name}` (domain-wide)
//! - Precedence: base < domain-wide < language-specific
//! - Objects merge recursively; any other value replaces

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use crate::config::schema::OverrideConfig;

const PREFIX: &str = "domain.config";

/// Storage key of an override.
///
/// Keys are flat dotted strings, so a language override of `x` and a
/// domain-wide override of a config named `{langcode}.x` share a key.
/// Config names must not start with a language code.
pub fn override_name(domain_id: &str, langcode: Option<&str>, name: &str) -> String {
    match langcode {
        Some(lang) if !lang.is_empty() => format!("{}.{}.{}.{}", PREFIX, domain_id, lang, name),
        _ => format!("{}.{}.{}", PREFIX, domain_id, name),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    entries: Arc<DashMap<String, Value>>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(overrides: &[OverrideConfig]) -> Self {
        let store = Self::new();
        for o in overrides {
            store.set(&o.domain_id, o.langcode.as_deref(), &o.name, o.data.clone());
        }
        store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set(&self, domain_id: &str, langcode: Option<&str>, name: &str, data: Value) {
        self.entries.insert(override_name(domain_id, langcode, name), data);
    }

    pub fn get(&self, domain_id: &str, langcode: Option<&str>, name: &str) -> Option<Value> {
        self.entries
            .get(&override_name(domain_id, langcode, name))
            .map(|r| r.value().clone())
    }

    pub fn remove(&self, domain_id: &str, langcode: Option<&str>, name: &str) -> Option<Value> {
        self.entries
            .remove(&override_name(domain_id, langcode, name))
            .map(|(_, v)| v)
    }

    /// Drop every override of a domain.
    pub fn remove_domain(&self, domain_id: &str) {
        let prefix = format!("{}.{}.", PREFIX, domain_id);
        self.entries.retain(|key, _| !key.starts_with(&prefix));
    }

    /// True when the domain overrides `name` at all.
    pub fn has_override(&self, domain_id: &str, langcode: Option<&str>, name: &str) -> bool {
        self.entries.contains_key(&override_name(domain_id, None, name))
            || (langcode.is_some() && self.entries.contains_key(&override_name(domain_id, langcode, name)))
    }

    /// Effective configuration object for a domain.
    pub fn resolve(&self, domain_id: &str, langcode: Option<&str>, name: &str, base: Value) -> Value {
        let mut value = base;
        if let Some(domain_wide) = self.get(domain_id, None, name) {
            merge(&mut value, domain_wide);
        }
        if langcode.is_some_and(|l| !l.is_empty()) {
            if let Some(localized) = self.get(domain_id, langcode, name) {
                merge(&mut value, localized);
            }
        }
        value
    }
}

/// Recursive object merge; `overlay` wins.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_override_names() {
        assert_eq!(override_name("one_example_com", None, "system.site"), "domain.config.one_example_com.system.site");
        assert_eq!(
            override_name("one_example_com", Some("es"), "system.site"),
            "domain.config.one_example_com.es.system.site"
        );
    }

    #[test]
    fn test_language_key_shares_namespace_with_dotted_names() {
        assert_eq!(override_name("b", Some("es"), "x"), override_name("b", None, "es.x"));

        let overrides = ConfigOverrides::new();
        overrides.set("b", Some("es"), "x", json!({"name": "Uno"}));
        assert_eq!(overrides.get("b", None, "es.x"), Some(json!({"name": "Uno"})));
        assert_eq!(overrides.len(), 1);
    }

    #[test]
    fn test_resolve_precedence() {
        let overrides = ConfigOverrides::new();
        overrides.set("b", None, "system.site", json!({"name": "One", "page": {"front": "/one"}}));
        overrides.set("b", Some("es"), "system.site", json!({"name": "Uno"}));

        let base = json!({"name": "Base", "mail": "a@example.com", "page": {"front": "/node", "403": ""}});
        let resolved = overrides.resolve("b", None, "system.site", base.clone());
        assert_eq!(resolved["name"], "One");
        assert_eq!(resolved["page"]["front"], "/one");
        assert_eq!(resolved["page"]["403"], "");
        assert_eq!(resolved["mail"], "a@example.com");

        let localized = overrides.resolve("b", Some("es"), "system.site", base.clone());
        assert_eq!(localized["name"], "Uno");
        assert_eq!(localized["page"]["front"], "/one");

        // other domains see the base object
        assert_eq!(overrides.resolve("a", Some("es"), "system.site", base.clone()), base);
        assert!(overrides.has_override("b", Some("es"), "system.site"));
        assert!(!overrides.has_override("a", None, "system.site"));
    }

    #[test]
    fn test_remove_domain() {
        let overrides = ConfigOverrides::new();
        overrides.set("b", None, "system.site", json!({"name": "One"}));
        overrides.set("b", Some("es"), "system.site", json!({"name": "Uno"}));
        overrides.set("bb", None, "system.site", json!({"name": "Other"}));
        overrides.remove_domain("b");
        assert_eq!(overrides.len(), 1);
        assert!(overrides.get("bb", None, "system.site").is_some());
    }
}
