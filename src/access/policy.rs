//! Inactive-domain access policy.
//!
//! # Responsibilities
//! - Decide whether a path is subject to the domain access check
//! - Decide whether a caller may use the negotiated domain
//!
//! # Design Decisions
//! - Paths are compared without leading/trailing slashes
//! - Disabled domains are reachable only by privileged callers

use std::collections::BTreeSet;

use crate::domain::DomainRecord;

#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    bypass_paths: BTreeSet<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(bypass_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            bypass_paths: bypass_paths
                .into_iter()
                .map(|p| trim_path(p.as_ref()).to_string())
                .collect(),
        }
    }

    /// True when the access check applies to `path` (i.e. not bypassed).
    pub fn check_path(&self, path: &str) -> bool {
        !self.bypass_paths.contains(trim_path(path))
    }

    /// May the caller use this domain?
    pub fn domain_access(&self, domain: &DomainRecord, privileged: bool) -> bool {
        domain.status || privileged
    }
}

fn trim_path(path: &str) -> &str {
    path.trim().trim_matches('/')
}
