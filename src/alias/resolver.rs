//! Alias resolution plugged into negotiation.

use std::sync::Arc;

use crate::alias::store::AliasStore;
use crate::domain::DomainStore;
use crate::negotiation::{DomainResolver, TransientDomain};

/// Claims unmatched hosts through the alias table of one environment.
#[derive(Debug)]
pub struct AliasResolver {
    aliases: Arc<AliasStore>,
    domains: Arc<DomainStore>,
    environment: String,
}

impl AliasResolver {
    pub fn new(aliases: Arc<AliasStore>, domains: Arc<DomainStore>, environment: impl Into<String>) -> Self {
        Self {
            aliases,
            domains,
            environment: environment.into(),
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }
}

impl DomainResolver for AliasResolver {
    fn try_resolve(&self, domain: &mut TransientDomain) -> bool {
        let matches = self.aliases.matches(&domain.hostname, &self.environment);
        let Some(alias) = matches.first() else {
            return false;
        };
        if matches.len() > 1 {
            tracing::warn!(
                host = %domain.hostname,
                environment = %self.environment,
                chosen = %alias.pattern,
                candidates = matches.len(),
                "Multiple alias patterns match, using the first created"
            );
        }
        if self.domains.get(&alias.domain_id).is_none() {
            return false;
        }

        domain.id = Some(alias.domain_id.clone());
        match alias.redirect {
            // send the visitor to the domain's own hostname
            Some(code) => domain.redirect = Some(code),
            // keep links on the environment's hostname
            None if !alias.is_default_environment() => {
                domain.active_hostname = Some(domain.hostname.clone());
            }
            None => {}
        }
        domain.alias = Some(alias.clone());
        true
    }
}
