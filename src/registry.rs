//! Domain and alias registry.
//!
//! # Responsibilities
//! - Own the domain and alias stores as one unit
//! - Keep them consistent (alias targets exist, cascade on domain delete)
//! - Build the stores and the negotiator from configuration

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::alias::{
    AliasError, AliasFilter, AliasPatch, AliasRecord, AliasResolver, AliasResult, AliasStore,
    AliasValues,
};
use crate::config::schema::{GatewayConfig, NegotiationConfig};
use crate::domain::{
    DomainError, DomainPatch, DomainRecord, DomainResult, DomainStore, DomainValues, Scheme,
};
use crate::negotiation::Negotiator;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Alias(#[from] AliasError),
}

/// Writes that touch both stores hold `links`, so an alias is never
/// attached to a domain that is being deleted.
#[derive(Debug, Default)]
pub struct Registry {
    domains: Arc<DomainStore>,
    aliases: Arc<AliasStore>,
    links: Mutex<()>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate a registry from the `[[domains]]` and `[[aliases]]` tables.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RegistryError> {
        let registry = Self::new();
        for values in &config.domains {
            registry.create_domain(values.clone(), None)?;
        }
        for values in &config.aliases {
            registry.create_alias(values.clone())?;
        }
        tracing::info!(
            domains = registry.domains.count(),
            aliases = registry.aliases.count(),
            "Registry loaded"
        );
        Ok(registry)
    }

    pub fn domains(&self) -> &Arc<DomainStore> {
        &self.domains
    }

    pub fn aliases(&self) -> &Arc<AliasStore> {
        &self.aliases
    }

    /// Negotiator over this registry with the alias resolver installed.
    pub fn negotiator(&self, config: &NegotiationConfig) -> Negotiator {
        Negotiator::new(self.domains.clone(), config.strip_www_prefix).with_resolver(Arc::new(
            AliasResolver::new(
                self.aliases.clone(),
                self.domains.clone(),
                config.alias_environment.clone(),
            ),
        ))
    }

    pub fn create_domain(
        &self,
        values: DomainValues,
        ambient_scheme: Option<Scheme>,
    ) -> DomainResult<DomainRecord> {
        self.domains.create(values, ambient_scheme)
    }

    pub fn update_domain(&self, id: &str, patch: DomainPatch) -> DomainResult<DomainRecord> {
        self.domains.update(id, patch)
    }

    pub fn set_default(&self, id: &str) -> DomainResult<DomainRecord> {
        self.domains.set_default(id)
    }

    /// Delete a domain together with every alias pointing at it.
    pub fn delete_domain(&self, id: &str) -> DomainResult<(DomainRecord, Vec<AliasRecord>)> {
        let _links = self.lock_links();
        let domain = self.domains.delete(id)?;
        let aliases = self.aliases.delete_bulk(id, &AliasFilter::default());
        if !aliases.is_empty() {
            tracing::info!(domain_id = %id, aliases = aliases.len(), "Deleted aliases of removed domain");
        }
        Ok((domain, aliases))
    }

    pub fn create_alias(&self, values: AliasValues) -> AliasResult<AliasRecord> {
        let _links = self.lock_links();
        self.ensure_domain(&values.domain_id)?;
        self.aliases.create(values)
    }

    pub fn update_alias(&self, id: &str, patch: AliasPatch) -> AliasResult<AliasRecord> {
        let _links = self.lock_links();
        if let Some(ref domain_id) = patch.domain_id {
            self.ensure_domain(domain_id)?;
        }
        self.aliases.update(id, patch)
    }

    pub fn delete_alias(&self, id: &str) -> AliasResult<AliasRecord> {
        self.aliases.delete(id)
    }

    pub fn delete_aliases_bulk(
        &self,
        domain_id: &str,
        filter: &AliasFilter,
    ) -> AliasResult<Vec<AliasRecord>> {
        self.ensure_domain(domain_id)?;
        Ok(self.aliases.delete_bulk(domain_id, filter))
    }

    fn lock_links(&self) -> MutexGuard<'_, ()> {
        self.links.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_domain(&self, domain_id: &str) -> AliasResult<()> {
        match self.domains.get(domain_id) {
            Some(_) => Ok(()),
            None => Err(AliasError::UnknownDomain(domain_id.to_string())),
        }
    }
}
