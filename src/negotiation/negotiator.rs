//! Host negotiation.
//!
//! # Responsibilities
//! - Normalize the raw Host header
//! - Resolve it to a domain record: exact → resolver chain → default
//! - Answer "is this hostname registered?" for redirect target checks
//!
//! # States
//! ```text
//! UNRESOLVED ─ exact hit ─────────▶ EXACT_MATCHED ─┐
//!            ─ resolver sets id ──▶ ALIAS_MATCHED ─┼─▶ ACTIVE
//!            ─ default exists ────▶ NONE_MATCHED ──┘
//!            ─ nothing ───────────▶ NoDomainConfigured
//! ```
//!
//! # Design Decisions
//! - Resolvers are plain trait objects run in registration order; the first
//!   one that claims the host wins
//! - A default fallback keeps `MatchType::None` so callers can tell it apart
//! - No caching here; memoization is per request (see `context.rs`)

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::alias::types::{AliasRecord, DEFAULT_ENVIRONMENT};
use crate::domain::hostname::normalize;
use crate::domain::{DomainRecord, DomainStore};

/// How the active domain was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Alias,
    /// No match; the default domain (if any) is active.
    None,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Alias => "alias",
            MatchType::None => "none",
        }
    }
}

/// Unsaved domain handed to resolvers when no exact record matched.
///
/// A resolver claims the host by setting `id`; it may also force a
/// redirect or replace the hostname used for generated URLs.
#[derive(Debug, Clone, Default)]
pub struct TransientDomain {
    /// Normalized request hostname.
    pub hostname: String,
    pub id: Option<String>,
    pub redirect: Option<u16>,
    pub active_hostname: Option<String>,
    pub alias: Option<AliasRecord>,
}

impl TransientDomain {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Default::default()
        }
    }
}

/// Alternate lookup plugged into negotiation (e.g. aliases).
pub trait DomainResolver: Send + Sync + std::fmt::Debug {
    /// Try to claim the transient domain. Returns true if an id was set.
    fn try_resolve(&self, domain: &mut TransientDomain) -> bool;
}

/// Outcome of negotiating one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NegotiationResult {
    /// Active domain, with any resolver adjustments applied.
    pub domain: DomainRecord,
    pub match_type: MatchType,
    /// Host header exactly as received.
    pub requested_host: String,
    /// Host after normalization.
    pub hostname: String,
    /// Alias that produced an alias match.
    pub alias: Option<AliasRecord>,
}

impl NegotiationResult {
    /// True when the default domain is active only because nothing matched.
    pub fn is_fallback(&self) -> bool {
        self.match_type == MatchType::None
    }

    /// Alias environment of the match, `default` otherwise.
    pub fn environment(&self) -> &str {
        self.alias
            .as_ref()
            .map(|a| a.environment.as_str())
            .unwrap_or(DEFAULT_ENVIRONMENT)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("no domain matches {host} and no default domain is configured")]
    NoDomainConfigured { host: String },
}

/// Resolves request hosts to domain records.
#[derive(Debug)]
pub struct Negotiator {
    domains: Arc<DomainStore>,
    resolvers: Vec<Arc<dyn DomainResolver>>,
    strip_www_prefix: bool,
}

impl Negotiator {
    pub fn new(domains: Arc<DomainStore>, strip_www_prefix: bool) -> Self {
        Self {
            domains,
            resolvers: Vec::new(),
            strip_www_prefix,
        }
    }

    /// Append a resolver; resolvers run in registration order.
    pub fn register_resolver(&mut self, resolver: Arc<dyn DomainResolver>) {
        self.resolvers.push(resolver);
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn DomainResolver>) -> Self {
        self.register_resolver(resolver);
        self
    }

    pub fn strip_www_prefix(&self) -> bool {
        self.strip_www_prefix
    }

    /// Normalize a hostname with this negotiator's www. setting.
    pub fn prepare_hostname(&self, hostname: &str) -> String {
        normalize(hostname, self.strip_www_prefix)
    }

    /// Resolve the active domain for a raw Host header value.
    pub fn negotiate(&self, raw_host: &str) -> Result<NegotiationResult, NegotiationError> {
        let hostname = self.prepare_hostname(raw_host);

        if let Some(domain) = self.domains.find_by_hostname(&hostname) {
            tracing::debug!(host = %hostname, domain_id = %domain.id, "Exact domain match");
            return Ok(NegotiationResult {
                domain,
                match_type: MatchType::Exact,
                requested_host: raw_host.to_string(),
                hostname,
                alias: None,
            });
        }

        if let Some((domain, transient)) = self.resolve_transient(&hostname) {
            tracing::debug!(host = %hostname, domain_id = %domain.id, "Resolver domain match");
            return Ok(NegotiationResult {
                domain,
                match_type: MatchType::Alias,
                requested_host: raw_host.to_string(),
                hostname,
                alias: transient.alias,
            });
        }

        match self.domains.find_default() {
            Some(domain) => {
                tracing::debug!(host = %hostname, domain_id = %domain.id, "No match, using default domain");
                Ok(NegotiationResult {
                    domain,
                    match_type: MatchType::None,
                    requested_host: raw_host.to_string(),
                    hostname,
                    alias: None,
                })
            }
            None => Err(NegotiationError::NoDomainConfigured { host: hostname }),
        }
    }

    /// True if the hostname maps to a record directly or through a resolver.
    pub fn is_registered_domain(&self, hostname: &str) -> bool {
        let hostname = self.prepare_hostname(hostname);
        if hostname.is_empty() {
            return false;
        }
        self.domains.find_by_hostname(&hostname).is_some()
            || self.resolve_transient(&hostname).is_some()
    }

    /// Run the resolver chain and load the claimed record.
    fn resolve_transient(&self, hostname: &str) -> Option<(DomainRecord, TransientDomain)> {
        let mut transient = TransientDomain::new(hostname);
        let claimed = self
            .resolvers
            .iter()
            .any(|resolver| resolver.try_resolve(&mut transient));
        if !claimed {
            return None;
        }

        let id = transient.id.as_deref()?;
        let Some(mut domain) = self.domains.get(id) else {
            tracing::warn!(host = %hostname, domain_id = %id, "Resolver claimed unknown domain");
            return None;
        };
        if let Some(redirect) = transient.redirect {
            domain.redirect = Some(redirect);
        }
        if let Some(ref active) = transient.active_hostname {
            domain.hostname = active.clone();
        }
        Some((domain, transient))
    }
}
