//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Referential integrity (aliases and overrides reference existing domains)
//! - Value ranges (timeouts > 0, redirect codes)
//! - Conflicting records (duplicate hostnames, ids, patterns, defaults)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: GatewayConfig → Result<(), Vec<ValidationError>>

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::alias::{AliasPattern, DEFAULT_ENVIRONMENT};
use crate::config::schema::GatewayConfig;
use crate::domain::hostname::{host_key, machine_name};

/// Redirect codes accepted on domain and alias records (0 = none).
pub const ALLOWED_REDIRECTS: [u16; 3] = [0, 301, 302];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: String },

    #[error("{field} must be greater than zero")]
    NotPositive { field: String },

    #[error("{field}: redirect code {code} is not allowed")]
    InvalidRedirect { field: String, code: u16 },

    #[error("duplicate domain hostname {0}")]
    DuplicateHostname(String),

    #[error("duplicate domain id {0}")]
    DuplicateDomainId(String),

    #[error("more than one domain is marked as default")]
    MultipleDefaults,

    #[error("{field} references unknown domain {domain_id}")]
    UnknownDomain { field: String, domain_id: String },

    #[error("invalid alias pattern {0}")]
    InvalidPattern(String),

    #[error("duplicate alias pattern {pattern} in environment {environment}")]
    DuplicatePattern { pattern: String, environment: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "listener.bind_address".into() });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::NotPositive { field: "timeouts.request_secs".into() });
    }
    if !(300..=308).contains(&config.negotiation.default_redirect_status) {
        errors.push(ValidationError::InvalidRedirect {
            field: "negotiation.default_redirect_status".into(),
            code: config.negotiation.default_redirect_status,
        });
    }
    if config.negotiation.alias_environment.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "negotiation.alias_environment".into() });
    }
    if config.admin.enabled {
        if config.admin.api_key.trim().is_empty() {
            errors.push(ValidationError::Empty { field: "admin.api_key".into() });
        }
        if config.admin.bind_address.trim().is_empty() {
            errors.push(ValidationError::Empty { field: "admin.bind_address".into() });
        }
    }

    let mut hostnames = HashSet::new();
    let mut ids = HashSet::new();
    let mut defaults = 0;
    for (i, domain) in config.domains.iter().enumerate() {
        let field = format!("domains[{}]", i);
        if domain.hostname.trim().is_empty() {
            errors.push(ValidationError::Empty { field: format!("{}.hostname", field) });
            continue;
        }
        if !hostnames.insert(host_key(&domain.hostname)) {
            errors.push(ValidationError::DuplicateHostname(domain.hostname.clone()));
        }
        let id = domain
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| machine_name(&domain.hostname));
        if !ids.insert(id.clone()) {
            errors.push(ValidationError::DuplicateDomainId(id));
        }
        if domain.is_default == Some(true) {
            defaults += 1;
        }
        if let Some(code) = domain.redirect {
            if !ALLOWED_REDIRECTS.contains(&code) {
                errors.push(ValidationError::InvalidRedirect { field: format!("{}.redirect", field), code });
            }
        }
    }
    if defaults > 1 {
        errors.push(ValidationError::MultipleDefaults);
    }

    let mut patterns: HashMap<(String, String), usize> = HashMap::new();
    for (i, alias) in config.aliases.iter().enumerate() {
        let field = format!("aliases[{}]", i);
        if !ids.contains(&alias.domain_id) {
            errors.push(ValidationError::UnknownDomain {
                field: format!("{}.domain_id", field),
                domain_id: alias.domain_id.clone(),
            });
        }
        match AliasPattern::parse(&alias.pattern) {
            Ok(pattern) => {
                let environment = alias
                    .environment
                    .clone()
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
                let seen = patterns.entry((environment.clone(), pattern.key())).or_insert(0);
                *seen += 1;
                if *seen == 2 {
                    errors.push(ValidationError::DuplicatePattern {
                        pattern: alias.pattern.clone(),
                        environment,
                    });
                }
            }
            Err(_) => errors.push(ValidationError::InvalidPattern(alias.pattern.clone())),
        }
        if let Some(code) = alias.redirect {
            if !ALLOWED_REDIRECTS.contains(&code) {
                errors.push(ValidationError::InvalidRedirect { field: format!("{}.redirect", field), code });
            }
        }
    }

    for (i, o) in config.overrides.iter().enumerate() {
        if !ids.contains(&o.domain_id) {
            errors.push(ValidationError::UnknownDomain {
                field: format!("overrides[{}].domain_id", i),
                domain_id: o.domain_id.clone(),
            });
        }
        if o.name.trim().is_empty() {
            errors.push(ValidationError::Empty { field: format!("overrides[{}].name", i) });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
