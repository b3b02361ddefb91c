//! Alias record types and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment tag used when none is given.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// A pattern mapping additional hostnames onto a domain record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    pub id: String,
    /// Target domain record id.
    pub domain_id: String,
    /// Exact hostname or a pattern with a single `*`.
    pub pattern: String,
    pub environment: String,
    /// Redirect status to the target domain, if any.
    pub redirect: Option<u16>,
}

impl AliasRecord {
    pub fn is_wildcard(&self) -> bool {
        self.pattern.contains('*')
    }

    pub fn is_default_environment(&self) -> bool {
        self.environment == DEFAULT_ENVIRONMENT
    }
}

/// Values accepted when creating an alias.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AliasValues {
    pub id: Option<String>,
    pub domain_id: String,
    pub pattern: String,
    pub environment: Option<String>,
    pub redirect: Option<u16>,
}

impl AliasValues {
    pub fn new(domain_id: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            domain_id: domain_id.into(),
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_redirect(mut self, redirect: u16) -> Self {
        self.redirect = Some(redirect);
        self
    }
}

/// Partial alias update. `redirect: Some(0)` clears the redirect.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AliasPatch {
    pub domain_id: Option<String>,
    pub pattern: Option<String>,
    pub environment: Option<String>,
    pub redirect: Option<u16>,
}

/// Equality filter over alias properties. Unset fields match anything.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AliasFilter {
    pub domain_id: Option<String>,
    pub environment: Option<String>,
    /// `Some(0)` selects aliases without a redirect.
    pub redirect: Option<u16>,
}

impl AliasFilter {
    pub fn matches(&self, alias: &AliasRecord) -> bool {
        self.domain_id.as_ref().map_or(true, |d| *d == alias.domain_id)
            && self.environment.as_ref().map_or(true, |e| *e == alias.environment)
            && self
                .redirect
                .map_or(true, |code| alias.redirect.unwrap_or(0) == code)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AliasError {
    #[error("alias pattern {pattern} already exists in environment {environment}")]
    DuplicatePattern { pattern: String, environment: String },

    #[error("alias id {0} is already in use")]
    DuplicateId(String),

    #[error("invalid alias pattern {0:?}: at most one '*' is allowed")]
    InvalidPattern(String),

    #[error("alias {0} not found")]
    NotFound(String),

    #[error("alias target domain {0} does not exist")]
    UnknownDomain(String),
}

pub type AliasResult<T> = Result<T, AliasError>;
