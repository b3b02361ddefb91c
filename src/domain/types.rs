//! Domain record types and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// URL scheme used when building absolute URLs for a domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// Parses a scheme, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered site bound to one canonical hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Stable machine identifier.
    pub id: String,
    /// Canonical host (no scheme, no trailing slash).
    pub hostname: String,
    /// Human-readable label, used as the secondary sort key.
    pub name: String,
    pub scheme: Scheme,
    /// Sort priority (lower sorts first).
    pub weight: i32,
    pub is_default: bool,
    /// Enabled flag. Disabled records still match.
    pub status: bool,
    /// Forced redirect status code, if any.
    pub redirect: Option<u16>,
}

impl DomainRecord {
    /// The canonical hostname of this record.
    pub fn canonical(&self) -> &str {
        &self.hostname
    }

    /// Base URL of the domain, e.g. `https://example.com/`.
    pub fn path(&self) -> String {
        format!("{}://{}/", self.scheme, self.hostname)
    }

    /// Absolute URL for a request path on this domain.
    pub fn url(&self, request_path: &str) -> String {
        format!(
            "{}://{}/{}",
            self.scheme,
            self.hostname,
            request_path.trim_start_matches('/')
        )
    }
}

/// Values accepted when registering a new domain record.
///
/// Everything except `hostname` is optional and filled in by the store.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DomainValues {
    pub id: Option<String>,
    pub hostname: String,
    pub name: Option<String>,
    pub scheme: Option<Scheme>,
    pub weight: Option<i32>,
    pub is_default: Option<bool>,
    pub status: Option<bool>,
    pub redirect: Option<u16>,
}

impl DomainValues {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = Some(is_default);
        self
    }

    pub fn with_status(mut self, status: bool) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_redirect(mut self, redirect: u16) -> Self {
        self.redirect = Some(redirect);
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }
}

/// Partial update of an existing record. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DomainPatch {
    pub hostname: Option<String>,
    pub name: Option<String>,
    pub scheme: Option<Scheme>,
    pub weight: Option<i32>,
    pub is_default: Option<bool>,
    pub status: Option<bool>,
    /// `Some(0)` clears the redirect.
    pub redirect: Option<u16>,
}

/// Domain store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("hostname {0} is already registered")]
    DuplicateHostname(String),

    #[error("domain id {0} is already in use")]
    DuplicateId(String),

    #[error("invalid hostname: {0:?}")]
    InvalidHostname(String),

    #[error("domain {0} not found")]
    NotFound(String),

    #[error("domain {0} is the default; promote another domain first")]
    DefaultRequired(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
