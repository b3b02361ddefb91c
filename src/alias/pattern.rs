//! Alias pattern matching.
//!
//! # Responsibilities
//! - Parse exact and single-wildcard patterns
//! - Match a hostname against a pattern
//!
//! # Design Decisions
//! - Case-insensitive, port-insensitive (comparison keys on both sides)
//! - No regex: prefix/suffix checks only
//! - `*` matches at least one character

use crate::alias::types::{AliasError, AliasResult};
use crate::domain::hostname::host_key;

/// A compiled alias pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasPattern {
    /// Full-string match.
    Exact(String),
    /// `prefix*suffix`.
    Wildcard { prefix: String, suffix: String },
}

impl AliasPattern {
    /// Compile a pattern. More than one `*` is rejected.
    pub fn parse(pattern: &str) -> AliasResult<Self> {
        let key = host_key(pattern);
        if key.is_empty() || key.contains('/') || key.contains(char::is_whitespace) {
            return Err(AliasError::InvalidPattern(pattern.to_string()));
        }
        match key.matches('*').count() {
            0 => Ok(AliasPattern::Exact(key)),
            1 => {
                let (prefix, suffix) = key
                    .split_once('*')
                    .ok_or_else(|| AliasError::InvalidPattern(pattern.to_string()))?;
                Ok(AliasPattern::Wildcard {
                    prefix: prefix.to_string(),
                    suffix: suffix.to_string(),
                })
            }
            _ => Err(AliasError::InvalidPattern(pattern.to_string())),
        }
    }

    /// Returns true if the hostname matches this pattern.
    pub fn matches(&self, hostname: &str) -> bool {
        let host = host_key(hostname);
        match self {
            AliasPattern::Exact(exact) => host == *exact,
            AliasPattern::Wildcard { prefix, suffix } => {
                host.len() > prefix.len() + suffix.len()
                    && host.starts_with(prefix.as_str())
                    && host.ends_with(suffix.as_str())
            }
        }
    }

    /// Comparison key used to detect colliding patterns.
    pub fn key(&self) -> String {
        match self {
            AliasPattern::Exact(exact) => exact.clone(),
            AliasPattern::Wildcard { prefix, suffix } => format!("{}*{}", prefix, suffix),
        }
    }
}

/// Convenience: does `hostname` match `pattern`? Invalid patterns never match.
pub fn pattern_matches(pattern: &str, hostname: &str) -> bool {
    AliasPattern::parse(pattern)
        .map(|p| p.matches(hostname))
        .unwrap_or(false)
}
