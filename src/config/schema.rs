//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::alias::AliasValues;
use crate::domain::DomainValues;

/// Root configuration for the domain gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Negotiation and redirect settings.
    pub negotiation: NegotiationConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,

    /// Registered domain records.
    pub domains: Vec<DomainValues>,

    /// Alias records.
    pub aliases: Vec<AliasValues>,

    /// Per-domain configuration overrides.
    pub overrides: Vec<OverrideConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// What to do with a request when no domain (not even a default) exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Answer 503.
    #[default]
    Reject,
    /// Pass the request through without domain context.
    ServeUnscoped,
}

/// Negotiation and redirect settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NegotiationConfig {
    /// Ignore a leading `www.` on incoming hosts.
    pub strip_www_prefix: bool,

    /// Paths (without surrounding slashes) exempt from the domain access check.
    pub bypass_paths: BTreeSet<String>,

    /// Status used when a configured redirect code is not a 3xx redirect.
    pub default_redirect_status: u16,

    /// Alias environment consulted during negotiation.
    pub alias_environment: String,

    pub unmatched_policy: UnmatchedPolicy,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            strip_www_prefix: false,
            bypass_paths: ["user/login", "user/logout", "user/password"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_redirect_status: 302,
            alias_environment: crate::alias::DEFAULT_ENVIRONMENT.to_string(),
            unmatched_policy: UnmatchedPolicy::default(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token). Also grants access to
    /// disabled domains on the public listener.
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// One configuration override for a domain.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverrideConfig {
    pub domain_id: String,

    /// Language code; domain-wide when absent.
    #[serde(default)]
    pub langcode: Option<String>,

    /// Configuration object name, e.g. `system.site`.
    pub name: String,

    /// Override data merged over the base object.
    pub data: serde_json::Value,
}
