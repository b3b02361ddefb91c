//! Structured logging.
//!
//! Level comes from `RUST_LOG` when set, otherwise from
//! `observability.log_level` (applied to this crate, externals stay at warn).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Directives handed to `EnvFilter`.
pub fn filter_directives(config: &ObservabilityConfig) -> String {
    match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => directives,
        _ => format!(
            "warn,domain_gateway={level},tower_http={level}",
            level = config.log_level
        ),
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_new(filter_directives(config))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let _ = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_uses_configured_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = ObservabilityConfig {
            log_level: "debug".into(),
            ..Default::default()
        };
        assert_eq!(filter_directives(&config), "warn,domain_gateway=debug,tower_http=debug");
    }
}
