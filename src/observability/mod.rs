//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! negotiation / redirect / admin
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and histograms, Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID is attached to every request span by the HTTP layer
//! - Metrics are cheap (atomic increments); recording without an installed
//!   recorder is a no-op

pub mod logging;
pub mod metrics;
