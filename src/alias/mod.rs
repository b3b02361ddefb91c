//! Domain alias subsystem.
//!
//! # Data Flow
//! ```text
//! Unmatched hostname (TransientDomain)
//!     → resolver.rs (AliasResolver, one environment)
//!     → store.rs (aliases of that environment, creation order)
//!     → pattern.rs (exact / single `*` match)
//!     → claims the domain id, optional redirect or hostname override
//! ```
//!
//! # Design Decisions
//! - First created alias wins when several patterns match
//! - Non-overlapping patterns are the operator's job, not enforced

pub mod pattern;
pub mod resolver;
pub mod store;
pub mod types;

pub use pattern::AliasPattern;
pub use resolver::AliasResolver;
pub use store::AliasStore;
pub use types::{
    AliasError, AliasFilter, AliasPatch, AliasRecord, AliasResult, AliasValues,
    DEFAULT_ENVIRONMENT,
};
