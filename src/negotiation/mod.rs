//! Domain negotiation subsystem.
//!
//! # Data Flow
//! ```text
//! Host header
//!     → context.rs (request-scoped, memoized)
//!     → negotiator.rs
//!         → DomainStore exact lookup
//!         → resolver chain (AliasResolver, ...)
//!         → default domain fallback
//!     → NegotiationResult { domain, match_type }
//! ```

pub mod context;
pub mod negotiator;

pub use context::RequestContext;
pub use negotiator::{
    DomainResolver, MatchType, NegotiationError, NegotiationResult, Negotiator, TransientDomain,
};
