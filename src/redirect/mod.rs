//! Redirect decision subsystem.
//!
//! # Data Flow
//! ```text
//! NegotiationResult.domain + request path + access result
//!     → engine.rs (configured redirect → access redirect → pass)
//!     → trusted-host check (target must negotiate to a registered domain)
//!     → RedirectDecision { PassThrough | Redirect | Rejected }
//! ```

pub mod engine;

pub use engine::{
    RedirectDecision, RedirectEngine, RejectReason, ACCESS_REDIRECT_STATUS, REJECTED_STATUS,
};
