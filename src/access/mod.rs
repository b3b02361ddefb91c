//! Domain access subsystem.
//!
//! - evaluator.rs: "is the active domain in this set" (conditions, filters)
//! - policy.rs: bypass paths and inactive-domain access for the gateway

pub mod evaluator;
pub mod policy;

pub use evaluator::{evaluate, DomainCondition};
pub use policy::AccessPolicy;
