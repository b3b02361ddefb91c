//! Domain record subsystem.
//!
//! # Data Flow
//! ```text
//! Raw Host header
//!     → hostname.rs (strip www., comparison keys)
//!     → store.rs (exact lookup by hostname, default lookup)
//!     → DomainRecord (immutable snapshot entry)
//!
//! Administrative writes:
//!     DomainValues / DomainPatch
//!     → store.rs single writer path (duplicate + default checks)
//!     → atomic swap of the record snapshot
//! ```
//!
//! # Design Decisions
//! - Reads never lock: lookups run against an `ArcSwap` snapshot
//! - Exactly one default record once any record exists
//! - Hostname comparison is case-insensitive and ignores the port

pub mod hostname;
pub mod store;
pub mod types;

pub use hostname::{host_key, normalize};
pub use store::{sort, DomainStore};
pub use types::{DomainError, DomainPatch, DomainRecord, DomainResult, DomainValues, Scheme};
