//! HTTP gateway subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, negotiation middleware)
//!     → request.rs (request ID, host/scheme extraction, bearer token)
//!     → redirect decision
//!     → response.rs (3xx/401/503, or pass-through tagged with the domain)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::{X_DOMAIN_ID, X_DOMAIN_MATCH};
pub use server::{AppState, GatewayState, HttpServer};
