//! Multi-site domain negotiation and redirect decisions.
//!
//! Maps each request's host to a registered domain record (exact match,
//! alias pattern, or the default domain), decides whether the request must
//! be redirected, and exposes the result through an HTTP gateway and a
//! bearer-protected admin API.

pub mod access;
pub mod admin;
pub mod alias;
pub mod config;
pub mod domain;
pub mod http;
pub mod lifecycle;
pub mod negotiation;
pub mod observability;
pub mod overrides;
pub mod redirect;
pub mod registry;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use negotiation::{MatchType, NegotiationResult, Negotiator};
pub use redirect::{RedirectDecision, RedirectEngine};
pub use registry::Registry;
