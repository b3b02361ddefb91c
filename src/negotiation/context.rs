//! Request-scoped negotiation context.
//!
//! Holds what negotiation needs from the inbound request (read-only) and
//! memoizes the result for the lifetime of that request only.

use crate::domain::Scheme;
use crate::negotiation::negotiator::{NegotiationError, NegotiationResult, Negotiator};

/// Hostname assumed when a request carries no Host header.
pub const FALLBACK_HOST: &str = "localhost";

#[derive(Debug, Clone)]
pub struct RequestContext {
    host: String,
    scheme: Scheme,
    request_uri: String,
    active: Option<Result<NegotiationResult, NegotiationError>>,
}

impl RequestContext {
    /// `request_uri` is the path with its query string, if any.
    pub fn new(host: Option<&str>, scheme: Scheme, request_uri: impl Into<String>) -> Self {
        let host = host
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(FALLBACK_HOST)
            .to_string();
        Self {
            host,
            scheme,
            request_uri: request_uri.into(),
            active: None,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    pub fn path(&self) -> &str {
        self.request_uri
            .split_once('?')
            .map_or(self.request_uri.as_str(), |(path, _)| path)
    }

    /// Active domain for this request.
    ///
    /// Negotiates on first use and reuses the outcome afterwards; `reset`
    /// forces a fresh negotiation.
    pub fn active_domain(
        &mut self,
        negotiator: &Negotiator,
        reset: bool,
    ) -> Result<&NegotiationResult, NegotiationError> {
        if reset {
            self.active = None;
        }
        let host = &self.host;
        match self.active.get_or_insert_with(|| negotiator.negotiate(host)) {
            Ok(result) => Ok(result),
            Err(e) => Err(e.clone()),
        }
    }

    /// Id of the active domain, if negotiation has run and succeeded.
    pub fn active_id(&self) -> Option<&str> {
        match self.active {
            Some(Ok(ref result)) => Some(result.domain.id.as_str()),
            _ => None,
        }
    }
}
