//! Redirect decisions.
//!
//! # Rules (in order)
//! 1. The negotiated domain carries a redirect code → redirect to its URL
//!    with that code, skipping the access check.
//! 2. The path is subject to the access check and access is denied →
//!    redirect to the default domain with 302.
//! 3. Otherwise pass through.
//!
//! Every redirect target must itself negotiate to a registered domain;
//! otherwise the request is rejected (401) instead of redirected.
//!
//! Targets carry the request path and query string.

use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::access::AccessPolicy;
use crate::config::schema::NegotiationConfig;
use crate::domain::hostname::host_key;
use crate::domain::{DomainRecord, DomainStore};
use crate::negotiation::Negotiator;

/// Status used when access to a domain is denied.
pub const ACCESS_REDIRECT_STATUS: u16 = 302;

/// Status of a rejected redirect.
pub const REJECTED_STATUS: u16 = 401;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    UntrustedRedirectTarget { target_url: String },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::UntrustedRedirectTarget { .. } => {
                f.write_str("The provided host name is not a valid redirect.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RedirectDecision {
    PassThrough,
    Redirect { target_url: String, status: u16 },
    Rejected(RejectReason),
}

impl RedirectDecision {
    pub fn should_redirect(&self) -> bool {
        matches!(self, RedirectDecision::Redirect { .. })
    }

    pub fn target_url(&self) -> Option<&str> {
        match self {
            RedirectDecision::Redirect { target_url, .. } => Some(target_url),
            _ => None,
        }
    }

    /// HTTP status the gateway answers with, if it answers at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RedirectDecision::PassThrough => None,
            RedirectDecision::Redirect { status, .. } => Some(*status),
            RedirectDecision::Rejected(_) => Some(REJECTED_STATUS),
        }
    }

    /// True when this is a redirect back to `host` (case and port ignored).
    pub fn targets_host(&self, host: &str) -> bool {
        self.target_url()
            .and_then(|url| Url::parse(url).ok())
            .and_then(|url| url.host_str().map(host_key))
            .is_some_and(|target| target == host_key(host))
    }
}

#[derive(Debug)]
pub struct RedirectEngine {
    negotiator: Arc<Negotiator>,
    domains: Arc<DomainStore>,
    policy: AccessPolicy,
    default_redirect_status: u16,
}

impl RedirectEngine {
    pub fn new(
        negotiator: Arc<Negotiator>,
        domains: Arc<DomainStore>,
        config: &NegotiationConfig,
    ) -> Self {
        Self {
            negotiator,
            domains,
            policy: AccessPolicy::new(&config.bypass_paths),
            default_redirect_status: config.default_redirect_status,
        }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Decide what to do with a request negotiated to `domain`.
    ///
    /// `request_uri` is the path with its query string, if any.
    pub fn decide(
        &self,
        domain: &DomainRecord,
        request_uri: &str,
        access_allowed: bool,
    ) -> RedirectDecision {
        if let Some(code) = domain.redirect.filter(|code| *code > 0) {
            return self.trusted(domain.url(request_uri), self.redirect_status(code));
        }

        let path = request_uri.split_once('?').map_or(request_uri, |(path, _)| path);
        if self.policy.check_path(path) && !access_allowed {
            return match self.domains.find_default() {
                Some(default) => self.trusted(default.url(request_uri), ACCESS_REDIRECT_STATUS),
                None => {
                    tracing::warn!(domain_id = %domain.id, "Access denied but no default domain to redirect to");
                    RedirectDecision::PassThrough
                }
            };
        }

        RedirectDecision::PassThrough
    }

    /// Emit the redirect only if its host is registered.
    fn trusted(&self, target_url: String, status: u16) -> RedirectDecision {
        let registered = Url::parse(&target_url)
            .ok()
            .and_then(|url| url.host_str().map(|host| self.negotiator.is_registered_domain(host)))
            .unwrap_or(false);
        if registered {
            RedirectDecision::Redirect { target_url, status }
        } else {
            tracing::warn!(target_url = %target_url, "Refusing redirect to unregistered host");
            RedirectDecision::Rejected(RejectReason::UntrustedRedirectTarget { target_url })
        }
    }

    fn redirect_status(&self, code: u16) -> u16 {
        if (300..=308).contains(&code) {
            code
        } else {
            self.default_redirect_status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::{AliasResolver, AliasStore, AliasValues};
    use crate::domain::{DomainPatch, DomainValues};

    struct Fixture {
        domains: Arc<DomainStore>,
        aliases: Arc<AliasStore>,
        engine: RedirectEngine,
        negotiator: Arc<Negotiator>,
    }

    fn fixture() -> Fixture {
        let domains = Arc::new(DomainStore::new());
        domains.create(DomainValues::new("example.com").with_id("a"), None).unwrap();
        domains.create(DomainValues::new("one.example.com").with_id("b"), None).unwrap();
        let aliases = Arc::new(AliasStore::new());
        let negotiator = Arc::new(Negotiator::new(domains.clone(), false).with_resolver(Arc::new(
            AliasResolver::new(aliases.clone(), domains.clone(), "default"),
        )));
        let engine = RedirectEngine::new(negotiator.clone(), domains.clone(), &NegotiationConfig::default());
        Fixture { domains, aliases, engine, negotiator }
    }

    #[test]
    fn test_domain_redirect_overrides_access() {
        let f = fixture();
        let b = f
            .domains
            .update("b", DomainPatch { redirect: Some(301), ..Default::default() })
            .unwrap();
        let decision = f.engine.decide(&b, "/any/path", true);
        assert_eq!(
            decision,
            RedirectDecision::Redirect {
                target_url: "http://one.example.com/any/path".into(),
                status: 301
            }
        );
        // access result is irrelevant when a redirect is configured
        assert_eq!(f.engine.decide(&b, "/any/path", false), decision);
    }

    #[test]
    fn test_access_denied_redirects_to_default() {
        let f = fixture();
        let b = f.domains.get("b").unwrap();
        let decision = f.engine.decide(&b, "/node/1", false);
        assert_eq!(decision.target_url(), Some("http://example.com/node/1"));
        assert_eq!(decision.status(), Some(302));
        assert!(decision.should_redirect());
    }

    #[test]
    fn test_bypass_path_passes() {
        let f = fixture();
        let b = f.domains.get("b").unwrap();
        assert_eq!(f.engine.decide(&b, "/user/login", false), RedirectDecision::PassThrough);
        assert_eq!(f.engine.decide(&b, "/user/login?destination=/node", false), RedirectDecision::PassThrough);
        assert_eq!(f.engine.decide(&b, "/node/1", true), RedirectDecision::PassThrough);
    }

    #[test]
    fn test_target_keeps_query_string() {
        let f = fixture();
        let b = f.domains.get("b").unwrap();
        let decision = f.engine.decide(&b, "/node/1?page=2&sort=asc", false);
        assert_eq!(decision.target_url(), Some("http://example.com/node/1?page=2&sort=asc"));

        let mut b = b;
        b.redirect = Some(301);
        let decision = f.engine.decide(&b, "/x?page=2", true);
        assert_eq!(decision.target_url(), Some("http://one.example.com/x?page=2"));
    }

    #[test]
    fn test_targets_host() {
        let decision = RedirectDecision::Redirect {
            target_url: "http://one.example.com/x?page=2".into(),
            status: 301,
        };
        assert!(decision.targets_host("one.example.com"));
        assert!(decision.targets_host("ONE.example.com:8080"));
        assert!(!decision.targets_host("old.example.org"));
        assert!(!RedirectDecision::PassThrough.targets_host("one.example.com"));
    }

    #[test]
    fn test_untrusted_target_rejected() {
        let f = fixture();
        // a record whose hostname the registry does not know
        let mut forged = f.domains.get("b").unwrap();
        forged.hostname = "evil.org".into();
        forged.redirect = Some(302);
        let decision = f.engine.decide(&forged, "/", true);
        assert!(!decision.should_redirect());
        assert_eq!(decision.status(), Some(401));
        assert!(matches!(
            decision,
            RedirectDecision::Rejected(RejectReason::UntrustedRedirectTarget { .. })
        ));
    }

    #[test]
    fn test_alias_redirect_is_trusted() {
        let f = fixture();
        f.aliases
            .create(AliasValues::new("b", "old.example.org").with_redirect(301))
            .unwrap();
        let result = f.negotiator.negotiate("old.example.org").unwrap();
        let decision = f.engine.decide(&result.domain, "/x", true);
        assert_eq!(decision.target_url(), Some("http://one.example.com/x"));
        assert_eq!(decision.status(), Some(301));
    }

    #[test]
    fn test_invalid_code_uses_default_status() {
        let f = fixture();
        let mut b = f.domains.get("b").unwrap();
        b.redirect = Some(1);
        assert_eq!(f.engine.decide(&b, "/", true).status(), Some(302));
    }

    #[test]
    fn test_never_redirects_to_unregistered_host() {
        let f = fixture();
        for host in ["example.com", "one.example.com", "evil.org", "example.com.evil.org"] {
            let mut d = f.domains.get("b").unwrap();
            d.hostname = host.into();
            d.redirect = Some(301);
            let decision = f.engine.decide(&d, "/", true);
            if let Some(url) = decision.target_url() {
                let host = Url::parse(url).unwrap().host_str().unwrap().to_string();
                assert!(f.negotiator.is_registered_domain(&host));
            }
        }
    }
}
