//! End-to-end tests of negotiation and redirect decisions over HTTP.

use domain_gateway::alias::AliasValues;
use domain_gateway::config::{GatewayConfig, UnmatchedPolicy};
use domain_gateway::domain::DomainValues;
use reqwest::header::{AUTHORIZATION, HOST, LOCATION};
use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

fn two_domains() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.domains = vec![
        DomainValues::new("example.com").with_id("a").with_default(true),
        DomainValues::new("one.example.com").with_id("b"),
    ];
    config
}

#[tokio::test]
async fn test_exact_alias_and_default_negotiation() {
    let mut config = two_domains();
    config.aliases = vec![AliasValues::new("b", "*.example.org")];
    let gateway = common::start_gateway(config).await;
    let client = common::client();

    for (host, domain, match_type) in [
        ("one.example.com", "b", "exact"),
        ("ONE.example.com:8080", "b", "exact"),
        ("sub.example.org", "b", "alias"),
        ("unknown.org", "a", "none"),
    ] {
        let res = client
            .get(gateway.url("/node/1"))
            .header(HOST, host)
            .send()
            .await
            .expect("gateway unreachable");
        assert_eq!(res.status(), StatusCode::OK, "host {}", host);
        assert_eq!(res.headers()["x-domain-id"], domain, "host {}", host);
        assert_eq!(res.headers()["x-domain-match"], match_type, "host {}", host);
    }
}

#[tokio::test]
async fn test_domain_redirect() {
    let mut config = two_domains();
    config.domains[1].redirect = Some(301);
    config.aliases = vec![AliasValues::new("b", "*.example.org")];
    let gateway = common::start_gateway(config).await;
    let client = common::client();

    let res = client
        .get(gateway.url("/any/path?page=2"))
        .header(HOST, "sub.example.org")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()[LOCATION], "http://one.example.com/any/path?page=2");

    // following the redirect lands on the canonical host without another hop
    let res = client
        .get(gateway.url("/any/path?page=2"))
        .header(HOST, "one.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(LOCATION).is_none());
    assert_eq!(res.headers()["x-domain-id"], "b");
}

#[tokio::test]
async fn test_alias_redirect_goes_to_canonical_host() {
    let mut config = two_domains();
    config.aliases = vec![AliasValues::new("b", "old.example.net").with_redirect(302)];
    let gateway = common::start_gateway(config).await;

    let res = common::client()
        .get(gateway.url("/news"))
        .header(HOST, "old.example.net")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[LOCATION], "http://one.example.com/news");
}

#[tokio::test]
async fn test_inactive_domain() {
    let mut config = two_domains();
    config.domains[1].status = Some(false);
    let gateway = common::start_gateway(config).await;
    let client = common::client();

    let res = client
        .get(gateway.url("/node/1"))
        .header(HOST, "one.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()[LOCATION], "http://example.com/node/1");

    let res = client
        .get(gateway.url("/user/login"))
        .header(HOST, "one.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(gateway.url("/node/1"))
        .header(HOST, "one.example.com")
        .header(AUTHORIZATION, format!("Bearer {}", common::API_KEY))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-domain-id"], "b");
}

#[tokio::test]
async fn test_no_domain_configured() {
    let gateway = common::start_gateway(GatewayConfig::default()).await;
    let res = common::client()
        .get(gateway.url("/"))
        .header(HOST, "example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let mut config = GatewayConfig::default();
    config.negotiation.unmatched_policy = UnmatchedPolicy::ServeUnscoped;
    let gateway = common::start_gateway(config).await;
    let res = common::client()
        .get(gateway.url("/"))
        .header(HOST, "example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("x-domain-id").is_none());
}

#[tokio::test]
async fn test_domain_info_and_config_overrides() {
    let mut config = two_domains();
    config.aliases = vec![AliasValues::new("b", "one.local").with_environment("local")];
    config.negotiation.alias_environment = "local".into();
    config.overrides = toml::from_str::<GatewayConfig>(
        r#"
        [[overrides]]
        domain_id = "b"
        name = "system.site"
        data = { name = "One", page = { front = "/one" } }

        [[overrides]]
        domain_id = "b"
        langcode = "es"
        name = "system.site"
        data = { name = "Uno" }
        "#,
    )
    .unwrap()
    .overrides;
    let gateway = common::start_gateway(config).await;
    let client = common::client();

    let info: Value = client
        .get(gateway.url("/_domain/info"))
        .header(HOST, "one.local")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["domain_match"], "ALIAS: Using alias one.local");
    assert_eq!(info["environment"], "local");
    assert_eq!(info["domain"]["id"], "b");
    // links stay on the environment's hostname
    assert_eq!(info["canonical"], "one.local");
    assert_eq!(info["base_path"], "http://one.local/");

    let site: Value = client
        .get(gateway.url("/_domain/config/system.site?langcode=es"))
        .header(HOST, "one.example.com")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(site["data"], json!({"name": "Uno", "page": {"front": "/one"}}));
    assert_eq!(site["overridden"], true);
}

#[tokio::test]
async fn test_config_reload() {
    let gateway = common::start_gateway(two_domains()).await;
    let mut next = two_domains();
    next.domains.push(DomainValues::new("two.example.com").with_id("c"));
    gateway.config_updates.send(next).unwrap();

    let state = gateway.state.clone();
    assert!(common::eventually(|| state.load().registry.domains().get("c").is_some()).await);

    let res = common::client()
        .get(gateway.url("/"))
        .header(HOST, "two.example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-domain-id"], "c");
    assert_eq!(res.headers()["x-domain-match"], "exact");
}

#[tokio::test]
async fn test_admin_changes_apply_to_live_traffic() {
    let gateway = common::start_gateway(two_domains()).await;
    let client = common::client();

    let res = client
        .post(gateway.admin_url("/admin/aliases"))
        .bearer_auth(common::API_KEY)
        .json(&json!({"domain_id": "b", "pattern": "*.one.example.net"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(gateway.url("/"))
        .header(HOST, "x.one.example.net")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-domain-id"], "b");
    assert_eq!(res.headers()["x-domain-match"], "alias");

    let res = client
        .patch(gateway.admin_url("/admin/domains/b"))
        .bearer_auth(common::API_KEY)
        .json(&json!({"redirect": 301}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(gateway.url("/x"))
        .header(HOST, "x.one.example.net")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()[LOCATION], "http://one.example.com/x");

    let res = client
        .get(gateway.admin_url("/admin/domains"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
