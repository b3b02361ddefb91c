//! Shared utilities for gateway integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use domain_gateway::config::GatewayConfig;
use domain_gateway::http::AppState;
use domain_gateway::lifecycle::Shutdown;
use domain_gateway::{admin, HttpServer};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const API_KEY: &str = "test-key";

/// A gateway and its admin API running on ephemeral ports.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub state: AppState,
    pub config_updates: mpsc::UnboundedSender<GatewayConfig>,
    pub shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{}", self.admin_addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_gateway(mut config: GatewayConfig) -> TestGateway {
    config.admin.enabled = true;
    config.admin.api_key = API_KEY.to_string();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let admin_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let admin_addr = admin_listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let state = server.state();

    let admin_state = state.clone();
    let admin_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = admin::serve(admin_listener, admin_state, admin_shutdown).await;
    });

    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    TestGateway {
        addr,
        admin_addr,
        state,
        config_updates,
        shutdown,
    }
}

/// Client that never follows redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Poll until `check` holds or the deadline passes.
#[allow(dead_code)]
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..50 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
