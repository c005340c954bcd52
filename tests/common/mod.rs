//! Shared utilities for integration tests.

use fault_harness::config::HarnessConfig;

/// Harness config with test-local ports and fast timing.
///
/// Every test passes its own fixed port pair so parallel tests never
/// collide. Timeouts are shortened to keep the suite quick; upstream stays
/// below the probe window as the loader requires.
pub fn test_config(proxy_port: u16, target_port: u16) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.endpoints.proxy_port = proxy_port;
    config.endpoints.target_port = target_port;
    config.timeouts.probe_secs = 2;
    config.timeouts.upstream_secs = 1;
    config.timeouts.response_delay_ms = 20;
    config.runner.cooldown_ms = 50;
    config
}

/// Non-pooled HTTP client, so sockets never linger across assertions.
#[allow(dead_code)]
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
