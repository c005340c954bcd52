//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files. Every
//! field carries a default so the harness runs with no config file at all.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the harness, immutable once loaded.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HarnessConfig {
    /// Local endpoint bind settings.
    pub endpoints: EndpointPorts,

    /// External addresses raw probes are aimed at.
    pub network: NetworkConfig,

    /// Probe, upstream, and target timing.
    pub timeouts: TimeoutConfig,

    /// Scenario pacing.
    pub runner: RunnerConfig,
}

impl HarnessConfig {
    /// Window inside which every probe must resolve.
    pub fn probe_window(&self) -> Duration {
        Duration::from_secs(self.timeouts.probe_secs)
    }

    /// Upper bound on one proxied upstream request.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.upstream_secs)
    }

    /// Delay before the target answers a request.
    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.timeouts.response_delay_ms)
    }

    /// Pause between consecutive scenarios.
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.runner.cooldown_ms)
    }
}

/// Fixed local ports the simulated endpoints bind.
///
/// Every scenario reuses the same two ports, which is what makes port
/// release observable: a scenario that failed to tear down breaks the next
/// bind.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointPorts {
    /// Host both endpoints bind on.
    pub bind_host: String,

    /// Port for the proxy endpoint.
    pub proxy_port: u16,

    /// Port for the target endpoint.
    pub target_port: u16,
}

impl Default for EndpointPorts {
    fn default() -> Self {
        Self {
            bind_host: "127.0.0.1".to_string(),
            proxy_port: 9080,
            target_port: 9081,
        }
    }
}

/// Reserved external addresses for raw network probes.
///
/// The matching firewall rules (reject with host-unreachable, reject with
/// net-unreachable, silent drop) are installed outside the harness before a
/// run. Without them the affected scenarios resolve to OS-dependent
/// alternates instead.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the firewall rejects with ICMP host-unreachable.
    pub host_unreachable_addr: String,

    /// Address the firewall rejects with ICMP net-unreachable.
    pub net_unreachable_addr: String,

    /// Address the firewall silently drops packets to.
    pub blackhole_addr: String,

    /// Port used for probes against the external addresses.
    pub raw_probe_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        // TEST-NET-2, TEST-NET-3, TEST-NET-1 (RFC 5737): never routable in
        // the wild, so a missing firewall rule cannot reach a real host.
        Self {
            host_unreachable_addr: "198.51.100.10".to_string(),
            net_unreachable_addr: "203.0.113.10".to_string(),
            blackhole_addr: "192.0.2.10".to_string(),
            raw_probe_port: 9000,
        }
    }
}

/// Timing for probes, upstream requests, and target behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Probe resolution window in seconds.
    pub probe_secs: u64,

    /// Proxy upstream timeout in seconds. Must stay below `probe_secs` so
    /// upstream timeouts surface as 504 before the probe window expires.
    pub upstream_secs: u64,

    /// Delay before the target answers a request, in milliseconds.
    pub response_delay_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_secs: 5,
            upstream_secs: 3,
            response_delay_ms: 100,
        }
    }
}

/// Scenario runner pacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Cooldown between consecutive scenarios in milliseconds, letting
    /// sockets in TIME_WAIT and lingering kernel state settle.
    pub cooldown_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { cooldown_ms: 1000 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_loopback_with_distinct_ports() {
        let config = HarnessConfig::default();
        assert_eq!(config.endpoints.bind_host, "127.0.0.1");
        assert_ne!(config.endpoints.proxy_port, config.endpoints.target_port);
        assert_eq!(config.probe_window(), Duration::from_secs(5));
        assert!(config.upstream_timeout() < config.probe_window());
    }

    #[test]
    fn partial_toml_merges_with_defaults() {
        let config: HarnessConfig = toml::from_str(
            "[endpoints]\n\
             proxy_port = 28080\n",
        )
        .unwrap();
        assert_eq!(config.endpoints.proxy_port, 28080);
        assert_eq!(config.endpoints.target_port, 9081);
        assert_eq!(config.timeouts.probe_secs, 5);
    }

    #[test]
    fn external_addresses_stay_in_test_nets() {
        let config = HarnessConfig::default();
        assert!(config.network.host_unreachable_addr.starts_with("198.51.100."));
        assert!(config.network.net_unreachable_addr.starts_with("203.0.113."));
        assert!(config.network.blackhole_addr.starts_with("192.0.2."));
    }
}
