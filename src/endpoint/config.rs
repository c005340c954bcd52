//! Per-scenario endpoint behavior.

use std::net::SocketAddr;
use std::time::Duration;

/// Behavior selector for a simulated endpoint.
///
/// A fresh value is constructed for every scenario setup and consumed by the
/// spawn; nothing is shared or mutated across scenarios. The target endpoint
/// reads `accept_connections`, `respond_to_requests`, and
/// `delay_before_reset`; the proxy endpoint reads `forward_traffic`,
/// `forward_target`, and `simulate_stale_endpoint`.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Target: accept inbound connections at all. When false the port is
    /// claimed and released, so the kernel actively refuses peers.
    pub accept_connections: bool,

    /// Target: answer requests with a minimal success response.
    pub respond_to_requests: bool,

    /// Target: when non-zero and not responding, abort the connection with
    /// an RST after this delay.
    pub delay_before_reset: Duration,

    /// Proxy: upstream destination requests are forwarded to.
    pub forward_target: Option<SocketAddr>,

    /// Proxy: replace the destination port with an arbitrary unused one,
    /// modeling a load balancer holding a stale endpoint.
    pub simulate_stale_endpoint: bool,

    /// Proxy: forward at all. When false every request gets the drop
    /// response and no outbound attempt is made.
    pub forward_traffic: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            accept_connections: true,
            respond_to_requests: true,
            delay_before_reset: Duration::ZERO,
            forward_target: None,
            simulate_stale_endpoint: false,
            forward_traffic: true,
        }
    }
}
