//! Builtin scenario catalog and selection.
//!
//! # Responsibilities
//! - Define every scenario the harness knows, in run order
//! - Resolve symbolic probe destinations against the config
//! - Select scenarios by category, by id, or all of them

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;

use crate::config::HarnessConfig;
use crate::endpoint::EndpointConfig;
use crate::faults::FailureKind;
use crate::probe::ProbeOutcome;
use crate::scenario::context::ScenarioContext;
use crate::scenario::{Category, Expectation, HarnessError, Scenario, ScenarioDescriptor};

/// Delay before the reset-behavior target aborts the connection.
const RESET_DELAY: Duration = Duration::from_millis(200);

/// Where a probe is aimed, resolved against the config at probe time.
#[derive(Debug, Clone, Copy)]
enum ProbeTarget {
    /// The target endpoint's fixed port.
    TargetPort,
    /// The proxy endpoint's fixed port.
    ProxyPort,
    /// The externally firewalled host-unreachable address.
    HostUnreachableAddr,
    /// The externally firewalled net-unreachable address.
    NetUnreachableAddr,
    /// The externally black-holed address.
    BlackholeAddr,
}

impl ProbeTarget {
    fn resolve(self, config: &HarnessConfig) -> Result<SocketAddr, HarnessError> {
        fn parse(addr: &str, port: u16) -> Result<SocketAddr, HarnessError> {
            let ip = addr.parse().map_err(|source| HarnessError::InvalidAddress {
                addr: addr.to_string(),
                source,
            })?;
            Ok(SocketAddr::new(ip, port))
        }

        match self {
            Self::TargetPort => parse(&config.endpoints.bind_host, config.endpoints.target_port),
            Self::ProxyPort => parse(&config.endpoints.bind_host, config.endpoints.proxy_port),
            Self::HostUnreachableAddr => {
                parse(&config.network.host_unreachable_addr, config.network.raw_probe_port)
            }
            Self::NetUnreachableAddr => {
                parse(&config.network.net_unreachable_addr, config.network.raw_probe_port)
            }
            Self::BlackholeAddr => {
                parse(&config.network.blackhole_addr, config.network.raw_probe_port)
            }
        }
    }
}

/// Probe mode and destination for a catalog scenario.
#[derive(Debug, Clone, Copy)]
enum ProbeSpec {
    Raw(ProbeTarget),
    Http(ProbeTarget),
}

/// Builds the behavior for one endpoint role from the harness config.
type EndpointPlan = fn(&HarnessConfig) -> Result<EndpointConfig, HarnessError>;

/// Catalog scenario: a descriptor plus a declarative plan.
///
/// Plans are functions, not values, so every setup builds a fresh
/// EndpointConfig from the current config.
struct FaultScenario {
    descriptor: ScenarioDescriptor,
    target: Option<EndpointPlan>,
    proxy: Option<EndpointPlan>,
    probe: ProbeSpec,
}

#[async_trait]
impl Scenario for FaultScenario {
    fn descriptor(&self) -> &ScenarioDescriptor {
        &self.descriptor
    }

    async fn setup(&self, cx: &mut ScenarioContext) -> Result<(), HarnessError> {
        if let Some(plan) = self.target {
            let endpoint = plan(cx.config())?;
            cx.start_target(endpoint).await?;
        }
        if let Some(plan) = self.proxy {
            let endpoint = plan(cx.config())?;
            cx.start_proxy(endpoint).await?;
        }
        Ok(())
    }

    async fn probe(&self, cx: &mut ScenarioContext) -> Result<ProbeOutcome, HarnessError> {
        Ok(match self.probe {
            ProbeSpec::Raw(target) => {
                let addr = target.resolve(cx.config())?;
                cx.probe().connect_raw(addr).await
            }
            ProbeSpec::Http(target) => {
                let addr = target.resolve(cx.config())?;
                cx.probe().request_http(addr).await
            }
        })
    }
}

fn respond_target(_: &HarnessConfig) -> Result<EndpointConfig, HarnessError> {
    Ok(EndpointConfig::default())
}

fn refuse_target(_: &HarnessConfig) -> Result<EndpointConfig, HarnessError> {
    Ok(EndpointConfig {
        accept_connections: false,
        ..EndpointConfig::default()
    })
}

fn silent_target(_: &HarnessConfig) -> Result<EndpointConfig, HarnessError> {
    Ok(EndpointConfig {
        respond_to_requests: false,
        ..EndpointConfig::default()
    })
}

fn resetting_target(_: &HarnessConfig) -> Result<EndpointConfig, HarnessError> {
    Ok(EndpointConfig {
        respond_to_requests: false,
        delay_before_reset: RESET_DELAY,
        ..EndpointConfig::default()
    })
}

fn dropping_proxy(_: &HarnessConfig) -> Result<EndpointConfig, HarnessError> {
    Ok(EndpointConfig {
        forward_traffic: false,
        ..EndpointConfig::default()
    })
}

fn forwarding_proxy(config: &HarnessConfig) -> Result<EndpointConfig, HarnessError> {
    Ok(EndpointConfig {
        forward_target: Some(ProbeTarget::TargetPort.resolve(config)?),
        ..EndpointConfig::default()
    })
}

fn stale_proxy(config: &HarnessConfig) -> Result<EndpointConfig, HarnessError> {
    Ok(EndpointConfig {
        forward_target: Some(ProbeTarget::TargetPort.resolve(config)?),
        simulate_stale_endpoint: true,
        ..EndpointConfig::default()
    })
}

fn unreachable_upstream_proxy(config: &HarnessConfig) -> Result<EndpointConfig, HarnessError> {
    Ok(EndpointConfig {
        forward_target: Some(ProbeTarget::HostUnreachableAddr.resolve(config)?),
        ..EndpointConfig::default()
    })
}

/// Owns the builtin catalog.
pub struct ScenarioRegistry {
    scenarios: Vec<Box<dyn Scenario>>,
}

/// Which scenarios a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionFilter {
    All,
    Category(Category),
    Id(String),
}

impl ScenarioRegistry {
    /// The full builtin catalog, in run order: basic first, then
    /// cluster-simulation.
    pub fn builtin() -> Self {
        let scenarios: Vec<Box<dyn Scenario>> = vec![
            Box::new(FaultScenario {
                descriptor: ScenarioDescriptor {
                    id: "host-unreachable",
                    name: "Host unreachable (raw)",
                    description: "Raw connect to an address rejected with ICMP host-unreachable",
                    category: Category::Basic,
                    expectation: Expectation::Failure {
                        expected: FailureKind::HostUnreachable,
                        alternates: &[FailureKind::NetworkUnreachable, FailureKind::TimedOut],
                    },
                },
                target: None,
                proxy: None,
                probe: ProbeSpec::Raw(ProbeTarget::HostUnreachableAddr),
            }),
            Box::new(FaultScenario {
                descriptor: ScenarioDescriptor {
                    id: "net-unreachable",
                    name: "Network unreachable (raw)",
                    description: "Raw connect to an address rejected with ICMP net-unreachable",
                    category: Category::Basic,
                    expectation: Expectation::Failure {
                        expected: FailureKind::NetworkUnreachable,
                        alternates: &[FailureKind::HostUnreachable, FailureKind::TimedOut],
                    },
                },
                target: None,
                proxy: None,
                probe: ProbeSpec::Raw(ProbeTarget::NetUnreachableAddr),
            }),
            Box::new(FaultScenario {
                descriptor: ScenarioDescriptor {
                    id: "connection-refused",
                    name: "Connection refused (raw)",
                    description: "Raw connect to the target port with nothing listening on it",
                    category: Category::Basic,
                    expectation: Expectation::Failure {
                        expected: FailureKind::ConnectionRefused,
                        alternates: &[],
                    },
                },
                target: Some(refuse_target),
                proxy: None,
                probe: ProbeSpec::Raw(ProbeTarget::TargetPort),
            }),
            Box::new(FaultScenario {
                descriptor: ScenarioDescriptor {
                    id: "connect-timeout",
                    name: "Connect timeout (raw)",
                    description: "Raw connect to a black-holed address until the window expires",
                    category: Category::Basic,
                    expectation: Expectation::Failure {
                        expected: FailureKind::TimedOut,
                        alternates: &[
                            FailureKind::HostUnreachable,
                            FailureKind::NetworkUnreachable,
                        ],
                    },
                },
                target: None,
                proxy: None,
                probe: ProbeSpec::Raw(ProbeTarget::BlackholeAddr),
            }),
            Box::new(FaultScenario {
                descriptor: ScenarioDescriptor {
                    id: "proxy-drop",
                    name: "Load balancer dropping traffic",
                    description: "Proxy configured to drop; no outbound attempt is made",
                    category: Category::ClusterSimulation,
                    expectation: Expectation::Status {
                        expected: StatusCode::SERVICE_UNAVAILABLE,
                        alternates: &[],
                    },
                },
                target: None,
                proxy: Some(dropping_proxy),
                probe: ProbeSpec::Http(ProbeTarget::ProxyPort),
            }),
            Box::new(FaultScenario {
                descriptor: ScenarioDescriptor {
                    id: "backend-refused",
                    name: "Backend refusing connections",
                    description: "Proxy forwards to a port the kernel actively refuses",
                    category: Category::ClusterSimulation,
                    expectation: Expectation::Status {
                        expected: StatusCode::BAD_GATEWAY,
                        alternates: &[],
                    },
                },
                target: Some(refuse_target),
                proxy: Some(forwarding_proxy),
                probe: ProbeSpec::Http(ProbeTarget::ProxyPort),
            }),
            Box::new(FaultScenario {
                descriptor: ScenarioDescriptor {
                    id: "stale-endpoint",
                    name: "Stale endpoint",
                    description: "Proxy forwards to a no-longer-valid port",
                    category: Category::ClusterSimulation,
                    expectation: Expectation::Status {
                        expected: StatusCode::BAD_GATEWAY,
                        alternates: &[StatusCode::GATEWAY_TIMEOUT],
                    },
                },
                target: None,
                proxy: Some(stale_proxy),
                probe: ProbeSpec::Http(ProbeTarget::ProxyPort),
            }),
            Box::new(FaultScenario {
                descriptor: ScenarioDescriptor {
                    id: "backend-unreachable",
                    name: "Backend unreachable",
                    description: "Proxy forwards to a firewalled external address",
                    category: Category::ClusterSimulation,
                    expectation: Expectation::Status {
                        expected: StatusCode::BAD_GATEWAY,
                        alternates: &[
                            StatusCode::GATEWAY_TIMEOUT,
                            StatusCode::INTERNAL_SERVER_ERROR,
                        ],
                    },
                },
                target: None,
                proxy: Some(unreachable_upstream_proxy),
                probe: ProbeSpec::Http(ProbeTarget::ProxyPort),
            }),
            Box::new(FaultScenario {
                descriptor: ScenarioDescriptor {
                    id: "backend-timeout",
                    name: "Backend accepting silently",
                    description: "Upstream accepts but never answers; the proxy times out",
                    category: Category::ClusterSimulation,
                    expectation: Expectation::Status {
                        expected: StatusCode::GATEWAY_TIMEOUT,
                        alternates: &[],
                    },
                },
                target: Some(silent_target),
                proxy: Some(forwarding_proxy),
                probe: ProbeSpec::Http(ProbeTarget::ProxyPort),
            }),
            Box::new(FaultScenario {
                descriptor: ScenarioDescriptor {
                    id: "backend-reset",
                    name: "Backend resetting mid-request",
                    description: "Upstream aborts the connection after accepting the request",
                    category: Category::ClusterSimulation,
                    expectation: Expectation::Status {
                        expected: StatusCode::INTERNAL_SERVER_ERROR,
                        alternates: &[StatusCode::BAD_GATEWAY],
                    },
                },
                target: Some(resetting_target),
                proxy: Some(forwarding_proxy),
                probe: ProbeSpec::Http(ProbeTarget::ProxyPort),
            }),
            Box::new(FaultScenario {
                descriptor: ScenarioDescriptor {
                    id: "backend-online",
                    name: "Backend online",
                    description: "Healthy upstream; the response is mirrored through the proxy",
                    category: Category::ClusterSimulation,
                    expectation: Expectation::Status {
                        expected: StatusCode::OK,
                        alternates: &[],
                    },
                },
                target: Some(respond_target),
                proxy: Some(forwarding_proxy),
                probe: ProbeSpec::Http(ProbeTarget::ProxyPort),
            }),
        ];
        Self { scenarios }
    }

    /// Number of scenarios in the catalog.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Descriptors in run order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ScenarioDescriptor> {
        self.scenarios.iter().map(|s| s.descriptor())
    }

    /// Apply a selection filter, preserving run order.
    pub fn select(&self, filter: &SelectionFilter) -> Vec<&dyn Scenario> {
        self.scenarios
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| match filter {
                SelectionFilter::All => true,
                SelectionFilter::Category(category) => s.descriptor().category == *category,
                SelectionFilter::Id(id) => s.descriptor().id == id.as_str(),
            })
            .collect()
    }
}
