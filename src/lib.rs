//! Scenario-driven network fault-injection harness.
//!
//! Reproduces low-level connection failures (host unreachable, network
//! unreachable, connection refused, timeouts) and checks that a simulated
//! load balancer translates them into well-defined HTTP error responses.

pub mod config;
pub mod endpoint;
pub mod faults;
pub mod probe;
pub mod scenario;

pub use config::schema::HarnessConfig;
pub use probe::ProbeOutcome;
pub use scenario::{ScenarioRegistry, ScenarioRunner, SelectionFilter};
