//! Simulated network endpoints.
//!
//! # Data Flow
//! ```text
//! scenario setup
//!     → EndpointConfig (behavior for this scenario only)
//!     → target.rs / proxy.rs (bind the fixed port, spawn the serving task)
//!     → EndpointHandle (role + port + shutdown signal + handled counter)
//!
//! scenario teardown
//!     → EndpointHandle::shutdown (signal, join the task, port released)
//! ```
//!
//! # Design Decisions
//! - Spawn returns only after the listener is bound, so setup completion
//!   implies the port answers (or refuses) immediately
//! - Shutdown joins the serving task before returning, so teardown
//!   completion implies the port is free for the next scenario
//! - At most one live handle per role; the scenario context enforces this

pub mod config;
pub mod handle;
pub mod proxy;
pub mod target;

pub use config::EndpointConfig;
pub use handle::{EndpointHandle, EndpointRole};
pub use proxy::ProxyEndpoint;
pub use target::TargetEndpoint;

use std::net::SocketAddr;
use thiserror::Error;

/// Errors raised while bringing endpoints up or down.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The configured bind host is not an IP address.
    #[error("invalid bind host `{host}`: {source}")]
    BindHost {
        host: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// Binding the endpoint listener failed, usually because the previous
    /// scenario left the port occupied.
    #[error("failed to bind {role} endpoint on {addr}: {source}")]
    Bind {
        role: EndpointRole,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Forwarding was requested without a destination.
    #[error("proxy endpoint requires a forward target when forwarding is enabled")]
    MissingForwardTarget,

    /// The serving task panicked or was cancelled before joining.
    #[error("endpoint task failed to join: {0}")]
    Join(#[from] tokio::task::JoinError),
}
