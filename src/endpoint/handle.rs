//! Live endpoint handles.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::endpoint::EndpointError;

/// Which simulated role an endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    /// Backend simulator.
    Target,
    /// Forwarding load-balancer simulator.
    Proxy,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target => write!(f, "target"),
            Self::Proxy => write!(f, "proxy"),
        }
    }
}

/// Tally shared between a handle and its serving task.
///
/// Counts accepted connections for the target and served requests for the
/// proxy. Relaxed ordering suffices; the counter orders nothing.
#[derive(Debug, Clone, Default)]
pub struct HandledCounter(Arc<AtomicU64>);

impl HandledCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one handled connection or request.
    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Current tally.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Handle to a live endpoint.
///
/// Shutting down consumes the handle: signal the serving task, join it, and
/// only then return, so the caller knows the port is free. Dropping the
/// handle instead also stops the task (the watch sender closes) but gives no
/// joined-and-released guarantee, so teardown always goes through
/// [`EndpointHandle::shutdown`].
pub struct EndpointHandle {
    role: EndpointRole,
    port: u16,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    handled: HandledCounter,
}

impl EndpointHandle {
    pub(crate) fn new(
        role: EndpointRole,
        port: u16,
        shutdown: watch::Sender<bool>,
        task: JoinHandle<()>,
        handled: HandledCounter,
    ) -> Self {
        Self {
            role,
            port,
            shutdown,
            task,
            handled,
        }
    }

    pub fn role(&self) -> EndpointRole {
        self.role
    }

    /// Port the endpoint claimed at setup.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Connections (target) or requests (proxy) handled so far.
    pub fn handled(&self) -> u64 {
        self.handled.get()
    }

    /// Signal the serving task and wait for it to exit.
    ///
    /// When this returns Ok the listener is closed and the port is free.
    pub async fn shutdown(self) -> Result<(), EndpointError> {
        let _ = self.shutdown.send(true);
        self.task.await?;
        tracing::debug!(role = %self.role, port = self.port, "endpoint released");
        Ok(())
    }
}
