//! Per-scenario context.
//!
//! # Responsibilities
//! - Own the live endpoint handles for the current scenario
//! - Enforce at most one live handle per role
//! - Hand the probe and config to scenario bodies

use crate::config::HarnessConfig;
use crate::endpoint::{
    EndpointConfig, EndpointHandle, EndpointRole, ProxyEndpoint, TargetEndpoint,
};
use crate::probe::Probe;
use crate::scenario::HarnessError;

/// Everything a scenario body gets to work with.
///
/// A context is built fresh for each scenario and dropped after teardown,
/// so endpoint state can never leak from one scenario into the next.
pub struct ScenarioContext {
    config: HarnessConfig,
    probe: Probe,
    target: Option<EndpointHandle>,
    proxy: Option<EndpointHandle>,
}

impl ScenarioContext {
    /// Build a context for one scenario run.
    pub fn new(config: HarnessConfig) -> Self {
        let probe = Probe::new(config.probe_window());
        Self {
            config,
            probe,
            target: None,
            proxy: None,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn probe(&self) -> &Probe {
        &self.probe
    }

    /// Bring up the target endpoint with this scenario's behavior.
    pub async fn start_target(&mut self, endpoint: EndpointConfig) -> Result<(), HarnessError> {
        if self.target.is_some() {
            return Err(HarnessError::EndpointBusy {
                role: EndpointRole::Target,
            });
        }
        let handle = TargetEndpoint::spawn(&self.config, endpoint).await?;
        self.target = Some(handle);
        Ok(())
    }

    /// Bring up the proxy endpoint with this scenario's behavior.
    pub async fn start_proxy(&mut self, endpoint: EndpointConfig) -> Result<(), HarnessError> {
        if self.proxy.is_some() {
            return Err(HarnessError::EndpointBusy {
                role: EndpointRole::Proxy,
            });
        }
        let handle = ProxyEndpoint::spawn(&self.config, endpoint).await?;
        self.proxy = Some(handle);
        Ok(())
    }

    /// The live target handle, when setup started one.
    pub fn target(&self) -> Option<&EndpointHandle> {
        self.target.as_ref()
    }

    /// The live proxy handle, when setup started one.
    pub fn proxy(&self) -> Option<&EndpointHandle> {
        self.proxy.as_ref()
    }

    /// Shut down whatever is live, proxy first so in-flight forwards stop
    /// before their upstream disappears.
    ///
    /// Shutdown errors are logged, not propagated; one failed join must not
    /// leave the other handle live. Idempotent.
    pub async fn release_all(&mut self) {
        for handle in [self.proxy.take(), self.target.take()].into_iter().flatten() {
            let role = handle.role();
            if let Err(e) = handle.shutdown().await {
                tracing::error!(%role, error = %e, "endpoint shutdown failed");
            }
        }
    }
}
