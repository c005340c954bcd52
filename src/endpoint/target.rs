//! Target endpoint: a backend simulator with selectable failure behavior.
//!
//! # Responsibilities
//! - Bind the fixed target port
//! - Refuse, accept silently, respond after a delay, or reset after a
//!   delay, per the scenario's EndpointConfig
//! - Count accepted connections
//! - Release the port on shutdown

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::config::HarnessConfig;
use crate::endpoint::handle::{EndpointHandle, EndpointRole, HandledCounter};
use crate::endpoint::{EndpointConfig, EndpointError};

/// Body of the minimal success response.
pub const TARGET_BODY: &str = "target ok";

/// Backend simulator bound to the fixed target port.
pub struct TargetEndpoint;

impl TargetEndpoint {
    /// Bind the target port and start serving the configured behavior.
    ///
    /// Returns once the socket state is in place; callers may probe
    /// immediately.
    pub async fn spawn(
        config: &HarnessConfig,
        endpoint: EndpointConfig,
    ) -> Result<EndpointHandle, EndpointError> {
        let host = config
            .endpoints
            .bind_host
            .parse()
            .map_err(|source| EndpointError::BindHost {
                host: config.endpoints.bind_host.clone(),
                source,
            })?;
        let addr = SocketAddr::new(host, config.endpoints.target_port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| EndpointError::Bind {
                role: EndpointRole::Target,
                addr,
                source,
            })?;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handled = HandledCounter::new();

        if !endpoint.accept_connections {
            // Claiming the port proves the previous scenario released it.
            // Releasing it right away leaves nothing listening, so the
            // kernel refuses every attempt for the rest of the scenario.
            drop(listener);
            tracing::info!(port = addr.port(), "target refusing connections");
            let task = tokio::spawn(async move {
                let _ = shutdown_rx.changed().await;
            });
            return Ok(EndpointHandle::new(
                EndpointRole::Target,
                addr.port(),
                shutdown_tx,
                task,
                handled,
            ));
        }

        tracing::info!(
            port = addr.port(),
            respond = endpoint.respond_to_requests,
            reset_after = ?endpoint.delay_before_reset,
            "target endpoint listening"
        );

        let counter = handled.clone();
        let response_delay = config.response_delay();
        let task = tokio::spawn(async move {
            let mut connections = JoinSet::new();
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    accepted = listener.accept() => match accepted {
                        Ok((socket, peer)) => {
                            counter.record();
                            tracing::debug!(peer = %peer, "target accepted connection");
                            let behavior = endpoint.clone();
                            connections.spawn(handle_connection(socket, behavior, response_delay));
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "target accept failed");
                        }
                    }
                }
            }
            // The listener drops here, freeing the port. Connections still
            // held open (silent mode) are aborted so no socket outlives the
            // scenario.
            drop(listener);
            connections.shutdown().await;
        });

        Ok(EndpointHandle::new(
            EndpointRole::Target,
            addr.port(),
            shutdown_tx,
            task,
            handled,
        ))
    }
}

/// Drive one accepted connection through the configured behavior.
async fn handle_connection(
    mut socket: TcpStream,
    behavior: EndpointConfig,
    response_delay: Duration,
) {
    let mut buf = [0u8; 4096];

    // Every behavior waits for request data first; refusal never gets here.
    let received = match socket.read(&mut buf).await {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };

    if behavior.respond_to_requests {
        tokio::time::sleep(response_delay).await;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            TARGET_BODY.len(),
            TARGET_BODY
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        tracing::debug!(bytes_in = received, "target responded");
        return;
    }

    if behavior.delay_before_reset > Duration::ZERO {
        tokio::time::sleep(behavior.delay_before_reset).await;
        // Zero linger turns the close below into an RST instead of a FIN.
        // The deprecation guards against blocking drops; a zero timeout
        // never blocks.
        #[allow(deprecated)]
        let _ = socket.set_linger(Some(Duration::ZERO));
        tracing::debug!(bytes_in = received, "target resetting connection");
        return;
    }

    // Silent mode: hold the connection open and never answer. Reading until
    // EOF keeps the socket alive exactly as long as the peer stays.
    tracing::debug!(bytes_in = received, "target holding connection silently");
    loop {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) => continue,
        }
    }
}
