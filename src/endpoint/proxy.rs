//! Proxy endpoint: a forwarding load-balancer simulator.
//!
//! # Responsibilities
//! - Bind the fixed proxy port and serve HTTP
//! - Drop, forward, or forward to a stale destination, per EndpointConfig
//! - Classify outbound failures and answer with canonical responses only
//! - Mirror upstream status and body on success

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::uri::{Authority, Scheme},
    http::{Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::config::HarnessConfig;
use crate::endpoint::handle::{EndpointHandle, EndpointRole, HandledCounter};
use crate::endpoint::{EndpointConfig, EndpointError};
use crate::faults::{classify, ConnectFailure, FailureKind};

/// Canonical body of the drop response.
pub const DROP_BODY: &str = "Dropping Traffic";

/// Destination policy, fixed at spawn time.
#[derive(Debug, Clone, Copy)]
enum ForwardMode {
    /// Answer every request with the drop response.
    Drop,
    /// Forward every request to this upstream.
    Forward(SocketAddr),
}

/// Application state injected into the forward handler.
#[derive(Clone)]
struct ProxyState {
    client: Client<HttpConnector, Body>,
    mode: ForwardMode,
    upstream_timeout: Duration,
    served: HandledCounter,
}

/// Forwarding load-balancer simulator bound to the fixed proxy port.
pub struct ProxyEndpoint;

impl ProxyEndpoint {
    /// Bind the proxy port and start serving the configured behavior.
    ///
    /// The effective upstream is fixed here: the configured forward target,
    /// or that target's host with an arbitrary unused port when the
    /// scenario simulates a stale endpoint. Returns once the socket is
    /// bound.
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
        let addr = SocketAddr::new(host, config.endpoints.proxy_port);

        let mode = if !endpoint.forward_traffic {
            ForwardMode::Drop
        } else {
            let target = endpoint
                .forward_target
                .ok_or(EndpointError::MissingForwardTarget)?;
            if endpoint.simulate_stale_endpoint {
                let stale = SocketAddr::new(target.ip(), unused_port(target.ip()).await?);
                tracing::info!(
                    configured = %target,
                    stale = %stale,
                    "proxy holding stale endpoint"
                );
                ForwardMode::Forward(stale)
            } else {
                ForwardMode::Forward(target)
            }
        };

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| EndpointError::Bind {
                role: EndpointRole::Proxy,
                addr,
                source,
            })?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let handled = HandledCounter::new();
        let state = ProxyState {
            client,
            mode,
            upstream_timeout: config.upstream_timeout(),
            served: handled.clone(),
        };

        let app = Router::new()
            .route("/{*path}", any(forward_handler))
            .route("/", any(forward_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        tracing::info!(port = addr.port(), mode = ?mode, "proxy endpoint listening");

        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            });
            if let Err(e) = serve.await {
                tracing::error!(error = %e, "proxy endpoint serve error");
            }
        });

        Ok(EndpointHandle::new(
            EndpointRole::Proxy,
            addr.port(),
            shutdown_tx,
            task,
            handled,
        ))
    }
}

/// Pick a port nothing is listening on by binding port 0 and releasing it.
async fn unused_port(host: IpAddr) -> Result<u16, EndpointError> {
    let probe_addr = SocketAddr::new(host, 0);
    let bind_err = |source| EndpointError::Bind {
        role: EndpointRole::Proxy,
        addr: probe_addr,
        source,
    };
    let probe = TcpListener::bind(probe_addr).await.map_err(bind_err)?;
    let port = probe.local_addr().map_err(bind_err)?.port();
    Ok(port)
}

/// Serve one inbound request according to the forward mode.
async fn forward_handler(State(state): State<ProxyState>, request: Request<Body>) -> Response {
    state.served.record();

    let upstream = match state.mode {
        ForwardMode::Drop => {
            tracing::info!(path = %request.uri().path(), "dropping traffic");
            return (StatusCode::SERVICE_UNAVAILABLE, DROP_BODY).into_response();
        }
        ForwardMode::Forward(upstream) => upstream,
    };

    let (mut parts, body) = request.into_parts();

    // Rewrite the URI to point at the upstream, keeping path and query.
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = match Authority::from_str(&upstream.to_string()) {
        Ok(authority) => Some(authority),
        Err(e) => {
            tracing::error!(upstream = %upstream, error = %e, "unusable upstream authority");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error: bad upstream address")
                .into_response();
        }
    };
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(upstream = %upstream, error = %e, "failed to rewrite request uri");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Error: bad upstream address")
                .into_response();
        }
    };

    let outbound = Request::from_parts(parts, body);
    tracing::debug!(method = %outbound.method(), uri = %outbound.uri(), "forwarding request");

    match tokio::time::timeout(state.upstream_timeout, state.client.request(outbound)).await {
        Ok(Ok(response)) => {
            let status = response.status();
            tracing::debug!(status = %status, "upstream responded");
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body)).into_response()
        }
        Ok(Err(e)) => {
            let failure = ConnectFailure::from_error(&e, upstream);
            let classification = classify(failure.kind);
            tracing::warn!(
                kind = %failure.kind,
                code = ?failure.code,
                syscall = ?failure.syscall,
                upstream = %failure.addr,
                status = %classification.status,
                error = %failure.message,
                "upstream request failed"
            );
            classification.into_response()
        }
        Err(_) => {
            let classification = classify(FailureKind::TimedOut);
            tracing::warn!(
                upstream = %upstream,
                timeout = ?state.upstream_timeout,
                status = %classification.status,
                "upstream request timed out"
            );
            classification.into_response()
        }
    }
}
