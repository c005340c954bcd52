//! Client probe subsystem.
//!
//! # Data Flow
//! ```text
//! scenario probe phase
//!     → Probe::connect_raw / Probe::request_http
//!     → bounded by the probe window (tokio::time::timeout)
//!     → ProbeOutcome: connected | responded | failed(detail) | timed-out
//! ```
//!
//! # Design Decisions
//! - One attempt per invocation; retries are out of scope
//! - Window expiry drops the in-flight future, closing any half-open socket
//! - HTTP probes use the same legacy hyper client the proxy forwards with,
//!   so raw OS errors stay visible in the error source chain

pub mod outcome;

pub use outcome::ProbeOutcome;

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time;

use crate::faults::ConnectFailure;

/// Upper bound on buffered response bodies.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Issues single bounded probes against endpoints.
pub struct Probe {
    window: Duration,
    client: Client<HttpConnector, Body>,
}

impl Probe {
    /// Create a probe with the given resolution window.
    pub fn new(window: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { window, client }
    }

    /// Open a TCP connection to `addr`, then close it cleanly.
    pub async fn connect_raw(&self, addr: SocketAddr) -> ProbeOutcome {
        tracing::debug!(addr = %addr, window = ?self.window, "raw connect probe");
        match time::timeout(self.window, TcpStream::connect(addr)).await {
            Ok(Ok(mut stream)) => {
                let _ = stream.shutdown().await;
                ProbeOutcome::Connected
            }
            Ok(Err(e)) => ProbeOutcome::Failed(ConnectFailure::from_connect(&e, addr)),
            Err(_) => ProbeOutcome::TimedOut {
                window: self.window,
            },
        }
    }

    /// Send `GET /` to `addr` and read the complete response.
    pub async fn request_http(&self, addr: SocketAddr) -> ProbeOutcome {
        tracing::debug!(addr = %addr, window = ?self.window, "http probe");
        let client = self.client.clone();
        let exchange = async move {
            let request = Request::builder()
                .method("GET")
                .uri(format!("http://{}/", addr))
                .header("user-agent", "fault-harness-probe")
                .body(Body::empty())
                .map_err(|e| ConnectFailure::from_error(&e, addr))?;
            let response = client
                .request(request)
                .await
                .map_err(|e| ConnectFailure::from_error(&e, addr))?;
            let status = response.status();
            let body = axum::body::to_bytes(Body::new(response.into_body()), MAX_BODY_BYTES)
                .await
                .map_err(|e| ConnectFailure::from_error(&e, addr))?;
            Ok::<_, ConnectFailure>((status, String::from_utf8_lossy(&body).into_owned()))
        };

        match time::timeout(self.window, exchange).await {
            Ok(Ok((status, body))) => ProbeOutcome::Responded { status, body },
            Ok(Err(failure)) => ProbeOutcome::Failed(failure),
            Err(_) => ProbeOutcome::TimedOut {
                window: self.window,
            },
        }
    }
}
