//! Probe resolution type.

use std::time::Duration;

use axum::http::StatusCode;

use crate::faults::ConnectFailure;

/// Resolution of a single probe.
///
/// A probe resolves exactly once with exactly one variant; the fixed window
/// turns a silent peer into `TimedOut` rather than a hang.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// Raw mode: the TCP connection was established, then closed.
    Connected,
    /// HTTP mode: a complete response arrived.
    Responded { status: StatusCode, body: String },
    /// The operation failed before the window elapsed.
    Failed(ConnectFailure),
    /// Nothing resolved within the window. In-flight resources were
    /// released when it expired.
    TimedOut { window: Duration },
}

impl ProbeOutcome {
    /// True for the two success shapes.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Connected | Self::Responded { .. })
    }
}
