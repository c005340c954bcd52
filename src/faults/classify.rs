//! Classification of raw failure kinds into HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::faults::FailureKind;

/// Application-level classification of a raw failure.
///
/// The status and message are the only things a client ever sees; raw error
/// text stays in the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// HTTP status surfaced to the client.
    pub status: StatusCode,
    /// Canonical response message.
    pub message: String,
}

impl IntoResponse for Classification {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Map a failure kind to its canonical response.
///
/// The mapping is total and deterministic. Host-unreachable and
/// connection-refused surface as 502, timeouts as 504, and everything else
/// (network-unreachable included) falls through to 500 with the raw kind
/// named in the message.
pub fn classify(kind: FailureKind) -> Classification {
    match kind {
        FailureKind::HostUnreachable => Classification {
            status: StatusCode::BAD_GATEWAY,
            message: "Host Unreachable".to_string(),
        },
        FailureKind::ConnectionRefused => Classification {
            status: StatusCode::BAD_GATEWAY,
            message: "Connection Refused".to_string(),
        },
        FailureKind::TimedOut => Classification {
            status: StatusCode::GATEWAY_TIMEOUT,
            message: "Gateway Timeout".to_string(),
        },
        other => Classification {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Error: {}", other),
        },
    }
}
