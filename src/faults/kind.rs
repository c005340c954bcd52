//! Raw connection-failure taxonomy.
//!
//! # Responsibilities
//! - Name the low-level failure kinds the harness reproduces
//! - Extract the io::Error cause from wrapped client errors
//! - Capture per-failure detail (kind, OS code, syscall, peer address)

use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Raw kind of a connection-level failure.
///
/// `Other` carries the io::ErrorKind verbatim so unclassified failures stay
/// visible in logs and in the default-branch response message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No route to host (EHOSTUNREACH).
    HostUnreachable,
    /// Network is unreachable (ENETUNREACH).
    NetworkUnreachable,
    /// Peer actively refused the connection (ECONNREFUSED).
    ConnectionRefused,
    /// The operation timed out, at the OS or at the request level.
    TimedOut,
    /// Any other failure.
    Other(io::ErrorKind),
}

impl FailureKind {
    /// Map an io::ErrorKind into the harness taxonomy.
    pub fn from_io_kind(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::HostUnreachable => Self::HostUnreachable,
            io::ErrorKind::NetworkUnreachable => Self::NetworkUnreachable,
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            io::ErrorKind::TimedOut => Self::TimedOut,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostUnreachable => write!(f, "host unreachable"),
            Self::NetworkUnreachable => write!(f, "network unreachable"),
            Self::ConnectionRefused => write!(f, "connection refused"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// Full detail of one observed connection failure.
#[derive(Debug, Clone)]
pub struct ConnectFailure {
    /// Taxonomy kind.
    pub kind: FailureKind,
    /// Raw OS error code, when the failure came from a syscall.
    pub code: Option<i32>,
    /// Message from the error source. Logged, never surfaced verbatim.
    pub message: String,
    /// Syscall that failed, when known.
    pub syscall: Option<&'static str>,
    /// Peer address and port the operation targeted.
    pub addr: SocketAddr,
}

impl ConnectFailure {
    /// Build from an io::Error observed during a raw connect.
    pub fn from_connect(err: &io::Error, addr: SocketAddr) -> Self {
        Self {
            kind: FailureKind::from_io_kind(err.kind()),
            code: err.raw_os_error(),
            message: err.to_string(),
            syscall: Some("connect"),
            addr,
        }
    }

    /// Build from a wrapped error (an HTTP client error, a request build
    /// error), walking the source chain for the io::Error that caused it.
    pub fn from_error(err: &(dyn std::error::Error + 'static), addr: SocketAddr) -> Self {
        match find_io_source(err) {
            Some(io_err) => {
                let kind = FailureKind::from_io_kind(io_err.kind());
                Self {
                    kind,
                    code: io_err.raw_os_error(),
                    message: io_err.to_string(),
                    syscall: syscall_for(kind),
                    addr,
                }
            }
            None => Self {
                kind: FailureKind::Other(io::ErrorKind::Other),
                code: None,
                message: err.to_string(),
                syscall: None,
                addr,
            },
        }
    }
}

/// Walk an error's source chain looking for an io::Error.
fn find_io_source<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a io::Error> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return Some(io_err);
        }
        current = e.source();
    }
    None
}

/// These kinds are only ever produced by the connect path.
fn syscall_for(kind: FailureKind) -> Option<&'static str> {
    match kind {
        FailureKind::HostUnreachable
        | FailureKind::NetworkUnreachable
        | FailureKind::ConnectionRefused => Some("connect"),
        _ => None,
    }
}
