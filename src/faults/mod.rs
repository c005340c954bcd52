//! Failure taxonomy and classification subsystem.
//!
//! # Data Flow
//!
//! ```text
//! raw io::Error (connect, upstream request)
//!       |
//!       v
//! kind.rs (walk source chain, map to FailureKind, capture detail)
//!       |
//!       v
//! classify.rs (total mapping to status + canonical message)
//!       |
//!       v
//! proxy response body / runner log line
//! ```
//!
//! # Design Decisions
//!
//! - Classification is pure and total; identical kinds always produce
//!   identical responses
//! - Raw error text is logged with full detail but never surfaced to a
//!   client; only the kind name reaches the default-branch message

pub mod classify;
pub mod kind;

pub use classify::{classify, Classification};
pub use kind::{ConnectFailure, FailureKind};
