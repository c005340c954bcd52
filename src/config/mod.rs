//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, defaults when a field is absent)
//!     → loader::validate (semantic checks: distinct non-zero ports,
//!       parseable addresses, upstream timeout inside the probe window)
//!     → HarnessConfig (validated, immutable for the whole run)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a run never observes changes
//! - All fields have defaults so the harness runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use loader::ConfigError;
pub use schema::HarnessConfig;
