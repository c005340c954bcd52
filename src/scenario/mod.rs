//! Scenario subsystem.
//!
//! # Data Flow
//! ```text
//! registry.rs (builtin catalog)
//!     → selection (all | category | single id)
//!     → runner.rs (pending → setting-up → probing → tearing-down → done)
//!         → Scenario::setup    (context binds endpoints)
//!         → Scenario::probe    (bounded, resolves to a ProbeOutcome)
//!         → Scenario::teardown (context releases endpoints, always runs)
//!     → verdict per scenario → run summary
//! ```
//!
//! # Design Decisions
//! - Scenarios are trait objects; the runner drives every scenario the same
//!   way regardless of category
//! - Expected outcomes are advisory: environments without the external
//!   firewall rules still complete a run, and strict mode turns mismatches
//!   into a failing exit instead
//! - Teardown is owned by the runner, not the scenario body, so a failing
//!   setup or probe can never skip port release

pub mod context;
pub mod registry;
pub mod runner;

pub use context::ScenarioContext;
pub use registry::{ScenarioRegistry, SelectionFilter};
pub use runner::{RunSummary, ScenarioRunner};

use std::fmt;

use async_trait::async_trait;
use axum::http::StatusCode;
use thiserror::Error;

use crate::config::ConfigError;
use crate::endpoint::{EndpointError, EndpointRole};
use crate::faults::FailureKind;
use crate::probe::ProbeOutcome;

/// Errors surfaced by scenario setup, probe plumbing, or selection.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Endpoint spawn or shutdown failed.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// Setup ran while the previous handle for this role was still live.
    #[error("{role} endpoint already live; teardown must finish before the next setup")]
    EndpointBusy { role: EndpointRole },

    /// A configured address could not be parsed.
    #[error("invalid address `{addr}`: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// No scenario with the requested id exists.
    #[error("no scenario with id `{0}`")]
    UnknownScenario(String),

    /// Configuration loading failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Scenario grouping used for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Direct probes exercising raw failure kinds.
    Basic,
    /// Probes through the proxy against a target in some state.
    ClusterSimulation,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::ClusterSimulation => write!(f, "cluster-simulation"),
        }
    }
}

/// Static description of one scenario.
#[derive(Debug, Clone)]
pub struct ScenarioDescriptor {
    /// Unique id used for selection.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// What the scenario reproduces.
    pub description: &'static str,
    /// Selection category.
    pub category: Category,
    /// What a fully configured environment should observe.
    pub expectation: Expectation,
}

/// Expected probe resolution, with OS-dependent acceptable alternates.
#[derive(Debug, Clone, Copy)]
pub enum Expectation {
    /// The probe should fail, or time out, with this kind.
    Failure {
        expected: FailureKind,
        alternates: &'static [FailureKind],
    },
    /// The probe should complete with this HTTP status.
    Status {
        expected: StatusCode,
        alternates: &'static [StatusCode],
    },
}

impl Expectation {
    /// Compare an observed outcome against this expectation.
    ///
    /// A probe-level timeout counts as the timed-out kind: the window
    /// expiring and an immediate OS timeout belong to the same family.
    pub fn judge(&self, outcome: &ProbeOutcome) -> Verdict {
        match self {
            Self::Failure {
                expected,
                alternates,
            } => {
                let observed = match outcome {
                    ProbeOutcome::Failed(failure) => failure.kind,
                    ProbeOutcome::TimedOut { .. } => FailureKind::TimedOut,
                    ProbeOutcome::Connected | ProbeOutcome::Responded { .. } => {
                        return Verdict::Unexpected;
                    }
                };
                if observed == *expected {
                    Verdict::Expected
                } else if alternates.contains(&observed) {
                    Verdict::AcceptableAlternate
                } else {
                    Verdict::Unexpected
                }
            }
            Self::Status {
                expected,
                alternates,
            } => match outcome {
                ProbeOutcome::Responded { status, .. } => {
                    if status == expected {
                        Verdict::Expected
                    } else if alternates.contains(status) {
                        Verdict::AcceptableAlternate
                    } else {
                        Verdict::Unexpected
                    }
                }
                _ => Verdict::Unexpected,
            },
        }
    }
}

/// How an observed outcome compared to the expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The canonical expected outcome.
    Expected,
    /// An acceptable OS-dependent substitute.
    AcceptableAlternate,
    /// Neither expected nor acceptable.
    Unexpected,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected => write!(f, "expected"),
            Self::AcceptableAlternate => write!(f, "acceptable-alternate"),
            Self::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// One fault scenario, driven by the runner through three phases.
///
/// `teardown` has a default that releases whatever the context holds, so a
/// scenario only overrides it when it has extra state of its own.
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Static descriptor: id, name, category, expectation.
    fn descriptor(&self) -> &ScenarioDescriptor;

    /// Bring up the endpoints this scenario needs. Must not return until
    /// every listener state is in place.
    async fn setup(&self, cx: &mut ScenarioContext) -> Result<(), HarnessError>;

    /// Issue the probe and return its resolution.
    async fn probe(&self, cx: &mut ScenarioContext) -> Result<ProbeOutcome, HarnessError>;

    /// Release everything setup created.
    async fn teardown(&self, cx: &mut ScenarioContext) -> Result<(), HarnessError> {
        cx.release_all().await;
        Ok(())
    }
}
