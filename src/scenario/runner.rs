//! Scenario runner: the per-scenario state machine and the run loop.
//!
//! # Responsibilities
//! - Drive each scenario through pending → setting-up → probing →
//!   tearing-down → done
//! - Guarantee teardown and port release whatever setup or probe did
//! - Pace consecutive scenarios with the configured cooldown
//! - Judge resolutions against expectations and tally the run

use std::fmt;

use uuid::Uuid;

use crate::config::HarnessConfig;
use crate::faults::classify;
use crate::probe::ProbeOutcome;
use crate::scenario::context::ScenarioContext;
use crate::scenario::registry::{ScenarioRegistry, SelectionFilter};
use crate::scenario::{HarnessError, Scenario, ScenarioDescriptor, Verdict};

/// Phase of one scenario's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    SettingUp,
    Probing,
    TearingDown,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::SettingUp => "setting-up",
            Self::Probing => "probing",
            Self::TearingDown => "tearing-down",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// What one scenario produced.
#[derive(Debug)]
pub enum ScenarioOutcome {
    /// The probe resolved.
    Probed(ProbeOutcome),
    /// Setup or probe plumbing failed before any resolution existed.
    Error { phase: Phase, error: HarnessError },
}

/// Record of one scenario run.
#[derive(Debug)]
pub struct ScenarioResult {
    pub id: &'static str,
    pub name: &'static str,
    pub outcome: ScenarioOutcome,
    /// Verdict against the expectation; None when the scenario errored.
    pub verdict: Option<Verdict>,
}

/// Tallied results of a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub results: Vec<ScenarioResult>,
}

impl RunSummary {
    pub fn expected(&self) -> usize {
        self.count(Verdict::Expected)
    }

    pub fn alternates(&self) -> usize {
        self.count(Verdict::AcceptableAlternate)
    }

    pub fn unexpected(&self) -> usize {
        self.count(Verdict::Unexpected)
    }

    /// Scenarios that errored before producing a probe resolution.
    pub fn errors(&self) -> usize {
        self.results.iter().filter(|r| r.verdict.is_none()).count()
    }

    /// True when nothing was unexpected and nothing errored.
    pub fn is_clean(&self) -> bool {
        self.unexpected() == 0 && self.errors() == 0
    }

    fn count(&self, verdict: Verdict) -> usize {
        self.results
            .iter()
            .filter(|r| r.verdict == Some(verdict))
            .count()
    }
}

/// Drives selected scenarios strictly sequentially.
pub struct ScenarioRunner {
    config: HarnessConfig,
}

impl ScenarioRunner {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Run every scenario the filter selects, in registry order.
    ///
    /// Scenario failures are isolated: they are recorded in the summary and
    /// the loop moves on to the next scenario.
    pub async fn run(&self, registry: &ScenarioRegistry, filter: &SelectionFilter) -> RunSummary {
        let selected = registry.select(filter);
        if selected.is_empty() {
            tracing::warn!(?filter, "selection matched no scenarios");
            return RunSummary::default();
        }

        tracing::info!(
            selected = selected.len(),
            total = registry.len(),
            cooldown = ?self.config.cooldown(),
            "starting run"
        );

        let mut summary = RunSummary::default();
        for (index, scenario) in selected.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.cooldown()).await;
            }
            summary.results.push(self.run_scenario(*scenario).await);
        }

        for result in &summary.results {
            match result.verdict {
                Some(verdict) => tracing::info!(
                    scenario = result.id,
                    name = result.name,
                    verdict = %verdict,
                    "scenario verdict"
                ),
                None => tracing::warn!(
                    scenario = result.id,
                    name = result.name,
                    "scenario errored before resolving"
                ),
            }
        }
        tracing::info!(
            expected = summary.expected(),
            acceptable_alternate = summary.alternates(),
            unexpected = summary.unexpected(),
            errors = summary.errors(),
            "run finished"
        );
        summary
    }

    /// Drive one scenario through its phases. Teardown always runs.
    async fn run_scenario(&self, scenario: &dyn Scenario) -> ScenarioResult {
        let descriptor = scenario.descriptor().clone();
        let run_id = Uuid::new_v4();

        tracing::info!(
            scenario = descriptor.id,
            run_id = %run_id,
            category = %descriptor.category,
            description = descriptor.description,
            phase = %Phase::SettingUp,
            "scenario starting"
        );

        let mut cx = ScenarioContext::new(self.config.clone());

        let outcome = match scenario.setup(&mut cx).await {
            Err(error) => {
                tracing::error!(
                    scenario = descriptor.id,
                    run_id = %run_id,
                    error = %error,
                    "setup failed"
                );
                ScenarioOutcome::Error {
                    phase: Phase::SettingUp,
                    error,
                }
            }
            Ok(()) => {
                tracing::info!(
                    scenario = descriptor.id,
                    run_id = %run_id,
                    phase = %Phase::Probing,
                    "endpoints up, probing"
                );
                match scenario.probe(&mut cx).await {
                    Err(error) => {
                        tracing::error!(
                            scenario = descriptor.id,
                            run_id = %run_id,
                            error = %error,
                            "probe could not run"
                        );
                        ScenarioOutcome::Error {
                            phase: Phase::Probing,
                            error,
                        }
                    }
                    Ok(resolution) => {
                        log_resolution(&descriptor, run_id, &resolution);
                        ScenarioOutcome::Probed(resolution)
                    }
                }
            }
        };

        tracing::info!(
            scenario = descriptor.id,
            run_id = %run_id,
            phase = %Phase::TearingDown,
            "tearing down"
        );
        if let Err(error) = scenario.teardown(&mut cx).await {
            tracing::error!(
                scenario = descriptor.id,
                run_id = %run_id,
                error = %error,
                "teardown failed"
            );
        }
        // The fixed ports must be free before the next scenario, even when a
        // custom teardown errored out. Release is idempotent.
        cx.release_all().await;

        let verdict = match &outcome {
            ScenarioOutcome::Probed(resolution) => Some(descriptor.expectation.judge(resolution)),
            ScenarioOutcome::Error { .. } => None,
        };

        match verdict {
            Some(Verdict::Unexpected) => tracing::warn!(
                scenario = descriptor.id,
                run_id = %run_id,
                verdict = %Verdict::Unexpected,
                phase = %Phase::Done,
                "scenario finished with an unexpected resolution"
            ),
            Some(v) => tracing::info!(
                scenario = descriptor.id,
                run_id = %run_id,
                verdict = %v,
                phase = %Phase::Done,
                "scenario finished"
            ),
            None => tracing::warn!(
                scenario = descriptor.id,
                run_id = %run_id,
                phase = %Phase::Done,
                "scenario errored"
            ),
        }

        ScenarioResult {
            id: descriptor.id,
            name: descriptor.name,
            outcome,
            verdict,
        }
    }
}

/// Log the probe resolution with full failure detail and the status the
/// classifier maps it to.
fn log_resolution(descriptor: &ScenarioDescriptor, run_id: Uuid, resolution: &ProbeOutcome) {
    match resolution {
        ProbeOutcome::Connected => {
            tracing::info!(scenario = descriptor.id, run_id = %run_id, "probe connected");
        }
        ProbeOutcome::Responded { status, body } => {
            tracing::info!(
                scenario = descriptor.id,
                run_id = %run_id,
                status = %status,
                body = %body,
                "probe got a response"
            );
        }
        ProbeOutcome::Failed(failure) => {
            let classification = classify(failure.kind);
            tracing::info!(
                scenario = descriptor.id,
                run_id = %run_id,
                kind = %failure.kind,
                code = ?failure.code,
                syscall = ?failure.syscall,
                addr = %failure.addr,
                message = %failure.message,
                classified_status = %classification.status,
                classified_message = %classification.message,
                "probe failed"
            );
        }
        ProbeOutcome::TimedOut { window } => {
            tracing::info!(
                scenario = descriptor.id,
                run_id = %run_id,
                window = ?window,
                "probe timed out"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probed(verdict: Verdict) -> ScenarioResult {
        ScenarioResult {
            id: "x",
            name: "x",
            outcome: ScenarioOutcome::Probed(ProbeOutcome::Connected),
            verdict: Some(verdict),
        }
    }

    fn errored() -> ScenarioResult {
        ScenarioResult {
            id: "x",
            name: "x",
            outcome: ScenarioOutcome::Error {
                phase: Phase::SettingUp,
                error: HarnessError::UnknownScenario("x".to_string()),
            },
            verdict: None,
        }
    }

    #[test]
    fn summary_tallies_by_verdict() {
        let summary = RunSummary {
            results: vec![
                probed(Verdict::Expected),
                probed(Verdict::Expected),
                probed(Verdict::AcceptableAlternate),
                probed(Verdict::Unexpected),
                errored(),
            ],
        };
        assert_eq!(summary.expected(), 2);
        assert_eq!(summary.alternates(), 1);
        assert_eq!(summary.unexpected(), 1);
        assert_eq!(summary.errors(), 1);
        assert!(!summary.is_clean());
    }

    #[test]
    fn alternates_keep_a_run_clean() {
        let summary = RunSummary {
            results: vec![probed(Verdict::Expected), probed(Verdict::AcceptableAlternate)],
        };
        assert!(summary.is_clean());
    }

    #[test]
    fn phase_names() {
        assert_eq!(Phase::Pending.to_string(), "pending");
        assert_eq!(Phase::SettingUp.to_string(), "setting-up");
        assert_eq!(Phase::Probing.to_string(), "probing");
        assert_eq!(Phase::TearingDown.to_string(), "tearing-down");
        assert_eq!(Phase::Done.to_string(), "done");
    }
}
