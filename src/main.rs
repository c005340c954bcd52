//! Network fault-injection harness.
//!
//! Reproduces low-level connection failures and checks that a simulated
//! load balancer translates them into well-defined HTTP error responses.
//!
//! # Architecture Overview
//!
//! ```text
//!     CLI (--basic | --cluster | --scenario <id> | --list)
//!          │
//!          ▼
//!     ┌──────────────────┐      ┌──────────────────────────────────┐
//!     │ ScenarioRegistry │─────▶│          ScenarioRunner          │
//!     │ (builtin catalog)│      │  per scenario, strictly in turn: │
//!     └──────────────────┘      │    setup    (bind fixed ports)   │
//!                               │    probe    (raw | HTTP, bounded)│
//!                               │    teardown (ports released)     │
//!                               └───────────────┬──────────────────┘
//!                                               │
//!                 ┌─────────────┐   forwards    │   probes
//!                 │   target    │◀──────────────┴──────────────┐
//!                 │  endpoint   │       ┌─────────────┐        │
//!                 │ (backend    │◀──────│    proxy    │◀───────┘
//!                 │  simulator) │       │  endpoint   │
//!                 └─────────────┘       └─────────────┘
//!
//!     faults: io::Error ─▶ FailureKind ─▶ (status, canonical message)
//! ```

use std::path::PathBuf;

use clap::{Args, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fault_harness::config::{load_config, HarnessConfig};
use fault_harness::scenario::{
    Category, HarnessError, ScenarioRegistry, ScenarioRunner, SelectionFilter,
};

#[derive(Parser)]
#[command(name = "fault-harness")]
#[command(about = "Reproduce and classify network connection failures", long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    selection: Selection,

    /// List the scenario catalog and exit.
    #[arg(long)]
    list: bool,

    /// Keep the process alive after the run, until Ctrl+C.
    #[arg(long)]
    keep_alive: bool,

    /// Exit non-zero when any resolution is unexpected or any scenario errors.
    #[arg(long)]
    strict: bool,
}

/// Mutually exclusive scenario selection.
#[derive(Args)]
#[group(multiple = false)]
struct Selection {
    /// Run only the basic scenarios.
    #[arg(long)]
    basic: bool,

    /// Run only the cluster-simulation scenarios.
    #[arg(long)]
    cluster: bool,

    /// Run a single scenario by id.
    #[arg(long, value_name = "ID")]
    scenario: Option<String>,
}

impl Selection {
    fn filter(&self) -> SelectionFilter {
        if self.basic {
            SelectionFilter::Category(Category::Basic)
        } else if self.cluster {
            SelectionFilter::Category(Category::ClusterSimulation)
        } else if let Some(id) = &self.scenario {
            SelectionFilter::Id(id.clone())
        } else {
            SelectionFilter::All
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fault_harness=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    tracing::info!("fault-harness v0.1.0 starting");

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HarnessConfig::default(),
    };

    tracing::info!(
        proxy_port = config.endpoints.proxy_port,
        target_port = config.endpoints.target_port,
        probe_window_secs = config.timeouts.probe_secs,
        "configuration loaded"
    );

    let registry = ScenarioRegistry::builtin();

    if cli.list {
        for descriptor in registry.descriptors() {
            println!(
                "{:<20} [{}] {}",
                descriptor.id, descriptor.category, descriptor.description
            );
        }
        return Ok(());
    }

    let filter = cli.selection.filter();
    if let SelectionFilter::Id(id) = &filter {
        if registry.select(&filter).is_empty() {
            return Err(HarnessError::UnknownScenario(id.clone()).into());
        }
    }

    let runner = ScenarioRunner::new(config);
    let summary = runner.run(&registry, &filter).await;

    if cli.keep_alive {
        tracing::info!("run finished, staying alive until Ctrl+C");
        tokio::signal::ctrl_c().await?;
    }

    if cli.strict && !summary.is_clean() {
        return Err(format!(
            "strict mode: {} unexpected resolution(s), {} error(s)",
            summary.unexpected(),
            summary.errors()
        )
        .into());
    }

    tracing::info!("shutdown complete");
    Ok(())
}
