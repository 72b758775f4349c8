//! Main entry point for the chaosctl binary
//!
//! Wires the inventory selector and the HTTP agent transport into the
//! experiment runner.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::signal;

use controller::{
    core,
    services::{HttpAgentTransport, Inventory, InventorySelector},
    ControllerConfig, ExperimentRunner, DEFAULT_AGENT_PORT,
};
use shared::{component_info, logging, ComponentId, ExperimentPhase, FaultDocument};

/// Controller for declarative JVM fault experiments
#[derive(Parser)]
#[command(name = "chaosctl")]
#[command(about = "Validates, resolves and runs JVM fault experiments")]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Upper bound for one call to a single agent, in milliseconds
    #[arg(long, global = true, env = "CHAOSCTL_AGENT_TIMEOUT_MS", default_value = "5000")]
    pub agent_timeout_ms: u64,

    /// Port used for inventory agent addresses without one
    #[arg(long, global = true, default_value_t = DEFAULT_AGENT_PORT)]
    pub agent_port: u16,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a fault document and print its normalized form
    Validate {
        /// Fault document (YAML or JSON)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    /// Show which instances a document would select, without injecting
    Resolve(Selection),
    /// Inject the fault, hold it for its duration (or until Ctrl+C), recover
    Run(Selection),
}

#[derive(Args)]
pub struct Selection {
    /// Fault document (YAML or JSON)
    #[arg(short = 'f', long = "file")]
    pub file: PathBuf,

    /// Inventory of running instances (YAML or JSON)
    #[arg(long)]
    pub inventory: PathBuf,

    /// Seed for target resolution
    #[arg(long)]
    pub seed: Option<u64>,
}

fn read_document(path: &Path) -> anyhow::Result<FaultDocument> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    FaultDocument::parse(&text).with_context(|| format!("parsing {}", path.display()))
}

fn runner(
    selection: &Selection,
    config: ControllerConfig,
) -> anyhow::Result<ExperimentRunner<InventorySelector, HttpAgentTransport>> {
    let inventory = Inventory::from_path(&selection.inventory)?;
    let transport = HttpAgentTransport::new(
        inventory.agent_endpoints(),
        config.default_agent_port,
        config.agent_timeout,
    )?;
    Ok(ExperimentRunner::new(
        InventorySelector::new(inventory),
        transport,
        config.with_seed(selection.seed),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    ComponentId::init_controller();
    logging::init_tracing_with_level(Some(&cli.log_level));

    let config = ControllerConfig {
        agent_timeout: Duration::from_millis(cli.agent_timeout_ms),
        default_agent_port: cli.agent_port,
        ..ControllerConfig::default()
    };

    match cli.command {
        Command::Validate { file } => {
            let document = read_document(&file)?;
            let fault = core::validate(&document)?;
            print!("{}", fault.to_document().to_yaml()?);
        }
        Command::Resolve(selection) => {
            let document = read_document(&selection.file)?;
            let prepared = runner(&selection, config)?.prepare(&document)?;
            let output = json!({
                "experimentId": prepared.id,
                "plan": prepared.plan,
                "payload": prepared.payload,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Run(selection) => {
            let document = read_document(&selection.file)?;
            let runner = runner(&selection, config)?;
            logging::log_startup(ComponentId::current(), &format!("experiment from {}", selection.file.display()));

            let shutdown = async {
                match signal::ctrl_c().await {
                    Ok(()) => logging::log_shutdown(ComponentId::current(), "Received Ctrl+C signal"),
                    Err(err) => {
                        logging::log_error(ComponentId::current(), "Signal handling", &err);
                        // no signal source: hold until the duration elapses
                        std::future::pending::<()>().await;
                    }
                }
            };

            let experiment = runner.run_until(&document, shutdown).await?;
            println!("{}", serde_json::to_string_pretty(&experiment.status)?);

            match experiment.status.phase {
                ExperimentPhase::Recovered => {
                    component_info!(ComponentId::current(), experiment = %experiment.id, "Experiment finished");
                }
                phase => anyhow::bail!("experiment {} ended as {phase:?}", experiment.id),
            }
        }
    }

    Ok(())
}
