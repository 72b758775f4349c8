//! Agent entry point
//!
//! Runs inside each instance and serves the fault API until Ctrl+C.

use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use agent::{bind, serve, AgentState};
use shared::{logging, ComponentId};

/// Fault agent serving apply/recover instructions
#[derive(Parser, Debug)]
#[command(name = "chaos-agent")]
#[command(about = "Receives fault instructions from chaosctl")]
struct Args {
    /// Address to serve the agent API on
    #[arg(long, env = "CHAOS_AGENT_BIND", default_value = "0.0.0.0:9288")]
    bind: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    ComponentId::init_agent();
    logging::init_tracing_with_level(Some(&args.log_level));

    let (listener, local) = bind(&args.bind).await?;
    logging::log_startup(ComponentId::current(), &format!("fault agent on http://{local}"));

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => logging::log_shutdown(ComponentId::current(), "Received Ctrl+C signal"),
            Err(err) => logging::log_error(ComponentId::current(), "Signal handling", &err),
        }
    };

    serve(listener, Arc::new(AgentState::new()), shutdown).await?;
    logging::log_success(ComponentId::current(), "Agent stopped gracefully");
    Ok(())
}
