//! Demo runner for a cobridge co-simulation session.
//!
//! Loads a node configuration file, starts a session against the
//! in-process loopback framework, and drives a number of lockstep
//! exchanges, playing both the engine (this thread) and the
//! co-simulation network (the loopback driver). Useful for exercising
//! the full handshake without a live transport.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use cobridge_core::{ExchangeReply, LoopbackNode, NodeConfig, Session, SessionConfig, SimTime};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cobridge", about = "Run a loopback co-simulation session")]
struct Args {
    /// Path to the node configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Number of lockstep exchanges to run.
    #[arg(long, default_value_t = 10)]
    steps: u64,

    /// Simulated seconds per step.
    #[arg(long, default_value_t = 60.0)]
    step_size: f64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = NodeConfig::from_file(&args.config)?;
    info!(
        name = %config.name,
        workspace = config.workspace.as_deref().unwrap_or(""),
        timeout = ?config.timeout,
        "starting co-simulation node"
    );

    // Demo plant: echo the engine's outputs with a slow drift so each
    // step's inputs are visibly distinct in the log.
    let (node, driver) = LoopbackNode::new(
        config.name.clone(),
        Box::new(|outputs, sim_time| {
            let drift = sim_time.as_secs_f64() / 3600.0;
            outputs.iter().map(|v| v + drift).collect()
        }),
    );
    let session = Session::start(node, SessionConfig::from(&config))?;

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))?;
    }

    session.await_start()?;
    info!("node initialized");

    let step = SimTime::from_secs(args.step_size);
    let mut outputs = vec![21.0, 0.5];
    for n in 0..args.steps {
        if interrupted.load(Ordering::SeqCst) {
            warn!("interrupted, stopping session");
            break;
        }

        driver.advance(step);
        match session.exchange(&outputs)? {
            ExchangeReply::Step { values, sim_time } => {
                info!(step = n, %sim_time, inputs = ?values, "exchange complete");
                // Feed the inputs back as the next outputs.
                if !values.is_empty() {
                    outputs = values;
                }
            }
            ExchangeReply::Terminated => {
                info!("node terminated normally");
                if session.quit_engine_on_terminate() {
                    info!("configuration requests engine shutdown");
                }
                break;
            }
            ExchangeReply::Aborted => {
                warn!("node aborted the session");
                break;
            }
        }
    }

    driver.terminate();
    // Dropping the session posts EXIT and joins the node thread.
    Ok(())
}
