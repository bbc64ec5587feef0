//! Serving entry point.
//!
//! Loads the best model for the experiment exactly once at startup; if no
//! validated model is available the process exits with code 1 rather than
//! serving degraded. Once ready, it answers line-delimited JSON predict
//! requests on stdin with one JSON response per line (transport framework
//! wiring is out of scope for the pipeline).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use irisflow::serve::{ErrorResponse, PredictRequest, PredictorService};
use irisflow::store::FsRunStore;

#[derive(Parser)]
#[command(
    name = "irisflow-serve",
    version,
    about = "Serve predictions from the best recorded run"
)]
struct Cli {
    /// Root directory of the run store.
    #[arg(long, default_value = "mlruns")]
    store: PathBuf,

    /// Experiment to select the model from.
    #[arg(long, default_value = "iris-rf")]
    experiment: String,

    /// Print the health payload and exit.
    #[arg(long)]
    probe: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = FsRunStore::open(&cli.store)
        .with_context(|| format!("opening run store at {}", cli.store.display()))?;

    let service = match PredictorService::start(&store, &cli.experiment) {
        Ok(service) => service,
        Err(e) => {
            // Never serve without a validated model.
            error!(experiment = %cli.experiment, error = %e, "startup model load failed");
            std::process::exit(1);
        }
    };

    let stdout = io::stdout();
    if cli.probe {
        serde_json::to_writer(stdout.lock(), &service.health())?;
        println!();
        return Ok(());
    }

    info!(experiment = %cli.experiment, "accepting requests on stdin");
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (status, body) = match serde_json::from_str::<PredictRequest>(&line) {
            Ok(request) => match service.predict(&request) {
                Ok(response) => (200, serde_json::to_value(&response)?),
                Err(e) => (e.status(), serde_json::to_value(e.to_response())?),
            },
            Err(e) => (
                400,
                serde_json::to_value(ErrorResponse {
                    error: format!("malformed request: {e}"),
                })?,
            ),
        };
        info!(status, "request handled");
        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, &body)?;
        writeln!(out)?;
    }
    Ok(())
}
