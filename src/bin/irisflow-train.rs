//! Offline training entry point: hyperparameter sweeps and single runs.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use irisflow::dataset::Dataset;
use irisflow::model::Hyperparams;
use irisflow::search::SearchSpace;
use irisflow::store::FsRunStore;
use irisflow::train::{TrainOptions, Trainer};

#[derive(Parser)]
#[command(
    name = "irisflow-train",
    version,
    about = "Train classifier configurations and record each attempt as a run"
)]
struct Cli {
    /// Root directory of the run store.
    #[arg(long, default_value = "mlruns")]
    store: PathBuf,

    /// Experiment name runs are recorded under.
    #[arg(long, default_value = "iris-rf")]
    experiment: String,

    /// CSV dataset (last column is the label); defaults to the bundled Iris data.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Held-out fraction for the evaluation split.
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,

    /// Seed for the train/test split.
    #[arg(long, default_value_t = 42)]
    split_seed: u64,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Random search over the default hyperparameter grid.
    Search {
        /// Number of independent trials.
        #[arg(long, default_value_t = 10)]
        n_trials: usize,

        /// Seed for configuration sampling.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// One run with the fixed named configuration.
    Single {
        /// Std deviation of additive gaussian noise on the training features.
        #[arg(long)]
        noise_std: Option<f64>,

        /// Report mean accuracy over this many cross-validation folds.
        #[arg(long)]
        cv_folds: Option<usize>,
    },
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
    let dataset = match &cli.dataset {
        Some(path) => Dataset::from_csv_path(path)
            .with_context(|| format!("loading dataset {}", path.display()))?,
        None => Dataset::iris().context("loading bundled iris dataset")?,
    };
    let trainer = Trainer::new(&store, dataset, cli.test_fraction, cli.split_seed)
        .context("splitting dataset")?;

    match cli.cmd {
        Command::Search { n_trials, seed } => {
            let outcome = trainer
                .run_search(&cli.experiment, &SearchSpace::default(), n_trials, seed)
                .context("hyperparameter search")?;
            println!(
                "best: accuracy {:.2}% with {:?}",
                outcome.best_accuracy * 100.0,
                outcome.best_params
            );
        }
        Command::Single {
            noise_std,
            cv_folds,
        } => {
            let options = TrainOptions {
                noise_std,
                cv_folds,
            };
            let outcome = trainer
                .train_single(&cli.experiment, &Hyperparams::default(), &options)
                .context("single training run")?;
            if let Some(cv) = outcome.cv_accuracy {
                println!("cross-validation: {:.2}%", cv * 100.0);
            }
            println!(
                "run {}: accuracy {:.2}%",
                outcome.run_id,
                outcome.accuracy * 100.0
            );
        }
    }
    Ok(())
}
