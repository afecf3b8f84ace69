use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use burn::backend::ndarray::NdArrayDevice;
use burn::module::AutodiffModule;
use clap::Parser;
use sigfit::data::{read_matrix, write_matrix};
use sigfit::loss::WassersteinLoss;
use sigfit::training::{fit, predict, TrainConfig};
use sigfit::TrainBackend;

#[derive(Parser)]
#[command(name = "sigfit")]
#[command(about = "Fit a signature regression model with a weighted Wasserstein loss")]
struct Cli {
    /// Weight table: one row, one non-negative weight per signature feature
    #[arg(long, default_value = "data/weights.csv")]
    weights: PathBuf,

    /// Training inputs: one improper signature per row
    #[arg(long, default_value = "data/signature_improper.csv")]
    improper: PathBuf,

    /// Training targets: one proper signature per row
    #[arg(long, default_value = "data/signature_proper.csv")]
    proper: PathBuf,

    /// Held-out signatures to predict on after training
    #[arg(long, default_value = "data/input.csv")]
    input: PathBuf,

    /// Destination for the predicted signatures
    #[arg(long, default_value = "data/output.csv")]
    output: PathBuf,

    #[arg(long, default_value_t = 30)]
    epochs: usize,

    #[arg(long, default_value_t = 1)]
    batch_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// Fraction of training rows held back for validation
    #[arg(long, default_value_t = 0.1)]
    validation_split: f64,

    /// Seed for the validation-split shuffle
    #[arg(long, default_value_t = 1492)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let weights = read_matrix(&cli.weights)
        .with_context(|| format!("load: weight table {}", cli.weights.display()))?;
    let improper = read_matrix(&cli.improper)
        .with_context(|| format!("load: improper signatures {}", cli.improper.display()))?;
    let proper = read_matrix(&cli.proper)
        .with_context(|| format!("load: proper signatures {}", cli.proper.display()))?;
    let input = read_matrix(&cli.input)
        .with_context(|| format!("load: held-out input {}", cli.input.display()))?;

    println!(
        "loaded: improper {}x{}, proper {}x{}, weights {}x{}, held-out {}x{}",
        improper.nrows(),
        improper.ncols(),
        proper.nrows(),
        proper.ncols(),
        weights.nrows(),
        weights.ncols(),
        input.nrows(),
        input.ncols()
    );

    if improper.nrows() != proper.nrows() {
        bail!(
            "load: {} improper rows but {} proper rows",
            improper.nrows(),
            proper.nrows()
        );
    }
    if input.ncols() != improper.ncols() {
        bail!(
            "load: held-out rows have {} columns but training rows have {}",
            input.ncols(),
            improper.ncols()
        );
    }
    if weights.ncols() != improper.ncols() {
        bail!(
            "load: weight vector has {} entries but signatures have {} features",
            weights.ncols(),
            improper.ncols()
        );
    }
    if weights.ncols() < proper.ncols() {
        bail!(
            "load: weight vector has {} entries but target rows need {}",
            weights.ncols(),
            proper.ncols()
        );
    }
    if weights.nrows() > 1 {
        log::warn!(
            "weight table has {} rows; only the first is used",
            weights.nrows()
        );
    }

    let loss = WassersteinLoss::new(weights.row(0).to_vec())
        .context("load: weight vector rejected")?;

    let config = TrainConfig::new()
        .with_epochs(cli.epochs)
        .with_batch_size(cli.batch_size)
        .with_learning_rate(cli.learning_rate)
        .with_validation_split(cli.validation_split)
        .with_seed(cli.seed);

    let device = NdArrayDevice::default();
    let outcome = fit::<TrainBackend>(&device, &config, &improper, &proper, &loss)
        .context("train: fitting failed")?;

    let model = outcome.model.valid();
    let predictions = predict(&model, &device, &input).context("predict: inference failed")?;
    write_matrix(&cli.output, &predictions)
        .with_context(|| format!("write: predictions {}", cli.output.display()))?;

    println!(
        "wrote {} predictions ({} columns) to {}",
        predictions.nrows(),
        predictions.ncols(),
        cli.output.display()
    );
    Ok(())
}
