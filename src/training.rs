//! Fit-and-predict driver.
//!
//! The loop is deliberately plain: seeded shuffle for the validation split,
//! then one Adam step per batch with the Wasserstein loss, and a per-epoch
//! validation pass on the non-autodiff backend. The full loss history is
//! returned so callers can inspect convergence.

use burn::config::Config;
use burn::module::{AutodiffModule, Module};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::{
    backend::{AutodiffBackend, Backend},
    ElementConversion, Tensor, TensorData,
};
use ndarray::Array2;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::Error;
use crate::loss::WassersteinLoss;
use crate::model::{SignatureNet, SignatureNetConfig};

#[derive(Config, Debug)]
pub struct TrainConfig {
    #[config(default = 30)]
    pub epochs: usize,
    #[config(default = 1)]
    pub batch_size: usize,
    /// Fraction of the training rows held back for validation.
    #[config(default = 0.1)]
    pub validation_split: f64,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
    /// Seeds the validation-split shuffle, the only stochastic step.
    #[config(default = 1492)]
    pub seed: u64,
}

/// Per-epoch loss curves. `valid_loss` is empty when the split holds back no
/// rows.
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub train_loss: Vec<f32>,
    pub valid_loss: Vec<f32>,
}

#[derive(Debug)]
pub struct FitOutcome<B: AutodiffBackend> {
    pub model: SignatureNet<B>,
    pub history: TrainingHistory,
}

/// Trains a fresh [`SignatureNet`] on matched signature rows.
///
/// The topology is derived from the matrix shapes; the loss adapter carries
/// the shared weight vector. Metric errors abort training immediately.
pub fn fit<B: AutodiffBackend>(
    device: &B::Device,
    config: &TrainConfig,
    improper: &Array2<f32>,
    proper: &Array2<f32>,
    loss: &WassersteinLoss,
) -> crate::error::Result<FitOutcome<B>> {
    if improper.nrows() != proper.nrows() {
        return Err(Error::Shape(format!(
            "{} input rows but {} target rows",
            improper.nrows(),
            proper.nrows()
        )));
    }
    if improper.nrows() == 0 {
        return Err(Error::Shape("no training rows".into()));
    }
    if config.epochs == 0 || config.batch_size == 0 {
        return Err(Error::Config("epochs and batch size must be at least 1".into()));
    }
    if !(0.0..1.0).contains(&config.validation_split) {
        return Err(Error::Config(format!(
            "validation split must be in [0, 1), got {}",
            config.validation_split
        )));
    }

    let rows = improper.nrows();
    let mut order: Vec<usize> = (0..rows).collect();
    order.shuffle(&mut StdRng::seed_from_u64(config.seed));
    let held_back = ((rows as f64) * config.validation_split).round() as usize;
    let held_back = held_back.min(rows - 1);
    let (valid_idx, train_idx) = order.split_at(held_back);

    let mut model = SignatureNetConfig::new(improper.ncols(), proper.ncols()).init::<B>(device)?;
    log::info!(
        "training on {} rows ({} held back), {} parameters",
        train_idx.len(),
        valid_idx.len(),
        model.num_params()
    );
    let mut optim = AdamConfig::new().init::<B, SignatureNet<B>>();

    let mut history = TrainingHistory::default();
    for epoch in 1..=config.epochs {
        let mut total = 0.0f32;
        let mut batches = 0usize;
        for chunk in train_idx.chunks(config.batch_size) {
            let inputs = rows_to_tensor::<B>(improper, chunk, device);
            let targets = rows_to_tensor::<B>(proper, chunk, device);
            let predictions = model.forward(inputs);
            let batch_loss = loss.forward(targets, predictions)?;
            total += batch_loss.clone().into_scalar().elem::<f32>();
            let grads = GradientsParams::from_grads(batch_loss.backward(), &model);
            model = optim.step(config.learning_rate, model, grads);
            batches += 1;
        }
        let train_loss = total / batches as f32;
        history.train_loss.push(train_loss);

        if valid_idx.is_empty() {
            println!("Epoch {epoch}/{}  train loss {train_loss:.6}", config.epochs);
        } else {
            let inner = model.valid();
            let inputs = rows_to_tensor::<B::InnerBackend>(improper, valid_idx, device);
            let targets = rows_to_tensor::<B::InnerBackend>(proper, valid_idx, device);
            let valid_loss: f32 = loss
                .forward(targets, inner.forward(inputs))?
                .into_scalar()
                .elem();
            history.valid_loss.push(valid_loss);
            println!(
                "Epoch {epoch}/{}  train loss {train_loss:.6}  valid loss {valid_loss:.6}",
                config.epochs
            );
        }
    }

    Ok(FitOutcome { model, history })
}

/// Applies a fitted model to every row of `input`.
pub fn predict<B: Backend>(
    model: &SignatureNet<B>,
    device: &B::Device,
    input: &Array2<f32>,
) -> crate::error::Result<Array2<f32>> {
    if input.ncols() != model.num_features() {
        return Err(Error::Shape(format!(
            "prediction rows have {} columns but the model expects {}",
            input.ncols(),
            model.num_features()
        )));
    }
    if input.nrows() == 0 {
        return Err(Error::Shape("no rows to predict".into()));
    }

    let all: Vec<usize> = (0..input.nrows()).collect();
    let output = model.forward(rows_to_tensor::<B>(input, &all, device));
    let [rows, cols] = output.dims();
    let flat: Vec<f32> = output
        .into_data()
        .convert::<f32>()
        .to_vec()
        .expect("forward output converted to f32");
    Ok(Array2::from_shape_vec((rows, cols), flat).expect("forward output is dense row-major"))
}

fn rows_to_tensor<B: Backend>(
    matrix: &Array2<f32>,
    rows: &[usize],
    device: &B::Device,
) -> Tensor<B, 2> {
    let cols = matrix.ncols();
    let mut data = Vec::with_capacity(rows.len() * cols);
    for &row in rows {
        data.extend(matrix.row(row).iter().copied());
    }
    Tensor::from_floats(TensorData::new(data, [rows.len(), cols]), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type B = Autodiff<NdArray<f32>>;

    fn loss() -> WassersteinLoss {
        WassersteinLoss::new(vec![1.0; 4]).expect("weights")
    }

    #[test]
    fn mismatched_row_counts_are_rejected() {
        let improper = Array2::zeros((3, 4));
        let proper = Array2::zeros((2, 2));
        let err = fit::<B>(
            &Default::default(),
            &TrainConfig::new(),
            &improper,
            &proper,
            &loss(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn out_of_range_split_is_rejected() {
        let improper = Array2::zeros((2, 4));
        let proper = Array2::zeros((2, 2));
        let config = TrainConfig::new().with_validation_split(1.0);
        let err = fit::<B>(&Default::default(), &config, &improper, &proper, &loss()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn predict_rejects_wrong_width() {
        let model = crate::model::SignatureNetConfig::new(4, 2)
            .init::<NdArray<f32>>(&Default::default())
            .expect("model");
        let input = Array2::zeros((1, 6));
        let err = predict(&model, &Default::default(), &input).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }
}
