//! Batch loss adapter around the weighted Wasserstein metric.
//!
//! Trainers hand a loss function `(labels, predictions)` pairs; the metric
//! wants two flat value sequences plus their weights. `WassersteinLoss`
//! closes over the externally loaded weight vector and bridges the two
//! signatures, using the same weights for both sides of every comparison.

use burn::tensor::{backend::Backend, Tensor};

use crate::error::{Error, Result};
use crate::metric::weighted_wasserstein;

/// Wasserstein training loss with a fixed, shared weight vector.
///
/// The weight vector is injected once at construction and reused for the
/// label side and the prediction side of every example. When rows are
/// shorter than the vector, only the leading entries take part — value ranks
/// index the weight vector positionally, so trailing entries can never be
/// touched by a shorter row.
#[derive(Debug, Clone)]
pub struct WassersteinLoss {
    weights: Vec<f32>,
}

impl WassersteinLoss {
    /// Binds the shared weight vector, rejecting negative, non-finite or
    /// all-zero weights up front.
    pub fn new(weights: Vec<f32>) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::ZeroWeightSum);
        }
        let mut sum = 0.0f32;
        for (index, &weight) in weights.iter().enumerate() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidWeight { index, weight });
            }
            sum += weight;
        }
        if sum <= 0.0 {
            return Err(Error::ZeroWeightSum);
        }
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Mean weighted Wasserstein distance over a batch.
    ///
    /// `labels` and `predictions` are `[batch, width]` tensors; each row is
    /// flattened and compared as one empirical distribution. The returned
    /// single-element tensor participates in the caller's backward pass.
    pub fn forward<B: Backend>(
        &self,
        labels: Tensor<B, 2>,
        predictions: Tensor<B, 2>,
    ) -> Result<Tensor<B, 1>> {
        let [batch, width] = labels.dims();
        let [pred_batch, pred_width] = predictions.dims();
        if batch != pred_batch || width != pred_width {
            return Err(Error::Shape(format!(
                "labels are {batch}x{width} but predictions are {pred_batch}x{pred_width}"
            )));
        }
        if batch == 0 {
            return Err(Error::EmptySample);
        }
        if self.weights.len() < width {
            return Err(Error::WeightLengthMismatch {
                values: width,
                weights: self.weights.len(),
            });
        }
        let weights = &self.weights[..width];

        let mut per_row = Vec::with_capacity(batch);
        for row in 0..batch {
            let predicted: Tensor<B, 1> = predictions
                .clone()
                .slice([row..row + 1, 0..width])
                .reshape([width]);
            let label: Tensor<B, 1> =
                labels.clone().slice([row..row + 1, 0..width]).reshape([width]);
            per_row.push(weighted_wasserstein(predicted, label, weights, weights)?);
        }
        Ok(Tensor::cat(per_row, 0).mean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type B = NdArray<f32>;

    fn matrix(rows: &[&[f32]]) -> Tensor<B, 2> {
        let cols = rows[0].len();
        let flat: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Tensor::from_floats(TensorData::new(flat, [rows.len(), cols]), &Default::default())
    }

    #[test]
    fn batch_mean_of_row_distances() {
        let loss = WassersteinLoss::new(vec![1.0, 1.0]).expect("weights");
        // Row distances are 1.0 and 0.0, so the batch mean is 0.5.
        let labels = matrix(&[&[1.0, 1.0], &[0.0, 1.0]]);
        let predictions = matrix(&[&[0.0, 0.0], &[0.0, 1.0]]);
        let value = loss.forward(labels, predictions).expect("loss").into_scalar();
        assert!((value - 0.5).abs() < 1e-6, "expected 0.5, got {value}");
    }

    #[test]
    fn argument_order_does_not_change_the_value() {
        let loss = WassersteinLoss::new(vec![2.0, 1.0, 0.5]).expect("weights");
        let a = matrix(&[&[0.5, -1.0, 2.0]]);
        let b = matrix(&[&[1.5, 0.0, -2.0]]);
        let ab = loss.forward(a.clone(), b.clone()).expect("loss").into_scalar();
        let ba = loss.forward(b, a).expect("loss").into_scalar();
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn longer_weight_vector_is_sliced_to_the_row_width() {
        // Only the first two weights can ever be gathered for width-2 rows.
        let sliced = WassersteinLoss::new(vec![3.0, 1.0]).expect("weights");
        let padded = WassersteinLoss::new(vec![3.0, 1.0, 99.0, 7.0]).expect("weights");
        let labels = matrix(&[&[0.0, 1.0]]);
        let predictions = matrix(&[&[1.0, 0.5]]);
        let a = sliced
            .forward(labels.clone(), predictions.clone())
            .expect("loss")
            .into_scalar();
        let b = padded.forward(labels, predictions).expect("loss").into_scalar();
        assert_eq!(a, b);
    }

    #[test]
    fn short_weight_vector_is_rejected() {
        let loss = WassersteinLoss::new(vec![1.0]).expect("weights");
        let labels = matrix(&[&[0.0, 1.0]]);
        let predictions = matrix(&[&[1.0, 0.0]]);
        let err = loss.forward(labels, predictions).unwrap_err();
        assert!(matches!(
            err,
            Error::WeightLengthMismatch { values: 2, weights: 1 }
        ));
    }

    #[test]
    fn invalid_weight_vectors_are_rejected_at_construction() {
        assert!(matches!(
            WassersteinLoss::new(vec![1.0, -2.0]).unwrap_err(),
            Error::InvalidWeight { index: 1, .. }
        ));
        assert!(matches!(
            WassersteinLoss::new(vec![0.0, 0.0]).unwrap_err(),
            Error::ZeroWeightSum
        ));
        assert!(matches!(
            WassersteinLoss::new(vec![]).unwrap_err(),
            Error::ZeroWeightSum
        ));
    }
}
