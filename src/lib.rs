//! Signature regression with a weighted Wasserstein training loss.
//!
//! `sigfit` fits a small convolutional regression model that maps "improper"
//! numeric signatures to "proper" target signatures. Instead of a pointwise
//! loss, training minimizes the weighted 1-D Wasserstein distance between the
//! predicted and target rows, treated as weighted empirical distributions
//! (see [`metric`]). The pipeline is a single batch run: load tabular data,
//! fit, predict on a held-out matrix, write the predictions back out.

pub mod data;
pub mod error;
pub mod loss;
pub mod metric;
pub mod model;
pub mod training;

pub use error::{Error, ErrorKind, Result};

/// Default backend for the pipeline: CPU tensors with autodiff on top.
pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray<f32>>;
