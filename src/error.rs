use std::io;

use thiserror::Error;

/// Failures surfaced by the pipeline.
///
/// The variants split into three classes (see [`Error::kind`]): structurally
/// invalid input, mathematically undefined metric evaluations, and I/O
/// failures. All of them abort the current run; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// A distribution side has no samples, so its CDF is undefined.
    #[error("empty sample: the empirical distribution needs at least one value")]
    EmptySample,

    /// Weights must pair one-to-one with the values they weight.
    #[error("values and weights have different lengths: {values} values vs {weights} weights")]
    WeightLengthMismatch { values: usize, weights: usize },

    /// A weight entry is negative, NaN or infinite.
    #[error("invalid weight {weight} at position {index}: weights must be finite and non-negative")]
    InvalidWeight { index: usize, weight: f32 },

    /// The weight vector sums to zero, so the weighted CDF cannot be normalized.
    #[error("weights sum to zero; the weighted CDF cannot be normalized")]
    ZeroWeightSum,

    /// Matrix-level shape problem: row-count mismatch, column mismatch,
    /// ragged or empty table.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// A run parameter is out of its valid range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The tabular reader rejected the file (unparsable cell, bad record).
    #[error("malformed table: {0}")]
    Table(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input data is structurally invalid (shapes, signs, parse failures).
    Validation,
    /// The metric is mathematically undefined for the given inputs.
    Domain,
    /// The surrounding system failed (filesystem, OS).
    Runtime,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptySample | Error::ZeroWeightSum => ErrorKind::Domain,
            Error::WeightLengthMismatch { .. }
            | Error::InvalidWeight { .. }
            | Error::Shape(_)
            | Error::Config(_)
            | Error::Table(_) => ErrorKind::Validation,
            Error::Io(_) => ErrorKind::Runtime,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
