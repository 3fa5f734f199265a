pub mod binseg;

pub use binseg::{BinarySegmentation, BinarySegmentationConfig};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectorError {
    #[error("{len} samples cannot form {segments} segments (need at least {min})")]
    TooShort {
        len: usize,
        segments: usize,
        min: usize,
    },
    #[error("{0}")]
    Failed(String),
}

/// Offline change-point search over a plain value sequence.
///
/// Implementations return the split positions for `n_segments` segments:
/// ascending indices into `values`, at most `n_segments - 1` of them.
pub trait ChangePointDetector {
    fn detect(&self, values: &[f64], n_segments: usize) -> Result<Vec<usize>, DetectorError>;
}

impl<D: ChangePointDetector + ?Sized> ChangePointDetector for &D {
    fn detect(&self, values: &[f64], n_segments: usize) -> Result<Vec<usize>, DetectorError> {
        (**self).detect(values, n_segments)
    }
}

impl<D: ChangePointDetector + ?Sized> ChangePointDetector for Box<D> {
    fn detect(&self, values: &[f64], n_segments: usize) -> Result<Vec<usize>, DetectorError> {
        (**self).detect(values, n_segments)
    }
}
