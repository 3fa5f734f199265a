use crate::detectors::{ChangePointDetector, DetectorError};
use crate::error::{Result, SanaError};
use crate::signal::{SegmentBoundaries, Series};

/// Run `detector` on the values of `series` and return its change points as
/// series indices.
///
/// Only the value sequence is handed over; timestamps play no part in the
/// search. The detector's answer is checked against its contract (at most
/// `n_segments - 1` strictly ascending in-range indices) but otherwise
/// passed through untouched.
pub fn segment<D>(series: &Series, n_segments: usize, detector: &D) -> Result<SegmentBoundaries>
where
    D: ChangePointDetector + ?Sized,
{
    if n_segments == 0 {
        return Err(SanaError::InvalidSegmentCount);
    }
    if series.is_empty() {
        return Err(SanaError::InsufficientData(
            "cannot segment an empty series".into(),
        ));
    }

    let values = series.values();
    let indices = detector
        .detect(&values, n_segments)
        .map_err(|err| match err {
            DetectorError::TooShort { .. } => SanaError::InsufficientData(err.to_string()),
            DetectorError::Failed(reason) => SanaError::DelegateFailure(reason),
        })?;

    check_contract(&indices, series.len(), n_segments)?;
    Ok(SegmentBoundaries::from_indices(indices))
}

fn check_contract(indices: &[usize], len: usize, n_segments: usize) -> Result<()> {
    if indices.len() > n_segments - 1 {
        return Err(SanaError::DelegateFailure(format!(
            "returned {} boundaries for {} segments",
            indices.len(),
            n_segments
        )));
    }
    if let Some(&idx) = indices.iter().find(|&&idx| idx >= len) {
        return Err(SanaError::DelegateFailure(format!(
            "boundary {idx} outside series of length {len}"
        )));
    }
    if indices.windows(2).any(|w| w[0] >= w[1]) {
        return Err(SanaError::DelegateFailure(format!(
            "boundaries not strictly ascending: {indices:?}"
        )));
    }
    Ok(())
}
