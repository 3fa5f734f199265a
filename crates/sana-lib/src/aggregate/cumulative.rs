use crate::error::{Result, SanaError};
use crate::signal::{CumulativeSeries, Point, Series};

/// Prefix sum of the values in series order, keyed by each sample's time.
pub fn cumulative_sum(series: &Series) -> Result<CumulativeSeries> {
    if series.is_empty() {
        return Err(SanaError::InsufficientData(
            "cannot accumulate an empty series".into(),
        ));
    }
    let mut total = 0.0;
    let points = series
        .points()
        .iter()
        .map(|p| {
            total += p.value;
            Point::new(p.time_ms, total)
        })
        .collect();
    Ok(CumulativeSeries { points })
}
