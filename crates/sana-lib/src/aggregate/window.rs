use crate::error::{Result, SanaError};
use crate::signal::{Point, Series, WindowSpec, WindowedSeries};

/// Mean of the values falling in each dynamic window.
///
/// Window starts sit on the grid `offset + j * every`, beginning with the
/// grid cell holding the earliest timestamp and ending at the last start not
/// after the latest timestamp. Each window covers `[start, start + period)`;
/// a zero period covers only the instant `start`. Windows without members are
/// left out of the result.
///
/// Samples are swept once in time order with a running sum, so the cost is
/// one sort plus one step per emitted window however far the windows overlap.
pub fn sliding_mean(series: &Series, spec: &WindowSpec) -> Result<WindowedSeries> {
    spec.validate()?;
    let (t_min, _) = series.time_extent().ok_or_else(|| {
        SanaError::InsufficientData("cannot window an empty series".into())
    })?;

    let every = i128::from(spec.every_ms);
    let period = i128::from(spec.period_ms);
    // Integer milliseconds: a zero period is the span [start, start + 1).
    let span = period.max(1);
    let first_start = i128::from(t_min).div_euclid(every) * every + i128::from(spec.offset_ms);

    // Stable, so equal timestamps keep file order.
    let mut samples: Vec<(i128, f64)> = series
        .points()
        .iter()
        .map(|p| (i128::from(p.time_ms) - first_start, p.value))
        .filter(|&(rel, _)| rel >= 0)
        .collect();
    samples.sort_by_key(|&(rel, _)| rel);

    let n = samples.len();
    let mut points = Vec::new();
    // Members of the current window are samples[tail..head].
    let (mut tail, mut head) = (0usize, 0usize);
    let mut sum = 0.0;
    let mut j: i128 = 0;
    while tail < n {
        let mut start = j * every;
        while tail < head && samples[tail].0 < start {
            sum -= samples[tail].1;
            tail += 1;
        }
        if tail == head {
            if head == n {
                break;
            }
            sum = 0.0;
            match member_windows(samples[head].0, every, period) {
                Some((lo, _)) => {
                    j = j.max(lo);
                    start = j * every;
                }
                None => {
                    head += 1;
                    tail = head;
                    continue;
                }
            }
        }
        while head < n && samples[head].0 < start + span {
            sum += samples[head].1;
            head += 1;
        }

        let window_start = i64::try_from(first_start + start).map_err(|_| {
            SanaError::InvalidWindowSpec("window start outside the representable time range".into())
        })?;
        points.push(Point::new(window_start, sum / (head - tail) as f64));
        j += 1;
    }
    Ok(WindowedSeries { points })
}

/// Inclusive range of window indices whose span holds a point at `rel`
/// milliseconds past the first window start.
fn member_windows(rel: i128, every: i128, period: i128) -> Option<(i128, i128)> {
    if rel < 0 {
        return None;
    }
    let hi = rel / every;
    if period == 0 {
        return (rel % every == 0).then_some((hi, hi));
    }
    let lo = ((rel - period).div_euclid(every) + 1).max(0);
    (lo <= hi).then_some((lo, hi))
}
