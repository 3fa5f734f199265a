use super::{ChangePointDetector, DetectorError};
use serde::{Deserialize, Serialize};

/// Configuration for [`BinarySegmentation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinarySegmentationConfig {
    /// Fewest samples any segment may hold.
    pub min_segment_len: usize,
}

impl Default for BinarySegmentationConfig {
    fn default() -> Self {
        Self { min_segment_len: 2 }
    }
}

/// Greedy binary segmentation under a squared-error (mean shift) cost.
///
/// Each round splits the segment whose best admissible split lowers the total
/// cost the most, until the requested number of segments is reached or no
/// segment can be split without violating `min_segment_len`.
#[derive(Debug, Clone, Default)]
pub struct BinarySegmentation {
    config: BinarySegmentationConfig,
}

impl BinarySegmentation {
    pub fn new(config: BinarySegmentationConfig) -> Result<Self, DetectorError> {
        if config.min_segment_len == 0 {
            return Err(DetectorError::Failed(
                "min_segment_len must be >= 1; got 0".into(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &BinarySegmentationConfig {
        &self.config
    }

    /// Cost reduction from a single split of the whole sequence, indexed by
    /// split position. Positions closer than `min_segment_len` to either end
    /// are not admissible and score zero.
    pub fn profile(&self, values: &[f64]) -> Result<Vec<f64>, DetectorError> {
        check_finite(values)?;
        let sums = PrefixSums::new(values);
        let min_len = self.config.min_segment_len;
        let mut gains = vec![0.0; values.len()];
        if values.len() >= 2 * min_len {
            for split in min_len..=(values.len() - min_len) {
                gains[split] = sums.split_gain(0, split, values.len());
            }
        }
        Ok(gains)
    }
}

fn check_finite(values: &[f64]) -> Result<(), DetectorError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(DetectorError::Failed(format!(
            "value at index {idx} is not finite"
        ))),
        None => Ok(()),
    }
}

struct PrefixSums {
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
}

impl PrefixSums {
    fn new(values: &[f64]) -> Self {
        let mut sum = Vec::with_capacity(values.len() + 1);
        let mut sum_sq = Vec::with_capacity(values.len() + 1);
        sum.push(0.0);
        sum_sq.push(0.0);
        for &v in values {
            sum.push(sum[sum.len() - 1] + v);
            sum_sq.push(sum_sq[sum_sq.len() - 1] + v * v);
        }
        Self { sum, sum_sq }
    }

    /// Sum of squared deviations from the mean over `[start, end)`.
    fn cost(&self, start: usize, end: usize) -> f64 {
        let n = (end - start) as f64;
        let s = self.sum[end] - self.sum[start];
        let ss = self.sum_sq[end] - self.sum_sq[start];
        (ss - s * s / n).max(0.0)
    }

    fn split_gain(&self, start: usize, split: usize, end: usize) -> f64 {
        self.cost(start, end) - self.cost(start, split) - self.cost(split, end)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    split: Option<(usize, f64)>,
}

impl BinarySegmentation {
    fn candidate(&self, sums: &PrefixSums, start: usize, end: usize) -> Candidate {
        let min_len = self.config.min_segment_len;
        let mut best: Option<(usize, f64)> = None;
        if end - start >= 2 * min_len {
            for split in (start + min_len)..=(end - min_len) {
                let gain = sums.split_gain(start, split, end);
                if best.map_or(true, |(_, g)| gain > g) {
                    best = Some((split, gain));
                }
            }
        }
        Candidate {
            start,
            end,
            split: best,
        }
    }
}

impl ChangePointDetector for BinarySegmentation {
    fn detect(&self, values: &[f64], n_segments: usize) -> Result<Vec<usize>, DetectorError> {
        if n_segments == 0 {
            return Err(DetectorError::Failed("n_segments must be >= 1".into()));
        }
        let min = n_segments.saturating_mul(self.config.min_segment_len);
        if n_segments > 1 && values.len() < min {
            return Err(DetectorError::TooShort {
                len: values.len(),
                segments: n_segments,
                min,
            });
        }
        check_finite(values)?;

        let sums = PrefixSums::new(values);
        let mut segments = vec![self.candidate(&sums, 0, values.len())];
        while segments.len() < n_segments {
            let pick = segments
                .iter()
                .enumerate()
                .filter_map(|(i, c)| c.split.map(|(_, gain)| (i, gain)))
                .fold(None, |best: Option<(usize, f64)>, (i, gain)| match best {
                    Some((_, g)) if g >= gain => best,
                    _ => Some((i, gain)),
                });
            let Some((idx, _)) = pick else {
                break;
            };
            let parent = segments[idx];
            let Some((split, _)) = parent.split else {
                break;
            };
            let left = self.candidate(&sums, parent.start, split);
            let right = self.candidate(&sums, split, parent.end);
            segments[idx] = left;
            segments.insert(idx + 1, right);
        }

        Ok(segments.iter().skip(1).map(|c| c.start).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps(levels: &[(f64, usize)]) -> Vec<f64> {
        levels
            .iter()
            .flat_map(|&(level, n)| std::iter::repeat(level).take(n))
            .collect()
    }

    #[test]
    fn single_mean_shift() {
        let values = steps(&[(0.0, 10), (5.0, 10)]);
        let det = BinarySegmentation::default();
        assert_eq!(det.detect(&values, 2).unwrap(), vec![10]);
    }

    #[test]
    fn two_mean_shifts_in_order() {
        let values = steps(&[(1.0, 12), (9.0, 8), (4.0, 15)]);
        let det = BinarySegmentation::default();
        assert_eq!(det.detect(&values, 3).unwrap(), vec![12, 20]);
    }

    #[test]
    fn one_segment_has_no_boundaries() {
        let values = steps(&[(0.0, 5), (3.0, 5)]);
        let det = BinarySegmentation::default();
        assert!(det.detect(&values, 1).unwrap().is_empty());
        assert!(det.detect(&[7.0], 1).unwrap().is_empty());
    }

    #[test]
    fn respects_min_segment_len() {
        let mut values = vec![0.0; 20];
        values[1] = 50.0;
        let det = BinarySegmentation::new(BinarySegmentationConfig { min_segment_len: 4 }).unwrap();
        let splits = det.detect(&values, 2).unwrap();
        assert_eq!(splits.len(), 1);
        assert!(splits[0] >= 4 && splits[0] <= 16);
    }

    #[test]
    fn profile_peaks_at_the_step() {
        let values = steps(&[(0.0, 10), (5.0, 10)]);
        let det = BinarySegmentation::default();
        let profile = det.profile(&values).unwrap();
        assert_eq!(profile.len(), values.len());
        let peak = profile
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &g)| if g > best.1 { (i, g) } else { best });
        assert_eq!(peak.0, 10);
        assert!((peak.1 - 125.0).abs() < 1e-9);
        assert_eq!(det.detect(&values, 2).unwrap(), vec![peak.0]);
        // Too close to either end to split.
        assert_eq!((profile[0], profile[1], profile[19]), (0.0, 0.0, 0.0));
    }

    #[test]
    fn profile_of_short_or_bad_input() {
        let det = BinarySegmentation::default();
        assert_eq!(det.profile(&[1.0, 2.0, 3.0]).unwrap(), vec![0.0; 3]);
        assert!(det.profile(&[]).unwrap().is_empty());
        assert!(matches!(
            det.profile(&[1.0, f64::INFINITY, 2.0, 3.0]),
            Err(DetectorError::Failed(_))
        ));
    }

    #[test]
    fn too_short_is_reported() {
        let det = BinarySegmentation::default();
        assert_eq!(
            det.detect(&[1.0, 2.0, 3.0], 2),
            Err(DetectorError::TooShort {
                len: 3,
                segments: 2,
                min: 4
            })
        );
    }

    #[test]
    fn stops_early_when_no_split_is_admissible() {
        let det = BinarySegmentation::new(BinarySegmentationConfig { min_segment_len: 3 }).unwrap();
        let values = steps(&[(0.0, 4), (1.0, 5)]);
        // 9 samples allow three segments of 3, but a 4/5 split leaves no room.
        let splits = det.detect(&values, 3).unwrap();
        assert!(splits.len() <= 2);
        assert!(splits.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn rejects_non_finite_values_and_zero_config() {
        let det = BinarySegmentation::default();
        assert!(matches!(
            det.detect(&[1.0, f64::NAN, 2.0, 3.0], 2),
            Err(DetectorError::Failed(_))
        ));
        assert!(BinarySegmentation::new(BinarySegmentationConfig { min_segment_len: 0 }).is_err());
    }
}
