use crate::error::{Result, SanaError};
use serde::{Deserialize, Serialize};

/// One sample on the zero-based time axis (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub time_ms: i64,
    pub value: f64,
}

impl Point {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }

    pub fn time_s(&self) -> f64 {
        self.time_ms as f64 / 1000.0
    }
}

/// Power trace as read from disk, in file order.
///
/// Timestamps are expected to be non-decreasing but this is not enforced;
/// equal timestamps are kept as separate samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    points: Vec<Point>,
}

impl Series {
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Plain value sequence in series order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn time_ms_at(&self, index: usize) -> Option<i64> {
        self.points.get(index).map(|p| p.time_ms)
    }

    /// Earliest and latest timestamps regardless of ordering.
    pub fn time_extent(&self) -> Option<(i64, i64)> {
        let first = self.points.first()?.time_ms;
        Some(
            self.points
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(p.time_ms), hi.max(p.time_ms))),
        )
    }

    pub fn is_time_ordered(&self) -> bool {
        self.points.windows(2).all(|w| w[0].time_ms <= w[1].time_ms)
    }
}

/// Per-window means keyed by window start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowedSeries {
    pub points: Vec<Point>,
}

/// Running totals, one per input sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CumulativeSeries {
    pub points: Vec<Point>,
}

/// Change points as indices into the originating [`Series`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentBoundaries {
    pub indices: Vec<usize>,
}

impl SegmentBoundaries {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Timestamps of each boundary, for marker overlays.
    pub fn times_ms(&self, series: &Series) -> Vec<i64> {
        self.indices
            .iter()
            .filter_map(|&idx| series.time_ms_at(idx))
            .collect()
    }
}

/// Dynamic window grouping: a window of length `period_ms` starts every
/// `every_ms`, shifted by `offset_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub every_ms: i64,
    pub period_ms: i64,
    pub offset_ms: i64,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            every_ms: 1_000,
            period_ms: 1_000,
            offset_ms: 0,
        }
    }
}

impl WindowSpec {
    pub fn new(every_ms: i64, period_ms: i64, offset_ms: i64) -> Self {
        Self {
            every_ms,
            period_ms,
            offset_ms,
        }
    }

    /// Build a spec from duration strings such as `"1s"`, `"500ms"` or `"1m30s"`.
    pub fn parse(every: &str, period: &str, offset: &str) -> Result<Self> {
        let spec = Self::new(
            parse_duration_ms(every)?,
            parse_duration_ms(period)?,
            parse_duration_ms(offset)?,
        );
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if self.every_ms <= 0 {
            return Err(SanaError::InvalidWindowSpec(format!(
                "every must be > 0, got {}ms",
                self.every_ms
            )));
        }
        if self.period_ms < 0 {
            return Err(SanaError::InvalidWindowSpec(format!(
                "period must be >= 0, got {}ms",
                self.period_ms
            )));
        }
        if self.offset_ms < 0 {
            return Err(SanaError::InvalidWindowSpec(format!(
                "offset must be >= 0, got {}ms",
                self.offset_ms
            )));
        }
        Ok(())
    }
}

/// Parse a duration string into signed milliseconds.
///
/// Accepts concatenated `<integer><unit>` terms with units `ms`, `s`, `m`,
/// `h` and `d`, or a bare decimal number of seconds. A leading `-` negates
/// the whole value; range checks are left to [`WindowSpec::validate`].
pub fn parse_duration_ms(text: &str) -> Result<i64> {
    let trimmed = text.trim();
    let invalid = |why: &str| SanaError::InvalidWindowSpec(format!("{why}: {trimmed:?}"));
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    if body.is_empty() {
        return Err(invalid("empty duration"));
    }

    let magnitude = if let Ok(seconds) = body.parse::<f64>() {
        let ms = seconds * 1000.0;
        if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
            return Err(invalid("duration out of range"));
        }
        ms as i64
    } else {
        let mut total: i64 = 0;
        let mut rest = body;
        while !rest.is_empty() {
            let digits = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits == 0 {
                return Err(invalid("expected a number"));
            }
            let (number, tail) = rest.split_at(digits);
            let unit_len = tail
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(tail.len());
            let (unit, tail) = tail.split_at(unit_len);
            let scale = match unit {
                "ms" => 1,
                "s" => 1_000,
                "m" => 60_000,
                "h" => 3_600_000,
                "d" => 86_400_000,
                "" => return Err(invalid("missing unit")),
                _ => return Err(invalid("unknown unit")),
            };
            let count: i64 = number.parse().map_err(|_| invalid("number too large"))?;
            total = count
                .checked_mul(scale)
                .and_then(|term| total.checked_add(term))
                .ok_or_else(|| invalid("duration out of range"))?;
            rest = tail;
        }
        total
    };

    Ok(if negative { -magnitude } else { magnitude })
}
