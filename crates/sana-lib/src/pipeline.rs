use crate::{
    aggregate::{cumulative_sum, sliding_mean},
    detectors::{BinarySegmentation, ChangePointDetector},
    error::{Result, SanaError},
    io::text as text_io,
    segmentation::segment,
    signal::{CumulativeSeries, SegmentBoundaries, Series, WindowSpec, WindowedSeries},
};
use serde::Serialize;
use std::path::Path;

pub const DEFAULT_SEGMENTS: usize = 3;

#[derive(Default)]
struct Snapshot {
    series: Option<Series>,
    windowed: Option<WindowedSeries>,
    cumulative: Option<CumulativeSeries>,
    boundaries: Option<SegmentBoundaries>,
}

/// Holds the loaded series and the views derived from it.
///
/// Views are computed on first request and kept until the series or the
/// parameter they depend on changes. Loading never touches the parameters,
/// and changing a parameter never re-reads the series.
pub struct Pipeline<D = BinarySegmentation> {
    snapshot: Snapshot,
    window_spec: WindowSpec,
    segments: usize,
    detector: D,
}

/// Every view at once, for hosts that render them side by side.
#[derive(Debug, Clone, Serialize)]
pub struct Views {
    pub raw: Series,
    pub window_spec: WindowSpec,
    pub sliding_mean: WindowedSeries,
    pub cumulative: CumulativeSeries,
    pub segments: usize,
    pub boundaries: SegmentBoundaries,
    pub boundary_times_ms: Vec<i64>,
}

impl Default for Pipeline<BinarySegmentation> {
    fn default() -> Self {
        Self::with_detector(BinarySegmentation::default())
    }
}

impl Pipeline<BinarySegmentation> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: ChangePointDetector> Pipeline<D> {
    pub fn with_detector(detector: D) -> Self {
        Self {
            snapshot: Snapshot::default(),
            window_spec: WindowSpec::default(),
            segments: DEFAULT_SEGMENTS,
            detector,
        }
    }

    /// Read `path` and make it the current series. On failure the previous
    /// series and its views stay in place.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let series = text_io::read_series(path)?;
        self.set_series(series);
        Ok(())
    }

    pub fn load_str(&mut self, text: &str) -> Result<()> {
        let series = text_io::parse_series(text)?;
        self.set_series(series);
        Ok(())
    }

    pub fn set_series(&mut self, series: Series) {
        self.snapshot = Snapshot {
            series: Some(series),
            ..Snapshot::default()
        };
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.series.is_some()
    }

    pub fn window_spec(&self) -> WindowSpec {
        self.window_spec
    }

    /// Validate and apply a new window spec; the sliding mean is recomputed
    /// on its next request. An invalid spec leaves the current one active.
    pub fn set_window_spec(&mut self, spec: WindowSpec) -> Result<()> {
        spec.validate()?;
        if spec != self.window_spec {
            self.window_spec = spec;
            self.snapshot.windowed = None;
        }
        Ok(())
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    pub fn set_segments(&mut self, segments: usize) -> Result<()> {
        if segments == 0 {
            return Err(SanaError::InvalidSegmentCount);
        }
        if segments != self.segments {
            self.segments = segments;
            self.snapshot.boundaries = None;
        }
        Ok(())
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Swap the detector; cached boundaries are dropped.
    pub fn set_detector(&mut self, detector: D) {
        self.detector = detector;
        self.snapshot.boundaries = None;
    }

    pub fn raw(&self) -> Result<&Series> {
        self.snapshot.series.as_ref().ok_or(SanaError::NotLoaded)
    }

    pub fn sliding_mean(&mut self) -> Result<&WindowedSeries> {
        if self.snapshot.windowed.is_none() {
            let windowed = sliding_mean(self.raw()?, &self.window_spec)?;
            self.snapshot.windowed = Some(windowed);
        }
        self.snapshot.windowed.as_ref().ok_or(SanaError::NotLoaded)
    }

    pub fn cumulative(&mut self) -> Result<&CumulativeSeries> {
        if self.snapshot.cumulative.is_none() {
            let cumulative = cumulative_sum(self.raw()?)?;
            self.snapshot.cumulative = Some(cumulative);
        }
        self.snapshot.cumulative.as_ref().ok_or(SanaError::NotLoaded)
    }

    pub fn boundaries(&mut self) -> Result<&SegmentBoundaries> {
        if self.snapshot.boundaries.is_none() {
            let boundaries = segment(self.raw()?, self.segments, &self.detector)?;
            self.snapshot.boundaries = Some(boundaries);
        }
        self.snapshot.boundaries.as_ref().ok_or(SanaError::NotLoaded)
    }

    /// Boundary positions on the time axis, for vertical markers.
    pub fn boundary_times_ms(&mut self) -> Result<Vec<i64>> {
        let boundaries = self.boundaries()?.clone();
        Ok(boundaries.times_ms(self.raw()?))
    }

    pub fn views(&mut self) -> Result<Views> {
        let sliding_mean = self.sliding_mean()?.clone();
        let cumulative = self.cumulative()?.clone();
        let boundaries = self.boundaries()?.clone();
        let raw = self.raw()?;
        Ok(Views {
            boundary_times_ms: boundaries.times_ms(raw),
            raw: raw.clone(),
            window_spec: self.window_spec,
            sliding_mean,
            cumulative,
            segments: self.segments,
            boundaries,
        })
    }
}
