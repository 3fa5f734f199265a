use crate::signal::{CumulativeSeries, Point, Series, WindowedSeries};
use serde::{Deserialize, Serialize};

pub const TIME_LABEL: &str = "Time (s)";
pub const POWER_LABEL: &str = "Power (ms²)";
pub const MEAN_POWER_LABEL: &str = "Mean Power (ms²)";
pub const CUMULATIVE_POWER_LABEL: &str = "Cumulative Power (ms²)";
pub const SPLIT_GAIN_LABEL: &str = "Split Gain (ms⁴)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Vertical lines spanning the full y range, one per x position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Markers {
    pub name: String,
    pub xs: Vec<f64>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Layer {
    Line(LineSeries),
    VLines(Markers),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub layers: Vec<Layer>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            layers: Vec::new(),
        }
    }

    pub fn with_labels(mut self, x: &str, y: &str) -> Self {
        self.x.label = Some(x.into());
        self.y.label = Some(y.into());
        self
    }

    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Overlay segment boundaries given in milliseconds.
    pub fn add_boundaries(&mut self, times_ms: &[i64]) {
        self.add_layer(Layer::VLines(Markers {
            name: "Boundaries".into(),
            xs: times_ms.iter().map(|&t| t as f64 / 1000.0).collect(),
            style: Style {
                width: 1.0,
                dash: Some([4.0, 4.0]),
                color: Color(0xD62728),
            },
        }));
    }

    /// `(min, max)` over line points and markers, or `None` for an empty figure.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let xs = self.layers.iter().flat_map(|layer| match layer {
            Layer::Line(line) => line.points.iter().map(|p| p[0]).collect::<Vec<_>>(),
            Layer::VLines(markers) => markers.xs.clone(),
        });
        min_max(xs)
    }

    pub fn y_range(&self) -> Option<(f64, f64)> {
        let ys = self.layers.iter().flat_map(|layer| match layer {
            Layer::Line(line) => line.points.iter().map(|p| p[1]).collect::<Vec<_>>(),
            Layer::VLines(_) => Vec::new(),
        });
        min_max(ys)
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

fn line_figure(title: &str, y_label: &str, points: &[Point], max_points: usize, color: u32) -> Figure {
    let points: Vec<[f64; 2]> = points.iter().map(|p| [p.time_s(), p.value]).collect();
    let mut fig = Figure::new(Some(title.into())).with_labels(TIME_LABEL, y_label);
    fig.add_layer(Layer::Line(LineSeries {
        name: title.into(),
        points: decimate_points(&points, max_points),
        style: Style {
            width: 1.4,
            dash: None,
            color: Color(color),
        },
    }));
    fig
}

pub fn figure_from_series(series: &Series, max_points: usize) -> Figure {
    line_figure("Power", POWER_LABEL, series.points(), max_points, 0x1F77B4)
}

pub fn figure_from_sliding_mean(windowed: &WindowedSeries, max_points: usize) -> Figure {
    line_figure(
        "Sliding mean",
        MEAN_POWER_LABEL,
        &windowed.points,
        max_points,
        0xFF7F0E,
    )
}

pub fn figure_from_cumulative(cumulative: &CumulativeSeries, max_points: usize) -> Figure {
    line_figure(
        "Cumulative power",
        CUMULATIVE_POWER_LABEL,
        &cumulative.points,
        max_points,
        0x2CA02C,
    )
}

/// Change-point score of each sample, drawn at the sample's timestamp.
pub fn figure_from_profile(series: &Series, profile: &[f64], max_points: usize) -> Figure {
    let points: Vec<Point> = series
        .points()
        .iter()
        .zip(profile)
        .map(|(p, &gain)| Point::new(p.time_ms, gain))
        .collect();
    line_figure("Change-point profile", SPLIT_GAIN_LABEL, &points, max_points, 0x9467BD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_figure_uses_seconds_and_power_labels() {
        let series = Series::from_points(vec![Point::new(0, 1.0), Point::new(1_500, 2.0)]);
        let fig = figure_from_series(&series, 1024);
        assert_eq!(fig.x.label.as_deref(), Some(TIME_LABEL));
        assert_eq!(fig.y.label.as_deref(), Some(POWER_LABEL));
        match &fig.layers[0] {
            Layer::Line(line) => assert_eq!(line.points, vec![[0.0, 1.0], [1.5, 2.0]]),
            other => panic!("unexpected layer {other:?}"),
        }
    }

    #[test]
    fn decimation_caps_point_count() {
        let points: Vec<[f64; 2]> = (0..10_000).map(|i| [i as f64, i as f64]).collect();
        let out = decimate_points(&points, 512);
        assert_eq!(out.len(), 512);
        assert_eq!(out[0], [0.0, 0.0]);
    }

    #[test]
    fn boundaries_extend_x_range_only() {
        let series = Series::from_points(vec![Point::new(0, 1.0), Point::new(2_000, 3.0)]);
        let mut fig = figure_from_series(&series, 16);
        fig.add_boundaries(&[4_000]);
        assert_eq!(fig.x_range(), Some((0.0, 4.0)));
        assert_eq!(fig.y_range(), Some((1.0, 3.0)));
        assert_eq!(Figure::new(None::<String>).x_range(), None);
    }

    #[test]
    fn profile_figure_follows_sample_times() {
        let series = Series::from_points(vec![
            Point::new(0, 1.0),
            Point::new(500, 1.0),
            Point::new(1_000, 9.0),
        ]);
        let fig = figure_from_profile(&series, &[0.0, 32.0, 0.0], 16);
        assert_eq!(fig.x.label.as_deref(), Some(TIME_LABEL));
        assert_eq!(fig.y.label.as_deref(), Some(SPLIT_GAIN_LABEL));
        match &fig.layers[0] {
            Layer::Line(line) => {
                assert_eq!(line.points, vec![[0.0, 0.0], [0.5, 32.0], [1.0, 0.0]])
            }
            other => panic!("unexpected layer {other:?}"),
        }
    }

    #[test]
    fn color_splits_into_channels() {
        assert_eq!(Color(0x1F77B4).rgb(), (0x1F, 0x77, 0xB4));
    }
}
