use anyhow::{Context, Result};
use sana_lib::{detectors::BinarySegmentationConfig, WindowSpec};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Defaults read from `sana.toml`; command-line flags win over these.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SanaConfig {
    pub window: WindowConfig,
    pub segmentation: SegmentationConfig,
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub every: String,
    pub period: String,
    pub offset: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            every: "1s".into(),
            period: "1s".into(),
            offset: "0s".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub segments: usize,
    pub min_segment_len: usize,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            segments: sana_lib::pipeline::DEFAULT_SEGMENTS,
            min_segment_len: BinarySegmentationConfig::default().min_segment_len,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    pub max_points: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
            max_points: 2048,
        }
    }
}

impl SanaConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => read_config(path),
            None => Ok(Self::default()),
        }
    }

    /// Window spec from config values, each overridable by a flag.
    pub fn window_spec(
        &self,
        every: Option<&str>,
        period: Option<&str>,
        offset: Option<&str>,
    ) -> Result<WindowSpec> {
        let every = every.unwrap_or(self.window.every.as_str());
        let period = period.unwrap_or(self.window.period.as_str());
        let offset = offset.unwrap_or(self.window.offset.as_str());
        WindowSpec::parse(every, period, offset).with_context(|| {
            format!("window every={every} period={period} offset={offset}")
        })
    }
}

pub fn read_config(path: &Path) -> Result<SanaConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: SanaConfig =
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}
