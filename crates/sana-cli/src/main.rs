mod config;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::SanaConfig;
use env_logger::Env;
use log::{debug, info, warn};
use plotters::prelude::*;
use sana_lib::{
    detectors::{BinarySegmentation, BinarySegmentationConfig},
    plot::{
        figure_from_cumulative, figure_from_profile, figure_from_series, figure_from_sliding_mean,
        Figure, Layer,
    },
    Pipeline, Point,
};
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "sana",
    version,
    about = "SANA: inspect power-over-time traces"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    /// TOML file with window, segmentation and plot defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum View {
    Raw,
    #[value(name = "sliding-mean")]
    SlidingMean,
    #[value(name = "cum-sum")]
    CumSum,
    /// Split gain of the built-in detector at each sample
    Profile,
}

#[derive(Args)]
struct InputArgs {
    /// Two-column `<time_seconds> <value>` file; stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Args)]
struct WindowArgs {
    /// Stride between window starts, e.g. 1s, 500ms, 1m30s
    #[arg(long)]
    every: Option<String>,
    /// Window length
    #[arg(long)]
    period: Option<String>,
    /// Shift of the first window start
    #[arg(long)]
    offset: Option<String>,
}

#[derive(Args)]
struct SegmentArgs {
    /// Number of segments to split the trace into
    #[arg(long)]
    segments: Option<usize>,
    /// Fewest samples per segment
    #[arg(long)]
    min_segment_len: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parsed trace
    Raw {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Mean power over dynamic time windows
    SlidingMean {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Running total of power
    CumSum {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Change-point boundaries of the trace
    Segment {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        segment: SegmentArgs,
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Every view in one JSON document
    Summary {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        segment: SegmentArgs,
    },
    /// Render one view to a PNG via plotters
    Plot {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum, default_value = "raw")]
        view: View,
        #[arg(long)]
        out: PathBuf,
        /// Overlay change-point boundaries
        #[arg(long)]
        markers: bool,
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        segment: SegmentArgs,
    },
}

#[derive(Serialize)]
struct Row {
    time_s: f64,
    value: f64,
}

#[derive(Serialize)]
struct ViewOutput {
    view: &'static str,
    points: Vec<Row>,
}

#[derive(Serialize)]
struct Boundary {
    index: usize,
    time_s: f64,
}

#[derive(Serialize)]
struct SegmentOutput {
    segments: usize,
    boundaries: Vec<Boundary>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();
    let config = SanaConfig::load(cli.config.as_deref())?;
    debug!("using config {:?}", config);

    match cli.command {
        Commands::Raw { input, format } => cmd_raw(&input, format)?,
        Commands::SlidingMean {
            input,
            window,
            format,
        } => cmd_sliding_mean(&config, &input, &window, format)?,
        Commands::CumSum { input, format } => cmd_cum_sum(&input, format)?,
        Commands::Segment {
            input,
            segment,
            format,
        } => cmd_segment(&config, &input, &segment, format)?,
        Commands::Summary {
            input,
            window,
            segment,
        } => cmd_summary(&config, &input, &window, &segment)?,
        Commands::Plot {
            input,
            view,
            out,
            markers,
            window,
            segment,
        } => cmd_plot(&config, &input, view, &out, markers, &window, &segment)?,
    }
    Ok(())
}

fn load_pipeline(input: &InputArgs, detector: BinarySegmentation) -> Result<Pipeline> {
    let mut pipeline = Pipeline::with_detector(detector);
    match input.input.as_deref() {
        Some(path) => pipeline
            .load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            pipeline.load_str(&buf).context("loading stdin")?;
        }
    }
    let series = pipeline.raw()?;
    info!("loaded {} samples", series.len());
    if !series.is_time_ordered() {
        warn!("timestamps are not in ascending order; views follow file order");
    }
    Ok(pipeline)
}

fn detector_from(config: &SanaConfig, args: &SegmentArgs) -> Result<BinarySegmentation> {
    let min_segment_len = args
        .min_segment_len
        .unwrap_or(config.segmentation.min_segment_len);
    BinarySegmentation::new(BinarySegmentationConfig { min_segment_len })
        .context("configuring change-point detector")
}

fn apply_window(config: &SanaConfig, pipeline: &mut Pipeline, args: &WindowArgs) -> Result<()> {
    let spec = config.window_spec(
        args.every.as_deref(),
        args.period.as_deref(),
        args.offset.as_deref(),
    )?;
    debug!("window spec {:?}", spec);
    pipeline.set_window_spec(spec)?;
    Ok(())
}

fn apply_segments(config: &SanaConfig, pipeline: &mut Pipeline, args: &SegmentArgs) -> Result<()> {
    let segments = args.segments.unwrap_or(config.segmentation.segments);
    pipeline
        .set_segments(segments)
        .with_context(|| format!("segment count {segments}"))?;
    Ok(())
}

fn rows(points: &[Point]) -> Vec<Row> {
    points
        .iter()
        .map(|p| Row {
            time_s: p.time_s(),
            value: p.value,
        })
        .collect()
}

fn print_rows(view: &'static str, points: &[Point], format: OutputFormat) -> Result<()> {
    let rows = rows(points);
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&ViewOutput { view, points: rows })?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn cmd_raw(input: &InputArgs, format: OutputFormat) -> Result<()> {
    let pipeline = load_pipeline(input, BinarySegmentation::default())?;
    print_rows("raw", pipeline.raw()?.points(), format)
}

fn cmd_sliding_mean(
    config: &SanaConfig,
    input: &InputArgs,
    window: &WindowArgs,
    format: OutputFormat,
) -> Result<()> {
    let mut pipeline = load_pipeline(input, BinarySegmentation::default())?;
    apply_window(config, &mut pipeline, window)?;
    let windowed = pipeline.sliding_mean()?;
    print_rows("sliding-mean", &windowed.points, format)
}

fn cmd_cum_sum(input: &InputArgs, format: OutputFormat) -> Result<()> {
    let mut pipeline = load_pipeline(input, BinarySegmentation::default())?;
    let cumulative = pipeline.cumulative()?;
    print_rows("cum-sum", &cumulative.points, format)
}

fn cmd_segment(
    config: &SanaConfig,
    input: &InputArgs,
    segment: &SegmentArgs,
    format: OutputFormat,
) -> Result<()> {
    let mut pipeline = load_pipeline(input, detector_from(config, segment)?)?;
    apply_segments(config, &mut pipeline, segment)?;
    let indices = pipeline.boundaries()?.indices.clone();
    let times = pipeline.boundary_times_ms()?;
    let boundaries: Vec<Boundary> = indices
        .into_iter()
        .zip(times)
        .map(|(index, t)| Boundary {
            index,
            time_s: t as f64 / 1000.0,
        })
        .collect();
    match format {
        OutputFormat::Json => {
            let out = SegmentOutput {
                segments: pipeline.segments(),
                boundaries,
            };
            println!("{}", serde_json::to_string(&out)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            for boundary in &boundaries {
                writer.serialize(boundary)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn cmd_summary(
    config: &SanaConfig,
    input: &InputArgs,
    window: &WindowArgs,
    segment: &SegmentArgs,
) -> Result<()> {
    let mut pipeline = load_pipeline(input, detector_from(config, segment)?)?;
    apply_window(config, &mut pipeline, window)?;
    apply_segments(config, &mut pipeline, segment)?;
    let views = pipeline.views()?;
    println!("{}", serde_json::to_string(&views)?);
    Ok(())
}

fn cmd_plot(
    config: &SanaConfig,
    input: &InputArgs,
    view: View,
    out: &Path,
    markers: bool,
    window: &WindowArgs,
    segment: &SegmentArgs,
) -> Result<()> {
    let mut pipeline = load_pipeline(input, detector_from(config, segment)?)?;
    let max_points = config.plot.max_points;
    let mut fig = match view {
        View::Raw => figure_from_series(pipeline.raw()?, max_points),
        View::SlidingMean => {
            apply_window(config, &mut pipeline, window)?;
            figure_from_sliding_mean(pipeline.sliding_mean()?, max_points)
        }
        View::CumSum => figure_from_cumulative(pipeline.cumulative()?, max_points),
        View::Profile => {
            let series = pipeline.raw()?;
            let profile = pipeline
                .detector()
                .profile(&series.values())
                .context("computing change-point profile")?;
            figure_from_profile(series, &profile, max_points)
        }
    };
    if markers {
        apply_segments(config, &mut pipeline, segment)?;
        fig.add_boundaries(&pipeline.boundary_times_ms()?);
    }
    draw_plotters_figure(out, &fig, (config.plot.width, config.plot.height))
        .with_context(|| format!("rendering {}", out.display()))?;
    info!("wrote {}", out.display());
    Ok(())
}

fn padded(range: Option<(f64, f64)>) -> (f64, f64) {
    match range {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, _)) => (lo - 0.5, lo + 0.5),
        None => (0.0, 1.0),
    }
}

fn draw_plotters_figure(path: &Path, fig: &Figure, size: (u32, u32)) -> Result<()> {
    if size.0 == 0 || size.1 == 0 {
        bail!("plot size must be non-zero, got {}x{}", size.0, size.1);
    }
    let backend = BitMapBackend::new(path, size);
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let (x_min, x_max) = padded(fig.x_range());
    let (y_min, y_max) = padded(fig.y_range());
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc(fig.x.label.clone().unwrap_or_default())
        .y_desc(fig.y.label.clone().unwrap_or_default())
        .draw()?;
    for layer in &fig.layers {
        match layer {
            Layer::Line(line) => {
                let (r, g, b) = line.style.color.rgb();
                chart.draw_series(LineSeries::new(
                    line.points.iter().map(|p| (p[0], p[1])),
                    RGBColor(r, g, b).stroke_width(line.style.width.round().max(1.0) as u32),
                ))?;
            }
            Layer::VLines(marks) => {
                let (r, g, b) = marks.style.color.rgb();
                let color = RGBColor(r, g, b);
                chart.draw_series(
                    marks
                        .xs
                        .iter()
                        .map(|&x| PathElement::new(vec![(x, y_min), (x, y_max)], color)),
                )?;
            }
        }
    }
    root.present()?;
    Ok(())
}
