use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::{error::Error, path::PathBuf};

#[derive(Deserialize)]
struct Row {
    time_s: f64,
    value: f64,
}

#[derive(Deserialize)]
struct ViewOutput {
    view: String,
    points: Vec<Row>,
}

#[derive(Deserialize)]
struct Boundary {
    index: usize,
    time_s: f64,
}

#[derive(Deserialize)]
struct SegmentOutput {
    segments: usize,
    boundaries: Vec<Boundary>,
}

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

fn sample_path(relative: &str) -> String {
    workspace_root()
        .join(relative)
        .to_string_lossy()
        .to_string()
}

fn run_view(args: &[&str]) -> Result<ViewOutput, Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("sana");
    cmd.args(args);
    let out = cmd.assert().success().get_output().stdout.clone();
    Ok(serde_json::from_slice(&out)?)
}

fn assert_close(a: f64, b: f64, tol: f64) {
    let diff = (a - b).abs();
    assert!(
        diff <= tol,
        "diff {} exceeded tol {} ({} vs {})",
        diff,
        tol,
        a,
        b
    );
}

#[test]
fn raw_prints_samples_in_seconds() -> Result<(), Box<dyn Error>> {
    let out = run_view(&["raw", "--input", &sample_path("test_data/three_points.txt")])?;
    assert_eq!(out.view, "raw");
    let pairs: Vec<(f64, f64)> = out.points.iter().map(|r| (r.time_s, r.value)).collect();
    assert_eq!(pairs, vec![(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
    Ok(())
}

#[test]
fn cum_sum_accumulates() -> Result<(), Box<dyn Error>> {
    let out = run_view(&["cum-sum", "--input", &sample_path("test_data/three_points.txt")])?;
    let values: Vec<f64> = out.points.iter().map(|r| r.value).collect();
    assert_eq!(values, vec![1.0, 3.0, 6.0]);
    Ok(())
}

#[test]
fn sliding_mean_honours_flags() -> Result<(), Box<dyn Error>> {
    let out = run_view(&[
        "sliding-mean",
        "--input",
        &sample_path("test_data/power_trace.txt"),
        "--every",
        "2s",
        "--period",
        "2s",
    ])?;
    assert_eq!(out.points.len(), 8);
    assert_close(out.points[0].time_s, 0.0, 1e-9);
    assert_close(out.points[0].value, 101.5, 1e-9);
    assert_close(out.points[7].time_s, 14.0, 1e-9);
    Ok(())
}

#[test]
fn sliding_mean_reads_stdin() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("sana");
    cmd.args(["sliding-mean", "--every", "1s", "--period", "2s"])
        .write_stdin("0 1\n1 2\n2 3\n");
    let out = cmd.assert().success().get_output().stdout.clone();
    let parsed: ViewOutput = serde_json::from_slice(&out)?;
    let values: Vec<f64> = parsed.points.iter().map(|r| r.value).collect();
    assert_eq!(values, vec![1.5, 2.5, 3.0]);
    Ok(())
}

#[test]
fn segment_finds_level_changes() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("sana");
    cmd.args([
        "segment",
        "--input",
        &sample_path("test_data/power_trace.txt"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let parsed: SegmentOutput = serde_json::from_slice(&out)?;
    assert_eq!(parsed.segments, 3);
    let indices: Vec<usize> = parsed.boundaries.iter().map(|b| b.index).collect();
    assert_eq!(indices, vec![10, 20]);
    assert_close(parsed.boundaries[0].time_s, 5.0, 1e-9);
    assert_close(parsed.boundaries[1].time_s, 10.0, 1e-9);
    Ok(())
}

#[test]
fn config_file_supplies_defaults() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("sana");
    cmd.args([
        "--config",
        &sample_path("test_data/sana.toml"),
        "segment",
        "--input",
        &sample_path("test_data/power_trace.txt"),
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let parsed: SegmentOutput = serde_json::from_slice(&out)?;
    assert_eq!(parsed.segments, 2);
    assert_eq!(parsed.boundaries.len(), 1);
    assert_eq!(parsed.boundaries[0].index, 10);
    Ok(())
}

#[test]
fn csv_output_has_header() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("sana");
    cmd.args([
        "cum-sum",
        "--input",
        &sample_path("test_data/three_points.txt"),
        "--format",
        "csv",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(out)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["time_s,value", "0.0,1.0", "1.0,3.0", "2.0,6.0"]);
    Ok(())
}

#[test]
fn summary_bundles_all_views() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("sana");
    cmd.args([
        "summary",
        "--input",
        &sample_path("test_data/power_trace.txt"),
        "--segments",
        "2",
    ]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: serde_json::Value = serde_json::from_slice(&out)?;
    assert_eq!(value["raw"]["points"].as_array().map(Vec::len), Some(30));
    assert_eq!(value["cumulative"]["points"].as_array().map(Vec::len), Some(30));
    assert_eq!(value["boundaries"]["indices"], serde_json::json!([10]));
    assert_eq!(value["boundary_times_ms"], serde_json::json!([5000]));
    Ok(())
}
