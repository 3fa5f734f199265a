use assert_cmd::cargo::cargo_bin_cmd;
use std::{error::Error, path::PathBuf};
use tempfile::tempdir;

fn trace_path() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("test_data/power_trace.txt")
        .to_string_lossy()
        .to_string()
}

#[test]
fn renders_each_view_to_png() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    for view in ["raw", "sliding-mean", "cum-sum", "profile"] {
        let out = dir.path().join(format!("{view}.png"));
        let mut cmd = cargo_bin_cmd!("sana");
        cmd.args([
            "plot",
            "--input",
            &trace_path(),
            "--view",
            view,
            "--out",
            out.to_str().expect("utf8 path"),
        ]);
        cmd.assert().success();
        assert!(std::fs::metadata(&out)?.len() > 0, "{view} produced an empty file");
    }
    Ok(())
}

#[test]
fn overlays_boundaries_when_asked() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let out = dir.path().join("markers.png");
    let mut cmd = cargo_bin_cmd!("sana");
    cmd.args([
        "plot",
        "--input",
        &trace_path(),
        "--markers",
        "--segments",
        "3",
        "--out",
        out.to_str().expect("utf8 path"),
    ]);
    cmd.assert().success();
    assert!(out.exists());
    Ok(())
}
