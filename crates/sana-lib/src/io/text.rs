use crate::error::{Result, SanaError};
use crate::signal::{Point, Series};
use std::path::Path;

/// Parse `<time_seconds> <value>` lines into a [`Series`].
///
/// Whitespace-only lines are skipped. Any other line must hold exactly two
/// finite numbers; the first bad line aborts the whole parse.
pub fn parse_series(text: &str) -> Result<Series> {
    let mut points = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        points.push(parse_line(idx + 1, line)?);
    }
    Ok(Series::from_points(points))
}

/// Read a two-column power trace from disk.
pub fn read_series(path: &Path) -> Result<Series> {
    let text = std::fs::read_to_string(path).map_err(|source| SanaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_series(&text)
}

fn parse_line(line_no: usize, line: &str) -> Result<Point> {
    let mut tokens = line.split_whitespace();
    let (time, value) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(time), Some(value), None) => (time, value),
        _ => {
            let count = line.split_whitespace().count();
            return Err(SanaError::malformed(
                line_no,
                line,
                format!("expected 2 fields, found {count}"),
            ));
        }
    };
    let seconds = parse_finite(line_no, line, time, "time")?;
    let value = parse_finite(line_no, line, value, "value")?;
    Ok(Point::new(seconds_to_ms(line_no, line, seconds)?, value))
}

fn parse_finite(line_no: usize, line: &str, token: &str, field: &str) -> Result<f64> {
    let parsed: f64 = token
        .parse()
        .map_err(|_| SanaError::malformed(line_no, line, format!("{field} is not a number")))?;
    if !parsed.is_finite() {
        return Err(SanaError::malformed(
            line_no,
            line,
            format!("{field} is not finite"),
        ));
    }
    Ok(parsed)
}

// Truncates toward zero: 1.9999s -> 1999ms, -0.0005s -> 0ms.
fn seconds_to_ms(line_no: usize, line: &str, seconds: f64) -> Result<i64> {
    let ms = seconds * 1000.0;
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return Err(SanaError::malformed(line_no, line, "time out of range"));
    }
    Ok(ms as i64)
}
