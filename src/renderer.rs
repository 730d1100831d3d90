//! # Glucose Data Visualization Rendering
//!
//! This module renders glucose readings and treatment summaries as plain
//! text for terminal output. The chart is a fixed-height grid: time runs
//! left to right in equal buckets, glucose (mg/dL) bottom to top, and the
//! latest reading is marked with `X`.
//!
//! ```text
//! 250│
//! 200│          ••
//! 150│      •••   ••
//! 100│••••••        •••X
//!  50│
//! ```

use crate::{estimated_a1c, GlucoseReading, TreatmentResult};
use std::fmt::Write;

const ROWS: usize = 16;
const MAX_COLUMNS: usize = 72;
const Y_AXIS_WIDTH: usize = 5;

/// Lower bound of the chart in mg/dL, the usual CGM floor.
const CHART_MIN: i32 = 40;
/// Upper bound of the chart in mg/dL, the usual CGM ceiling.
const CHART_MAX: i32 = 400;

/// Map a glucose value to a grid row (row 0 at the top).
fn value_to_row(value: i32, min: i32, max: i32) -> usize {
    let clamped = value.clamp(min, max);
    let normalized = (clamped - min) as f32 / (max - min).max(1) as f32;
    ((1.0 - normalized) * (ROWS as f32 - 1.0)).round() as usize
}

/// Display bounds rounded out to the nearest 50 mg/dL.
fn display_bounds(readings: &[GlucoseReading]) -> (i32, i32) {
    let (lo, hi) = readings
        .iter()
        .fold((i32::MAX, i32::MIN), |(lo, hi), r| (lo.min(r.value), hi.max(r.value)));

    let lo = ((lo / 50) * 50).clamp(CHART_MIN, CHART_MAX);
    let hi = (((hi + 49) / 50) * 50).clamp(CHART_MIN, CHART_MAX);
    if hi <= lo {
        (lo, (lo + 50).min(CHART_MAX))
    } else {
        (lo, hi)
    }
}

/// Render readings as an ASCII chart followed by a summary line.
pub fn render_ascii(readings: &[GlucoseReading]) -> String {
    let mut out = String::new();

    let (Some(first), Some(last)) = (readings.first(), readings.last()) else {
        out.push_str("No glucose readings in range\n");
        return out;
    };

    let (min, max) = display_bounds(readings);
    let columns = readings.len().min(MAX_COLUMNS);
    let start = first.display_time;
    let span = (last.display_time - start).num_seconds().max(1) as f64;

    let mut grid = vec![vec![' '; columns + Y_AXIS_WIDTH]; ROWS];

    // Y-axis labels every 50 mg/dL
    let mut label_value = min;
    while label_value <= max {
        let row = value_to_row(label_value, min, max);
        let label = format!("{:>width$}", label_value, width = Y_AXIS_WIDTH - 1);
        for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
            grid[row][i] = ch;
        }
        grid[row][Y_AXIS_WIDTH - 1] = '│';
        label_value += 50;
    }

    // Plot each reading in its time bucket
    for reading in readings {
        let offset = (reading.display_time - start).num_seconds() as f64 / span;
        let column = ((offset * (columns - 1) as f64).round() as usize).min(columns - 1);
        let row = value_to_row(reading.value, min, max);
        grid[row][column + Y_AXIS_WIDTH] = '•';
    }

    let last_row = value_to_row(last.value, min, max);
    grid[last_row][columns - 1 + Y_AXIS_WIDTH] = 'X';

    for row in grid {
        let line: String = row.into_iter().collect();
        let _ = writeln!(out, "{}", line.trim_end());
    }

    let _ = writeln!(
        out,
        "{}{} → {}",
        " ".repeat(Y_AXIS_WIDTH),
        first.display_time.format("%m/%d %H:%M"),
        last.display_time.format("%m/%d %H:%M")
    );
    let _ = writeln!(out, "{}", summary_line(readings));
    out
}

/// One-line summary: count, latest value and trend, mean and estimated A1C.
pub fn summary_line(readings: &[GlucoseReading]) -> String {
    let Some(last) = readings.last() else {
        return "0 readings".to_string();
    };

    let mean = readings.iter().map(|r| r.value as f32).sum::<f32>() / readings.len() as f32;
    let a1c = estimated_a1c(readings).unwrap_or(0.0);
    format!(
        "{} readings | latest {} mg/dL (trend {}) | mean {:.0} mg/dL | est. A1C {:.1}%",
        readings.len(),
        last.value,
        last.trend_rate,
        mean,
        a1c
    )
}

/// Print the chart to stdout.
pub fn draw_ascii(readings: &[GlucoseReading]) {
    print!("{}", render_ascii(readings));
}

/// Summarize classified treatments, one line per stream.
pub fn summarize_treatments(result: &TreatmentResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Temp basals: {}", result.basal_entries.len());
    let _ = writeln!(
        out,
        "Boluses:     {} ({:.2} U)",
        result.bolus_entries.len(),
        result.total_bolus_units()
    );
    let _ = writeln!(
        out,
        "Carbs:       {} ({} g)",
        result.carb_entries.len(),
        result.total_carbs()
    );
    out
}
