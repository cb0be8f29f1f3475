//! # Terminal Rendering
//!
//! Renders one Islamic day to plain text: a sky canvas with the sun's arc
//! sampled through the visual interpolators, a day ruler in progress
//! space, and a timetable with the active event marked. Everything returns
//! a `String` so callers decide where it goes; the binary just prints.
//!
//! The canvas is a picture, not a chart: the horizontal axis of the sky is
//! the sun's east-to-west position, while the ruler underneath runs in
//! day-fraction space from Fajr (left edge) to the next Fajr (right edge).

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset};

use crate::interpolate;
use crate::moon;
use crate::resolver;
use crate::{DayData, Timeline};

/// Sun glyph opacity cutoff between the faint and full form.
const SUN_FULL: f32 = 0.66;

/// Render the sky canvas and day ruler for one day.
///
/// `now` adds the position markers: the sun drawn at its current arc
/// point and an `X` on the ruler. A day without a timeline (no Fajr
/// anchor) renders as a dark, sunless sky.
pub fn render_day(
    day: &DayData,
    now: Option<DateTime<FixedOffset>>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(16);
    let height = height.max(4);
    let timeline = day.timeline.unwrap_or_default();
    let progress_now = now.and_then(|n| day_progress(day, n));

    let mut grid = vec![vec![' '; width]; height];

    // Background gradient: each column is one moment of the day
    for (x, progress) in (0..width).map(|x| (x, x as f32 / (width - 1) as f32)) {
        let night = interpolate::night_opacity(progress, &timeline);
        let sky = interpolate::sky_color(progress, &timeline);
        let luminance = 0.2126 * sky.r + 0.7152 * sky.g + 0.0722 * sky.b;
        for (row, cells) in grid.iter_mut().enumerate() {
            cells[x] = background_char(luminance, night, x, row);
        }
    }

    // The arc: horizontal position from sun_x, height from sun_y
    for step in 0..width {
        let progress = step as f32 / (width - 1) as f32;
        if interpolate::sun_opacity(progress, &timeline) <= 0.0 {
            continue;
        }
        let (col, row) = arc_point(progress, &timeline, width, height);
        grid[row][col] = '·';
    }

    // The sun itself, where the arc stands right now
    if let Some(progress) = progress_now {
        let opacity = interpolate::sun_opacity(progress, &timeline);
        if opacity > 0.0 {
            let (col, row) = arc_point(progress, &timeline, width, height);
            grid[row][col] = if opacity > SUN_FULL { 'O' } else { 'o' };
        }
    }

    let mut out = String::new();
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out.push_str(&ruler(&timeline, progress_now, width));
    out
}

fn arc_point(progress: f32, timeline: &Timeline, width: usize, height: usize) -> (usize, usize) {
    let x = interpolate::sun_x(progress, timeline);
    let y = interpolate::sun_y(progress, timeline);
    let col = (x * (width - 1) as f32).round() as usize;
    let row = ((1.0 - y) * (height - 1) as f32).round() as usize;
    (col.min(width - 1), row.min(height - 1))
}

/// Day ruler: a tick per event at its day fraction, `X` where now is, and
/// the boundary labels underneath.
fn ruler(timeline: &Timeline, progress_now: Option<f32>, width: usize) -> String {
    let mut ticks = vec![' '; width];
    for (_, fraction) in timeline.present() {
        let col = (fraction * (width - 1) as f32).round() as usize;
        ticks[col.min(width - 1)] = '|';
    }
    if let Some(progress) = progress_now {
        let col = (progress * (width - 1) as f32).round() as usize;
        ticks[col.min(width - 1)] = 'X';
    }

    let left = "Fajr";
    let right = "next Fajr";
    let pad = width.saturating_sub(left.len() + right.len());
    format!(
        "{}\n{left}{}{right}\n",
        ticks.into_iter().collect::<String>(),
        " ".repeat(pad)
    )
}

fn background_char(luminance: f32, night: f32, x: usize, row: usize) -> char {
    if night > 0.5 {
        // sparse deterministic starfield
        if (x * 31 + row * 17) % 23 == 0 {
            '*'
        } else {
            ' '
        }
    } else if luminance < 0.45 {
        '·'
    } else {
        ' '
    }
}

/// Render the timetable: date header with the moon phase, one row per
/// event, the active one marked when `now` is given.
pub fn render_timetable(day: &DayData, now: Option<DateTime<FixedOffset>>) -> String {
    let active = now
        .and_then(|n| resolver::resolve(&day.timings, n))
        .and_then(|period| period.event());
    let phase = moon::moon_phase(day.date);

    let mut out = String::new();
    writeln!(
        out,
        "{}  {} {}",
        day.date.format("%A %-d %B %Y"),
        phase.glyph(),
        phase.caption()
    )
    .ok();

    for timing in &day.timings {
        let marker = if active == Some(timing.event) { '▶' } else { ' ' };
        writeln!(out, " {marker} {:<24} {}", timing.label, timing.time).ok();
    }
    out
}

/// Fraction of this day's Fajr-to-Fajr span elapsed at `now`.
fn day_progress(day: &DayData, now: DateTime<FixedOffset>) -> Option<f32> {
    let start = day.day_start()?;
    let end = day.day_end()?;
    if now < start || now >= end {
        return None;
    }
    let span = (end - start).num_milliseconds();
    if span <= 0 {
        return None;
    }
    Some((now - start).num_milliseconds() as f32 / span as f32)
}
