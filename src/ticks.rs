//! Frequency tape above the waterfall and optional time ticks beside it.

use std::collections::HashSet;

use image::imageops;
use image::RgbImage;
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use tracing::debug;

use crate::color::{blend, BLACK, WHITE, YELLOW};
use crate::font::LabelFont;
use crate::raster::RasterLayout;
use crate::summary::{parse_time, Summary, TimeAxis};

/// Label point size on the tape.
pub const TAPE_PT: u32 = 10;

/// `(divisor of the label base, top row of the gridline)`, coarse to fine.
const SCALE_CASCADE: [(i64, u32); 6] = [
    (1, 10),
    (5, 15),
    (10, 19),
    (50, 22),
    (100, 24),
    (500, 25),
];

/// Labels are drawn when gridlines are further apart than this (px).
const LABEL_MIN_SPACING: i64 = 50;
/// Refinement stops once gridlines are closer than this (px).
const GRID_MIN_SPACING: i64 = 10;

/// Index of the axis value nearest to `target` on a sorted, non-uniform axis.
///
/// A halving-jump search compares `idx - jump`, `idx`, `idx + jump` and moves
/// to the best one; a short walk to the closer neighbour finishes the job
/// when the jump sequence was too coarse. Ties keep the current index.
pub fn closest_index(target: f64, axis: &[f64]) -> Option<usize> {
    if axis.is_empty() {
        return None;
    }
    let err = |i: usize| (axis[i] - target).abs();
    let mut idx = axis.len() / 2;
    let mut jump = axis.len() / 2;
    while jump >= 1 {
        let down = idx.checked_sub(jump).unwrap_or(idx);
        let up = if idx + jump < axis.len() { idx + jump } else { idx };
        let best = err(down).min(err(idx)).min(err(up));
        if err(idx) != best {
            idx = if err(up) == best { up } else { down };
        }
        jump /= 2;
    }
    while idx > 0 && err(idx - 1) < err(idx) {
        idx -= 1;
    }
    while idx + 1 < axis.len() && err(idx + 1) < err(idx) {
        idx += 1;
    }
    Some(idx)
}

/// The two columns bracketing `target`, for blending a gridline across
/// them. Both indices are equal when the target sits on a column or
/// beyond either end of the axis.
pub fn closest_pair(target: f64, axis: &[f64]) -> Option<(usize, usize)> {
    let idx = closest_index(target, axis)?;
    if target < axis[idx] && idx > 0 {
        return Some((idx - 1, idx));
    }
    if target > axis[idx] && idx + 1 < axis.len() {
        return Some((idx, idx + 1));
    }
    Some((idx, idx))
}

/// Largest decade interval (10^8 down to 10^0) giving at least four
/// gridline slots over `[first, last]`.
pub fn label_base(first: f64, last: f64) -> i64 {
    for exp in (0..=8).rev() {
        let interval = 10i64.pow(exp);
        let step = interval as f64;
        let low_f = (first / step).floor() * step;
        let high_f = (1.0 + (last / step).floor()) * step;
        let hits = ((high_f - low_f) / step).round() as i64;
        if hits >= 4 {
            return interval;
        }
    }
    10i64.pow(8)
}

/// Multiples of `interval` strictly inside `(first, last)`.
pub fn gridline_frequencies(first: f64, last: f64, interval: i64) -> Vec<i64> {
    if interval < 1 {
        return Vec::new();
    }
    let step = interval as f64;
    let low_f = ((first / step).floor() * step) as i64;
    let high_f = ((1.0 + (last / step).floor()) * step) as i64;
    (low_f..high_f)
        .step_by(interval as usize)
        .filter(|&f| first < f as f64 && (f as f64) < last)
        .collect()
}

/// Tape text for a gridline: as coarse a unit as still tells labels apart.
pub fn tape_label(freq: i64, interval: i64) -> String {
    let mhz = || format!("{}M", (freq as f64 / 1e6) as i64);
    let khz = || format!("{}k", ((freq as f64 / 1e3) % 1000.0) as i64);
    if interval >= 1_000_000 {
        return mhz();
    }
    if interval > 1000 {
        let s = khz();
        return if s.starts_with('0') { mhz() } else { s };
    }
    let mut s = format!("{}", freq % 1000);
    if s.starts_with('0') {
        s = khz();
    }
    if s.starts_with('0') {
        s = mhz();
    }
    s
}

/// Draws gridlines and labels onto the tape, remembering which
/// frequencies each has already handled across the scale cascade.
pub struct TapePlanner<'a> {
    axis: &'a [f64],
    lined: HashSet<i64>,
    labelled: HashSet<i64>,
}

impl<'a> TapePlanner<'a> {
    pub fn new(axis: &'a [f64]) -> Self {
        TapePlanner {
            axis,
            lined: HashSet::new(),
            labelled: HashSet::new(),
        }
    }

    fn span(&self) -> (f64, f64) {
        (
            self.axis.first().copied().unwrap_or(0.0),
            self.axis.last().copied().unwrap_or(0.0),
        )
    }

    /// Draws gridlines from `y1` to `y2`; returns how many gridline
    /// positions fall inside the axis, drawn now or earlier.
    pub fn draw_lines(&mut self, canvas: &mut RgbImage, interval: i64, y1: u32, y2: u32) -> usize {
        let (first, last) = self.span();
        let targets = gridline_frequencies(first, last, interval);
        let (top, bottom) = (y1 as f32, y2 as f32);
        for &freq in &targets {
            if !self.lined.insert(freq) {
                continue;
            }
            let Some((x1, x2)) = closest_pair(freq as f64, self.axis) else {
                continue;
            };
            if x1 == x2 {
                draw_line_segment_mut(canvas, (x1 as f32, top), (x1 as f32, bottom), BLACK);
            } else {
                let percent = (freq as f64 - self.axis[x1]) / (self.axis[x2] - self.axis[x1]);
                let near = blend(percent, YELLOW, BLACK);
                let far = blend(1.0 - percent, YELLOW, BLACK);
                draw_line_segment_mut(canvas, (x1 as f32, top), (x1 as f32, bottom), near);
                draw_line_segment_mut(canvas, (x2 as f32, top), (x2 as f32, bottom), far);
            }
        }
        targets.len()
    }

    pub fn draw_labels(&mut self, canvas: &mut RgbImage, interval: i64, y: u32, font: &LabelFont) {
        let (first, last) = self.span();
        for freq in gridline_frequencies(first, last, interval) {
            if !self.labelled.insert(freq) {
                continue;
            }
            let Some(x) = closest_index(freq as f64, self.axis) else {
                continue;
            };
            let label = font.render_label(&tape_label(freq, interval), TAPE_PT, BLACK, YELLOW);
            let left = x as i64 - (label.width() / 2) as i64;
            imageops::replace(canvas, &label, left, y as i64);
        }
    }
}

/// One entry of the gridline cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeScale {
    pub interval: i64,
    /// Top row of this scale's gridlines.
    pub y: u32,
    /// Gridline positions strictly inside the axis.
    pub hits: usize,
    pub labelled: bool,
}

/// Walks the cascade from coarse to fine. A scale is labelled when its
/// gridlines are more than 50 px apart, and the walk stops after the first
/// scale whose gridlines are closer than 10 px.
pub fn plan_tape(axis: &[f64], width: u32) -> Vec<TapeScale> {
    let (Some(&first), Some(&last)) = (axis.first(), axis.last()) else {
        return Vec::new();
    };
    let base = label_base(first, last);
    let mut scales = Vec::new();
    for (divisor, y) in SCALE_CASCADE {
        let interval = base / divisor;
        if interval < 1 {
            break;
        }
        let hits = gridline_frequencies(first, last, interval).len();
        if hits == 0 {
            scales.push(TapeScale {
                interval,
                y,
                hits,
                labelled: false,
            });
            continue;
        }
        let pixels_per_hit = width as i64 / hits as i64;
        debug!(interval, hits, pixels_per_hit, "tape scale");
        scales.push(TapeScale {
            interval,
            y,
            hits,
            labelled: pixels_per_hit > LABEL_MIN_SPACING,
        });
        if pixels_per_hit < GRID_MIN_SPACING {
            break;
        }
    }
    scales
}

/// Yellow tape with the gridlines and labels chosen by [`plan_tape`].
pub fn draw_tape(
    canvas: &mut RgbImage,
    summary: &Summary,
    layout: &RasterLayout,
    font: &LabelFont,
) {
    draw_filled_rect_mut(
        canvas,
        Rect::at(0, 0).of_size(layout.width.max(1), layout.tape_height),
        YELLOW,
    );
    let axis = summary.freqs.as_slice();
    let mut planner = TapePlanner::new(axis);
    for scale in plan_tape(axis, layout.width) {
        planner.draw_lines(canvas, scale.interval, scale.y, layout.tape_height);
        if scale.labelled {
            planner.draw_labels(canvas, scale.interval, scale.y.saturating_sub(TAPE_PT), font);
        }
    }
}

/// Rows that get a time-of-day label: the first row at least
/// `tick_seconds` after the previously labelled one, starting from the
/// capture start.
pub fn tick_rows(times: &TimeAxis, tick_seconds: f64) -> Vec<usize> {
    let mut rows = Vec::new();
    let mut last_label = times.start();
    for (row, key) in times.keys().iter().enumerate() {
        let Ok(label_time) = parse_time(key) else {
            continue;
        };
        let elapsed = (label_time - last_label).num_seconds() as f64;
        if elapsed >= tick_seconds {
            rows.push(row);
            last_label = label_time;
        }
    }
    rows
}

pub fn draw_time_ticks(
    canvas: &mut RgbImage,
    summary: &Summary,
    layout: &RasterLayout,
    font: &LabelFont,
    tick_seconds: f64,
) {
    let keys = summary.times.keys();
    for row in tick_rows(&summary.times, tick_seconds) {
        let key = &keys[row];
        let time_of_day = key.rsplit(' ').next().unwrap_or(key);
        let y = (row as u32 + layout.tape_height) as i32;
        font.shadow_text(canvas, 2, y, time_of_day, WHITE, BLACK);
    }
}
