//! Station legends: loading, greedy row packing, drawing.

use std::fs;
use std::path::Path;

use image::RgbImage;
use imageproc::drawing::{draw_filled_ellipse_mut, draw_line_segment_mut};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::color::{BLACK, CYAN, WHITE};
use crate::error::{HeatmapError, Result};
use crate::font::{LabelFont, FONT_SIZE};
use crate::raster::RasterLayout;
use crate::summary::Summary;
use crate::units::UnitValue;

pub const MAX_LEGEND_ROWS: usize = 5;
pub const LEGEND_LINE_HEIGHT: u32 = 8;
pub const LEGEND_LINE_SPACE: u32 = 10;

/// Height of one legend lane: label, bracket and spacing.
pub const LEGEND_ROW_HEIGHT: u32 = FONT_SIZE + LEGEND_LINE_HEIGHT + LEGEND_LINE_SPACE;

/// A named frequency interval, normalised to both edge and centre form.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendBand {
    pub name: String,
    pub freq_left: f64,
    pub freq_right: f64,
    pub bandwidth: f64,
    pub center: f64,
    /// Edges clamped to one step beyond the frequency axis, for drawing.
    pub cropped_left: f64,
    pub cropped_right: f64,
}

impl LegendBand {
    pub fn from_edges(name: impl Into<String>, left: f64, right: f64) -> Self {
        let bandwidth = right - left;
        LegendBand {
            name: name.into(),
            freq_left: left,
            freq_right: right,
            bandwidth,
            center: left + bandwidth / 2.0,
            cropped_left: left,
            cropped_right: right,
        }
    }

    pub fn from_center(name: impl Into<String>, center: f64, bandwidth: f64) -> Self {
        let left = center - bandwidth / 2.0;
        LegendBand {
            name: name.into(),
            freq_left: left,
            freq_right: left + bandwidth,
            bandwidth,
            center,
            cropped_left: left,
            cropped_right: left + bandwidth,
        }
    }

    pub fn crop(&mut self, axis_first: f64, axis_last: f64, step: f64) {
        self.cropped_left = self.freq_left.max(axis_first - step);
        self.cropped_right = self.freq_right.min(axis_last + step);
    }

    pub fn cropped_bandwidth(&self) -> f64 {
        self.cropped_right - self.cropped_left
    }

    pub fn cropped_center(&self) -> f64 {
        self.cropped_left + self.cropped_bandwidth() / 2.0
    }

    /// An edge inside `[first, last]`, or the band covers all of it.
    pub fn is_visible(&self, first: f64, last: f64) -> bool {
        let inside = |f: f64| first <= f && f <= last;
        inside(self.freq_left)
            || inside(self.freq_right)
            || (self.freq_left <= first && self.freq_right >= last)
    }

    pub fn overlaps(&self, other: &LegendBand) -> bool {
        self.freq_left < other.freq_right && other.freq_left < self.freq_right
    }
}

#[derive(Debug, Deserialize)]
struct StationFile {
    #[serde(default)]
    stations: Vec<StationEntry>,
}

#[derive(Debug, Deserialize)]
struct StationEntry {
    name: Option<String>,
    freq_left: Option<UnitValue>,
    freq_right: Option<UnitValue>,
    freq_center: Option<UnitValue>,
    bw: Option<UnitValue>,
}

impl StationEntry {
    fn into_band(self) -> Result<Option<LegendBand>> {
        let Some(name) = self.name else {
            return Ok(None);
        };
        match (self.freq_left, self.freq_right, self.freq_center, self.bw) {
            (Some(left), Some(right), _, _) => {
                Ok(Some(LegendBand::from_edges(name, left.to_hz()?, right.to_hz()?)))
            }
            (_, _, Some(center), Some(bw)) => {
                Ok(Some(LegendBand::from_center(name, center.to_hz()?, bw.to_hz()?)))
            }
            _ => {
                warn!("station '{}' has neither freq_left/freq_right nor freq_center/bw", name);
                Ok(None)
            }
        }
    }
}

pub fn parse_stations(text: &str, path: &Path) -> Result<Vec<LegendBand>> {
    let file: StationFile = serde_json::from_str(text).map_err(|source| HeatmapError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bands = Vec::with_capacity(file.stations.len());
    for entry in file.stations {
        if let Some(band) = entry.into_band()? {
            bands.push(band);
        }
    }
    Ok(bands)
}

/// Reads every station file; files that do not exist are skipped.
pub fn load_bands<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<LegendBand>> {
    let mut bands = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if !path.is_file() {
            warn!("legend file {:?} not found, skipped", path);
            continue;
        }
        let text = fs::read_to_string(path).map_err(|source| HeatmapError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let loaded = parse_stations(&text, path)?;
        debug!("{} stations from {:?}", loaded.len(), path);
        bands.extend(loaded);
    }
    Ok(bands)
}

/// Packed legend lanes, top lane first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegendRows {
    rows: Vec<Vec<LegendBand>>,
}

impl LegendRows {
    pub fn rows(&self) -> &[Vec<LegendBand>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn height(&self) -> u32 {
        self.rows.len() as u32 * LEGEND_ROW_HEIGHT
    }
}

/// Greedy first-fit placement of bands into lanes, widest band first.
///
/// This is not optimal interval colouring: wide bands settle into the first
/// lanes and narrow ones fill the gaps they leave. Bands that fit nowhere
/// once `max_rows` lanes exist are dropped.
#[derive(Debug, Clone, Copy)]
pub struct LegendPacker {
    pub max_rows: usize,
}

impl Default for LegendPacker {
    fn default() -> Self {
        LegendPacker {
            max_rows: MAX_LEGEND_ROWS,
        }
    }
}

impl LegendPacker {
    pub fn pack(&self, bands: Vec<LegendBand>, summary: &Summary) -> LegendRows {
        self.pack_span(bands, summary.freqs.first(), summary.freqs.last(), summary.step)
    }

    pub fn pack_span(
        &self,
        bands: Vec<LegendBand>,
        first: f64,
        last: f64,
        step: f64,
    ) -> LegendRows {
        let mut visible: Vec<LegendBand> = bands
            .into_iter()
            .filter(|band| band.is_visible(first, last))
            .map(|mut band| {
                band.crop(first, last, step);
                band
            })
            .collect();
        visible.sort_by(|a, b| b.bandwidth.total_cmp(&a.bandwidth));

        let mut rows: Vec<Vec<LegendBand>> = Vec::new();
        let mut dropped = 0;
        for band in visible {
            match rows.iter().position(|row| fits(row, &band)) {
                Some(idx) => {
                    let row = &mut rows[idx];
                    row.push(band);
                    row.sort_by(|a, b| {
                        a.freq_left
                            .total_cmp(&b.freq_left)
                            .then(a.freq_right.total_cmp(&b.freq_right))
                    });
                }
                None if rows.len() < self.max_rows => rows.push(vec![band]),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!("{} legend bands dropped, all {} rows full", dropped, self.max_rows);
        }
        rows.reverse();
        LegendRows { rows }
    }
}

/// A row is sorted by `freq_left` and free of overlaps, so a band fits when
/// it lies after the last member, before the first, or inside the gap
/// between two neighbours.
fn fits(row: &[LegendBand], band: &LegendBand) -> bool {
    let (Some(first), Some(last)) = (row.first(), row.last()) else {
        return true;
    };
    if band.freq_left >= last.freq_right || band.freq_right <= first.freq_left {
        return true;
    }
    row.windows(2)
        .any(|pair| band.freq_left >= pair[0].freq_right && band.freq_right <= pair[1].freq_left)
}

/// How a placed band is marked under its label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegendMarker {
    /// Span wider than 5 px. A clipped end runs off the canvas and is
    /// drawn dotted instead of with a vertical tick.
    Bracket {
        left: f32,
        right: f32,
        clipped_left: bool,
        clipped_right: bool,
    },
    Dot,
}

/// A band placed on its legend row, in canvas x coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendMark<'a> {
    pub band: &'a LegendBand,
    pub row: usize,
    pub text_x: f32,
    pub center: f32,
    pub marker: LegendMarker,
}

/// Positions every band whose centred label clears the previous label on
/// its row; bands whose labels would collide are left out entirely.
pub fn layout_legends<'a, F>(
    legends: &'a LegendRows,
    first: f64,
    last: f64,
    width: u32,
    text_width: F,
) -> Vec<LegendMark<'a>>
where
    F: Fn(&str) -> u32,
{
    let span = last - first;
    if legends.is_empty() || span <= 0.0 {
        return Vec::new();
    }
    let freq_pixel = width as f64 / span;
    let to_x = |freq: f64| ((freq - first) * freq_pixel) as f32;

    let mut marks = Vec::new();
    for (row_idx, row) in legends.rows().iter().enumerate() {
        let mut last_text_end = 0.0f32;
        for band in row {
            let center = to_x(band.cropped_center());
            let left = to_x(band.cropped_left);
            let right = to_x(band.cropped_left + band.cropped_bandwidth());

            let text_w = text_width(&band.name) as f32;
            let text_x = center - text_w / 2.0;
            if text_x < last_text_end {
                continue;
            }
            last_text_end = text_x + text_w;

            let marker = if (right - left) as i32 > 5 {
                LegendMarker::Bracket {
                    left,
                    right,
                    clipped_left: left < 0.0,
                    clipped_right: right > width as f32,
                }
            } else {
                LegendMarker::Dot
            };
            marks.push(LegendMark {
                band,
                row: row_idx,
                text_x,
                center,
                marker,
            });
        }
    }
    marks
}

/// Bracket or dot for one mark whose row starts at `ypos`.
pub fn draw_marker(canvas: &mut RgbImage, mark: &LegendMark<'_>, ypos: f32) {
    let bar_y = ypos + LEGEND_LINE_HEIGHT as f32;
    match mark.marker {
        LegendMarker::Bracket {
            left,
            right,
            clipped_left,
            clipped_right,
        } => {
            draw_line_segment_mut(canvas, (left + 1.0, bar_y), (right - 1.0, bar_y), WHITE);
            draw_line_segment_mut(
                canvas,
                (mark.center, bar_y),
                (mark.center, bar_y + 5.0),
                WHITE,
            );
            if clipped_left {
                dotted_end(canvas, left, bar_y, 1.0);
            } else {
                draw_line_segment_mut(canvas, (left + 1.0, bar_y), (left + 1.0, ypos), WHITE);
            }
            if clipped_right {
                dotted_end(canvas, right, bar_y, -1.0);
            } else {
                draw_line_segment_mut(canvas, (right - 1.0, bar_y), (right - 1.0, ypos), WHITE);
            }
        }
        LegendMarker::Dot => {
            let center_y = ypos + LEGEND_LINE_HEIGHT as f32 / 2.0;
            draw_filled_ellipse_mut(canvas, (mark.center as i32, center_y as i32), 1, 1, CYAN);
        }
    }
}

/// Draws packed legends into the strip below the waterfall.
pub fn draw_legends(
    canvas: &mut RgbImage,
    legends: &LegendRows,
    summary: &Summary,
    layout: &RasterLayout,
    font: &LabelFont,
) {
    let marks = layout_legends(
        legends,
        summary.freqs.first(),
        summary.freqs.last(),
        layout.width,
        |name| font.text_size(name).0,
    );
    let strip_top = layout.height - layout.legends_height;
    for mark in &marks {
        let ypos = (strip_top + mark.row as u32 * LEGEND_ROW_HEIGHT) as f32;
        let text_y = (ypos + LEGEND_LINE_HEIGHT as f32 + 6.0) as i32;
        font.draw(canvas, mark.text_x as i32, text_y, &mark.band.name, WHITE);
        draw_marker(canvas, mark, ypos);
    }
}

// Black dots marking a band that continues past the canvas edge.
fn dotted_end(canvas: &mut RgbImage, x: f32, y: f32, direction: f32) {
    for idx in (0..10).step_by(2) {
        let px = (x + direction * idx as f32) as i64;
        let py = y as i64;
        if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
            canvas.put_pixel(px as u32, py as u32, BLACK);
        }
    }
}
