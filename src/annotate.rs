//! Text overlay in the bottom-left corner of the waterfall.

use image::{Rgb, RgbImage};

use crate::color::{parse_color, BLACK, WHITE};
use crate::error::Result;
use crate::font::{LabelFont, FONT_SIZE};
use crate::params::{HeatmapParameters, TextEntry};
use crate::raster::RasterLayout;
use crate::summary::Summary;

/// rtl_power stamps a sweep when it starts; the last one runs roughly
/// this long past its timestamp.
const TRAILING_SWEEP_SECONDS: i64 = 30;

/// First line sits this far above the legend strip.
const FIRST_LINE_OFFSET: u32 = 5;

const TEXT_MARGIN: i32 = 2;
/// Leaves room for the time tick labels.
const TEXT_MARGIN_WITH_TICKS: i32 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub fg: Rgb<u8>,
    pub bg: Rgb<u8>,
}

impl TextLine {
    fn from_entry(entry: &TextEntry) -> Result<Self> {
        let fg = match &entry.fg_color {
            Some(name) => parse_color(name)?,
            None => WHITE,
        };
        let bg = match &entry.bg_color {
            Some(name) => parse_color(name)?,
            None => BLACK,
        };
        Ok(TextLine {
            text: entry.text.clone(),
            fg,
            bg,
        })
    }
}

/// Capture start, pixel size, frequency range and duration.
pub fn info_lines(summary: &Summary) -> Vec<TextEntry> {
    let start = summary.times.start();
    let duration = (summary.times.stop() - start).num_seconds() + TRAILING_SWEEP_SECONDS;
    let pixel_height = duration as f64 / summary.times.len().max(1) as f64;
    let hours = duration / 3600;
    let minutes = (duration - 3600 * hours) / 60;

    vec![
        TextEntry::plain(format!("Started: {}", start)),
        TextEntry::plain(format!(
            "Pixel: {:.2}Hz x {}s",
            summary.step,
            pixel_height.round() as i64
        )),
        TextEntry::plain(format!(
            "Range: {:.2}MHz - {:.2}MHz",
            summary.freqs.first() / 1e6,
            (summary.freqs.last() + summary.step) / 1e6
        )),
        TextEntry::plain(format!("Duration: {}:{:02}", hours, minutes)),
    ]
}

/// Info lines followed by the parameter texts, in drawing order.
pub fn compose_texts(summary: &Summary, params: &HeatmapParameters) -> Result<Vec<TextLine>> {
    let mut lines = info_lines(summary)
        .iter()
        .chain(params.texts.iter())
        .map(TextLine::from_entry)
        .collect::<Result<Vec<_>>>()?;
    if params.reverse_texts_order {
        lines.reverse();
    }
    Ok(lines)
}

/// Stacks `lines` upwards from just above the legend strip, first line
/// lowest.
pub fn draw_texts(
    canvas: &mut RgbImage,
    lines: &[TextLine],
    layout: &RasterLayout,
    font: &LabelFont,
    with_time_ticks: bool,
) {
    let margin = if with_time_ticks {
        TEXT_MARGIN_WITH_TICKS
    } else {
        TEXT_MARGIN
    };
    for (idx, line) in lines.iter().enumerate() {
        let ypos = FIRST_LINE_OFFSET + idx as u32 * FONT_SIZE;
        let y = layout.height as i32 - (ypos + FONT_SIZE + layout.legends_height) as i32;
        font.shadow_text(canvas, margin, y, &line.text, line.fg, line.bg);
    }
}
