use image::Rgb;

use crate::error::{HeatmapError, Result};
use crate::summary::PowerRange;

pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);
pub const CYAN: Rgb<u8> = Rgb([0, 255, 255]);

/// Blue channel of every waterfall pixel above the quiet threshold.
const BLUE_LEVEL: u8 = 50;

/// Maps a dB value to the waterfall palette.
///
/// The ramp runs from (0,0,50) at `min_z` to (255,255,50) at `max_z`. With
/// a `mean` threshold, values at or below it lose their green channel and
/// render as a dark red "quiet" band. Values outside the range are not
/// rescaled; the channel saturates at 0 or 255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMapper {
    range: PowerRange,
    mean: Option<f64>,
}

impl ColorMapper {
    pub fn new(range: PowerRange, mean: Option<f64>) -> Self {
        ColorMapper { range, mean }
    }

    /// Position of `z` on the ramp; 0 for a degenerate range.
    pub fn level(&self, z: f64) -> f64 {
        let span = self.range.max_z - self.range.min_z;
        if span == 0.0 {
            return 0.0;
        }
        (z - self.range.min_z) / span
    }

    pub fn map(&self, z: f64) -> Rgb<u8> {
        let c = channel(self.level(z));
        match self.mean {
            Some(mean) if z <= mean => Rgb([c, 0, 0]),
            _ => Rgb([c, c, BLUE_LEVEL]),
        }
    }
}

// Rounds to nearest; `as` saturates anything outside 0..=255.
fn channel(level: f64) -> u8 {
    (level * 255.0).round() as u8
}

/// `c1 * percent + c2 * (1 - percent)`, per channel.
pub fn blend(percent: f64, c1: Rgb<u8>, c2: Rgb<u8>) -> Rgb<u8> {
    let mix = |a: u8, b: u8| (a as f64 * percent + b as f64 * (1.0 - percent)).round() as u8;
    Rgb([mix(c1[0], c2[0]), mix(c1[1], c2[1]), mix(c1[2], c2[2])])
}

/// Color names accepted in parameter files, plus `#rgb` / `#rrggbb`.
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("lime", [0, 255, 0]),
    ("green", [0, 128, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("orange", [255, 165, 0]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
    ("navy", [0, 0, 128]),
    ("purple", [128, 0, 128]),
];

pub fn parse_color(value: &str) -> Result<Rgb<u8>> {
    let name = value.trim();
    let invalid = || HeatmapError::InvalidColor {
        value: value.to_string(),
    };

    if let Some(hex) = name.strip_prefix('#') {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()
            .ok_or_else(invalid)?;
        return match digits.as_slice() {
            [r, g, b] => Ok(Rgb([r * 17, g * 17, b * 17])),
            [r1, r2, g1, g2, b1, b2] => Ok(Rgb([r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2])),
            _ => Err(invalid()),
        };
    }

    NAMED_COLORS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, rgb)| Rgb(*rgb))
        .ok_or_else(invalid)
}
