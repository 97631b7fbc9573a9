use std::fs;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};

use crate::error::{HeatmapError, Result};

pub const DEFAULT_FONT_PATH: &str = "Vera.ttf";

/// Pixel size of overlay and legend text.
pub const FONT_SIZE: u32 = 10;

/// Labels are rasterised at this multiple and shrunk back down.
const SUPERSAMPLE: u32 = 3;

pub struct LabelFont {
    font: FontVec,
    scale: PxScale,
}

impl LabelFont {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(HeatmapError::MissingFontResource {
                path: path.to_path_buf(),
            });
        }
        let data = fs::read(path).map_err(|source| HeatmapError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let font = FontVec::try_from_vec(data).map_err(|_| HeatmapError::InvalidFont {
            path: path.to_path_buf(),
        })?;
        Ok(LabelFont {
            font,
            scale: PxScale::from(FONT_SIZE as f32),
        })
    }

    pub fn text_size(&self, text: &str) -> (u32, u32) {
        text_size(self.scale, &self.font, text)
    }

    pub fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        draw_text_mut(canvas, color, x, y, self.scale, &self.font, text);
    }

    /// Text with a one pixel drop shadow in `bg`.
    pub fn shadow_text(
        &self,
        canvas: &mut RgbImage,
        x: i32,
        y: i32,
        text: &str,
        fg: Rgb<u8>,
        bg: Rgb<u8>,
    ) {
        self.draw(canvas, x + 1, y + 1, text, bg);
        self.draw(canvas, x, y, text, fg);
    }

    /// Renders `text` at `pt * 3` px on a `bg` tile and downsamples it to a
    /// smooth `pt`-sized label. The tile is `pt * 3 + 3` px tall before
    /// shrinking because glyph metrics under-report descenders.
    pub fn render_label(&self, text: &str, pt: u32, fg: Rgb<u8>, bg: Rgb<u8>) -> RgbImage {
        let big = PxScale::from((pt * SUPERSAMPLE) as f32);
        let (width, _) = text_size(big, &self.font, text);
        let height = pt * SUPERSAMPLE + 3;
        let mut tile = RgbImage::from_pixel(width.max(SUPERSAMPLE), height, bg);
        draw_text_mut(&mut tile, fg, 0, 0, big, &self.font, text);
        imageops::resize(
            &tile,
            (tile.width() / SUPERSAMPLE).max(1),
            height / SUPERSAMPLE,
            FilterType::Lanczos3,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_font_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Vera.ttf");
        match LabelFont::load(&path) {
            Err(HeatmapError::MissingFontResource { path: reported }) => assert_eq!(reported, path),
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("font should not load"),
        }
    }

    #[test]
    fn test_garbage_font_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"not a font").unwrap();
        assert!(matches!(LabelFont::load(&path), Err(HeatmapError::InvalidFont { .. })));
    }
}
