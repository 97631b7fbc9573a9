//! Second pass: paints every record onto a canvas sized from the summary.

use std::io;
use std::path::Path;

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::color::ColorMapper;
use crate::error::Result;
use crate::input_support::open_lines;
use crate::record::{decode_line, SweepRecord};
use crate::slice::kept_columns;
use crate::summary::{Summary, SweepSettings};

/// Rows reserved above the waterfall for the frequency tape.
pub const TAPE_HEIGHT: u32 = 25;

/// Vertical layout of the output image, top to bottom:
/// tape, waterfall (one row per timestamp), legend strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterLayout {
    pub width: u32,
    pub height: u32,
    pub tape_height: u32,
    pub waterfall_height: u32,
    pub legends_height: u32,
}

impl RasterLayout {
    pub fn new(summary: &Summary, legends_height: u32) -> Self {
        let width = summary.freqs.len() as u32;
        let waterfall_height = summary.times.len() as u32;
        RasterLayout {
            width,
            height: TAPE_HEIGHT + waterfall_height + legends_height,
            tape_height: TAPE_HEIGHT,
            waterfall_height,
            legends_height,
        }
    }

    pub fn allocate(&self) -> RgbImage {
        RgbImage::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(usize),
    /// Timestamp absent from the time axis; the file grew after pass 1.
    StaleTimestamp,
    /// Nothing of the record survives the frequency window.
    Excluded,
    /// First kept frequency is not on the axis.
    OffAxis,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintStats {
    pub records: usize,
    pub pixels: usize,
    pub stale: usize,
    pub skipped: usize,
}

pub struct RasterWriter<'a> {
    summary: &'a Summary,
    settings: SweepSettings,
    mapper: ColorMapper,
    layout: RasterLayout,
}

impl<'a> RasterWriter<'a> {
    pub fn new(
        summary: &'a Summary,
        settings: SweepSettings,
        mapper: ColorMapper,
        layout: RasterLayout,
    ) -> Self {
        RasterWriter {
            summary,
            settings,
            mapper,
            layout,
        }
    }

    pub fn write_record(&self, canvas: &mut RgbImage, record: &SweepRecord) -> WriteOutcome {
        let Some(row) = self.summary.times.row_of(&record.time_key()) else {
            return WriteOutcome::StaleTimestamp;
        };
        let Some(kept) = kept_columns(record, &self.settings.bounds) else {
            return WriteOutcome::Excluded;
        };
        let Some(x_start) = self.summary.freqs.position(kept.first_freq) else {
            return WriteOutcome::OffAxis;
        };

        let y = row as u32 + self.layout.tape_height;
        let mut written = 0;
        for (offset, &z) in kept.samples.iter().enumerate() {
            let x = x_start + offset;
            if x >= self.layout.width as usize {
                continue;
            }
            canvas.put_pixel(x as u32, y, self.mapper.map(z));
            written += 1;
        }
        WriteOutcome::Written(written)
    }

    pub fn paint_lines<I>(&self, canvas: &mut RgbImage, lines: I) -> Result<PaintStats>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        let mut stats = PaintStats::default();
        for (idx, line) in lines.into_iter().enumerate() {
            let line = line?;
            let record = match decode_line(&line, self.settings.offset_hz, idx + 1) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!("skipping record: {}", e);
                    continue;
                }
            };
            match self.write_record(canvas, &record) {
                WriteOutcome::Written(n) => {
                    stats.records += 1;
                    stats.pixels += n;
                }
                WriteOutcome::StaleTimestamp => {
                    debug!(line = idx + 1, "timestamp not in pass 1 axis, skipped");
                    stats.stale += 1;
                }
                WriteOutcome::OffAxis => {
                    debug!(line = idx + 1, "first kept frequency not on the axis, skipped");
                    stats.skipped += 1;
                }
                WriteOutcome::Excluded => stats.skipped += 1,
            }
        }
        Ok(stats)
    }

    pub fn paint_file(&self, canvas: &mut RgbImage, path: &Path) -> Result<PaintStats> {
        let stats = self.paint_lines(canvas, open_lines(path)?)?;
        info!(
            "painted {} records ({} pixels), {} stale, {} outside the window",
            stats.records, stats.pixels, stats.stale, stats.skipped
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::FrequencyBounds;
    use crate::summary::{scan_lines, PowerRange};
    use image::Rgb;
    use std::io::Write;

    fn lines(text: &str) -> Vec<io::Result<String>> {
        text.lines().map(|l| Ok(l.to_string())).collect()
    }

    const SAME_TIME: &str = "\
2020-01-01, 10:00:00, 1000, 1004, 1.0, 4, 0, 10, 20, 30
2020-01-01, 10:00:00, 1004, 1010, 2.0, 3, 40, 50, 60
";

    #[test]
    fn test_same_timestamp_merges_into_one_row() {
        let settings = SweepSettings {
            db_override: Some(PowerRange::fixed(0.0, 60.0)),
            ..SweepSettings::default()
        };
        let summary = scan_lines(lines(SAME_TIME), settings).unwrap();
        let layout = RasterLayout::new(&summary, 0);
        assert_eq!(layout.width, 7);
        assert_eq!(layout.height, TAPE_HEIGHT + 1);

        let mapper = ColorMapper::new(summary.power, None);
        let writer = RasterWriter::new(&summary, settings, mapper, layout);
        let mut canvas = layout.allocate();
        let stats = writer.paint_lines(&mut canvas, lines(SAME_TIME)).unwrap();
        assert_eq!(stats.records, 2);
        assert_eq!(stats.pixels, 7);

        let row = TAPE_HEIGHT;
        let expected = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0];
        for (x, z) in expected.iter().enumerate() {
            assert_eq!(*canvas.get_pixel(x as u32, row), mapper.map(*z), "column {}", x);
        }
        assert_eq!(*canvas.get_pixel(6, row), Rgb([255, 255, 50]));
    }

    #[test]
    fn test_stale_timestamp_is_skipped() {
        let settings = SweepSettings::default();
        let summary = scan_lines(lines(SAME_TIME), settings).unwrap();
        let layout = RasterLayout::new(&summary, 0);
        let mapper = ColorMapper::new(summary.power, None);
        let writer = RasterWriter::new(&summary, settings, mapper, layout);
        let mut canvas = layout.allocate();
        let grown = format!("{}2020-01-01, 10:00:10, 1000, 1004, 1.0, 4, 1, 2, 3, 4\n", SAME_TIME);
        let stats = writer.paint_lines(&mut canvas, lines(&grown)).unwrap();
        assert_eq!(stats.records, 2);
        assert_eq!(stats.stale, 1);
    }

    #[test]
    fn test_window_is_consistent_between_passes() {
        let settings = SweepSettings {
            bounds: FrequencyBounds::new(Some(1002.0), Some(1006.0)),
            db_override: Some(PowerRange::fixed(0.0, 60.0)),
            ..SweepSettings::default()
        };
        let summary = scan_lines(lines(SAME_TIME), settings).unwrap();
        assert_eq!(summary.freqs.as_slice(), &[1002.0, 1003.0, 1004.0, 1006.0]);
        let layout = RasterLayout::new(&summary, 0);
        let mapper = ColorMapper::new(summary.power, None);
        let writer = RasterWriter::new(&summary, settings, mapper, layout);
        let mut canvas = layout.allocate();
        writer.paint_lines(&mut canvas, lines(SAME_TIME)).unwrap();
        let row = TAPE_HEIGHT;
        assert_eq!(*canvas.get_pixel(0, row), mapper.map(20.0));
        assert_eq!(*canvas.get_pixel(1, row), mapper.map(30.0));
        assert_eq!(*canvas.get_pixel(2, row), mapper.map(40.0));
        assert_eq!(*canvas.get_pixel(3, row), mapper.map(50.0));
    }

    #[test]
    fn test_paint_file_from_gzip() {
        let mut file = tempfile::Builder::new().suffix(".csv.gz").tempfile().unwrap();
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(SAME_TIME.as_bytes()).unwrap();
        file.write_all(&encoder.finish().unwrap()).unwrap();
        file.flush().unwrap();

        let settings = SweepSettings::default();
        let summary = crate::summary::summarize_file(file.path(), settings).unwrap();
        let plain = scan_lines(lines(SAME_TIME), settings).unwrap();
        assert_eq!(summary, plain);

        let layout = RasterLayout::new(&summary, 28);
        let mapper = ColorMapper::new(summary.power, None);
        let writer = RasterWriter::new(&summary, settings, mapper, layout);
        let mut canvas = layout.allocate();
        let stats = writer.paint_file(&mut canvas, file.path()).unwrap();
        assert_eq!(stats.pixels, 7);
        assert_eq!(canvas.height(), TAPE_HEIGHT + 1 + 28);
    }
}
