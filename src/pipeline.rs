use std::path::PathBuf;

use tracing::info;

use crate::annotate::{compose_texts, draw_texts};
use crate::color::ColorMapper;
use crate::error::Result;
use crate::font::{LabelFont, DEFAULT_FONT_PATH};
use crate::legend::{draw_legends, load_bands, LegendPacker};
use crate::params::load_parameters;
use crate::raster::{PaintStats, RasterLayout, RasterWriter};
use crate::slice::FrequencyBounds;
use crate::summary::{summarize_file, PowerRange, SweepSettings};
use crate::ticks::{draw_tape, draw_time_ticks};

/// Everything one run needs, already parsed into Hz, seconds and dB.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub offset_hz: f64,
    pub bounds: FrequencyBounds,
    pub db_override: Option<PowerRange>,
    /// Seconds between time-of-day labels; `None` disables them.
    pub time_tick: Option<f64>,
    pub parameters: Vec<PathBuf>,
    pub font_path: PathBuf,
}

impl RenderOptions {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        RenderOptions {
            input: input.into(),
            output: output.into(),
            offset_hz: 0.0,
            bounds: FrequencyBounds::default(),
            db_override: None,
            time_tick: None,
            parameters: Vec::new(),
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderReport {
    pub width: u32,
    pub height: u32,
    pub power: PowerRange,
    pub stats: PaintStats,
}

/// Reads the sweep file twice and writes the annotated waterfall.
pub fn render(opts: &RenderOptions) -> Result<RenderReport> {
    // Fail before the slow passes when the font is unusable.
    let font = LabelFont::load(&opts.font_path)?;
    let params = load_parameters(&opts.parameters)?;

    let settings = SweepSettings {
        offset_hz: opts.offset_hz,
        bounds: opts.bounds,
        db_override: params.db_limit().or(opts.db_override),
    };

    info!("loading {}", opts.input.display());
    let summary = summarize_file(&opts.input, settings)?;

    let bands = load_bands(&params.legends)?;
    let legends = LegendPacker::default().pack(bands, &summary);
    let layout = RasterLayout::new(&summary, legends.height());

    info!("drawing");
    let mut canvas = layout.allocate();
    let mapper = ColorMapper::new(summary.power, params.mean());
    let writer = RasterWriter::new(&summary, settings, mapper, layout);
    let stats = writer.paint_file(&mut canvas, &opts.input)?;

    info!("labeling");
    draw_tape(&mut canvas, &summary, &layout, &font);
    if let Some(seconds) = opts.time_tick {
        draw_time_ticks(&mut canvas, &summary, &layout, &font, seconds);
    }
    draw_legends(&mut canvas, &legends, &summary, &layout, &font);
    let texts = compose_texts(&summary, &params)?;
    draw_texts(&mut canvas, &texts, &layout, &font, opts.time_tick.is_some());

    info!("saving {}", opts.output.display());
    canvas.save(&opts.output)?;

    Ok(RenderReport {
        width: layout.width,
        height: layout.height,
        power: summary.power,
        stats,
    })
}
