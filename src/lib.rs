//! Waterfall heatmaps from rtl_power sweep logs.
//!
//! The input is read twice: [`summary`] builds the frequency and time axes,
//! then [`raster`] paints each record onto a canvas sized from them. Tape,
//! legends and text are drawn on top by [`ticks`], [`legend`] and
//! [`annotate`]. [`pipeline::render`] ties the stages together.

pub mod annotate;
pub mod color;
pub mod error;
pub mod font;
pub mod input_support;
pub mod legend;
pub mod logging;
pub mod params;
pub mod pipeline;
pub mod raster;
pub mod record;
pub mod slice;
pub mod summary;
pub mod ticks;
pub mod units;

pub use error::{HeatmapError, Result};
