//! First pass over the sweep file: builds the frequency and time axes and
//! the power range that size and scale the raster.

use std::collections::{BTreeSet, HashSet};
use std::io;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::error::{HeatmapError, Result};
use crate::input_support::open_lines;
use crate::record::{decode_line, SweepRecord};
use crate::slice::{kept_columns, FrequencyBounds};

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT).map_err(|_| HeatmapError::InvalidTimestamp {
        value: value.to_string(),
    })
}

/// Lower/upper dB used by the color mapper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerRange {
    pub min_z: f64,
    pub max_z: f64,
}

impl PowerRange {
    /// A fixed range; the arguments may come in either order.
    pub fn fixed(a: f64, b: f64) -> Self {
        PowerRange {
            min_z: a.min(b),
            max_z: a.max(b),
        }
    }
}

/// Settings shared by both passes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SweepSettings {
    pub offset_hz: f64,
    pub bounds: FrequencyBounds,
    /// When set, the data never widens or narrows the range.
    pub db_override: Option<PowerRange>,
}

/// Sorted, de-duplicated column frequencies. Spacing is not uniform.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyAxis {
    freqs: Vec<f64>,
}

impl FrequencyAxis {
    pub fn from_unsorted(mut freqs: Vec<f64>) -> Self {
        freqs.sort_by(|a, b| a.total_cmp(b));
        freqs.dedup();
        FrequencyAxis { freqs }
    }

    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.freqs
    }

    pub fn first(&self) -> f64 {
        self.freqs.first().copied().unwrap_or(0.0)
    }

    pub fn last(&self) -> f64 {
        self.freqs.last().copied().unwrap_or(0.0)
    }

    /// Column of an exact frequency value.
    pub fn position(&self, freq: f64) -> Option<usize> {
        self.freqs.binary_search_by(|f| f.total_cmp(&freq)).ok()
    }
}

/// Sorted distinct `"date time"` keys, one raster row each.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    keys: Vec<String>,
    start: NaiveDateTime,
    stop: NaiveDateTime,
}

impl TimeAxis {
    pub fn from_sorted(keys: Vec<String>) -> Result<Self> {
        let first = keys.first().ok_or(HeatmapError::EmptyInput)?;
        let last = keys.last().ok_or(HeatmapError::EmptyInput)?;
        let start = parse_time(first)?;
        let stop = parse_time(last)?;
        Ok(TimeAxis { keys, start, stop })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn row_of(&self, key: &str) -> Option<usize> {
        self.keys.binary_search_by(|k| k.as_str().cmp(key)).ok()
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn stop(&self) -> NaiveDateTime {
        self.stop
    }
}

/// Result of pass 1, handed unchanged to the raster stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub freqs: FrequencyAxis,
    pub times: TimeAxis,
    pub power: PowerRange,
    /// Step of the last record read; rtl_power writes one step per file.
    pub step: f64,
}

/// Accumulates axes and power extremes while records stream past.
#[derive(Debug)]
pub struct AxisBuilder {
    settings: SweepSettings,
    freqs: Vec<f64>,
    grid_cache: HashSet<(u64, u64, u64, usize)>,
    times: BTreeSet<String>,
    min_z: f64,
    max_z: f64,
    step: Option<f64>,
}

impl AxisBuilder {
    pub fn new(settings: SweepSettings) -> Self {
        AxisBuilder {
            settings,
            freqs: Vec::new(),
            grid_cache: HashSet::new(),
            times: BTreeSet::new(),
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
            step: None,
        }
    }

    pub fn add_record(&mut self, record: &SweepRecord) {
        self.step = Some(record.step);
        let Some(kept) = kept_columns(record, &self.settings.bounds) else {
            return;
        };

        if self.grid_cache.insert(kept.grid_key()) {
            self.freqs.extend(kept.frequencies());
        }
        self.times.insert(record.time_key());

        if self.settings.db_override.is_none() {
            for &z in kept.samples {
                self.min_z = self.min_z.min(z);
                self.max_z = self.max_z.max(z);
            }
        }
    }

    pub fn finish(self) -> Result<Summary> {
        if self.freqs.is_empty() || self.times.is_empty() {
            return Err(HeatmapError::EmptyInput);
        }
        let step = self.step.ok_or(HeatmapError::EmptyInput)?;
        let freqs = FrequencyAxis::from_unsorted(self.freqs);
        let times = TimeAxis::from_sorted(self.times.into_iter().collect())?;
        let power = self.settings.db_override.unwrap_or(PowerRange {
            min_z: self.min_z,
            max_z: self.max_z,
        });
        debug!(grids = self.grid_cache.len(), "distinct sweep shapes");
        Ok(Summary {
            freqs,
            times,
            power,
            step,
        })
    }
}

/// Runs pass 1 over a line stream. Malformed records are logged and skipped.
pub fn scan_lines<I>(lines: I, settings: SweepSettings) -> Result<Summary>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut builder = AxisBuilder::new(settings);
    for (idx, line) in lines.into_iter().enumerate() {
        let line = line?;
        match decode_line(&line, settings.offset_hz, idx + 1) {
            Ok(Some(record)) => builder.add_record(&record),
            Ok(None) => {}
            Err(e) => warn!("skipping record: {}", e),
        }
    }
    builder.finish()
}

pub fn summarize_file(path: &Path, settings: SweepSettings) -> Result<Summary> {
    let summary = scan_lines(open_lines(path)?, settings)?;
    info!(
        "File info: Freq: {:.2}MHz-{:.2}MHz / Time: {}-{}",
        summary.freqs.first() / 1e6,
        summary.freqs.last() / 1e6,
        summary.times.start(),
        summary.times.stop()
    );
    info!(
        "Img info: x: {}, y: {}, z: ({}, {})",
        summary.freqs.len(),
        summary.times.len(),
        summary.power.min_z,
        summary.power.max_z
    );
    Ok(summary)
}
