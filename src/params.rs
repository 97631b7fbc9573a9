//! Heatmap parameter files: JSON objects merged key by key, later files
//! winning, then read into typed settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{HeatmapError, Result};
use crate::summary::PowerRange;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DbParameters {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Values at or below this render in the quiet red band.
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextEntry {
    pub text: String,
    pub fg_color: Option<String>,
    pub bg_color: Option<String>,
}

impl TextEntry {
    pub fn plain(text: impl Into<String>) -> Self {
        TextEntry {
            text: text.into(),
            fg_color: None,
            bg_color: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeatmapParameters {
    pub db: Option<DbParameters>,
    pub texts: Vec<TextEntry>,
    /// Station files to draw as legends.
    pub legends: Vec<PathBuf>,
    #[serde(rename = "reversetextsorder")]
    pub reverse_texts_order: bool,
}

impl HeatmapParameters {
    /// Fixed color range, only when both ends are given.
    pub fn db_limit(&self) -> Option<PowerRange> {
        let db = self.db.as_ref()?;
        Some(PowerRange::fixed(db.min?, db.max?))
    }

    pub fn mean(&self) -> Option<f64> {
        self.db.as_ref().and_then(|db| db.mean)
    }
}

/// Top-level keys of `overlay` replace those of `base`; nested objects are
/// not merged.
pub fn merge_objects(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let text = fs::read_to_string(path).map_err(|source| HeatmapError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| HeatmapError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_parameters<P: AsRef<Path>>(paths: &[P]) -> Result<HeatmapParameters> {
    let mut merged = Map::new();
    for path in paths {
        let path = path.as_ref();
        info!("loading parameters from {}", path.display());
        merge_objects(&mut merged, read_object(path)?);
    }
    let origin = paths
        .last()
        .map(|p| p.as_ref().to_path_buf())
        .unwrap_or_default();
    serde_json::from_value(Value::Object(merged)).map_err(|source| HeatmapError::Json {
        path: origin,
        source,
    })
}
