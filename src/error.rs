use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HeatmapError>;

#[derive(Error, Debug)]
pub enum HeatmapError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to read {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The label font is required for every run; there is no fallback face.
    #[error("font file {path:?} not found (download Vera.ttf or pass --font)")]
    MissingFontResource { path: PathBuf },

    #[error("font file {path:?} is not a usable TrueType/OpenType font")]
    InvalidFont { path: PathBuf },

    #[error("unrecognized unit in '{value}'")]
    UnrecognizedUnit { value: String },

    #[error("invalid number '{value}'")]
    InvalidNumber { value: String },

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("no sweep data left to draw (check --low/--high against the input range)")]
    EmptyInput,

    #[error("invalid timestamp '{value}', expected YYYY-MM-DD HH:MM:SS")]
    InvalidTimestamp { value: String },

    #[error("unknown color '{value}'")]
    InvalidColor { value: String },

    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
