use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::debug;
use zstd::stream::read::Decoder;

use crate::error::{HeatmapError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
}

impl Compression {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Compression::Gzip,
            Some(ext) if ext.eq_ignore_ascii_case("zst") => Compression::Zstd,
            _ => Compression::None,
        }
    }
}

/// Text lines of a sweep file, decompressed on the fly.
///
/// Read errors inside a compressed stream end the iteration quietly: a
/// capture that was still being written (or got cut short) has a broken
/// trailer, and everything before it is still good data. Plain files
/// surface their read errors.
pub struct SweepLines {
    reader: Box<dyn BufRead>,
    tolerant: bool,
    finished: bool,
    buf: Vec<u8>,
}

impl SweepLines {
    pub fn new<R: Read + 'static>(reader: R, compression: Compression) -> io::Result<Self> {
        let reader: Box<dyn BufRead> = match compression {
            Compression::None => Box::new(BufReader::new(reader)),
            Compression::Gzip => Box::new(BufReader::new(MultiGzDecoder::new(reader))),
            Compression::Zstd => Box::new(BufReader::new(Decoder::new(reader)?)),
        };
        Ok(SweepLines {
            reader,
            tolerant: compression != Compression::None,
            finished: false,
            buf: Vec::new(),
        })
    }
}

impl Iterator for SweepLines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.finished = true;
                None
            }
            Ok(_) => Some(Ok(String::from_utf8_lossy(&self.buf).into_owned())),
            Err(e) if self.tolerant => {
                debug!("compressed stream ended early: {}", e);
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

pub fn open_lines(path: &Path) -> Result<SweepLines> {
    let file = File::open(path).map_err(|source| HeatmapError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SweepLines::new(file, Compression::from_path(path))?)
}
