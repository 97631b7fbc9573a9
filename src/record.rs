use crate::error::{HeatmapError, Result};

/// Index of the first power sample in a sweep line.
const SAMPLES_FIELD: usize = 6;

/// One decoded rtl_power line.
///
/// `freq_low`/`freq_high` already include the global offset. `samples` has
/// been through [`sanitize_samples`], so every value is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRecord {
    pub date: String,
    pub time: String,
    pub freq_low: f64,
    pub freq_high: f64,
    pub step: f64,
    pub samples: Vec<f64>,
}

impl SweepRecord {
    /// The `"date time"` string used as the time axis key.
    pub fn time_key(&self) -> String {
        format!("{} {}", self.date, self.time)
    }

    /// Column frequencies of this sweep, stepping uniformly from `freq_low`.
    pub fn columns(&self) -> Vec<f64> {
        frange(self.freq_low, self.freq_high, self.step)
    }
}

/// `start, start + step, ...` up to and including `stop`.
///
/// Each value is computed as `idx * step + start` so two grids built from
/// the same `(start, stop, step)` are bit-identical.
pub fn frange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let mut values = Vec::new();
    if !step.is_finite() || step <= 0.0 {
        return values;
    }
    let mut idx: u64 = 0;
    loop {
        let value = idx as f64 * step + start;
        if value > stop {
            break;
        }
        values.push(value);
        idx += 1;
    }
    values
}

/// Parses power tokens, replacing anything unparseable or non-finite with
/// the previous valid value of the row (0 for the first column).
///
/// rtl_power writes `-inf`/`nan` on some platforms and `-1.#J` on others;
/// none of them is allowed to break the row.
pub fn sanitize_samples<'a, I>(tokens: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut previous = 0.0;
    tokens
        .into_iter()
        .map(|token| {
            let value = match token.parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => previous,
            };
            previous = value;
            value
        })
        .collect()
}

/// Decodes one line of the sweep format:
/// `date, time, freq_low, freq_high, step, sample_count, p0, p1, ...`.
///
/// Returns `Ok(None)` for blank lines. Empty tokens (trailing commas) are
/// dropped before the fields are counted.
pub fn decode_line(line: &str, offset_hz: f64, line_no: usize) -> Result<Option<SweepRecord>> {
    let tokens: Vec<&str> = line
        .trim()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if tokens.is_empty() {
        return Ok(None);
    }
    if tokens.len() < SAMPLES_FIELD {
        return Err(malformed(
            line_no,
            format!("expected at least {} fields, found {}", SAMPLES_FIELD, tokens.len()),
        ));
    }

    let freq_low = parse_hz(tokens[2], "freq_low", line_no)? + offset_hz;
    let freq_high = parse_hz(tokens[3], "freq_high", line_no)? + offset_hz;
    let step: f64 = tokens[4]
        .parse()
        .map_err(|_| malformed(line_no, format!("invalid step '{}'", tokens[4])))?;
    if !step.is_finite() || step <= 0.0 {
        return Err(malformed(line_no, format!("step must be positive, got {}", step)));
    }

    Ok(Some(SweepRecord {
        date: tokens[0].to_string(),
        time: tokens[1].to_string(),
        freq_low,
        freq_high,
        step,
        samples: sanitize_samples(tokens[SAMPLES_FIELD..].iter().copied()),
    }))
}

fn parse_hz(token: &str, field: &str, line_no: usize) -> Result<f64> {
    token
        .parse::<i64>()
        .map(|hz| hz as f64)
        .map_err(|_| malformed(line_no, format!("invalid {} '{}'", field, token)))
}

fn malformed(line: usize, reason: String) -> HeatmapError {
    HeatmapError::MalformedRecord { line, reason }
}
