use crate::record::{frange, SweepRecord};

/// Optional `--low`/`--high` limits, in Hz after the offset is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrequencyBounds {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl FrequencyBounds {
    pub fn new(low: Option<f64>, high: Option<f64>) -> Self {
        FrequencyBounds { low, high }
    }

    /// True when the record span lies entirely outside the requested window.
    pub fn excludes(&self, freq_low: f64, freq_high: f64) -> bool {
        if let Some(low) = self.low {
            if freq_high < low {
                return true;
            }
        }
        if let Some(high) = self.high {
            if high < freq_low {
                return true;
            }
        }
        false
    }
}

/// Inclusive `(start_col, stop_col)` of the columns to keep.
///
/// A bound only narrows the range when it falls inside `[span_low, span_high]`.
/// `start_col` counts columns strictly below `low`, and the exclusive stop
/// counts columns at or below `high`. Returns `None` when nothing is left.
pub fn slice_columns(
    columns: &[f64],
    span_low: f64,
    span_high: f64,
    bounds: &FrequencyBounds,
) -> Option<(usize, usize)> {
    let mut start_col = 0;
    let mut stop_col = columns.len();
    if let Some(low) = bounds.low {
        if span_low <= low && low <= span_high {
            start_col = columns.iter().filter(|&&f| f < low).count();
        }
    }
    if let Some(high) = bounds.high {
        if span_low <= high && high <= span_high {
            stop_col = columns.iter().filter(|&&f| f <= high).count();
        }
    }
    if stop_col == 0 || start_col >= stop_col {
        return None;
    }
    Some((start_col, stop_col - 1))
}

/// The part of a record that lands on the raster.
#[derive(Debug, Clone, PartialEq)]
pub struct KeptColumns<'a> {
    /// Frequency of the first kept column; the record's x origin.
    pub first_freq: f64,
    /// Frequency of the last kept column from the slice (may lie past the
    /// last sample when the record carries fewer samples than columns).
    pub last_freq: f64,
    pub step: f64,
    pub samples: &'a [f64],
}

impl KeptColumns<'_> {
    /// Frequencies of the kept samples, regenerated from
    /// `(first_freq, last_freq, step)` and trimmed to the sample count.
    pub fn frequencies(&self) -> Vec<f64> {
        let mut freqs = frange(self.first_freq, self.last_freq, self.step);
        freqs.truncate(self.samples.len());
        freqs
    }

    /// Key identifying the sweep shape, used to avoid rebuilding grids.
    pub fn grid_key(&self) -> (u64, u64, u64, usize) {
        (
            self.first_freq.to_bits(),
            self.last_freq.to_bits(),
            self.step.to_bits(),
            self.samples.len(),
        )
    }
}

/// Applies the range pre-filter and [`slice_columns`] to a record.
///
/// Both passes go through this function, so the columns pass 1 puts on the
/// axis are exactly the ones pass 2 looks up.
pub fn kept_columns<'a>(
    record: &'a SweepRecord,
    bounds: &FrequencyBounds,
) -> Option<KeptColumns<'a>> {
    if bounds.excludes(record.freq_low, record.freq_high) {
        return None;
    }
    let columns = record.columns();
    let (start_col, stop_col) =
        slice_columns(&columns, record.freq_low, record.freq_high, bounds)?;
    let end = (stop_col + 1).min(record.samples.len());
    if start_col >= end {
        return None;
    }
    Some(KeptColumns {
        first_freq: columns[start_col],
        last_freq: columns[stop_col],
        step: record.step,
        samples: &record.samples[start_col..end],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(low: f64, high: f64, step: f64, samples: Vec<f64>) -> SweepRecord {
        SweepRecord {
            date: "2020-01-01".into(),
            time: "00:00:00".into(),
            freq_low: low,
            freq_high: high,
            step,
            samples,
        }
    }

    #[test]
    fn test_no_bounds_keeps_everything() {
        let columns = frange(100.0, 110.0, 1.0);
        assert_eq!(
            slice_columns(&columns, 100.0, 110.0, &FrequencyBounds::default()),
            Some((0, 10))
        );
    }

    #[test]
    fn test_bounds_inside_span() {
        let columns = frange(100.0, 110.0, 1.0);
        let bounds = FrequencyBounds::new(Some(102.5), Some(107.0));
        // columns below 102.5: 100,101,102 -> start 3; columns <= 107: 8 -> stop 7
        assert_eq!(slice_columns(&columns, 100.0, 110.0, &bounds), Some((3, 7)));
    }

    #[test]
    fn test_bounds_outside_span_are_ignored() {
        let columns = frange(100.0, 110.0, 1.0);
        let bounds = FrequencyBounds::new(Some(50.0), Some(500.0));
        assert_eq!(slice_columns(&columns, 100.0, 110.0, &bounds), Some((0, 10)));
    }

    #[test]
    fn test_excludes() {
        let bounds = FrequencyBounds::new(Some(200.0), Some(300.0));
        assert!(bounds.excludes(100.0, 199.0));
        assert!(bounds.excludes(301.0, 400.0));
        assert!(!bounds.excludes(150.0, 250.0));
        assert!(!FrequencyBounds::default().excludes(0.0, 1.0));
    }

    #[test]
    fn test_kept_columns_trims_to_samples() {
        // 5 columns (inclusive grid) but only 4 samples
        let rec = record(1000.0, 1004.0, 1.0, vec![1.0, 2.0, 3.0, 4.0]);
        let kept = kept_columns(&rec, &FrequencyBounds::default()).unwrap();
        assert_eq!(kept.samples, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(kept.frequencies(), vec![1000.0, 1001.0, 1002.0, 1003.0]);

        let bounds = FrequencyBounds::new(Some(1001.5), None);
        let kept = kept_columns(&rec, &bounds).unwrap();
        assert!((kept.first_freq - 1002.0).abs() < 1e-12);
        assert_eq!(kept.samples, &[3.0, 4.0]);
        assert_eq!(kept.frequencies(), vec![1002.0, 1003.0]);
    }

    #[test]
    fn test_kept_columns_empty_window() {
        let rec = record(1000.0, 1004.0, 1.0, vec![1.0, 2.0, 3.0, 4.0]);
        // low falls between the last sample column and freq_high
        let bounds = FrequencyBounds::new(Some(1003.5), None);
        assert!(kept_columns(&rec, &bounds).is_none());
        let bounds = FrequencyBounds::new(None, Some(900.0));
        assert!(kept_columns(&rec, &bounds).is_none());
    }
}
