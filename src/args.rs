use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};

use rtl_heatmap::font::DEFAULT_FONT_PATH;
use rtl_heatmap::pipeline::RenderOptions;
use rtl_heatmap::slice::FrequencyBounds;
use rtl_heatmap::summary::PowerRange;
use rtl_heatmap::units::{parse_duration, parse_frequency};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "heatmap",
    version,
    about = "Render rtl_power sweep CSV files as an annotated waterfall image.",
    after_help = "Frequencies accept k/M/G suffixes (e.g. 100M), durations s/m/h (e.g. 5m).
Inputs ending in .gz or .zst are decompressed on the fly."
)]
pub struct Args {
    /// rtl_power CSV file to read
    #[arg(value_name = "INPUT")]
    pub input_path: PathBuf,

    /// Image file to write; the format follows the extension
    #[arg(value_name = "OUTPUT")]
    pub output_path: PathBuf,

    /// Frequency offset added to every sweep (up/down converters).
    #[arg(long, value_name = "FREQ", allow_hyphen_values = true)]
    pub offset: Option<String>,

    /// Label the time axis every DURATION.
    #[arg(long, value_name = "DURATION")]
    pub ytick: Option<String>,

    /// Fixed color range in dB instead of the data extremes.
    #[arg(long, num_args = 2, value_name = "MIN MAX", allow_negative_numbers = true)]
    pub db: Vec<f64>,

    /// Lowest frequency to draw.
    #[arg(
        long,
        value_name = "FREQ",
        allow_hyphen_values = true,
        help_heading = "Slicing"
    )]
    pub low: Option<String>,

    /// Highest frequency to draw.
    #[arg(
        long,
        value_name = "FREQ",
        allow_hyphen_values = true,
        help_heading = "Slicing"
    )]
    pub high: Option<String>,

    /// Heatmap parameters JSON file. Can be given several times; later files override earlier keys.
    #[arg(long, value_name = "FILE", action = ArgAction::Append, help_heading = "Slicing")]
    pub parameters: Vec<PathBuf>,

    /// TrueType font used for every label.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_FONT_PATH)]
    pub font: PathBuf,

    /// Log debug detail (RUST_LOG takes precedence).
    #[arg(long, short)]
    pub verbose: bool,
}

impl Args {
    pub fn render_options(&self) -> Result<RenderOptions> {
        let freq = |value: &Option<String>, name: &str| -> Result<Option<f64>> {
            value
                .as_deref()
                .map(|v| parse_frequency(v).with_context(|| format!("invalid --{} value", name)))
                .transpose()
        };

        let db_override = match self.db.as_slice() {
            [] => None,
            [a, b] => Some(PowerRange::fixed(*a, *b)),
            _ => bail!("--db expects exactly two values"),
        };
        let time_tick = self
            .ytick
            .as_deref()
            .map(|v| parse_duration(v).context("invalid --ytick value"))
            .transpose()?;

        Ok(RenderOptions {
            input: self.input_path.clone(),
            output: self.output_path.clone(),
            offset_hz: freq(&self.offset, "offset")?.unwrap_or(0.0),
            bounds: FrequencyBounds::new(freq(&self.low, "low")?, freq(&self.high, "high")?),
            db_override,
            time_tick,
            parameters: self.parameters.clone(),
            font_path: self.font.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_only() {
        let args = Args::try_parse_from(["heatmap", "scan.csv.gz", "scan.png"]).unwrap();
        let opts = args.render_options().unwrap();
        assert_eq!(opts.input, PathBuf::from("scan.csv.gz"));
        assert_eq!(opts.output, PathBuf::from("scan.png"));
        assert_eq!(opts.offset_hz, 0.0);
        assert_eq!(opts.bounds, FrequencyBounds::default());
        assert_eq!(opts.db_override, None);
        assert_eq!(opts.time_tick, None);
        assert_eq!(opts.font_path, PathBuf::from(DEFAULT_FONT_PATH));
    }

    #[test]
    fn test_units_and_negative_values() {
        let args = Args::try_parse_from([
            "heatmap", "in.csv", "out.png", "--offset", "-125M", "--low", "88M", "--high", "108.5M",
            "--ytick", "5m", "--db", "-10", "-60",
        ])
        .unwrap();
        let opts = args.render_options().unwrap();
        assert!((opts.offset_hz + 125e6).abs() < 1e-6);
        assert_eq!(opts.bounds.low, Some(88e6));
        assert!((opts.bounds.high.unwrap() - 108.5e6).abs() < 1e-6);
        assert_eq!(opts.time_tick, Some(300.0));
        let range = opts.db_override.unwrap();
        assert!((range.min_z + 60.0).abs() < 1e-12);
        assert!((range.max_z + 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_bounds_after_offset() {
        let args = Args::try_parse_from([
            "heatmap", "in.csv", "out.png", "--low", "-5M", "--high", "-1M",
        ])
        .unwrap();
        let opts = args.render_options().unwrap();
        assert_eq!(opts.bounds.low, Some(-5e6));
        assert_eq!(opts.bounds.high, Some(-1e6));
    }

    #[test]
    fn test_repeated_parameters_keep_order() {
        let args = Args::try_parse_from([
            "heatmap", "in.csv", "out.png", "--parameters", "a.json", "--parameters", "b.json",
        ])
        .unwrap();
        assert_eq!(args.parameters, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
    }

    #[test]
    fn test_bad_unit_is_rejected() {
        let args = Args::try_parse_from(["heatmap", "in.csv", "out.png", "--low", "12x"]).unwrap();
        assert!(args.render_options().is_err());
    }

    #[test]
    fn test_db_needs_two_values() {
        assert!(Args::try_parse_from(["heatmap", "in.csv", "out.png", "--db", "-10"]).is_err());
    }
}
