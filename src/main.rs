use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

mod args;

use args::Args;
use rtl_heatmap::{logging, pipeline};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let opts = args.render_options()?;
    let report = pipeline::render(&opts)
        .with_context(|| format!("failed to render {:?}", opts.input))?;

    info!(
        "wrote {:?} ({}x{}, dB {:.1}..{:.1})",
        opts.output, report.width, report.height, report.power.min_z, report.power.max_z
    );
    Ok(())
}
