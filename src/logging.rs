use std::sync::OnceLock;

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

static LOGGING_INIT: OnceLock<()> = OnceLock::new();

const DEFAULT_FILTER: &str = "rtl_heatmap=info,heatmap=info";
const VERBOSE_FILTER: &str = "rtl_heatmap=debug,heatmap=debug";

/// Installs the stderr subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) {
    LOGGING_INIT.get_or_init(|| {
        let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(fallback))
            .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::INFO.into()));

        if let Err(err) = fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .try_init()
        {
            eprintln!("[heatmap] failed to initialise tracing subscriber: {err}");
        }
    });
}
