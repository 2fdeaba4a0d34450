//! Sets up the `tracing` subscriber (SPEC_FULL §10.1): `-d`/`-v` map to a
//! `tracing::Level`, mirroring `pkger-cli::fmt`'s job of turning CLI flags
//! into a configured formatter, but built on `tracing-subscriber::fmt` with
//! `chrono` timestamps instead of the teacher's own `colored`-based logger.

use tracing::Level;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

pub fn init(debug: bool, verbose: bool) {
    let level = if debug {
        Level::DEBUG
    } else if verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::rfc_3339())
        .with_target(debug)
        .with_writer(std::io::stderr)
        .try_init();
}
