use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize a tracing subscriber writing to stderr.
///
/// Uses the `RUST_LOG` environment variable to determine the log level,
/// defaulting to "info" (or "debug" when `verbose` is set). Stdout is left
/// for command output so it can be piped.
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .compact();

    let default_level = if verbose { "debug" } else { "info" };
    let filter_layer = if verbose {
        EnvFilter::try_new(default_level)?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
