use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks `debug` over `warn`.
/// Calling this twice is harmless: the second install is ignored.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "semgraph=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries the report, so logs stay on stderr
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}
