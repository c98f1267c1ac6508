// Tracing bootstrap for the driver binary.
//
// `RUST_LOG` wins when set; otherwise the `--log` level from the command
// line (default `info`). An unparsable filter falls back to `info` rather
// than refusing to start.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
    tracing::debug!(level, "tracing initialized");
}
