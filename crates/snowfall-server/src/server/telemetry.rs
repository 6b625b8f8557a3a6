//! Console logging for the server.
//!
//! Logs go through `tracing` and are printed by a `tracing_subscriber::fmt`
//! layer. Verbosity is controlled with `RUST_LOG` and defaults to `info`.
//! Each issued ID is logged at `debug`, so `RUST_LOG=debug` traces every
//! request.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(fmt::time::ChronoLocal::rfc_3339())
                .with_file(true),
        )
        .try_init()?;

    Ok(())
}
