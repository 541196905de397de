use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize a tracing subscriber for store operations.
///
/// Log level comes from `RUST_LOG`, defaulting to `info`. Per-file work is
/// logged at `debug`, per-version summaries at `info`.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_fails_without_panicking() {
        // Only one global subscriber per process; the second call must error
        let _ = init();
        assert!(init().is_err());
        tracing::info!(version = "16.0.0", "logging initialized");
    }
}
