pub mod audio;
pub mod config;
pub mod eq;
pub mod heartbeat;
pub mod hotkeys;
pub mod icon;

/// Installs the `tracing` subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}
