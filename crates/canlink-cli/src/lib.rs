//! Shared plumbing for the `isotp-rx` and `isotp-tx` tools.

pub mod args;
pub mod config;
#[cfg(target_os = "linux")]
pub mod run;
pub mod settings;

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
