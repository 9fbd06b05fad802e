use crate::config::RendererConfig;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, or by the configured
/// level when it is unset. Does nothing for `nope` or when a global
/// subscriber is already installed.
pub fn init(config: &RendererConfig) -> bool {
    if !config.logging_enabled() {
        return false;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok()
}
