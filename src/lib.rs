pub mod config;
pub mod pipeline;

pub use config::{ConfigError, Settings};
pub use pipeline::workflow::{WorkflowOrchestrator, WorkflowResult, WorkflowState};

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` overrides the default filter.
/// If a subscriber is already installed it is kept.
pub fn init_tracing() {
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
    {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
