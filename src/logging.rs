//! Subscriber setup for hosts that do not install their own.
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a global fmt subscriber. `RUST_LOG` wins over `level` when set.
///
/// Returns false if a global subscriber was already installed.
pub fn init(level: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("depgraph_core={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
