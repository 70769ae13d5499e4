//! Logging setup shared by the binaries

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`)
pub fn init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
