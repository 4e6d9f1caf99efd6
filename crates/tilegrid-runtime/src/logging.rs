#![forbid(unsafe_code)]

//! Log output format and, with the `subscriber` feature, a one-call
//! subscriber installer.
//!
//! Library code only emits `tracing` events (targets `tilegrid.commit` and
//! `tilegrid.session`); installing a subscriber is the embedding
//! application's choice.

use serde::{Deserialize, Serialize};

/// Output format of the installed fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Plain,
    /// One JSON object per event.
    Json,
}

/// Install a global fmt subscriber configured by `config`.
///
/// `RUST_LOG`, when set, takes precedence over `config.filter`. Returns
/// `false` if a global subscriber was already installed.
#[cfg(feature = "subscriber")]
pub fn init_subscriber(config: &crate::config::LoggingConfig) -> bool {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Plain => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
    };
    installed.is_ok()
}
