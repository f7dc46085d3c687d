//! Tracing subscriber initialization.
//!
//! CRONX runs as a single node with no distributed coordination, so
//! there is no span exporter to wire up here — just a `tracing-subscriber`
//! registry with an env filter, matching what a plain agent process needs.

use crate::CoreResult;
use serde::{Deserialize, Serialize};

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to log lines.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Whether to emit JSON-formatted logs instead of plain text.
    #[serde(default)]
    pub json: bool,
}

fn default_service_name() -> String {
    "cronx".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            json: false,
        }
    }
}

/// Initializes the global tracing subscriber from `RUST_LOG`, falling back
/// to `info,cronx=debug` when unset.
#[cfg(feature = "telemetry")]
pub fn init_tracing(config: &TelemetryConfig) -> CoreResult<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,cronx=debug"));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }

    tracing::info!(service_name = %config.service_name, "tracing initialized");
    Ok(())
}

#[cfg(not(feature = "telemetry"))]
pub fn init_tracing(_config: &TelemetryConfig) -> CoreResult<()> {
    Ok(())
}
