//! # MedChain Telemetry
//!
//! Observability for MedChain nodes.
//!
//! ## Components
//!
//! - **Logs**: `tracing` subscriber with env-filter, pretty or JSON output
//! - **Metrics**: Prometheus counters and gauges in a process-wide registry,
//!   rendered on demand by the node's `STATS` command, either as a summary or
//!   as Prometheus text via [`encode_metrics`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mc_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Node runs here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MC_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `MC_JSON_LOGS` | `false` | JSON formatted logs |
//! | `MC_CONSOLE_OUTPUT` | `true` | Emit logs to stderr |
//! | `MC_SERVICE_NAME` | `medchain` | Service name in the startup log |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsSnapshot, BLOCKS_APPENDED,
    BLOCK_VERIFICATION_DURATION, CHAIN_HEIGHT, COMMITS_APPLIED, DUPLICATE_COMMITS,
    MALFORMED_MESSAGES, PEERS_CONNECTED, PROPOSALS_SENT, SYNC_ABORTS, SYNC_BLOCKS_ACCEPTED,
    VOTES_CAST, VOTES_RECEIVED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber could not be installed (usually: one is already set)
    #[error("Failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),

    /// Metric registration failed
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard to hold for the lifetime of the process. Calling this twice
/// reports [`TelemetryError::SubscriberInit`] instead of panicking.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    logging::init_subscriber(&config)?;

    tracing::info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
