//! # Foundry Integrity Telemetry
//!
//! Structured logging and Prometheus metrics shared by the integrity crates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fi_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! // tracing macros now reach the configured subscriber and the
//! // counters in `metrics` are exported by `gather_metrics()`.
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FI_SERVICE_NAME` | `foundry-integrity` | Service name attached to logs |
//! | `FI_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `FI_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `FI_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_tracing;
pub use metrics::{
    gather_metrics, register_metrics, time_mutation, MetricsHandle, AUDIT_APPENDS, AUDIT_APPEND_FAILURES,
    CHAIN_VIOLATIONS, EVENTS_PUBLISHED, INVALIDATIONS_DELIVERED, INVALIDATION_EVENTS_LAGGED,
    LEDGER_REJECTIONS, MUTATION_DURATION, SCOPE_DENIALS, VERSION_CONFLICTS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Register metrics and install the global tracing subscriber.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_tracing(&config)?;
    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
