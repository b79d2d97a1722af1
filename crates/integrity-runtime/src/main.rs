//! # Integrity Node
//!
//! Boots the integrity core from the environment, verifies the audit chain
//! and runs the invalidation router until Ctrl-C.

use anyhow::Context;
use fi_04_audit_chain::AuditStore;
use fi_05_invalidation_router::ChannelSink;
use fi_telemetry::{gather_metrics, init_telemetry, TelemetryConfig};
use integrity_runtime::{ErrorKind, IntegrityConfig, IntegrityContainer};
use shared_types::SystemTimeSource;
use std::sync::Arc;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::for_service("integrity-node"))?;

    let config = IntegrityConfig::from_env().context("loading FI_* configuration")?;
    config.validate().context("validating configuration")?;

    match config.audit.log_path.clone() {
        Some(path) => {
            let container = IntegrityContainer::with_audit_log(config, SystemTimeSource, &path)
                .with_context(|| format!("opening audit log {}", path.display()))?;
            run(container).await
        }
        None => run(IntegrityContainer::in_memory(config, SystemTimeSource)).await,
    }
}

async fn run<A: AuditStore + 'static>(
    container: IntegrityContainer<A, SystemTimeSource>,
) -> anyhow::Result<()> {
    match container.gateway.integrity_check().await {
        Ok(report) => info!(records = report.checked, "Audit chain intact"),
        // Operational alert: keep serving so the divergence can be investigated.
        Err(e) if e.kind() == ErrorKind::ChainIntegrityViolation => {
            error!(error = %e, "Audit chain failed verification at startup");
        }
        Err(e) => return Err(e.into()),
    }

    let router = container.spawn_router(Arc::new(ChannelSink::new()));
    info!("Integrity node running; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    let stats = router.shutdown().await?;
    info!(
        events = stats.events_received,
        deliveries = stats.deliveries,
        "Integrity node stopped"
    );
    debug!(metrics = %gather_metrics()?, "Final metrics");
    Ok(())
}
