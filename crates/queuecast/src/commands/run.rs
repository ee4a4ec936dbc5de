//! `run`: the long-lived poll loop.

use tracing::{info, warn};

use queuecast_core::{HttpSnapshotSource, Scheduler, ServiceConfig, SnapshotSource};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::shutdown;

/// One fetch before starting, so a misconfigured backend shows up in the
/// log right away. Failure does not stop start-up.
async fn probe(config: &ServiceConfig) {
    let result = match HttpSnapshotSource::new(config) {
        Ok(source) => source.fetch().await,
        Err(e) => Err(e),
    };
    match result {
        Ok(queues) => info!(
            backend = %config.backend_url,
            queues = queues.len(),
            "backend reachable"
        ),
        Err(e) => warn!(
            backend = %config.backend_url,
            error = %e,
            "backend probe failed, polling anyway"
        ),
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let service = super::load_service_config(global)?;
    probe(&service).await;

    let handle = Scheduler::from_config(service)?.spawn();
    shutdown::wait_for_signal().await;
    handle.stop().await;

    info!("stopped");
    Ok(())
}
