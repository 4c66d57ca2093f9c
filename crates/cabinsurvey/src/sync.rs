//! Marking pending survey records as submitted.
//!
//! Delivery to a remote system is simulated: each pending record is paced by
//! a fixed delay and then marked submitted in the store. Records are handled
//! one at a time. When a record fails the loop stops and the error is
//! returned; records handled before it stay submitted.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::SyncStrategy;
use crate::error::{Error, Result};
use crate::store::RecordStore;

/// Reports whether the network is reachable.
#[async_trait::async_trait]
pub trait Connectivity: Send + Sync {
    /// Whether the device is online right now.
    async fn is_online(&self) -> bool;
}

/// Connectivity fixed at construction, e.g. from a command-line flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedConnectivity(
    /// Whether the device counts as online.
    pub bool,
);

#[async_trait::async_trait]
impl Connectivity for FixedConnectivity {
    async fn is_online(&self) -> bool {
        self.0
    }
}

/// Options for a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Delay before each record is marked.
    pub pacing: Duration,
    /// How records are marked.
    pub strategy: SyncStrategy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(500),
            strategy: SyncStrategy::default(),
        }
    }
}

/// One record that was marked submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncedRecord {
    /// Id before the sync.
    pub old_id: i64,
    /// Id after the sync. Equal to `old_id` unless records were reinserted.
    pub new_id: i64,
}

/// Outcome of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Records marked submitted, in the order they were handled.
    pub synced: Vec<SyncedRecord>,
}

impl SyncReport {
    /// Number of records marked submitted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.synced.len()
    }

    /// Whether there was nothing to sync.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.synced.is_empty()
    }
}

/// Mark every unsubmitted record as submitted.
///
/// # Errors
///
/// Returns [`Error::Offline`] without touching the store when offline, or
/// the first store error met while marking records.
pub async fn sync_records(
    store: &dyn RecordStore,
    connectivity: &dyn Connectivity,
    options: SyncOptions,
) -> Result<SyncReport> {
    if !connectivity.is_online().await {
        return Err(Error::offline("sync records"));
    }

    let pending = store.list_pending_records().await?;

    if pending.is_empty() {
        debug!("No unsubmitted records to sync");
        return Ok(SyncReport::default());
    }

    info!(
        "Syncing {} records using {}",
        pending.len(),
        options.strategy
    );

    let mut report = SyncReport::default();
    for mut record in pending {
        if !options.pacing.is_zero() {
            tokio::time::sleep(options.pacing).await;
        }

        let old_id = record.id;
        record.submitted = true;
        let new_id = match options.strategy {
            SyncStrategy::UpdateInPlace => {
                store.update_survey_record(record).await?;
                old_id
            }
            SyncStrategy::Reinsert => {
                let (_, body) = record.into_parts();
                let new_id = store.add_survey_record(body).await?;
                store.delete_survey_record(old_id).await?;
                new_id
            }
        };

        debug!("Submitted record {} (now {})", old_id, new_id);
        report.synced.push(SyncedRecord { old_id, new_id });
    }

    info!("Sync complete: {} records submitted", report.len());
    Ok(report)
}
