//! Off-path usage recording.
//!
//! Fee calculations hand usage events to a background task through an
//! unbounded channel and return immediately. The task writes them through
//! [`VersionManager::record_usage`], which logs and drops failures.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::versioning::VersionManager;

/// One calculated fee to be counted against its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEvent {
    pub config_id: String,
    pub amount: Decimal,
    pub fee: Decimal,
}

pub struct UsageRecorder {
    tx: mpsc::UnboundedSender<UsageEvent>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl UsageRecorder {
    /// Start the background task. Must be called inside a tokio runtime.
    pub fn spawn(manager: Arc<VersionManager>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_recorder(manager, rx, cancel.clone()));
        Self {
            tx,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// Queue an event. Never blocks and never fails the caller.
    pub fn record(&self, event: UsageEvent) {
        if let Err(err) = self.tx.send(event) {
            warn!(config_id = %err.0.config_id, "usage recorder stopped; event dropped");
        }
    }

    /// Stop accepting work, write every queued event, then wait for the task.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.task.lock().await.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "usage recorder task failed");
            }
        }
    }
}

async fn run_recorder(
    manager: Arc<VersionManager>,
    mut rx: mpsc::UnboundedReceiver<UsageEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            event = rx.recv() => match event {
                Some(event) => write(&manager, event).await,
                None => break,
            },
            _ = cancel.cancelled() => {
                rx.close();
                let mut drained = 0usize;
                while let Some(event) = rx.recv().await {
                    write(&manager, event).await;
                    drained += 1;
                }
                debug!(drained, "usage recorder drained");
                break;
            }
        }
    }
}

async fn write(manager: &VersionManager, event: UsageEvent) {
    manager
        .record_usage(&event.config_id, event.amount, event.fee)
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    use crate::config::EngineConfig;
    use crate::resolver::ConfigResolver;
    use crate::store::{ConfigStore, MemoryConfigStore};
    use crate::types::NewFeeConfig;

    async fn setup() -> (Arc<MemoryConfigStore>, Arc<VersionManager>, String) {
        let store = Arc::new(MemoryConfigStore::new());
        let resolver = ConfigResolver::new(store.clone(), Duration::from_secs(1));
        let manager = Arc::new(VersionManager::new(resolver, EngineConfig::default()));
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let created = manager
            .create(NewFeeConfig::percentage(from, dec!(2)), "admin")
            .await
            .unwrap();
        (store, manager, created.config_id)
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let (store, manager, config_id) = setup().await;
        let recorder = UsageRecorder::spawn(manager);
        for _ in 0..5 {
            recorder.record(UsageEvent {
                config_id: config_id.clone(),
                amount: dec!(100),
                fee: dec!(2),
            });
        }
        recorder.shutdown().await;

        let record = store.find_by_config_id(&config_id).await.unwrap().unwrap();
        assert_eq!(record.usage_stats.transactions_affected, 5);
        assert_eq!(record.usage_stats.total_fees_collected, dec!(10));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_task() {
        let (store, manager, config_id) = setup().await;
        let recorder = UsageRecorder::spawn(manager);
        recorder.record(UsageEvent {
            config_id: "fee_unknown".into(),
            amount: dec!(100),
            fee: dec!(2),
        });
        recorder.record(UsageEvent {
            config_id: config_id.clone(),
            amount: dec!(100),
            fee: dec!(2),
        });
        recorder.shutdown().await;

        let record = store.find_by_config_id(&config_id).await.unwrap().unwrap();
        assert_eq!(record.usage_stats.transactions_affected, 1);
    }

    #[tokio::test]
    async fn test_record_after_shutdown_is_dropped() {
        let (_, manager, config_id) = setup().await;
        let recorder = UsageRecorder::spawn(manager);
        recorder.shutdown().await;
        // must not panic
        recorder.record(UsageEvent {
            config_id,
            amount: dec!(1),
            fee: dec!(0.02),
        });
        recorder.shutdown().await;
    }
}
