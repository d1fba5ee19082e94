//! In-process [`ConfigStore`] backed by a `BTreeMap` behind a tokio `RwLock`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::{ConfigPatch, ConfigStore, CoveringQuery, RecordFilter, StoreResult};
use crate::error::StoreError;
use crate::types::{ConfigGroup, ConfigStatus, FeeConfiguration};
use crate::utils::generate_record_id;

/// Records keyed by storage id.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    records: RwLock<BTreeMap<String, FeeConfiguration>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load previously persisted records. Records without an id get one.
    pub fn from_records(records: Vec<FeeConfiguration>) -> Self {
        let map = records
            .into_iter()
            .map(|mut record| {
                if record.id.is_empty() {
                    record.id = generate_record_id();
                }
                (record.id.clone(), record)
            })
            .collect();
        Self {
            records: RwLock::new(map),
        }
    }

    /// Every record, oldest first.
    pub async fn snapshot(&self) -> Vec<FeeConfiguration> {
        let mut all: Vec<FeeConfiguration> = self.records.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn find_config_id<'a>(
    records: &'a BTreeMap<String, FeeConfiguration>,
    config_id: &str,
) -> Option<&'a FeeConfiguration> {
    records.values().find(|r| r.config_id == config_id)
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn insert(&self, mut record: FeeConfiguration) -> StoreResult<FeeConfiguration> {
        let mut records = self.records.write().await;
        if record.id.is_empty() {
            record.id = generate_record_id();
        }
        if records.contains_key(&record.id) {
            return Err(StoreError::Backend(format!("duplicate id {}", record.id)));
        }
        if find_config_id(&records, &record.config_id).is_some() {
            return Err(StoreError::Backend(format!(
                "duplicate configId {}",
                record.config_id
            )));
        }
        let now = Utc::now();
        record.created_at = now;
        record.updated_at = now;
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<FeeConfiguration>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_by_config_id(&self, config_id: &str) -> StoreResult<Option<FeeConfiguration>> {
        Ok(find_config_id(&*self.records.read().await, config_id).cloned())
    }

    async fn find_latest_version(
        &self,
        group: &ConfigGroup,
    ) -> StoreResult<Option<FeeConfiguration>> {
        let filter = RecordFilter::group(group);
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| filter.matches(r))
            .max_by_key(|r| r.version)
            .cloned())
    }

    async fn find_active_covering(
        &self,
        query: &CoveringQuery,
    ) -> StoreResult<Option<FeeConfiguration>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| query.matches(r))
            .max_by(|a, b| {
                a.effective_from
                    .cmp(&b.effective_from)
                    .then_with(|| a.version.cmp(&b.version))
            })
            .cloned())
    }

    async fn find_matching(&self, filter: &RecordFilter) -> StoreResult<Vec<FeeConfiguration>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn update(&self, id: &str, patch: ConfigPatch) -> StoreResult<FeeConfiguration> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        patch.apply(record, Utc::now())?;
        Ok(record.clone())
    }

    async fn commit(
        &self,
        writes: Vec<(String, ConfigPatch)>,
    ) -> StoreResult<Vec<FeeConfiguration>> {
        let mut records = self.records.write().await;

        // Check every guard before touching anything.
        for (id, patch) in &writes {
            let record = records
                .get(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            patch.check(record)?;
        }

        let now = Utc::now();
        let mut updated = Vec::with_capacity(writes.len());
        for (id, patch) in writes {
            let record = records
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            patch.apply(record, now)?;
            updated.push(record.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, id: &str, expected_status: ConfigStatus) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if record.status != expected_status {
            return Err(StoreError::Conflict {
                id: id.to_string(),
                expected: expected_status,
                actual: record.status,
            });
        }
        records.remove(id);
        Ok(())
    }

    async fn record_usage(
        &self,
        config_id: &str,
        fee: Decimal,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .values_mut()
            .find(|r| r.config_id == config_id)
            .ok_or_else(|| StoreError::NotFound(config_id.to_string()))?;
        let stats = &mut record.usage_stats;
        stats.transactions_affected += 1;
        stats.total_fees_collected += fee;
        stats.last_used = Some(at);
        Ok(())
    }
}
