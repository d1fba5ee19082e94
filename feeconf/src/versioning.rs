//! Configuration lifecycle: drafting, approval, superseding, expiry and
//! deletion.
//!
//! ```text
//!   draft --approve--> active --(later approval)--> superseded
//!     |                   |
//!   delete              expire
//!     v                   v
//!  (removed)           expired
//! ```
//!
//! `expired` and `superseded` are terminal. Version numbering and approvals
//! are serialised through one async mutex per manager; approvals also commit
//! their two writes as a single status-guarded batch, so a concurrent writer
//! outside this process makes the batch fail instead of leaving two active
//! records over the same instant.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{FeeError, Result, StoreError};
use crate::resolver::ConfigResolver;
use crate::store::{ConfigPatch, DynConfigStore, FieldMatch, RecordFilter};
use crate::types::{
    AnalyticsQuery, ConfigOverrides, ConfigStatus, FeeConfiguration, ListQuery, NewFeeConfig,
    PageResult, Scope, ScopeAnalytics, StatusBreakdown,
};
use crate::utils::{generate_config_id, with_timeout};
use crate::validation::{validate_terms, MAX_ADMIN_NOTES_LEN};

pub struct VersionManager {
    resolver: ConfigResolver,
    config: EngineConfig,
    lifecycle: Mutex<()>,
}

impl VersionManager {
    pub fn new(resolver: ConfigResolver, config: EngineConfig) -> Self {
        Self {
            resolver,
            config,
            lifecycle: Mutex::new(()),
        }
    }

    fn store(&self) -> &DynConfigStore {
        self.resolver.store()
    }

    /// Look up a configuration by its business id.
    pub async fn get(&self, config_id: &str) -> Result<FeeConfiguration> {
        with_timeout(
            "find_by_config_id",
            self.config.store_timeout,
            self.store().find_by_config_id(config_id),
        )
        .await?
        .ok_or_else(|| FeeError::NotFound(config_id.to_string()))
    }

    // -----------------------------------------------------------------------
    // Drafting
    // -----------------------------------------------------------------------

    /// Validate `terms` and persist them as a new draft numbered after the
    /// latest version of its group.
    pub async fn create(&self, terms: NewFeeConfig, created_by: &str) -> Result<FeeConfiguration> {
        let _lifecycle = self.lifecycle.lock().await;
        self.create_locked(terms, created_by).await
    }

    async fn create_locked(
        &self,
        mut terms: NewFeeConfig,
        created_by: &str,
    ) -> Result<FeeConfiguration> {
        validate_terms(&terms, self.config.strict_tiers)?;
        if terms.currency.is_none() {
            terms.currency = Some(self.config.default_currency);
        }

        let group = terms.group();
        let latest = with_timeout(
            "find_latest_version",
            self.config.store_timeout,
            self.store().find_latest_version(&group),
        )
        .await?;
        let version = latest.map_or(1, |r| r.version + 1);

        let now = Utc::now();
        let draft = FeeConfiguration::draft(
            terms,
            generate_config_id(now),
            version,
            created_by.to_string(),
            now,
        );
        let saved = with_timeout("insert", self.config.store_timeout, self.store().insert(draft)).await?;

        info!(
            config_id = %saved.config_id,
            version,
            scope = %saved.scope,
            tenant_id = ?saved.tenant_id,
            channel_bundle_id = ?saved.channel_bundle_id,
            created_by,
            "fee configuration draft created"
        );
        Ok(saved)
    }

    /// Replace the terms of a draft. The group cannot change.
    pub async fn update(&self, config_id: &str, mut terms: NewFeeConfig) -> Result<FeeConfiguration> {
        let record = self.get(config_id).await?;
        if record.status != ConfigStatus::Draft {
            return Err(FeeError::invalid_state(config_id, record.status, "update"));
        }
        if terms.group() != record.group() {
            return Err(FeeError::Validation(
                "scope, tenantId and channelBundleId cannot change on update".into(),
            ));
        }
        validate_terms(&terms, self.config.strict_tiers)?;
        if terms.currency.is_none() {
            terms.currency = Some(self.config.default_currency);
        }
        if terms.supersedes.is_none() {
            terms.supersedes = record.supersedes.clone();
        }

        let updated = with_timeout(
            "update",
            self.config.store_timeout,
            self.store()
                .update(&record.id, ConfigPatch::expecting(ConfigStatus::Draft).terms(terms)),
        )
        .await
        .map_err(|e| guard_failure(e, config_id, "update"))?;

        info!(config_id, version = updated.version, "fee configuration draft updated");
        Ok(updated)
    }

    /// Draft a successor of `existing_config_id`: its fee terms and group,
    /// a new start, open-ended, with `overrides` applied on top.
    pub async fn create_new_version(
        &self,
        existing_config_id: &str,
        effective_from: DateTime<Utc>,
        change_reason: &str,
        overrides: Option<ConfigOverrides>,
        created_by: &str,
    ) -> Result<FeeConfiguration> {
        if change_reason.trim().is_empty() {
            return Err(FeeError::Validation(
                "changeReason is required for a new version".into(),
            ));
        }
        let existing = self.get(existing_config_id).await?;

        let mut terms = existing.terms();
        terms.effective_from = effective_from;
        terms.effective_to = None;
        terms.change_reason = Some(change_reason.to_string());
        terms.admin_notes = None;
        terms.supersedes = Some(existing.id.clone());
        if let Some(overrides) = overrides {
            overrides.apply(&mut terms);
        }

        let _lifecycle = self.lifecycle.lock().await;
        let created = self.create_locked(terms, created_by).await?;
        info!(
            config_id = %created.config_id,
            version = created.version,
            previous = %existing.config_id,
            "new fee configuration version drafted"
        );
        Ok(created)
    }

    // -----------------------------------------------------------------------
    // Approval
    // -----------------------------------------------------------------------

    /// Activate a draft, superseding the active record of its group that
    /// covers the draft's start.
    ///
    /// The superseded record ends one second before the new one starts.
    /// Fails with a validation error when the draft would overlap a later
    /// active record of its group, or when superseding would leave the
    /// previous record with an empty window.
    pub async fn approve(
        &self,
        config_id: &str,
        approved_by: &str,
        approval_notes: Option<&str>,
    ) -> Result<FeeConfiguration> {
        let _lifecycle = self.lifecycle.lock().await;
        let attempts = self.config.approval_retries.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_approve(config_id, approved_by, approval_notes).await {
                Err(FeeError::Store(StoreError::Conflict {
                    id,
                    expected,
                    actual,
                })) if attempt < attempts => {
                    warn!(
                        config_id,
                        attempt,
                        conflicting_id = %id,
                        %expected,
                        %actual,
                        "approval lost a status guard, retrying"
                    );
                }
                other => return other,
            }
        }
    }

    async fn try_approve(
        &self,
        config_id: &str,
        approved_by: &str,
        approval_notes: Option<&str>,
    ) -> Result<FeeConfiguration> {
        let record = self.get(config_id).await?;
        if record.status != ConfigStatus::Draft {
            return Err(FeeError::invalid_state(config_id, record.status, "approve"));
        }
        let group = record.group();

        let active = self
            .find(&RecordFilter::group(&group).with_status(ConfigStatus::Active))
            .await?;
        if let Some(later) = active.iter().find(|r| {
            r.effective_from > record.effective_from
                && record.effective_to.map_or(true, |to| to > r.effective_from)
        }) {
            return Err(FeeError::Validation(format!(
                "configuration {config_id} would overlap active configuration {} starting {}",
                later.config_id, later.effective_from
            )));
        }

        let mut writes = Vec::with_capacity(2);
        let previous = self
            .resolver
            .resolve_in_group(&group, record.effective_from)
            .await?;
        if let Some(prev) = &previous {
            let end = record.effective_from - Duration::seconds(1);
            if end <= prev.effective_from {
                return Err(FeeError::Validation(format!(
                    "configuration {config_id} must start more than one second after {} ({})",
                    prev.config_id, prev.effective_from
                )));
            }
            writes.push((
                prev.id.clone(),
                ConfigPatch::expecting(ConfigStatus::Active)
                    .status(ConfigStatus::Superseded)
                    .effective_to(Some(end)),
            ));
        }

        let now = Utc::now();
        let mut activate = ConfigPatch::expecting(ConfigStatus::Draft)
            .status(ConfigStatus::Active)
            .approval(approved_by, now);
        if let Some(notes) = approval_notes.filter(|n| !n.trim().is_empty()) {
            let combined = format!(
                "{}\n\nApproval Notes: {notes}",
                record.admin_notes.as_deref().unwrap_or_default()
            );
            if combined.chars().count() > MAX_ADMIN_NOTES_LEN {
                return Err(FeeError::Validation(format!(
                    "adminNotes exceed {MAX_ADMIN_NOTES_LEN} characters"
                )));
            }
            activate = activate.admin_notes(combined);
        }
        writes.push((record.id.clone(), activate));

        let mut updated =
            with_timeout("commit", self.config.store_timeout, self.store().commit(writes)).await?;

        if previous.is_some() {
            if let Some(prev) = updated.first() {
                info!(
                    config_id = %prev.config_id,
                    effective_to = ?prev.effective_to,
                    superseded_by = config_id,
                    "fee configuration superseded"
                );
            }
        }
        let approved = updated
            .pop()
            .ok_or_else(|| StoreError::Backend("commit returned no records".into()))?;
        info!(
            config_id,
            version = approved.version,
            approved_by,
            effective_from = %approved.effective_from,
            "fee configuration approved"
        );
        Ok(approved)
    }

    // -----------------------------------------------------------------------
    // Retirement
    // -----------------------------------------------------------------------

    /// Close an active configuration now.
    ///
    /// The window ends at the current time, or one second after its start
    /// when it has not started yet. A window that already closed keeps its
    /// end.
    pub async fn expire(&self, config_id: &str) -> Result<FeeConfiguration> {
        let record = self.get(config_id).await?;
        if record.status != ConfigStatus::Active {
            return Err(FeeError::invalid_state(config_id, record.status, "expire"));
        }
        let now = Utc::now();
        let end = match record.effective_to {
            Some(to) if to <= now => to,
            _ => now.max(record.effective_from + Duration::seconds(1)),
        };

        let expired = with_timeout(
            "update",
            self.config.store_timeout,
            self.store().update(
                &record.id,
                ConfigPatch::expecting(ConfigStatus::Active)
                    .status(ConfigStatus::Expired)
                    .effective_to(Some(end)),
            ),
        )
        .await
        .map_err(|e| guard_failure(e, config_id, "expire"))?;

        info!(config_id, effective_to = %end, "fee configuration expired");
        Ok(expired)
    }

    /// Remove a draft. Anything past draft is history and stays.
    pub async fn delete(&self, config_id: &str) -> Result<()> {
        let record = self.get(config_id).await?;
        if record.status != ConfigStatus::Draft {
            return Err(FeeError::invalid_state(config_id, record.status, "delete"));
        }
        with_timeout(
            "delete",
            self.config.store_timeout,
            self.store().delete(&record.id, ConfigStatus::Draft),
        )
        .await
        .map_err(|e| guard_failure(e, config_id, "delete"))?;

        info!(config_id, version = record.version, "fee configuration draft deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Usage
    // -----------------------------------------------------------------------

    /// Count one transaction against `config_id`. Failures are logged and
    /// dropped.
    pub async fn record_usage(&self, config_id: &str, amount: Decimal, fee: Decimal) {
        let at = Utc::now();
        match with_timeout(
            "record_usage",
            self.config.store_timeout,
            self.store().record_usage(config_id, fee, at),
        )
        .await
        {
            Ok(()) => debug!(config_id, %amount, %fee, "fee usage recorded"),
            Err(err) => warn!(config_id, %amount, %fee, error = %err, "failed to record fee usage"),
        }
    }

    // -----------------------------------------------------------------------
    // Reporting
    // -----------------------------------------------------------------------

    /// Every configuration of `scope`, optionally narrowed to a tenant and
    /// bundle, newest start first.
    pub async fn history(
        &self,
        scope: Scope,
        tenant_id: Option<&str>,
        channel_bundle_id: Option<&str>,
    ) -> Result<Vec<FeeConfiguration>> {
        let filter = RecordFilter {
            scope: Some(scope),
            tenant_id: FieldMatch::filter(tenant_id),
            channel_bundle_id: FieldMatch::filter(channel_bundle_id),
            status: None,
        };
        let mut records = self.find(&filter).await?;
        records.sort_by(|a, b| {
            b.effective_from
                .cmp(&a.effective_from)
                .then_with(|| b.version.cmp(&a.version))
        });
        Ok(records)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<PageResult<FeeConfiguration>> {
        with_timeout("list", self.config.store_timeout, self.store().list(query)).await
    }

    /// Usage totals per scope and status.
    pub async fn analytics(&self, query: &AnalyticsQuery) -> Result<Vec<ScopeAnalytics>> {
        let filter = RecordFilter {
            scope: query.scope,
            tenant_id: FieldMatch::filter(query.tenant_id.as_deref()),
            ..Default::default()
        };
        let records = self.find(&filter).await?;

        let mut by_scope: BTreeMap<Scope, BTreeMap<ConfigStatus, StatusBreakdown>> =
            BTreeMap::new();
        for record in records.iter().filter(|r| {
            query.created_from.map_or(true, |from| r.created_at >= from)
                && query.created_to.map_or(true, |to| r.created_at <= to)
        }) {
            let row = by_scope
                .entry(record.scope)
                .or_default()
                .entry(record.status)
                .or_insert_with(|| StatusBreakdown {
                    status: record.status,
                    count: 0,
                    total_fees_collected: Decimal::ZERO,
                    total_transactions: 0,
                });
            row.count += 1;
            row.total_fees_collected += record.usage_stats.total_fees_collected;
            row.total_transactions += record.usage_stats.transactions_affected;
        }

        Ok(by_scope
            .into_iter()
            .map(|(scope, statuses)| {
                let status_breakdown: Vec<StatusBreakdown> = statuses.into_values().collect();
                ScopeAnalytics {
                    scope,
                    total_configs: status_breakdown.iter().map(|s| s.count).sum(),
                    grand_total_fees: status_breakdown.iter().map(|s| s.total_fees_collected).sum(),
                    grand_total_transactions: status_breakdown
                        .iter()
                        .map(|s| s.total_transactions)
                        .sum(),
                    status_breakdown,
                }
            })
            .collect())
    }

    async fn find(&self, filter: &RecordFilter) -> Result<Vec<FeeConfiguration>> {
        with_timeout(
            "find_matching",
            self.config.store_timeout,
            self.store().find_matching(filter),
        )
        .await
    }
}

/// A lost status guard means another writer moved the record on first.
fn guard_failure(err: FeeError, config_id: &str, operation: &'static str) -> FeeError {
    match err {
        FeeError::Store(StoreError::Conflict { actual, .. }) => {
            FeeError::invalid_state(config_id, actual, operation)
        }
        other => other,
    }
}
