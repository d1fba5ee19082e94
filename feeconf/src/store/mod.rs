//! Persistence abstraction over fee-configuration records.
//!
//! The store is plain CRUD plus a handful of targeted queries. It never
//! decides which configuration governs an instant beyond the status and
//! window filter of [`ConfigStore::find_active_covering`]; precedence lives in
//! the resolver and lifecycle rules live in the version manager.
//!
//! Two rules are enforced here as well, so that no caller can bypass them:
//!
//! - a [`ConfigPatch`] carrying new `terms` is refused unless the record is
//!   still a draft (fee-determining fields are frozen afterwards);
//! - every patch may carry an `expected_status` guard, and [`ConfigStore::commit`]
//!   applies a batch of guarded patches all-or-nothing.

mod memory;

pub use memory::MemoryConfigStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::types::{
    ConfigGroup, ConfigStatus, FeeConfiguration, ListQuery, NewFeeConfig, PageResult, Scope,
    SortField, SortOrder,
};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Shared handle to a store implementation.
pub type DynConfigStore = Arc<dyn ConfigStore>;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// How an optional identifier field is matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldMatch {
    /// No filter on this field.
    #[default]
    Any,
    /// The field must be absent.
    Unset,
    /// The field must equal the given value.
    Equals(String),
}

impl FieldMatch {
    /// Exact match on an optional value: `None` means the field must be unset.
    pub fn exact(value: Option<&str>) -> Self {
        match value {
            Some(v) => FieldMatch::Equals(v.to_string()),
            None => FieldMatch::Unset,
        }
    }

    /// Filter on an optional value: `None` means no filter.
    pub fn filter(value: Option<&str>) -> Self {
        match value {
            Some(v) => FieldMatch::Equals(v.to_string()),
            None => FieldMatch::Any,
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            FieldMatch::Any => true,
            FieldMatch::Unset => value.is_none(),
            FieldMatch::Equals(expected) => value == Some(expected.as_str()),
        }
    }
}

/// Filter over stored records. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub scope: Option<Scope>,
    pub tenant_id: FieldMatch,
    pub channel_bundle_id: FieldMatch,
    pub status: Option<ConfigStatus>,
}

impl RecordFilter {
    /// Every record of exactly this group.
    pub fn group(group: &ConfigGroup) -> Self {
        Self {
            scope: Some(group.scope),
            tenant_id: FieldMatch::exact(group.tenant_id.as_deref()),
            channel_bundle_id: FieldMatch::exact(group.channel_bundle_id.as_deref()),
            status: None,
        }
    }

    pub fn with_status(mut self, status: ConfigStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, record: &FeeConfiguration) -> bool {
        self.scope.map_or(true, |s| s == record.scope)
            && self.tenant_id.matches(record.tenant_id.as_deref())
            && self.channel_bundle_id.matches(record.channel_bundle_id.as_deref())
            && self.status.map_or(true, |s| s == record.status)
    }
}

impl From<&ListQuery> for RecordFilter {
    fn from(query: &ListQuery) -> Self {
        Self {
            scope: query.scope,
            tenant_id: FieldMatch::filter(query.tenant_id.as_deref()),
            channel_bundle_id: FieldMatch::filter(query.channel_bundle_id.as_deref()),
            status: query.status,
        }
    }
}

/// Active records the covering query would consider, whatever their window.
impl From<&CoveringQuery> for RecordFilter {
    fn from(query: &CoveringQuery) -> Self {
        Self {
            scope: Some(query.scope),
            tenant_id: query.tenant_id.clone(),
            channel_bundle_id: query.channel_bundle_id.clone(),
            status: Some(ConfigStatus::Active),
        }
    }
}

/// Input to [`ConfigStore::find_active_covering`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoveringQuery {
    pub scope: Scope,
    pub tenant_id: FieldMatch,
    pub channel_bundle_id: FieldMatch,
    pub at: DateTime<Utc>,
}

impl CoveringQuery {
    /// Global-scope lookup with no tenant or bundle filter.
    pub fn global(at: DateTime<Utc>) -> Self {
        Self {
            scope: Scope::Global,
            tenant_id: FieldMatch::Any,
            channel_bundle_id: FieldMatch::Any,
            at,
        }
    }

    /// Tenant-scope lookup, narrowed by bundle when one is given.
    pub fn tenant(tenant_id: &str, channel_bundle_id: Option<&str>, at: DateTime<Utc>) -> Self {
        Self {
            scope: Scope::Tenant,
            tenant_id: FieldMatch::Equals(tenant_id.to_string()),
            channel_bundle_id: FieldMatch::filter(channel_bundle_id),
            at,
        }
    }

    /// Exact-group lookup.
    pub fn group(group: &ConfigGroup, at: DateTime<Utc>) -> Self {
        Self {
            scope: group.scope,
            tenant_id: FieldMatch::exact(group.tenant_id.as_deref()),
            channel_bundle_id: FieldMatch::exact(group.channel_bundle_id.as_deref()),
            at,
        }
    }

    /// Status is the authoritative gate: only `active` records whose window
    /// contains `at` qualify.
    pub fn matches(&self, record: &FeeConfiguration) -> bool {
        record.scope == self.scope
            && self.tenant_id.matches(record.tenant_id.as_deref())
            && self.channel_bundle_id.matches(record.channel_bundle_id.as_deref())
            && record.is_active_at(self.at)
    }
}

// ---------------------------------------------------------------------------
// Patches
// ---------------------------------------------------------------------------

/// Partial update of a stored record.
///
/// Apart from `terms` (a full replacement of draft-editable fields, only
/// accepted while the record is a draft), a patch only touches fields that
/// stay mutable for the whole life of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    /// Refuse the write unless the record currently has this status.
    pub expected_status: Option<ConfigStatus>,
    pub terms: Option<NewFeeConfig>,
    /// `Some(None)` clears the end of the window.
    pub effective_to: Option<Option<DateTime<Utc>>>,
    pub status: Option<ConfigStatus>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
}

impl ConfigPatch {
    pub fn expecting(status: ConfigStatus) -> Self {
        Self {
            expected_status: Some(status),
            ..Default::default()
        }
    }

    pub fn terms(mut self, terms: NewFeeConfig) -> Self {
        self.terms = Some(terms);
        self
    }

    pub fn status(mut self, status: ConfigStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn effective_to(mut self, effective_to: Option<DateTime<Utc>>) -> Self {
        self.effective_to = Some(effective_to);
        self
    }

    pub fn approval(mut self, approved_by: impl Into<String>, approved_at: DateTime<Utc>) -> Self {
        self.approved_by = Some(approved_by.into());
        self.approved_at = Some(approved_at);
        self
    }

    pub fn admin_notes(mut self, notes: impl Into<String>) -> Self {
        self.admin_notes = Some(notes.into());
        self
    }

    /// Check the guard and the draft-only rule, then write the patch into
    /// `record`. Leaves `record` untouched on error.
    pub fn apply(self, record: &mut FeeConfiguration, now: DateTime<Utc>) -> StoreResult<()> {
        self.check(record)?;
        if let Some(terms) = self.terms {
            record.apply_terms(terms);
        }
        if let Some(effective_to) = self.effective_to {
            record.effective_to = effective_to;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(by) = self.approved_by {
            record.approved_by = Some(by);
        }
        if let Some(at) = self.approved_at {
            record.approved_at = Some(at);
        }
        if let Some(notes) = self.admin_notes {
            record.admin_notes = Some(notes);
        }
        record.updated_at = now;
        Ok(())
    }

    /// Validate the patch against `record` without writing.
    pub fn check(&self, record: &FeeConfiguration) -> StoreResult<()> {
        if let Some(expected) = self.expected_status {
            if record.status != expected {
                return Err(StoreError::Conflict {
                    id: record.id.clone(),
                    expected,
                    actual: record.status,
                });
            }
        }
        if self.terms.is_some() && record.status != ConfigStatus::Draft {
            return Err(StoreError::Immutable {
                id: record.id.clone(),
                status: record.status,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Persist a new record. An empty `id` is replaced by a generated one.
    async fn insert(&self, record: FeeConfiguration) -> StoreResult<FeeConfiguration>;

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<FeeConfiguration>>;

    async fn find_by_config_id(&self, config_id: &str) -> StoreResult<Option<FeeConfiguration>>;

    /// Highest-version record of exactly this group, any status.
    async fn find_latest_version(
        &self,
        group: &ConfigGroup,
    ) -> StoreResult<Option<FeeConfiguration>>;

    /// First active record covering `query.at`, latest `effective_from` first.
    async fn find_active_covering(
        &self,
        query: &CoveringQuery,
    ) -> StoreResult<Option<FeeConfiguration>>;

    /// Every record matching `filter`, in no particular order.
    async fn find_matching(&self, filter: &RecordFilter) -> StoreResult<Vec<FeeConfiguration>>;

    async fn update(&self, id: &str, patch: ConfigPatch) -> StoreResult<FeeConfiguration>;

    /// Apply every `(id, patch)` or none of them.
    async fn commit(&self, writes: Vec<(String, ConfigPatch)>)
        -> StoreResult<Vec<FeeConfiguration>>;

    /// Remove a record, provided it still has `expected_status`.
    async fn delete(&self, id: &str, expected_status: ConfigStatus) -> StoreResult<()>;

    /// Add one transaction and its fee to the usage counters of `config_id`.
    async fn record_usage(
        &self,
        config_id: &str,
        fee: Decimal,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Filtered, sorted and paginated listing.
    async fn list(&self, query: &ListQuery) -> StoreResult<PageResult<FeeConfiguration>> {
        let mut records = self.find_matching(&RecordFilter::from(query)).await?;
        sort_records(&mut records, query.sort_by, query.sort_order);
        Ok(PageResult::paginate(records, query.page, query.limit))
    }
}

/// Sort by `field`, breaking ties on storage id so pages stay stable.
pub fn sort_records(records: &mut [FeeConfiguration], field: SortField, order: SortOrder) {
    records.sort_by(|a, b| {
        let primary = match field {
            SortField::EffectiveFrom => a.effective_from.cmp(&b.effective_from),
            SortField::Version => a.version.cmp(&b.version),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let ord = primary.then_with(|| a.id.cmp(&b.id));
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}
