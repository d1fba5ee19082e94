//! Point-in-time resolution of the governing configuration.
//!
//! Precedence is two-tier: an active tenant configuration (narrowed by
//! channel bundle when one is supplied) beats the active global one. A
//! bundle without a tenant has no tier of its own and falls straight through
//! to the global lookup.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::store::{CoveringQuery, DynConfigStore, RecordFilter};
use crate::types::{ConfigGroup, FeeConfiguration};
use crate::utils::with_timeout;

#[derive(Clone)]
pub struct ConfigResolver {
    store: DynConfigStore,
    timeout: Duration,
}

impl ConfigResolver {
    pub fn new(store: DynConfigStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &DynConfigStore {
        &self.store
    }

    /// The configuration governing `at` for this context, or `None` when no
    /// active configuration covers it. Store failures and timeouts are
    /// errors, never `None`.
    pub async fn resolve(
        &self,
        tenant_id: Option<&str>,
        channel_bundle_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Option<FeeConfiguration>> {
        if let Some(tenant) = tenant_id {
            let query = CoveringQuery::tenant(tenant, channel_bundle_id, at);
            if let Some(found) = self.find(&query).await? {
                debug!(tenant, config_id = %found.config_id, "resolved tenant configuration");
                return Ok(Some(found));
            }
        }

        let found = self.find(&CoveringQuery::global(at)).await?;
        match &found {
            Some(config) => debug!(config_id = %config.config_id, "resolved global configuration"),
            None => debug!(?tenant_id, ?channel_bundle_id, %at, "no active configuration"),
        }
        Ok(found)
    }

    /// Every active record of either tier that could govern this context at
    /// some instant. The resolution only changes at the window edges of
    /// these records.
    pub async fn candidates(
        &self,
        tenant_id: Option<&str>,
        channel_bundle_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Vec<FeeConfiguration>> {
        let mut queries = Vec::with_capacity(2);
        if let Some(tenant) = tenant_id {
            queries.push(CoveringQuery::tenant(tenant, channel_bundle_id, at));
        }
        queries.push(CoveringQuery::global(at));

        let mut found = Vec::new();
        for query in &queries {
            let filter = RecordFilter::from(query);
            found.extend(
                with_timeout(
                    "find_matching",
                    self.timeout,
                    self.store.find_matching(&filter),
                )
                .await?,
            );
        }
        Ok(found)
    }

    /// Active record of exactly `group` covering `at`, with no fallback.
    pub async fn resolve_in_group(
        &self,
        group: &ConfigGroup,
        at: DateTime<Utc>,
    ) -> Result<Option<FeeConfiguration>> {
        self.find(&CoveringQuery::group(group, at)).await
    }

    async fn find(&self, query: &CoveringQuery) -> Result<Option<FeeConfiguration>> {
        with_timeout(
            "find_active_covering",
            self.timeout,
            self.store.find_active_covering(query),
        )
        .await
    }
}
