//! Time-bounded memoization in front of [`ConfigResolver`].
//!
//! Keys are `(tenant, bundle, time bucket)` where the bucket is the query
//! instant truncated to `EngineConfig::cache_bucket`. Only hits are stored;
//! a context with no active configuration is looked up again every time.
//!
//! A bucket can straddle the start or end of another candidate record, so
//! each entry also carries the span between the nearest window edges of all
//! candidates around the resolved instant. Inside that span the resolution
//! cannot change; outside it the entry is not served.
//!
//! The cache is per instance. Two services over the same store do not see
//! each other's invalidations, so a record approved through one may keep
//! resolving to its predecessor through the other for up to the TTL.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::error::Result;
use crate::resolver::ConfigResolver;
use crate::types::FeeConfiguration;
use crate::utils::time_bucket;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    tenant_id: Option<String>,
    channel_bundle_id: Option<String>,
    bucket: i64,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    config: FeeConfiguration,
    stored_at: Instant,
    /// Latest candidate window edge at or before the resolved instant.
    stable_from: Option<DateTime<Utc>>,
    /// Earliest candidate window edge after it.
    stable_until: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn serves(&self, at: DateTime<Utc>) -> bool {
        self.stable_from.map_or(true, |from| from <= at)
            && self.stable_until.map_or(true, |until| at < until)
            && self.config.is_active_at(at)
    }
}

/// The span around `at` bounded by the nearest window edges of `candidates`.
fn stable_span(
    candidates: &[FeeConfiguration],
    at: DateTime<Utc>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let mut from = None;
    let mut until: Option<DateTime<Utc>> = None;
    for edge in candidates
        .iter()
        .flat_map(|c| std::iter::once(c.effective_from).chain(c.effective_to))
    {
        if edge <= at {
            from = from.max(Some(edge));
        } else {
            until = Some(until.map_or(edge, |u| u.min(edge)));
        }
    }
    (from, until)
}

/// Entry counts reported by [`ResolutionCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

pub struct ResolutionCache {
    resolver: ConfigResolver,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    bucket: Duration,
}

impl ResolutionCache {
    pub fn new(resolver: ConfigResolver, ttl: Duration, bucket: Duration) -> Self {
        Self {
            resolver,
            entries: RwLock::new(HashMap::new()),
            ttl,
            bucket,
        }
    }

    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Cached resolution. An entry is only reused for instants where no
    /// candidate record starts or ends between it and the instant it was
    /// resolved for; otherwise the store is asked again.
    pub async fn get(
        &self,
        tenant_id: Option<&str>,
        channel_bundle_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Option<FeeConfiguration>> {
        let key = CacheKey {
            tenant_id: tenant_id.map(str::to_string),
            channel_bundle_id: channel_bundle_id.map(str::to_string),
            bucket: time_bucket(at, self.bucket),
        };

        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if entry.stored_at.elapsed() < self.ttl && entry.serves(at) {
                    debug!(?tenant_id, ?channel_bundle_id, bucket = key.bucket, "resolution cache hit");
                    return Ok(Some(entry.config.clone()));
                }
            }
        }

        debug!(?tenant_id, ?channel_bundle_id, bucket = key.bucket, "resolution cache miss");
        let resolved = self.resolver.resolve(tenant_id, channel_bundle_id, at).await?;

        if let Some(config) = &resolved {
            let candidates = self
                .resolver
                .candidates(tenant_id, channel_bundle_id, at)
                .await?;
            let (stable_from, stable_until) = stable_span(&candidates, at);

            let mut entries = self.entries.write().await;
            let ttl = self.ttl;
            entries.retain(|_, e| e.stored_at.elapsed() < ttl);
            entries.insert(
                key,
                CacheEntry {
                    config: config.clone(),
                    stored_at: Instant::now(),
                    stable_from,
                    stable_until,
                },
            );
        }
        Ok(resolved)
    }

    /// Resolve without reading or populating the cache.
    pub async fn get_uncached(
        &self,
        tenant_id: Option<&str>,
        channel_bundle_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Option<FeeConfiguration>> {
        self.resolver.resolve(tenant_id, channel_bundle_id, at).await
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "resolution cache cleared");
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let valid = entries
            .values()
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .count();
        CacheStats {
            total_entries: entries.len(),
            valid_entries: valid,
            expired_entries: entries.len() - valid,
        }
    }
}
