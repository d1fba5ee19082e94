//! Engine configuration.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{FeeError, Result};
use crate::types::Currency;

pub const ENV_CACHE_TTL_SECS: &str = "FEECONF_CACHE_TTL_SECS";
pub const ENV_CACHE_BUCKET_SECS: &str = "FEECONF_CACHE_BUCKET_SECS";
pub const ENV_STORE_TIMEOUT_MS: &str = "FEECONF_STORE_TIMEOUT_MS";
pub const ENV_APPROVAL_RETRIES: &str = "FEECONF_APPROVAL_RETRIES";
pub const ENV_DEFAULT_CURRENCY: &str = "FEECONF_DEFAULT_CURRENCY";
pub const ENV_STRICT_TIERS: &str = "FEECONF_STRICT_TIERS";

/// Tuneable parameters of the fee engine.
///
/// Use [`Default::default()`] or [`EngineConfig::from_env`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// How long a resolved configuration stays in the resolution cache.
    pub cache_ttl: Duration,
    /// Width of the time bucket that query instants are truncated to when
    /// building cache keys.
    pub cache_bucket: Duration,
    /// Deadline applied to every store call.
    pub store_timeout: Duration,
    /// Attempts made when an approval batch loses a status guard.
    pub approval_retries: u32,
    /// Currency applied to drafts whose input leaves it unset.
    pub default_currency: Currency,
    /// Reject tier lists with gaps or overlaps.
    pub strict_tiers: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            cache_bucket: Duration::from_secs(60),
            store_timeout: Duration::from_secs(5),
            approval_retries: 3,
            default_currency: Currency::Inr,
            strict_tiers: false,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by any `FEECONF_*` variables present in the
    /// process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_CACHE_TTL_SECS)? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_CACHE_BUCKET_SECS)? {
            if secs == 0 {
                return Err(FeeError::Config(format!("{ENV_CACHE_BUCKET_SECS} must be > 0")));
            }
            config.cache_bucket = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_STORE_TIMEOUT_MS)? {
            config.store_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = parse_var::<u32, _>(&lookup, ENV_APPROVAL_RETRIES)? {
            config.approval_retries = n.max(1);
        }
        if let Some(raw) = lookup(ENV_DEFAULT_CURRENCY) {
            config.default_currency = raw
                .parse()
                .map_err(|e| FeeError::Config(format!("{ENV_DEFAULT_CURRENCY}: {e}")))?;
        }
        if let Some(flag) = parse_var::<bool, _>(&lookup, ENV_STRICT_TIERS)? {
            config.strict_tiers = flag;
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| FeeError::Config(format!("{key}={raw}: {e}"))),
    }
}
