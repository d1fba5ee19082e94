use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{ConfigStatus, Currency, FeeType, Scope, TierType};

/// One amount band of a tiered fee structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTier {
    pub min_amount: Decimal,
    /// `None` means the tier is unbounded above.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<Decimal>,
    pub rate: Decimal,
    pub tier_type: TierType,
}

impl FeeTier {
    /// Whether `amount` falls inside `[min_amount, max_amount]` (both ends inclusive).
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min_amount && self.max_amount.map_or(true, |max| amount <= max)
    }
}

/// Usage telemetry. Never affects fee determination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    #[serde(default)]
    pub transactions_affected: u64,
    #[serde(default)]
    pub total_fees_collected: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

/// Identity of a version group: configurations sharing this triple are
/// numbered together and may not have overlapping active windows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigGroup {
    pub scope: Scope,
    pub tenant_id: Option<String>,
    pub channel_bundle_id: Option<String>,
}

/// A persisted, time-versioned fee configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfiguration {
    /// Storage key.
    pub id: String,
    /// Stable business identifier.
    pub config_id: String,
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_bundle_id: Option<String>,
    pub effective_from: DateTime<Utc>,
    /// `None` means open-ended.
    #[serde(default)]
    pub effective_to: Option<DateTime<Utc>>,
    pub fee_type: FeeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tiered_rates: Vec<FeeTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee: Option<Decimal>,
    pub status: ConfigStatus,
    pub version: u32,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    /// Storage key of the configuration this one replaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<String>,
    #[serde(default)]
    pub usage_stats: UsageStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeeConfiguration {
    /// Build an unsaved draft from `terms`. The store assigns `id` on insert.
    pub fn draft(
        terms: NewFeeConfig,
        config_id: String,
        version: u32,
        created_by: String,
        now: DateTime<Utc>,
    ) -> Self {
        let mut record = Self {
            id: String::new(),
            config_id,
            scope: terms.scope,
            tenant_id: None,
            channel_bundle_id: None,
            effective_from: terms.effective_from,
            effective_to: None,
            fee_type: terms.fee_type,
            percentage_rate: None,
            fixed_amount: None,
            currency: Currency::default(),
            tiered_rates: Vec::new(),
            min_fee: None,
            max_fee: None,
            status: ConfigStatus::Draft,
            version,
            created_by,
            approved_by: None,
            approved_at: None,
            change_reason: None,
            admin_notes: None,
            supersedes: None,
            usage_stats: UsageStats::default(),
            created_at: now,
            updated_at: now,
        };
        record.apply_terms(terms);
        record
    }

    /// Replace every draft-editable field with `terms`.
    pub fn apply_terms(&mut self, terms: NewFeeConfig) {
        self.scope = terms.scope;
        self.tenant_id = terms.tenant_id;
        self.channel_bundle_id = terms.channel_bundle_id;
        self.effective_from = terms.effective_from;
        self.effective_to = terms.effective_to;
        self.fee_type = terms.fee_type;
        self.percentage_rate = terms.percentage_rate;
        self.fixed_amount = terms.fixed_amount;
        if let Some(currency) = terms.currency {
            self.currency = currency;
        }
        self.tiered_rates = terms.tiered_rates;
        self.min_fee = terms.min_fee;
        self.max_fee = terms.max_fee;
        self.change_reason = terms.change_reason;
        self.admin_notes = terms.admin_notes;
        self.supersedes = terms.supersedes;
    }

    /// The draft-editable fields of this record.
    pub fn terms(&self) -> NewFeeConfig {
        NewFeeConfig {
            scope: self.scope,
            tenant_id: self.tenant_id.clone(),
            channel_bundle_id: self.channel_bundle_id.clone(),
            effective_from: self.effective_from,
            effective_to: self.effective_to,
            fee_type: self.fee_type,
            percentage_rate: self.percentage_rate,
            fixed_amount: self.fixed_amount,
            currency: Some(self.currency),
            tiered_rates: self.tiered_rates.clone(),
            min_fee: self.min_fee,
            max_fee: self.max_fee,
            change_reason: self.change_reason.clone(),
            admin_notes: self.admin_notes.clone(),
            supersedes: self.supersedes.clone(),
        }
    }

    pub fn group(&self) -> ConfigGroup {
        ConfigGroup {
            scope: self.scope,
            tenant_id: self.tenant_id.clone(),
            channel_bundle_id: self.channel_bundle_id.clone(),
        }
    }

    /// Whether the `[effective_from, effective_to)` window contains `at`.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.effective_from <= at && self.effective_to.map_or(true, |to| to > at)
    }

    /// Whether this record governs `at`: active and covering.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.status == ConfigStatus::Active && self.covers(at)
    }
}

/// Draft-editable terms of a configuration: the input to `create` and the
/// full replacement applied by `update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeeConfig {
    pub scope: Scope,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub channel_bundle_id: Option<String>,
    pub effective_from: DateTime<Utc>,
    #[serde(default)]
    pub effective_to: Option<DateTime<Utc>>,
    pub fee_type: FeeType,
    #[serde(default)]
    pub percentage_rate: Option<Decimal>,
    #[serde(default)]
    pub fixed_amount: Option<Decimal>,
    /// Falls back to the engine's default currency when unset.
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub tiered_rates: Vec<FeeTier>,
    #[serde(default)]
    pub min_fee: Option<Decimal>,
    #[serde(default)]
    pub max_fee: Option<Decimal>,
    #[serde(default)]
    pub change_reason: Option<String>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub supersedes: Option<String>,
}

impl NewFeeConfig {
    /// Global percentage fee starting at `effective_from`.
    pub fn percentage(effective_from: DateTime<Utc>, rate: Decimal) -> Self {
        Self::base(FeeType::Percentage, effective_from).with_percentage_rate(rate)
    }

    /// Global fixed fee starting at `effective_from`.
    pub fn fixed(effective_from: DateTime<Utc>, amount: Decimal) -> Self {
        let mut terms = Self::base(FeeType::Fixed, effective_from);
        terms.fixed_amount = Some(amount);
        terms
    }

    /// Global tiered fee starting at `effective_from`.
    pub fn tiered(effective_from: DateTime<Utc>, tiers: Vec<FeeTier>) -> Self {
        let mut terms = Self::base(FeeType::Tiered, effective_from);
        terms.tiered_rates = tiers;
        terms
    }

    fn base(fee_type: FeeType, effective_from: DateTime<Utc>) -> Self {
        Self {
            scope: Scope::Global,
            tenant_id: None,
            channel_bundle_id: None,
            effective_from,
            effective_to: None,
            fee_type,
            percentage_rate: None,
            fixed_amount: None,
            currency: None,
            tiered_rates: Vec::new(),
            min_fee: None,
            max_fee: None,
            change_reason: None,
            admin_notes: None,
            supersedes: None,
        }
    }

    /// Narrow to a tenant (sets `scope = tenant`).
    pub fn for_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.scope = Scope::Tenant;
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_channel_bundle(mut self, bundle_id: impl Into<String>) -> Self {
        self.channel_bundle_id = Some(bundle_id.into());
        self
    }

    pub fn with_percentage_rate(mut self, rate: Decimal) -> Self {
        self.percentage_rate = Some(rate);
        self
    }

    pub fn with_effective_to(mut self, effective_to: DateTime<Utc>) -> Self {
        self.effective_to = Some(effective_to);
        self
    }

    pub fn with_limits(mut self, min_fee: Option<Decimal>, max_fee: Option<Decimal>) -> Self {
        self.min_fee = min_fee;
        self.max_fee = max_fee;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.change_reason = Some(reason.into());
        self
    }

    pub fn group(&self) -> ConfigGroup {
        ConfigGroup {
            scope: self.scope,
            tenant_id: self.tenant_id.clone(),
            channel_bundle_id: self.channel_bundle_id.clone(),
        }
    }
}

/// Fee-value overrides applied on top of a cloned configuration by
/// `create_new_version`. The group (scope, tenant, bundle) is never overridden.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    #[serde(default)]
    pub fee_type: Option<FeeType>,
    #[serde(default)]
    pub percentage_rate: Option<Decimal>,
    #[serde(default)]
    pub fixed_amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub tiered_rates: Option<Vec<FeeTier>>,
    #[serde(default)]
    pub min_fee: Option<Decimal>,
    #[serde(default)]
    pub max_fee: Option<Decimal>,
    #[serde(default)]
    pub effective_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

impl ConfigOverrides {
    /// Apply onto `terms`. Switching `fee_type` clears the value fields of the
    /// previous type so the result stays consistent.
    pub fn apply(self, terms: &mut NewFeeConfig) {
        if let Some(fee_type) = self.fee_type {
            if fee_type != terms.fee_type {
                terms.percentage_rate = None;
                terms.fixed_amount = None;
                terms.tiered_rates.clear();
            }
            terms.fee_type = fee_type;
        }
        if let Some(rate) = self.percentage_rate {
            terms.percentage_rate = Some(rate);
        }
        if let Some(amount) = self.fixed_amount {
            terms.fixed_amount = Some(amount);
        }
        if let Some(currency) = self.currency {
            terms.currency = Some(currency);
        }
        if let Some(tiers) = self.tiered_rates {
            terms.tiered_rates = tiers;
        }
        if let Some(min) = self.min_fee {
            terms.min_fee = Some(min);
        }
        if let Some(max) = self.max_fee {
            terms.max_fee = Some(max);
        }
        if let Some(to) = self.effective_to {
            terms.effective_to = Some(to);
        }
        if let Some(notes) = self.admin_notes {
            terms.admin_notes = Some(notes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_tier_contains_bounds_inclusive() {
        let tier = FeeTier {
            min_amount: dec!(100),
            max_amount: Some(dec!(500)),
            rate: dec!(2),
            tier_type: TierType::Percentage,
        };
        assert!(tier.contains(dec!(100)));
        assert!(tier.contains(dec!(500)));
        assert!(!tier.contains(dec!(99.99)));
        assert!(!tier.contains(dec!(500.01)));
    }

    #[test]
    fn test_tier_without_max_is_unbounded() {
        let tier = FeeTier {
            min_amount: dec!(1000),
            max_amount: None,
            rate: dec!(1),
            tier_type: TierType::Percentage,
        };
        assert!(tier.contains(dec!(1000000000)));
    }

    #[test]
    fn test_covers_is_half_open() {
        let terms = NewFeeConfig::percentage(ts(2024, 1, 1), dec!(2.5))
            .with_effective_to(ts(2024, 7, 1));
        let record = FeeConfiguration::draft(terms, "fee_1".into(), 1, "admin".into(), ts(2023, 12, 1));
        assert!(record.covers(ts(2024, 1, 1)));
        assert!(record.covers(ts(2024, 6, 30)));
        assert!(!record.covers(ts(2024, 7, 1)));
        assert!(!record.covers(ts(2023, 12, 31)));
        // drafts never govern an instant
        assert!(!record.is_active_at(ts(2024, 3, 1)));
    }

    #[test]
    fn test_terms_round_trip_through_record() {
        let terms = NewFeeConfig::fixed(ts(2024, 1, 1), dec!(15))
            .for_tenant("t-1")
            .with_channel_bundle("b-9")
            .with_reason("launch pricing");
        let record = FeeConfiguration::draft(terms.clone(), "fee_1".into(), 3, "admin".into(), ts(2024, 1, 1));
        let mut expected = terms;
        expected.currency = Some(Currency::Inr);
        assert_eq!(record.terms(), expected);
        assert_eq!(record.version, 3);
        assert_eq!(record.status, ConfigStatus::Draft);
        assert_eq!(
            record.group(),
            ConfigGroup {
                scope: Scope::Tenant,
                tenant_id: Some("t-1".into()),
                channel_bundle_id: Some("b-9".into()),
            }
        );
    }

    #[test]
    fn test_overrides_switching_type_clears_old_values() {
        let mut terms = NewFeeConfig::percentage(ts(2024, 1, 1), dec!(2.5));
        ConfigOverrides {
            fee_type: Some(FeeType::Fixed),
            fixed_amount: Some(dec!(10)),
            ..Default::default()
        }
        .apply(&mut terms);
        assert_eq!(terms.fee_type, FeeType::Fixed);
        assert_eq!(terms.fixed_amount, Some(dec!(10)));
        assert_eq!(terms.percentage_rate, None);
    }

    #[test]
    fn test_overrides_keep_untouched_fields() {
        let mut terms = NewFeeConfig::percentage(ts(2024, 1, 1), dec!(2.5))
            .with_limits(Some(dec!(1)), Some(dec!(50)));
        ConfigOverrides {
            percentage_rate: Some(dec!(2.9)),
            ..Default::default()
        }
        .apply(&mut terms);
        assert_eq!(terms.percentage_rate, Some(dec!(2.9)));
        assert_eq!(terms.min_fee, Some(dec!(1)));
        assert_eq!(terms.max_fee, Some(dec!(50)));
    }
}
