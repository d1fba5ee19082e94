use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::config::{FeeConfiguration, FeeTier};
use super::enums::{AppliedFeeType, Currency, Scope, TierType};

/// Which clamp limits changed the raw fee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedLimits {
    /// Set to the configured `minFee` when the raw fee was raised to it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_fee_applied: Option<Decimal>,
    /// Set to the configured `maxFee` when the fee was lowered to it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_applied: Option<Decimal>,
}

impl AppliedLimits {
    pub fn is_empty(&self) -> bool {
        self.min_fee_applied.is_none() && self.max_fee_applied.is_none()
    }
}

/// Type-specific detail of how a fee was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CalculationDetail {
    #[serde(rename_all = "camelCase")]
    Percentage {
        rate: Decimal,
        base_amount: Decimal,
        /// Fee before clamping and rounding.
        calculated_fee: Decimal,
    },
    #[serde(rename_all = "camelCase")]
    Fixed {
        fixed_amount: Decimal,
        currency: Currency,
    },
    #[serde(rename_all = "camelCase")]
    Tiered {
        /// `None` when no tier contains the amount.
        applicable_tier: Option<FeeTier>,
        tier_rate: Option<Decimal>,
        tier_type: Option<TierType>,
        calculated_fee: Decimal,
    },
}

/// Fee breakdown attached to every calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub gross_amount: Decimal,
    pub platform_fee: Decimal,
    pub net_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation: Option<CalculationDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_limits: Option<AppliedLimits>,
}

/// Output of the pure fee calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeOutcome {
    /// Final fee: clamped and rounded to 2 dp.
    pub fee: Decimal,
    pub breakdown: FeeBreakdown,
}

/// Reference to the configuration that produced a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUsed {
    pub id: String,
    pub config_id: String,
    pub version: u32,
    pub scope: Scope,
    pub effective_from: DateTime<Utc>,
}

impl From<&FeeConfiguration> for ConfigUsed {
    fn from(config: &FeeConfiguration) -> Self {
        Self {
            id: config.id.clone(),
            config_id: config.config_id.clone(),
            version: config.version,
            scope: config.scope,
            effective_from: config.effective_from,
        }
    }
}

/// Result of `calculate_transaction_fee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeCalculation {
    pub transaction_amount: Decimal,
    pub platform_fee: Decimal,
    pub net_amount: Decimal,
    /// Only populated for percentage configurations.
    pub fee_rate: Option<Decimal>,
    pub fee_type: AppliedFeeType,
    pub currency: Currency,
    pub config_used: Option<ConfigUsed>,
    pub calculated_at: DateTime<Utc>,
    pub breakdown: FeeBreakdown,
}

/// Input to `calculate_transaction_fee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub channel_bundle_id: Option<String>,
    /// Defaults to the time of the call.
    #[serde(default)]
    pub transaction_date: Option<DateTime<Utc>>,
    /// Skip the resolution cache for this request.
    #[serde(default)]
    pub bypass_cache: bool,
}

impl FeeRequest {
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount,
            tenant_id: None,
            channel_bundle_id: None,
            transaction_date: None,
            bypass_cache: false,
        }
    }

    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn channel_bundle(mut self, bundle_id: impl Into<String>) -> Self {
        self.channel_bundle_id = Some(bundle_id.into());
        self
    }

    pub fn at(mut self, date: DateTime<Utc>) -> Self {
        self.transaction_date = Some(date);
        self
    }
}

/// One transaction of a bulk calculation. `amount` may be missing in the
/// input; that entry then fails on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTransaction {
    pub id: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub channel_bundle_id: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

/// Per-transaction outcome of a bulk calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkFeeResult {
    pub transaction_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_calculation: Option<FeeCalculation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
