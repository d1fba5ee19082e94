use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::calculation::{ConfigUsed, FeeCalculation};
use super::config::FeeTier;
use super::enums::{ConfigStatus, Currency, Scope};

/// Filter for `fee_analytics`. Created-at bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub created_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub status: ConfigStatus,
    pub count: u64,
    pub total_fees_collected: Decimal,
    pub total_transactions: u64,
}

/// Usage totals of every configuration in one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeAnalytics {
    pub scope: Scope,
    pub status_breakdown: Vec<StatusBreakdown>,
    pub total_configs: u64,
    pub grand_total_fees: Decimal,
    pub grand_total_transactions: u64,
}

/// Input to `simulate_fee_impact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    #[serde(default = "default_amounts")]
    pub amounts: Vec<Decimal>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub channel_bundle_id: Option<String>,
    /// Defaults to now.
    #[serde(default)]
    pub current_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub future_date: Option<DateTime<Utc>>,
}

pub fn default_amounts() -> Vec<Decimal> {
    vec![dec!(100), dec!(500), dec!(1000), dec!(5000), dec!(10000)]
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            amounts: default_amounts(),
            tenant_id: None,
            channel_bundle_id: None,
            current_date: None,
            future_date: None,
        }
    }
}

/// One simulated amount: either a calculation or the error it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationPoint {
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation: Option<FeeCalculation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeComparison {
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_change: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub current: Vec<SimulationPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future: Option<Vec<SimulationPoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Vec<FeeComparison>>,
}

/// Input to `fee_recommendations`: past transaction amounts plus optional
/// revenue goals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub channel_bundle_id: Option<String>,
    #[serde(default)]
    pub transaction_history: Vec<Decimal>,
    /// Percentage rate to price a flat percentage suggestion at.
    #[serde(default)]
    pub target_fee_percentage: Option<Decimal>,
    /// Revenue over the history to solve a percentage rate for. Ignored
    /// when `target_fee_percentage` is set.
    #[serde(default)]
    pub target_revenue: Option<Decimal>,
}

/// Nearest-rank percentiles of the history: index `floor(n * p)` of the
/// ascending amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountPercentiles {
    pub p25: Decimal,
    pub p75: Decimal,
    pub p90: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAnalysis {
    pub total_transactions: u64,
    pub total_amount: Decimal,
    pub average_amount: Decimal,
    pub median_amount: Decimal,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub percentiles: AmountPercentiles,
}

/// One suggested fee structure with its projected yield over the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeeRecommendation {
    #[serde(rename_all = "camelCase")]
    Percentage {
        percentage_rate: Decimal,
        projected_revenue: Decimal,
        average_fee_per_transaction: Decimal,
        description: String,
    },
    #[serde(rename_all = "camelCase")]
    Tiered {
        tiered_rates: Vec<FeeTier>,
        projected_revenue: Decimal,
        description: String,
    },
    #[serde(rename_all = "camelCase")]
    Fixed {
        fixed_amount: Decimal,
        currency: Currency,
        projected_revenue: Decimal,
        description: String,
    },
}

impl FeeRecommendation {
    pub fn kind(&self) -> &'static str {
        match self {
            FeeRecommendation::Percentage { .. } => "percentage",
            FeeRecommendation::Tiered { .. } => "tiered",
            FeeRecommendation::Fixed { .. } => "fixed",
        }
    }

    pub fn projected_revenue(&self) -> Decimal {
        match self {
            FeeRecommendation::Percentage { projected_revenue, .. }
            | FeeRecommendation::Tiered { projected_revenue, .. }
            | FeeRecommendation::Fixed { projected_revenue, .. } => *projected_revenue,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            FeeRecommendation::Percentage { description, .. }
            | FeeRecommendation::Tiered { description, .. }
            | FeeRecommendation::Fixed { description, .. } => description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationReport {
    pub transaction_analysis: TransactionAnalysis,
    /// Configuration governing the context now, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_config: Option<ConfigUsed>,
    /// What the governing configuration collects over the history.
    pub current_revenue: Decimal,
    pub recommendations: Vec<FeeRecommendation>,
    pub generated_at: DateTime<Utc>,
}
