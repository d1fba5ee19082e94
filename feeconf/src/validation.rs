//! Draft validation.
//!
//! Runs on `create` and `update` before anything reaches the store. A
//! configuration that fails here is never persisted.

use rust_decimal::Decimal;
use tracing::warn;

use crate::error::{FeeError, Result};
use crate::types::{FeeTier, FeeType, NewFeeConfig, Scope, TierType};

pub const MAX_CHANGE_REASON_LEN: usize = 1000;
pub const MAX_ADMIN_NOTES_LEN: usize = 2000;

/// Validate draft terms. `strict_tiers` additionally requires the tier list
/// to partition the amount range without gaps or overlaps.
pub fn validate_terms(terms: &NewFeeConfig, strict_tiers: bool) -> Result<()> {
    validate_scope(terms)?;
    validate_window(terms)?;
    validate_structure(terms)?;
    if strict_tiers && terms.fee_type == FeeType::Tiered {
        validate_tier_partition(&terms.tiered_rates)?;
    }
    validate_limits(terms)?;
    validate_text(terms)?;
    Ok(())
}

fn invalid(msg: impl Into<String>) -> FeeError {
    FeeError::Validation(msg.into())
}

fn validate_scope(terms: &NewFeeConfig) -> Result<()> {
    match (terms.scope, terms.tenant_id.as_deref()) {
        (Scope::Tenant, None) => Err(invalid("tenantId is required for tenant-specific fees")),
        (Scope::Tenant, Some(t)) if t.trim().is_empty() => {
            Err(invalid("tenantId must not be blank"))
        }
        (Scope::Global, Some(_)) => Err(invalid("tenantId must not be set for global fees")),
        _ => Ok(()),
    }
}

fn validate_window(terms: &NewFeeConfig) -> Result<()> {
    match terms.effective_to {
        Some(to) if to <= terms.effective_from => Err(invalid(
            "effectiveFrom must be before effectiveTo",
        )),
        _ => Ok(()),
    }
}

fn validate_structure(terms: &NewFeeConfig) -> Result<()> {
    let has_rate = terms.percentage_rate.is_some();
    let has_fixed = terms.fixed_amount.is_some();
    let has_tiers = !terms.tiered_rates.is_empty();

    match terms.fee_type {
        FeeType::Percentage => {
            let rate = terms
                .percentage_rate
                .ok_or_else(|| invalid("percentageRate is required for percentage fee type"))?;
            check_percentage("percentageRate", rate)?;
            if has_fixed || has_tiers {
                return Err(invalid(
                    "percentage fee type must not carry fixedAmount or tieredRates",
                ));
            }
        }
        FeeType::Fixed => {
            let amount = terms
                .fixed_amount
                .ok_or_else(|| invalid("fixedAmount is required for fixed fee type"))?;
            check_non_negative("fixedAmount", amount)?;
            if has_rate || has_tiers {
                return Err(invalid(
                    "fixed fee type must not carry percentageRate or tieredRates",
                ));
            }
        }
        FeeType::Tiered => {
            if !has_tiers {
                return Err(invalid("tieredRates are required for tiered fee type"));
            }
            if has_rate || has_fixed {
                return Err(invalid(
                    "tiered fee type must not carry percentageRate or fixedAmount",
                ));
            }
            for (i, tier) in terms.tiered_rates.iter().enumerate() {
                validate_tier(i, tier)?;
            }
        }
    }
    Ok(())
}

fn validate_tier(index: usize, tier: &FeeTier) -> Result<()> {
    check_non_negative(&format!("tieredRates[{index}].minAmount"), tier.min_amount)?;
    if let Some(max) = tier.max_amount {
        if max < tier.min_amount {
            return Err(invalid(format!(
                "tieredRates[{index}]: maxAmount {max} is below minAmount {}",
                tier.min_amount
            )));
        }
    }
    match tier.tier_type {
        TierType::Percentage => check_percentage(&format!("tieredRates[{index}].rate"), tier.rate),
        TierType::Fixed => check_non_negative(&format!("tieredRates[{index}].rate"), tier.rate),
    }
}

/// Tiers sorted by `minAmount` must start at zero, leave no gap and not
/// overlap; only the last tier may be unbounded.
pub fn validate_tier_partition(tiers: &[FeeTier]) -> Result<()> {
    let mut sorted: Vec<&FeeTier> = tiers.iter().collect();
    sorted.sort_by(|a, b| a.min_amount.cmp(&b.min_amount));

    let Some(first) = sorted.first() else {
        return Err(invalid("tieredRates must not be empty"));
    };
    if !first.min_amount.is_zero() {
        return Err(invalid("first tier must start at 0"));
    }

    for pair in sorted.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        let Some(lower_max) = lower.max_amount else {
            return Err(invalid("only the last tier may be unbounded"));
        };
        if upper.min_amount <= lower_max {
            return Err(invalid(format!(
                "tiers overlap at {}",
                upper.min_amount
            )));
        }
        // Amounts carry 2 decimals, so the next band starts one cent later.
        if upper.min_amount - lower_max > Decimal::new(1, 2) {
            return Err(invalid(format!(
                "gap between tiers: {lower_max} .. {}",
                upper.min_amount
            )));
        }
    }
    Ok(())
}

fn validate_limits(terms: &NewFeeConfig) -> Result<()> {
    if let Some(min) = terms.min_fee {
        check_non_negative("minFee", min)?;
    }
    if let Some(max) = terms.max_fee {
        check_non_negative("maxFee", max)?;
    }
    if let (Some(min), Some(max)) = (terms.min_fee, terms.max_fee) {
        if min > max {
            // Accepted: the calculator clamps min first, so maxFee wins.
            warn!(%min, %max, "minFee exceeds maxFee; fees will resolve to maxFee");
        }
    }
    Ok(())
}

fn validate_text(terms: &NewFeeConfig) -> Result<()> {
    if let Some(reason) = &terms.change_reason {
        if reason.chars().count() > MAX_CHANGE_REASON_LEN {
            return Err(invalid(format!(
                "changeReason exceeds {MAX_CHANGE_REASON_LEN} characters"
            )));
        }
    }
    if let Some(notes) = &terms.admin_notes {
        if notes.chars().count() > MAX_ADMIN_NOTES_LEN {
            return Err(invalid(format!(
                "adminNotes exceed {MAX_ADMIN_NOTES_LEN} characters"
            )));
        }
    }
    Ok(())
}

fn check_non_negative(field: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid(format!("{field} must be >= 0, got {value}")));
    }
    Ok(())
}

pub(crate) fn check_percentage(field: &str, value: Decimal) -> Result<()> {
    check_non_negative(field, value)?;
    if value > Decimal::ONE_HUNDRED {
        return Err(invalid(format!("{field} must be <= 100, got {value}")));
    }
    Ok(())
}
