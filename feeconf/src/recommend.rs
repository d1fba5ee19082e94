//! Fee structure suggestions derived from a transaction amount history.
//!
//! Everything here is pure arithmetic over the history; the service layer
//! adds the context's current configuration on top.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{FeeError, Result};
use crate::types::{
    AmountPercentiles, Currency, FeeRecommendation, FeeTier, RecommendationRequest, TierType,
    TransactionAnalysis,
};
use crate::utils::{percent_of, round2};
use crate::validation::check_percentage;

/// Rates of the low, middle and high suggested bands.
const TIER_RATES: [Decimal; 3] = [dec!(2.5), dec!(2.0), dec!(1.5)];
/// Fixed suggestions are only made below this average amount.
const FIXED_FEE_CEILING: Decimal = dec!(1000);
const FIXED_FEE_FLOOR: Decimal = dec!(10);
const FIXED_FEE_SHARE: Decimal = dec!(0.02);
/// Next band starts one cent above the previous band's max.
const CENT: Decimal = dec!(0.01);

fn calc_error(what: &str) -> FeeError {
    FeeError::Calculation(format!("{what} is out of the decimal range"))
}

/// Summary statistics of `amounts`. Amounts must be positive.
pub fn analyze_amounts(amounts: &[Decimal]) -> Result<TransactionAnalysis> {
    if amounts.is_empty() {
        return Err(FeeError::Validation(
            "transaction history is required for recommendations".into(),
        ));
    }
    if let Some(bad) = amounts.iter().find(|a| **a <= Decimal::ZERO) {
        return Err(FeeError::Validation(format!(
            "transaction history amounts must be positive, got {bad}"
        )));
    }

    let mut sorted = amounts.to_vec();
    sorted.sort();
    let n = sorted.len();
    let total = sorted
        .iter()
        .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(*a))
        .ok_or_else(|| calc_error("total transaction amount"))?;
    let average = total
        .checked_div(Decimal::from(n))
        .ok_or_else(|| calc_error("average transaction amount"))?;

    Ok(TransactionAnalysis {
        total_transactions: n as u64,
        total_amount: total,
        average_amount: round2(average),
        median_amount: sorted[n / 2],
        min_amount: sorted[0],
        max_amount: sorted[n - 1],
        percentiles: AmountPercentiles {
            p25: sorted[n / 4],
            p75: sorted[n * 3 / 4],
            p90: sorted[n * 9 / 10],
        },
    })
}

/// Suggestions for the analysed history: a flat percentage when a target
/// rate or revenue is given, always a tiered structure, and a fixed fee
/// when the average amount is small.
pub fn recommend(
    request: &RecommendationRequest,
    analysis: &TransactionAnalysis,
    currency: Currency,
) -> Result<Vec<FeeRecommendation>> {
    let mut recommendations = Vec::with_capacity(3);

    if let Some(rate) = target_rate(request, analysis)? {
        recommendations.push(percentage_recommendation(analysis, rate)?);
    }
    recommendations.push(tiered_recommendation(&request.transaction_history, analysis)?);
    if analysis.average_amount < FIXED_FEE_CEILING {
        recommendations.push(fixed_recommendation(analysis, currency)?);
    }
    Ok(recommendations)
}

/// The explicit target rate, or the rate that would collect
/// `target_revenue` over the history.
fn target_rate(
    request: &RecommendationRequest,
    analysis: &TransactionAnalysis,
) -> Result<Option<Decimal>> {
    let rate = match (request.target_fee_percentage, request.target_revenue) {
        (Some(rate), _) => rate,
        (None, Some(revenue)) => revenue
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.checked_div(analysis.total_amount))
            .map(round2)
            .ok_or_else(|| calc_error("rate for the target revenue"))?,
        (None, None) => return Ok(None),
    };
    check_percentage("targetFeePercentage", rate)?;
    Ok(Some(rate))
}

fn percentage_recommendation(analysis: &TransactionAnalysis, rate: Decimal) -> Result<FeeRecommendation> {
    Ok(FeeRecommendation::Percentage {
        percentage_rate: rate,
        projected_revenue: round2(percent_of(analysis.total_amount, rate)?),
        average_fee_per_transaction: round2(percent_of(analysis.average_amount, rate)?),
        description: format!("{rate}% fee on all transactions"),
    })
}

/// Three percentage bands split at the 25th and 75th percentiles. Bands
/// that would come out empty are folded into their neighbour, so the
/// result is always a gap-free partition starting at zero.
pub fn suggested_tiers(percentiles: &AmountPercentiles) -> Vec<FeeTier> {
    let band = |min_amount, max_amount, rate| FeeTier {
        min_amount,
        max_amount,
        rate,
        tier_type: TierType::Percentage,
    };
    let [low, middle, high] = TIER_RATES;
    let (p25, p75) = (percentiles.p25, percentiles.p75);

    let mut tiers = vec![band(Decimal::ZERO, Some(p25), low)];
    let mut upper = p25;
    if p75 >= p25 + CENT {
        tiers.push(band(p25 + CENT, Some(p75), middle));
        upper = p75;
    }
    tiers.push(band(upper + CENT, None, high));
    tiers
}

fn tiered_recommendation(amounts: &[Decimal], analysis: &TransactionAnalysis) -> Result<FeeRecommendation> {
    let tiers = suggested_tiers(&analysis.percentiles);
    let mut revenue = Decimal::ZERO;
    for amount in amounts {
        // amounts between a band max and the next band's first cent pay nothing
        let Some(tier) = tiers.iter().find(|t| t.contains(*amount)) else {
            continue;
        };
        let fee = round2(percent_of(*amount, tier.rate)?);
        revenue = revenue
            .checked_add(fee)
            .ok_or_else(|| calc_error("projected tiered revenue"))?;
    }
    Ok(FeeRecommendation::Tiered {
        tiered_rates: tiers,
        projected_revenue: revenue,
        description: "Tiered percentage fee based on transaction amount".into(),
    })
}

fn fixed_recommendation(analysis: &TransactionAnalysis, currency: Currency) -> Result<FeeRecommendation> {
    let share = analysis
        .average_amount
        .checked_mul(FIXED_FEE_SHARE)
        .map(round2)
        .ok_or_else(|| calc_error("suggested fixed fee"))?;
    let fixed_amount = share.max(FIXED_FEE_FLOOR);
    let projected_revenue = fixed_amount
        .checked_mul(Decimal::from(analysis.total_transactions))
        .ok_or_else(|| calc_error("projected fixed revenue"))?;
    Ok(FeeRecommendation::Fixed {
        fixed_amount,
        currency,
        projected_revenue,
        description: format!("Fixed fee of {fixed_amount} {currency} per transaction"),
    })
}
