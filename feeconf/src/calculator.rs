//! Stateless fee calculation: `(amount, configuration) -> fee + breakdown`.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{FeeError, Result};
use crate::types::{
    AppliedLimits, CalculationDetail, FeeBreakdown, FeeConfiguration, FeeOutcome, FeeType,
    TierType,
};
use crate::utils::{percent_of, round2};

/// Compute the fee for `amount` under `config`.
///
/// No configuration yields a zero fee with no calculation detail. The raw
/// fee is clamped to `min_fee` first and `max_fee` second, then rounded to
/// 2 dp. A configuration with `min_fee > max_fee` therefore always resolves
/// to `max_fee`.
pub fn compute_fee(amount: Decimal, config: Option<&FeeConfiguration>) -> Result<FeeOutcome> {
    let Some(config) = config else {
        return Ok(FeeOutcome {
            fee: Decimal::ZERO,
            breakdown: FeeBreakdown {
                gross_amount: amount,
                platform_fee: Decimal::ZERO,
                net_amount: amount,
                calculation: None,
                applied_limits: None,
            },
        });
    };

    let (raw, detail) = raw_fee(amount, config)?;
    let (clamped, limits) = clamp(raw, config.min_fee, config.max_fee);
    let fee = round2(clamped);

    debug!(
        config_id = %config.config_id,
        %amount,
        %raw,
        %fee,
        "fee computed"
    );

    Ok(FeeOutcome {
        fee,
        breakdown: FeeBreakdown {
            gross_amount: amount,
            platform_fee: fee,
            net_amount: amount - fee,
            calculation: Some(detail),
            applied_limits: (!limits.is_empty()).then_some(limits),
        },
    })
}

fn raw_fee(amount: Decimal, config: &FeeConfiguration) -> Result<(Decimal, CalculationDetail)> {
    match config.fee_type {
        FeeType::Percentage => {
            let rate = config.percentage_rate.ok_or_else(|| missing(config, "percentageRate"))?;
            let fee = percent_of(amount, rate)?;
            Ok((
                fee,
                CalculationDetail::Percentage {
                    rate,
                    base_amount: amount,
                    calculated_fee: fee,
                },
            ))
        }
        FeeType::Fixed => {
            let fixed = config.fixed_amount.ok_or_else(|| missing(config, "fixedAmount"))?;
            Ok((
                fixed,
                CalculationDetail::Fixed {
                    fixed_amount: fixed,
                    currency: config.currency,
                },
            ))
        }
        FeeType::Tiered => {
            let tier = config.tiered_rates.iter().find(|t| t.contains(amount));
            let fee = match tier {
                Some(t) => match t.tier_type {
                    TierType::Percentage => percent_of(amount, t.rate)?,
                    TierType::Fixed => t.rate,
                },
                None => Decimal::ZERO,
            };
            Ok((
                fee,
                CalculationDetail::Tiered {
                    applicable_tier: tier.cloned(),
                    tier_rate: tier.map(|t| t.rate),
                    tier_type: tier.map(|t| t.tier_type),
                    calculated_fee: fee,
                },
            ))
        }
    }
}

fn clamp(
    mut fee: Decimal,
    min_fee: Option<Decimal>,
    max_fee: Option<Decimal>,
) -> (Decimal, AppliedLimits) {
    let mut limits = AppliedLimits::default();
    if let Some(min) = min_fee {
        if fee < min {
            fee = min;
            limits.min_fee_applied = Some(min);
        }
    }
    if let Some(max) = max_fee {
        if fee > max {
            fee = max;
            limits.max_fee_applied = Some(max);
        }
    }
    (fee, limits)
}

fn missing(config: &FeeConfiguration, field: &str) -> FeeError {
    FeeError::Calculation(format!(
        "configuration {} has fee type {} but no {field}",
        config.config_id, config.fee_type
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, FeeTier, NewFeeConfig};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn config(terms: NewFeeConfig) -> FeeConfiguration {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        FeeConfiguration::draft(terms, "fee_test".into(), 1, "admin".into(), at)
    }

    fn jan1() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn tiers() -> Vec<FeeTier> {
        vec![
            FeeTier {
                min_amount: dec!(0),
                max_amount: Some(dec!(1000)),
                rate: dec!(3),
                tier_type: TierType::Percentage,
            },
            FeeTier {
                min_amount: dec!(1000.01),
                max_amount: Some(dec!(10000)),
                rate: dec!(2),
                tier_type: TierType::Percentage,
            },
            FeeTier {
                min_amount: dec!(10000.01),
                max_amount: None,
                rate: dec!(150),
                tier_type: TierType::Fixed,
            },
        ]
    }

    // ---- no configuration ----

    #[test]
    fn test_no_config_is_zero_fee() {
        let out = compute_fee(dec!(1000), None).unwrap();
        assert_eq!(out.fee, dec!(0));
        assert_eq!(out.breakdown.net_amount, dec!(1000));
        assert!(out.breakdown.calculation.is_none());
        assert!(out.breakdown.applied_limits.is_none());
    }

    // ---- percentage ----

    #[test]
    fn test_percentage_fee() {
        let c = config(NewFeeConfig::percentage(jan1(), dec!(2.5)));
        let out = compute_fee(dec!(1000), Some(&c)).unwrap();
        assert_eq!(out.fee, dec!(25.00));
        assert_eq!(out.breakdown.net_amount, dec!(975.00));
        assert_eq!(
            out.breakdown.calculation,
            Some(CalculationDetail::Percentage {
                rate: dec!(2.5),
                base_amount: dec!(1000),
                calculated_fee: dec!(25),
            })
        );
    }

    #[test]
    fn test_percentage_rounds_half_away_from_zero() {
        let c = config(NewFeeConfig::percentage(jan1(), dec!(1.5)));
        // 333 * 1.5% = 4.995
        assert_eq!(compute_fee(dec!(333), Some(&c)).unwrap().fee, dec!(5.00));
        // 0.10 * 2.5% = 0.0025
        let c = config(NewFeeConfig::percentage(jan1(), dec!(2.5)));
        assert_eq!(compute_fee(dec!(0.10), Some(&c)).unwrap().fee, dec!(0.00));
    }

    // ---- fixed ----

    #[test]
    fn test_fixed_fee_ignores_amount() {
        let c = config(NewFeeConfig::fixed(jan1(), dec!(15)));
        for amount in [dec!(1), dec!(100), dec!(1000000)] {
            let out = compute_fee(amount, Some(&c)).unwrap();
            assert_eq!(out.fee, dec!(15));
            assert_eq!(out.breakdown.net_amount, amount - dec!(15));
        }
        let out = compute_fee(dec!(1), Some(&c)).unwrap();
        assert_eq!(
            out.breakdown.calculation,
            Some(CalculationDetail::Fixed {
                fixed_amount: dec!(15),
                currency: Currency::Inr,
            })
        );
    }

    // ---- tiered ----

    #[test]
    fn test_tiered_inside_tiers() {
        let c = config(NewFeeConfig::tiered(jan1(), tiers()));
        assert_eq!(compute_fee(dec!(500), Some(&c)).unwrap().fee, dec!(15.00));
        assert_eq!(compute_fee(dec!(5000), Some(&c)).unwrap().fee, dec!(100.00));
        assert_eq!(compute_fee(dec!(50000), Some(&c)).unwrap().fee, dec!(150));
    }

    #[test]
    fn test_tiered_on_boundaries() {
        let c = config(NewFeeConfig::tiered(jan1(), tiers()));
        // upper bound of tier 1 is inclusive
        assert_eq!(compute_fee(dec!(1000), Some(&c)).unwrap().fee, dec!(30.00));
        // lower bound of tier 2 is inclusive
        assert_eq!(compute_fee(dec!(1000.01), Some(&c)).unwrap().fee, dec!(20.00));
        assert_eq!(compute_fee(dec!(10000), Some(&c)).unwrap().fee, dec!(200.00));
        assert_eq!(compute_fee(dec!(10000.01), Some(&c)).unwrap().fee, dec!(150));
    }

    #[test]
    fn test_tiered_first_match_wins() {
        let mut overlapping = tiers();
        overlapping.insert(
            0,
            FeeTier {
                min_amount: dec!(0),
                max_amount: None,
                rate: dec!(1),
                tier_type: TierType::Fixed,
            },
        );
        let c = config(NewFeeConfig::tiered(jan1(), overlapping));
        assert_eq!(compute_fee(dec!(5000), Some(&c)).unwrap().fee, dec!(1));
    }

    #[test]
    fn test_tiered_no_match_is_zero() {
        let gap = vec![FeeTier {
            min_amount: dec!(100),
            max_amount: Some(dec!(200)),
            rate: dec!(5),
            tier_type: TierType::Percentage,
        }];
        let c = config(NewFeeConfig::tiered(jan1(), gap));
        let out = compute_fee(dec!(50), Some(&c)).unwrap();
        assert_eq!(out.fee, dec!(0));
        match out.breakdown.calculation {
            Some(CalculationDetail::Tiered {
                applicable_tier,
                tier_rate,
                ..
            }) => {
                assert!(applicable_tier.is_none());
                assert!(tier_rate.is_none());
            }
            other => panic!("unexpected detail: {other:?}"),
        }
    }

    // ---- clamping ----

    #[test]
    fn test_min_fee_raises() {
        let c = config(
            NewFeeConfig::percentage(jan1(), dec!(1)).with_limits(Some(dec!(10)), Some(dec!(100))),
        );
        let out = compute_fee(dec!(100), Some(&c)).unwrap();
        assert_eq!(out.fee, dec!(10));
        assert_eq!(
            out.breakdown.applied_limits,
            Some(AppliedLimits {
                min_fee_applied: Some(dec!(10)),
                max_fee_applied: None,
            })
        );
    }

    #[test]
    fn test_max_fee_lowers() {
        let c = config(
            NewFeeConfig::percentage(jan1(), dec!(1)).with_limits(Some(dec!(10)), Some(dec!(100))),
        );
        let out = compute_fee(dec!(50000), Some(&c)).unwrap();
        assert_eq!(out.fee, dec!(100));
        assert_eq!(
            out.breakdown.applied_limits.and_then(|l| l.max_fee_applied),
            Some(dec!(100))
        );
    }

    #[test]
    fn test_within_limits_records_nothing() {
        let c = config(
            NewFeeConfig::percentage(jan1(), dec!(1)).with_limits(Some(dec!(10)), Some(dec!(100))),
        );
        let out = compute_fee(dec!(5000), Some(&c)).unwrap();
        assert_eq!(out.fee, dec!(50));
        assert!(out.breakdown.applied_limits.is_none());
    }

    #[test]
    fn test_min_above_max_resolves_to_max() {
        let c = config(
            NewFeeConfig::percentage(jan1(), dec!(1)).with_limits(Some(dec!(50)), Some(dec!(20))),
        );
        assert_eq!(compute_fee(dec!(100), Some(&c)).unwrap().fee, dec!(20));
        assert_eq!(compute_fee(dec!(100000), Some(&c)).unwrap().fee, dec!(20));
    }

    #[test]
    fn test_fixed_fee_is_clamped() {
        let c = config(NewFeeConfig::fixed(jan1(), dec!(15)).with_limits(None, Some(dec!(12))));
        assert_eq!(compute_fee(dec!(100), Some(&c)).unwrap().fee, dec!(12));
    }

    // ---- malformed records ----

    #[test]
    fn test_missing_rate_is_calculation_error() {
        let mut c = config(NewFeeConfig::percentage(jan1(), dec!(1)));
        c.percentage_rate = None;
        assert!(matches!(
            compute_fee(dec!(100), Some(&c)),
            Err(FeeError::Calculation(_))
        ));
    }

    #[test]
    fn test_overflowing_amount_is_calculation_error() {
        let pct = config(NewFeeConfig::percentage(jan1(), dec!(2.5)));
        assert!(matches!(
            compute_fee(Decimal::MAX, Some(&pct)),
            Err(FeeError::Calculation(_))
        ));
        // the top tier is a fixed fee, so the same amount is fine there
        let tiered = config(NewFeeConfig::tiered(jan1(), tiers()));
        assert_eq!(compute_fee(Decimal::MAX, Some(&tiered)).unwrap().fee, dec!(150));
    }
}
