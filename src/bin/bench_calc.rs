//! Synthetic microbenchmark: fee computation for percentage and tiered configurations
//! Runs each configuration 1M times over a spread of amounts

use std::time::Instant;

use chrono::{TimeZone, Utc};
use feeconf::{compute_fee, FeeConfiguration, FeeTier, NewFeeConfig, TierType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const ITERATIONS: u64 = 1_000_000;

fn main() {
    let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let percentage = FeeConfiguration::draft(
        NewFeeConfig::percentage(from, dec!(2.5)).with_limits(Some(dec!(1)), Some(dec!(500))),
        "fee_bench_pct".into(),
        1,
        "bench".into(),
        from,
    );
    let tiered = FeeConfiguration::draft(
        NewFeeConfig::tiered(
            from,
            vec![
                tier(dec!(0), Some(dec!(1000)), dec!(3), TierType::Percentage),
                tier(dec!(1000.01), Some(dec!(10000)), dec!(2), TierType::Percentage),
                tier(dec!(10000.01), None, dec!(150), TierType::Fixed),
            ],
        ),
        "fee_bench_tier".into(),
        1,
        "bench".into(),
        from,
    );

    let amounts: Vec<Decimal> = (1..=64u32).map(|i| Decimal::from(i * 397) + dec!(0.37)).collect();

    for (name, config) in [("percentage", &percentage), ("tiered", &tiered)] {
        // Warm up
        for amount in amounts.iter().cycle().take(10_000) {
            std::hint::black_box(compute_fee(*amount, Some(config)).unwrap());
        }

        let t0 = Instant::now();

        let mut sum = Decimal::ZERO;
        for amount in amounts.iter().cycle().take(ITERATIONS as usize) {
            sum += compute_fee(*amount, Some(config)).unwrap().fee;
        }

        // Prevent DCE
        std::hint::black_box(sum);

        let elapsed = t0.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let per_iter_ns = elapsed.as_nanos() as f64 / ITERATIONS as f64;
        let throughput = ITERATIONS as f64 / elapsed.as_secs_f64();

        println!("Fee calculation benchmark ({name})");
        println!("  Iterations: {}", format_with_commas(ITERATIONS));
        println!("  Total time: {:.1} ms", elapsed_ms);
        println!("  Per iteration: {:.0} ns", per_iter_ns);
        println!("  Throughput: {} ops/sec", format_with_commas(throughput as u64));
        println!("  (sum={} to prevent DCE)", sum);
    }
}

fn tier(min_amount: Decimal, max_amount: Option<Decimal>, rate: Decimal, tier_type: TierType) -> FeeTier {
    FeeTier {
        min_amount,
        max_amount,
        rate,
        tier_type,
    }
}

fn format_with_commas(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
