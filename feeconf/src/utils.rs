use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{FeeError, Result};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Round to 2 decimal places, half away from zero.
pub fn round2(x: Decimal) -> Decimal {
    x.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount * rate / 100`, unrounded. Fails instead of overflowing.
pub fn percent_of(amount: Decimal, rate: Decimal) -> Result<Decimal> {
    amount
        .checked_mul(rate)
        .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| {
            FeeError::Calculation(format!("{rate}% of {amount} is out of the decimal range"))
        })
}

/// Fresh business identifier: `fee_<unix-millis>_<9 base36 chars>`.
pub fn generate_config_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("fee_{}_{}", now.timestamp_millis(), suffix)
}

/// Fresh storage key: 12 random bytes as 24 lowercase hex chars.
pub fn generate_record_id() -> String {
    let bytes: [u8; 12] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Run a store call under `limit`, mapping an elapsed deadline to
/// [`FeeError::Timeout`].
pub async fn with_timeout<T, E, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Into<FeeError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(FeeError::Timeout {
            operation,
            after: limit,
        }),
    }
}

/// Truncate `at` down to a multiple of `bucket` since the epoch.
pub fn time_bucket(at: DateTime<Utc>, bucket: Duration) -> i64 {
    let width = bucket.as_millis().max(1) as i64;
    at.timestamp_millis().div_euclid(width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use crate::error::StoreError;

    // ---- round2 ----

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(1.004)), dec!(1.00));
        assert_eq!(round2(dec!(2.675)), dec!(2.68));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn test_round2_leaves_short_values() {
        assert_eq!(round2(dec!(25)), dec!(25));
        assert_eq!(round2(dec!(0.1)), dec!(0.1));
    }

    // ---- percent_of ----

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec!(1000), dec!(2.5)).unwrap(), dec!(25));
        assert_eq!(percent_of(dec!(333), dec!(1.5)).unwrap(), dec!(4.995));
        assert_eq!(percent_of(dec!(0), dec!(99)).unwrap(), dec!(0));
    }

    #[test]
    fn test_percent_of_overflow_is_an_error() {
        assert!(matches!(
            percent_of(Decimal::MAX, dec!(2.5)),
            Err(FeeError::Calculation(_))
        ));
    }

    // ---- identifiers ----

    #[test]
    fn test_generate_config_id_shape() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let id = generate_config_id(now);
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "fee");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_generate_config_id_unique() {
        let now = Utc::now();
        assert_ne!(generate_config_id(now), generate_config_id(now));
    }

    #[test]
    fn test_generate_record_id_is_hex() {
        let id = generate_record_id();
        assert_eq!(id.len(), 24);
        assert!(hex::decode(&id).is_ok());
    }

    // ---- time_bucket ----

    #[test]
    fn test_time_bucket_groups_within_minute() {
        let a = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 1).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 59).unwrap();
        let c = Utc.with_ymd_and_hms(2024, 3, 1, 12, 1, 0).unwrap();
        let minute = Duration::from_secs(60);
        assert_eq!(time_bucket(a, minute), time_bucket(b, minute));
        assert_ne!(time_bucket(b, minute), time_bucket(c, minute));
    }

    // ---- with_timeout ----

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let ok: Result<u32> = with_timeout("find_by_id", Duration::from_secs(1), async {
            Ok::<_, StoreError>(7)
        })
        .await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<u32> = with_timeout("find_by_id", Duration::from_secs(1), async {
            Err::<u32, _>(StoreError::Backend("down".into()))
        })
        .await;
        assert!(matches!(err, Err(FeeError::Store(StoreError::Backend(_)))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_elapses() {
        let res: Result<()> = with_timeout("slow_call", Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, StoreError>(())
        })
        .await;
        match res {
            Err(FeeError::Timeout { operation, after }) => {
                assert_eq!(operation, "slow_call");
                assert_eq!(after, Duration::from_millis(50));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
