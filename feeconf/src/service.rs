//! The fee engine facade: transaction fee calculation, bulk calculation,
//! impact simulation and the administrative lifecycle calls.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::{join, join_all};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::cache::{CacheStats, ResolutionCache};
use crate::calculator::compute_fee;
use crate::config::EngineConfig;
use crate::error::{FeeError, Result};
use crate::recommend::{analyze_amounts, recommend};
use crate::resolver::ConfigResolver;
use crate::store::DynConfigStore;
use crate::types::{
    AnalyticsQuery, AppliedFeeType, BulkFeeResult, BulkTransaction, ConfigOverrides, ConfigUsed,
    FeeCalculation, FeeComparison, FeeConfiguration, FeeRequest, FeeType, ListQuery, NewFeeConfig,
    PageResult, RecommendationReport, RecommendationRequest, Scope, ScopeAnalytics,
    SimulationPoint, SimulationReport, SimulationRequest,
};
use crate::usage::{UsageEvent, UsageRecorder};
use crate::utils::round2;
use crate::versioning::VersionManager;

/// Entry point used by the HTTP and CLI layers.
///
/// Owns one resolution cache and one usage recorder. Construct it inside a
/// tokio runtime and call [`FeeService::shutdown`] before exit so queued
/// usage events are written.
pub struct FeeService {
    cache: ResolutionCache,
    versions: Arc<VersionManager>,
    usage: UsageRecorder,
    config: EngineConfig,
}

impl FeeService {
    pub fn new(store: DynConfigStore, config: EngineConfig) -> Self {
        let resolver = ConfigResolver::new(store, config.store_timeout);
        let versions = Arc::new(VersionManager::new(resolver.clone(), config.clone()));
        let usage = UsageRecorder::spawn(versions.clone());
        let cache = ResolutionCache::new(resolver, config.cache_ttl, config.cache_bucket);
        Self {
            cache,
            versions,
            usage,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn versions(&self) -> &VersionManager {
        &self.versions
    }

    // -----------------------------------------------------------------------
    // Calculation
    // -----------------------------------------------------------------------

    /// Fee for one transaction. No governing configuration is a valid
    /// zero-fee result, not an error.
    pub async fn calculate_transaction_fee(&self, request: &FeeRequest) -> Result<FeeCalculation> {
        let (calculation, used) = self.calculate(request).await?;
        if let Some(config_id) = used {
            self.usage.record(UsageEvent {
                config_id,
                amount: calculation.transaction_amount,
                fee: calculation.platform_fee,
            });
        }
        Ok(calculation)
    }

    /// Calculation without usage recording.
    async fn calculate(&self, request: &FeeRequest) -> Result<(FeeCalculation, Option<String>)> {
        if request.amount <= Decimal::ZERO {
            return Err(FeeError::Calculation(format!(
                "transaction amount must be positive, got {}",
                request.amount
            )));
        }
        let at = request.transaction_date.unwrap_or_else(Utc::now);
        let tenant_id = request.tenant_id.as_deref();
        let bundle_id = request.channel_bundle_id.as_deref();

        let config = if request.bypass_cache {
            self.cache.get_uncached(tenant_id, bundle_id, at).await?
        } else {
            self.cache.get(tenant_id, bundle_id, at).await?
        };
        let outcome = compute_fee(request.amount, config.as_ref())?;

        let calculation = FeeCalculation {
            transaction_amount: request.amount,
            platform_fee: outcome.fee,
            net_amount: outcome.breakdown.net_amount,
            fee_rate: match &config {
                None => Some(Decimal::ZERO),
                Some(c) if c.fee_type == FeeType::Percentage => c.percentage_rate,
                Some(_) => None,
            },
            fee_type: config
                .as_ref()
                .map_or(AppliedFeeType::None, |c| c.fee_type.into()),
            currency: config
                .as_ref()
                .map_or(self.config.default_currency, |c| c.currency),
            config_used: config.as_ref().map(ConfigUsed::from),
            calculated_at: Utc::now(),
            breakdown: outcome.breakdown,
        };
        debug!(
            amount = %calculation.transaction_amount,
            fee = %calculation.platform_fee,
            fee_type = %calculation.fee_type,
            "transaction fee calculated"
        );
        Ok((calculation, config.map(|c| c.config_id)))
    }

    /// The configuration governing the context at `transaction_date`
    /// (default now).
    pub async fn get_active_fee_config(
        &self,
        tenant_id: Option<&str>,
        channel_bundle_id: Option<&str>,
        transaction_date: Option<DateTime<Utc>>,
    ) -> Result<Option<FeeConfiguration>> {
        let at = transaction_date.unwrap_or_else(Utc::now);
        self.cache.get(tenant_id, channel_bundle_id, at).await
    }

    /// Calculate each transaction in order. One failure never aborts the
    /// batch; it is reported on its own entry.
    pub async fn calculate_bulk_transaction_fees(
        &self,
        transactions: &[BulkTransaction],
    ) -> Vec<BulkFeeResult> {
        let mut results = Vec::with_capacity(transactions.len());
        for tx in transactions {
            let outcome = match tx.amount {
                None => Err(FeeError::Calculation("transaction amount is required".into())),
                Some(amount) => {
                    let request = FeeRequest {
                        amount,
                        tenant_id: tx.tenant_id.clone(),
                        channel_bundle_id: tx.channel_bundle_id.clone(),
                        transaction_date: tx.date,
                        bypass_cache: false,
                    };
                    self.calculate_transaction_fee(&request).await
                }
            };
            results.push(match outcome {
                Ok(calculation) => BulkFeeResult {
                    transaction_id: tx.id.clone(),
                    success: true,
                    fee_calculation: Some(calculation),
                    error: None,
                },
                Err(err) => BulkFeeResult {
                    transaction_id: tx.id.clone(),
                    success: false,
                    fee_calculation: None,
                    error: Some(err.to_string()),
                },
            });
        }
        let failed = results.iter().filter(|r| !r.success).count();
        info!(total = results.len(), failed, "bulk fee calculation finished");
        results
    }

    /// Compare fees for a set of amounts now and, optionally, at a future
    /// date. Future lookups bypass the cache; nothing is recorded as usage.
    pub async fn simulate_fee_impact(&self, request: &SimulationRequest) -> Result<SimulationReport> {
        if request.amounts.is_empty() {
            return Err(FeeError::Validation("amounts must not be empty".into()));
        }
        let current_date = request.current_date.unwrap_or_else(Utc::now);

        let current = self.simulate_at(request, current_date, false);
        let future = async {
            match request.future_date {
                Some(date) => Some(self.simulate_at(request, date, true).await),
                None => None,
            }
        };
        let (current, future) = join(current, future).await;

        let comparison = future
            .as_ref()
            .map(|future| current.iter().zip(future).map(|(c, f)| compare(c, f)).collect());

        Ok(SimulationReport {
            current,
            future,
            comparison,
        })
    }

    async fn simulate_at(
        &self,
        request: &SimulationRequest,
        at: DateTime<Utc>,
        bypass_cache: bool,
    ) -> Vec<SimulationPoint> {
        join_all(request.amounts.iter().map(|&amount| async move {
            let fee_request = FeeRequest {
                amount,
                tenant_id: request.tenant_id.clone(),
                channel_bundle_id: request.channel_bundle_id.clone(),
                transaction_date: Some(at),
                bypass_cache,
            };
            match self.calculate(&fee_request).await {
                Ok((calculation, _)) => SimulationPoint {
                    amount,
                    calculation: Some(calculation),
                    error: None,
                },
                Err(err) => SimulationPoint {
                    amount,
                    calculation: None,
                    error: Some(err.to_string()),
                },
            }
        }))
        .await
    }

    /// Analyse a transaction amount history and suggest fee structures for
    /// it, alongside what the context's current configuration collects over
    /// the same history. Read-only; nothing is recorded as usage.
    pub async fn fee_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationReport> {
        let analysis = analyze_amounts(&request.transaction_history)?;
        let current = self
            .cache
            .get(
                request.tenant_id.as_deref(),
                request.channel_bundle_id.as_deref(),
                Utc::now(),
            )
            .await?;

        let mut current_revenue = Decimal::ZERO;
        for &amount in &request.transaction_history {
            let outcome = compute_fee(amount, current.as_ref())?;
            current_revenue = current_revenue.checked_add(outcome.fee).ok_or_else(|| {
                FeeError::Calculation("current revenue is out of the decimal range".into())
            })?;
        }

        let currency = current
            .as_ref()
            .map_or(self.config.default_currency, |c| c.currency);
        let recommendations = recommend(request, &analysis, currency)?;
        info!(
            transactions = analysis.total_transactions,
            suggestions = recommendations.len(),
            "fee recommendations generated"
        );
        Ok(RecommendationReport {
            transaction_analysis: analysis,
            current_config: current.as_ref().map(ConfigUsed::from),
            current_revenue,
            recommendations,
            generated_at: Utc::now(),
        })
    }

    // -----------------------------------------------------------------------
    // Cache hooks
    // -----------------------------------------------------------------------

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    pub async fn get_config(&self, config_id: &str) -> Result<FeeConfiguration> {
        self.versions.get(config_id).await
    }

    pub async fn create_new_config(
        &self,
        terms: NewFeeConfig,
        created_by: &str,
    ) -> Result<FeeConfiguration> {
        self.versions.create(terms, created_by).await
    }

    pub async fn update(&self, config_id: &str, terms: NewFeeConfig) -> Result<FeeConfiguration> {
        self.versions.update(config_id, terms).await
    }

    pub async fn create_new_version(
        &self,
        existing_config_id: &str,
        effective_from: DateTime<Utc>,
        change_reason: &str,
        overrides: Option<ConfigOverrides>,
        created_by: &str,
    ) -> Result<FeeConfiguration> {
        self.versions
            .create_new_version(existing_config_id, effective_from, change_reason, overrides, created_by)
            .await
    }

    /// Approve a draft and drop every cached resolution.
    pub async fn approve(
        &self,
        config_id: &str,
        approved_by: &str,
        approval_notes: Option<&str>,
    ) -> Result<FeeConfiguration> {
        let approved = self.versions.approve(config_id, approved_by, approval_notes).await?;
        self.cache.clear().await;
        Ok(approved)
    }

    /// Expire an active configuration and drop every cached resolution.
    pub async fn expire(&self, config_id: &str) -> Result<FeeConfiguration> {
        let expired = self.versions.expire(config_id).await?;
        self.cache.clear().await;
        Ok(expired)
    }

    pub async fn delete(&self, config_id: &str) -> Result<()> {
        self.versions.delete(config_id).await
    }

    pub async fn fee_history(
        &self,
        scope: Scope,
        tenant_id: Option<&str>,
        channel_bundle_id: Option<&str>,
    ) -> Result<Vec<FeeConfiguration>> {
        self.versions.history(scope, tenant_id, channel_bundle_id).await
    }

    pub async fn list_configs(&self, query: &ListQuery) -> Result<PageResult<FeeConfiguration>> {
        self.versions.list(query).await
    }

    pub async fn fee_analytics(&self, query: &AnalyticsQuery) -> Result<Vec<ScopeAnalytics>> {
        self.versions.analytics(query).await
    }

    /// Write queued usage events and stop the recorder.
    pub async fn shutdown(&self) {
        self.usage.shutdown().await;
    }
}

fn compare(current: &SimulationPoint, future: &SimulationPoint) -> FeeComparison {
    match (&current.calculation, &future.calculation) {
        (Some(c), Some(f)) => {
            let (now, later) = (c.platform_fee, f.platform_fee);
            FeeComparison {
                amount: current.amount,
                current_fee: Some(now),
                future_fee: Some(later),
                difference: Some(later - now),
                percentage_change: percentage_change(now, later),
                error: None,
            }
        }
        _ => FeeComparison {
            amount: current.amount,
            current_fee: None,
            future_fee: None,
            difference: None,
            percentage_change: None,
            error: Some(
                current
                    .error
                    .clone()
                    .or_else(|| future.error.clone())
                    .unwrap_or_else(|| "calculation failed".into()),
            ),
        },
    }
}

/// `None` only when the ratio leaves the decimal range.
fn percentage_change(current: Decimal, future: Decimal) -> Option<Decimal> {
    if current.is_zero() {
        return Some(if future.is_zero() {
            Decimal::ZERO
        } else {
            Decimal::ONE_HUNDRED
        });
    }
    (future - current)
        .checked_div(current)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(round2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use crate::store::MemoryConfigStore;
    use crate::types::{CalculationDetail, Currency, FeeRecommendation};

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    async fn service_with(configs: Vec<NewFeeConfig>) -> FeeService {
        let service = FeeService::new(Arc::new(MemoryConfigStore::new()), EngineConfig::default());
        for terms in configs {
            let draft = service.create_new_config(terms, "admin").await.unwrap();
            service.approve(&draft.config_id, "boss", None).await.unwrap();
        }
        service
    }

    // ---- calculate_transaction_fee ----

    #[tokio::test]
    async fn test_no_config_returns_zero_fee() {
        let service = service_with(vec![]).await;
        let calc = service
            .calculate_transaction_fee(&FeeRequest::new(dec!(1000)))
            .await
            .unwrap();
        assert_eq!(calc.platform_fee, dec!(0));
        assert_eq!(calc.net_amount, dec!(1000));
        assert_eq!(calc.fee_type, AppliedFeeType::None);
        assert_eq!(calc.fee_rate, Some(dec!(0)));
        assert_eq!(calc.currency, Currency::Inr);
        assert!(calc.config_used.is_none());
    }

    #[tokio::test]
    async fn test_percentage_calculation_fields() {
        let service = service_with(vec![NewFeeConfig::percentage(ts(2024, 1, 1), dec!(2.5))]).await;
        let calc = service
            .calculate_transaction_fee(&FeeRequest::new(dec!(1000)).at(ts(2024, 3, 1)))
            .await
            .unwrap();
        assert_eq!(calc.platform_fee, dec!(25.00));
        assert_eq!(calc.net_amount, dec!(975.00));
        assert_eq!(calc.fee_rate, Some(dec!(2.5)));
        assert_eq!(calc.fee_type, AppliedFeeType::Percentage);
        let used = calc.config_used.unwrap();
        assert_eq!(used.version, 1);
        assert_eq!(used.scope, Scope::Global);
        assert!(matches!(
            calc.breakdown.calculation,
            Some(CalculationDetail::Percentage { .. })
        ));
    }

    #[tokio::test]
    async fn test_fixed_has_no_fee_rate() {
        let service = service_with(vec![NewFeeConfig::fixed(ts(2024, 1, 1), dec!(12))]).await;
        let calc = service
            .calculate_transaction_fee(&FeeRequest::new(dec!(500)).at(ts(2024, 3, 1)))
            .await
            .unwrap();
        assert_eq!(calc.platform_fee, dec!(12));
        assert_eq!(calc.fee_rate, None);
        assert_eq!(calc.fee_type, AppliedFeeType::Fixed);
    }

    #[tokio::test]
    async fn test_non_positive_amount_is_rejected() {
        let service = service_with(vec![]).await;
        for amount in [dec!(0), dec!(-5)] {
            assert!(matches!(
                service.calculate_transaction_fee(&FeeRequest::new(amount)).await,
                Err(FeeError::Calculation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let service = service_with(vec![NewFeeConfig::percentage(ts(2024, 1, 1), dec!(1.75))]).await;
        let req = FeeRequest::new(dec!(777.77)).at(ts(2024, 3, 1));
        let a = service.calculate_transaction_fee(&req).await.unwrap();
        let b = service.calculate_transaction_fee(&req).await.unwrap();
        assert_eq!(a.platform_fee, b.platform_fee);
        assert_eq!(a.breakdown, b.breakdown);
        assert_eq!(a.config_used, b.config_used);
    }

    #[tokio::test]
    async fn test_usage_is_recorded_off_path() {
        let service = service_with(vec![NewFeeConfig::percentage(ts(2024, 1, 1), dec!(2))]).await;
        let calc = service
            .calculate_transaction_fee(&FeeRequest::new(dec!(100)).at(ts(2024, 3, 1)))
            .await
            .unwrap();
        service.shutdown().await;
        let used = calc.config_used.unwrap();
        let record = service.get_config(&used.config_id).await.unwrap();
        assert_eq!(record.usage_stats.transactions_affected, 1);
        assert_eq!(record.usage_stats.total_fees_collected, dec!(2));
    }

    #[tokio::test]
    async fn test_active_config_prefers_tenant() {
        let service = service_with(vec![
            NewFeeConfig::percentage(ts(2024, 1, 1), dec!(2)),
            NewFeeConfig::percentage(ts(2024, 1, 1), dec!(1)).for_tenant("t-1"),
        ])
        .await;
        let tenant = service
            .get_active_fee_config(Some("t-1"), None, Some(ts(2024, 3, 1)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tenant.scope, Scope::Tenant);
        let other = service
            .get_active_fee_config(Some("t-2"), None, Some(ts(2024, 3, 1)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(other.scope, Scope::Global);
        assert!(service
            .get_active_fee_config(None, None, Some(ts(2023, 6, 1)))
            .await
            .unwrap()
            .is_none());
    }

    // ---- approval invalidates cache ----

    #[tokio::test]
    async fn test_approve_clears_cache() {
        let service = service_with(vec![NewFeeConfig::percentage(ts(2024, 1, 1), dec!(2))]).await;
        service
            .get_active_fee_config(None, None, Some(ts(2024, 8, 1)))
            .await
            .unwrap();
        assert_eq!(service.cache_stats().await.total_entries, 1);

        let next = service
            .create_new_config(NewFeeConfig::percentage(ts(2024, 7, 1), dec!(3)), "admin")
            .await
            .unwrap();
        service.approve(&next.config_id, "boss", None).await.unwrap();
        assert_eq!(service.cache_stats().await.total_entries, 0);

        let active = service
            .get_active_fee_config(None, None, Some(ts(2024, 8, 1)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.config_id, next.config_id);
    }

    // ---- bulk ----

    #[tokio::test]
    async fn test_bulk_reports_per_item_failures() {
        let service = service_with(vec![NewFeeConfig::percentage(ts(2024, 1, 1), dec!(2))]).await;
        let tx = |id: &str, amount: Option<Decimal>| BulkTransaction {
            id: id.into(),
            amount,
            tenant_id: None,
            channel_bundle_id: None,
            date: Some(ts(2024, 3, 1)),
        };
        let results = service
            .calculate_bulk_transaction_fees(&[
                tx("a", Some(dec!(100))),
                tx("b", Some(dec!(-1))),
                tx("c", None),
                tx("d", Some(dec!(50))),
            ])
            .await;
        let flags: Vec<bool> = results.iter().map(|r| r.success).collect();
        assert_eq!(flags, vec![true, false, false, true]);
        assert_eq!(results[1].transaction_id, "b");
        assert!(results[1].error.is_some());
        assert_eq!(
            results[3].fee_calculation.as_ref().unwrap().platform_fee,
            dec!(1)
        );
    }

    #[tokio::test]
    async fn test_bulk_survives_overflowing_amount() {
        let service = service_with(vec![NewFeeConfig::percentage(ts(2024, 1, 1), dec!(2.5))]).await;
        let tx = |id: &str, amount: Decimal| BulkTransaction {
            id: id.into(),
            amount: Some(amount),
            tenant_id: None,
            channel_bundle_id: None,
            date: Some(ts(2024, 3, 1)),
        };
        let results = service
            .calculate_bulk_transaction_fees(&[tx("huge", Decimal::MAX), tx("ok", dec!(1000))])
            .await;
        assert!(!results[0].success);
        assert!(results[0].error.as_deref().unwrap().contains("out of the decimal range"));
        assert!(results[1].success);
        assert_eq!(
            results[1].fee_calculation.as_ref().unwrap().platform_fee,
            dec!(25)
        );
    }

    // ---- simulation ----

    #[tokio::test]
    async fn test_simulation_compares_future_rates() {
        let service = service_with(vec![
            NewFeeConfig::percentage(ts(2024, 1, 1), dec!(2)).with_effective_to(ts(2025, 1, 1)),
            NewFeeConfig::percentage(ts(2025, 1, 1), dec!(3)),
        ])
        .await;
        let report = service
            .simulate_fee_impact(&SimulationRequest {
                amounts: vec![dec!(100), dec!(1000)],
                current_date: Some(ts(2024, 6, 1)),
                future_date: Some(ts(2025, 6, 1)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(report.current.len(), 2);
        let comparison = report.comparison.unwrap();
        assert_eq!(comparison[1].current_fee, Some(dec!(20)));
        assert_eq!(comparison[1].future_fee, Some(dec!(30)));
        assert_eq!(comparison[1].difference, Some(dec!(10)));
        assert_eq!(comparison[1].percentage_change, Some(dec!(50)));
        service.shutdown().await;
        // simulations leave usage untouched
        let history = service.fee_history(Scope::Global, None, None).await.unwrap();
        assert!(history.iter().all(|r| r.usage_stats.transactions_affected == 0));
    }

    #[tokio::test]
    async fn test_simulation_without_future_date() {
        let service = service_with(vec![]).await;
        let report = service
            .simulate_fee_impact(&SimulationRequest::default())
            .await
            .unwrap();
        assert_eq!(report.current.len(), 5);
        assert!(report.future.is_none());
        assert!(report.comparison.is_none());
    }

    // ---- recommendations ----

    #[tokio::test]
    async fn test_recommendations_report_current_revenue() {
        let service = service_with(vec![NewFeeConfig::percentage(ts(2024, 1, 1), dec!(2.5))]).await;
        let report = service
            .fee_recommendations(&RecommendationRequest {
                transaction_history: vec![dec!(100), dec!(200), dec!(300), dec!(400)],
                target_fee_percentage: Some(dec!(2)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(report.transaction_analysis.total_amount, dec!(1000));
        assert_eq!(report.current_revenue, dec!(25));
        assert!(report.current_config.is_some());
        let kinds: Vec<&str> = report.recommendations.iter().map(|r| r.kind()).collect();
        assert_eq!(kinds, vec!["percentage", "tiered", "fixed"]);

        service.shutdown().await;
        let history = service.fee_history(Scope::Global, None, None).await.unwrap();
        assert_eq!(history[0].usage_stats.transactions_affected, 0);
    }

    #[tokio::test]
    async fn test_recommendations_need_history() {
        let service = service_with(vec![]).await;
        let err = service
            .fee_recommendations(&RecommendationRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FeeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_recommendations_without_config_use_default_currency() {
        let service = service_with(vec![]).await;
        let report = service
            .fee_recommendations(&RecommendationRequest {
                transaction_history: vec![dec!(50)],
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(report.current_config.is_none());
        assert_eq!(report.current_revenue, dec!(0));
        match report.recommendations.last() {
            Some(FeeRecommendation::Fixed { currency, .. }) => assert_eq!(*currency, Currency::Inr),
            other => panic!("expected fixed, got {other:?}"),
        }
    }

    #[test]
    fn test_percentage_change_rules() {
        assert_eq!(percentage_change(dec!(0), dec!(0)), Some(dec!(0)));
        assert_eq!(percentage_change(dec!(0), dec!(5)), Some(dec!(100)));
        assert_eq!(percentage_change(dec!(20), dec!(30)), Some(dec!(50)));
        assert_eq!(percentage_change(dec!(3), dec!(2)), Some(dec!(-33.33)));
        assert_eq!(percentage_change(dec!(0.01), Decimal::MAX), None);
    }
}
