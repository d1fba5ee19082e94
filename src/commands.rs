//! Command execution against a JSON-file backed store.
//!
//! Each invocation loads the store file into a [`MemoryConfigStore`], runs one
//! command through [`FeeService`], drains queued usage events and, for
//! commands that write, saves the snapshot back atomically.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use feeconf::types::default_amounts;
use feeconf::{
    AnalyticsQuery, BulkTransaction, ConfigOverrides, EngineConfig, FeeConfiguration, FeeRequest,
    FeeService, FeeType, ListQuery, MemoryConfigStore, NewFeeConfig, RecommendationRequest,
    SimulationRequest, SortField, SortOrder,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::cli::{Command, OrderArg, SortArg, TermsArgs};
use crate::error::CliError;
use crate::output;

pub const ENV_STORE_PATH: &str = "FEECONF_STORE_PATH";
pub const DEFAULT_STORE_PATH: &str = "fee_configs.json";

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub store_path: PathBuf,
    pub json: bool,
}

impl RunOptions {
    /// `--store`, then `$FEECONF_STORE_PATH`, then `./fee_configs.json`.
    pub fn resolve(store: Option<PathBuf>, json: bool) -> Self {
        let store_path = store
            .or_else(|| std::env::var_os(ENV_STORE_PATH).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));
        Self { store_path, json }
    }
}

// ---------------------------------------------------------------------------
// Store file
// ---------------------------------------------------------------------------

/// Load the records saved at `path`. A missing file is an empty store.
pub async fn load_store(path: &Path) -> Result<MemoryConfigStore, CliError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let records: Vec<FeeConfiguration> = serde_json::from_slice(&bytes)?;
            debug!(path = %path.display(), records = records.len(), "store loaded");
            Ok(MemoryConfigStore::from_records(records))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "store file missing; starting empty");
            Ok(MemoryConfigStore::new())
        }
        Err(e) => Err(CliError::io(path, e)),
    }
}

/// Write every record to `path` through a temporary file and a rename.
pub async fn save_store(path: &Path, store: &MemoryConfigStore) -> Result<(), CliError> {
    let records = store.snapshot().await;
    let encoded = serde_json::to_vec_pretty(&records)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &encoded)
        .await
        .map_err(|e| CliError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| CliError::io(path, e))?;
    debug!(path = %path.display(), records = records.len(), "store saved");
    Ok(())
}

/// Parse a JSON document from `path`, or from stdin when `path` is `-`.
async fn read_input<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .map_err(|e| CliError::io(path, e))?;
        raw
    } else {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CliError::io(path, e))?
    };
    Ok(serde_json::from_str(&raw)?)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Whether `command` can change the store, including usage statistics.
fn writes_store(command: &Command) -> bool {
    !matches!(
        command,
        Command::Active(_)
            | Command::History(_)
            | Command::List(_)
            | Command::Simulate(_)
            | Command::Analytics(_)
            | Command::Recommend(_)
    )
}

/// Run one command and write its result to `out`.
pub async fn run<W: Write>(
    command: Command,
    options: &RunOptions,
    engine: EngineConfig,
    out: &mut W,
) -> Result<(), CliError> {
    let store = Arc::new(load_store(&options.store_path).await?);
    let service = FeeService::new(store.clone(), engine);
    let persist = writes_store(&command);

    let outcome = execute(&service, command, options.json, out).await;
    service.shutdown().await;
    outcome?;

    if persist {
        save_store(&options.store_path, &store).await?;
    }
    Ok(())
}

async fn execute<W: Write>(
    service: &FeeService,
    command: Command,
    json: bool,
    out: &mut W,
) -> Result<(), CliError> {
    match command {
        Command::Calculate(args) => {
            let request = FeeRequest {
                amount: args.amount,
                tenant_id: args.context.tenant,
                channel_bundle_id: args.context.bundle,
                transaction_date: args.context.at,
                bypass_cache: args.no_cache,
            };
            let calculation = service.calculate_transaction_fee(&request).await?;
            output::write_calculation(&calculation, json, out)
        }

        Command::Active(args) => {
            let config = service
                .get_active_fee_config(args.tenant.as_deref(), args.bundle.as_deref(), args.at)
                .await?;
            output::write_optional_config(config.as_ref(), json, out)
        }

        Command::Create(args) => {
            let terms = match &args.file {
                Some(path) => read_input::<NewFeeConfig>(path).await?,
                None => terms_from_flags(&args.terms)?,
            };
            let created = service.create_new_config(terms, &args.by).await?;
            output::write_configs(std::slice::from_ref(&created), json, out)
        }

        Command::Update(args) => {
            let terms = match &args.file {
                Some(path) => read_input::<NewFeeConfig>(path).await?,
                None => {
                    let mut terms = service.get_config(&args.config_id).await?.terms();
                    overlay_flags(&mut terms, &args.terms);
                    terms
                }
            };
            let updated = service.update(&args.config_id, terms).await?;
            output::write_configs(std::slice::from_ref(&updated), json, out)
        }

        Command::Approve(args) => {
            let approved = service
                .approve(&args.config_id, &args.by, args.notes.as_deref())
                .await?;
            output::write_configs(std::slice::from_ref(&approved), json, out)
        }

        Command::NewVersion(args) => {
            let mut overrides = match &args.overrides {
                Some(path) => read_input::<ConfigOverrides>(path).await?,
                None => ConfigOverrides::default(),
            };
            if let Some(rate) = args.percentage {
                overrides.fee_type = Some(FeeType::Percentage);
                overrides.percentage_rate = Some(rate);
            }
            if let Some(amount) = args.fixed {
                overrides.fee_type = Some(FeeType::Fixed);
                overrides.fixed_amount = Some(amount);
            }
            let created = service
                .create_new_version(&args.config_id, args.from, &args.reason, Some(overrides), &args.by)
                .await?;
            output::write_configs(std::slice::from_ref(&created), json, out)
        }

        Command::Expire(args) => {
            let expired = service.expire(&args.config_id).await?;
            output::write_configs(std::slice::from_ref(&expired), json, out)
        }

        Command::Delete(args) => {
            service.delete(&args.config_id).await?;
            if json {
                output::write_json(out, &serde_json::json!({ "deleted": args.config_id }))
            } else {
                writeln!(out, "deleted\t{}", args.config_id)?;
                Ok(())
            }
        }

        Command::History(args) => {
            let history = service
                .fee_history(args.scope, args.tenant.as_deref(), args.bundle.as_deref())
                .await?;
            if json {
                output::write_json(out, &history)
            } else {
                output::write_configs(&history, false, out)
            }
        }

        Command::List(args) => {
            let query = ListQuery {
                scope: args.scope,
                tenant_id: args.tenant,
                channel_bundle_id: args.bundle,
                status: args.status,
                sort_by: match args.sort_by {
                    SortArg::EffectiveFrom => SortField::EffectiveFrom,
                    SortArg::Version => SortField::Version,
                    SortArg::CreatedAt => SortField::CreatedAt,
                },
                sort_order: match args.order {
                    OrderArg::Asc => SortOrder::Asc,
                    OrderArg::Desc => SortOrder::Desc,
                },
                page: args.page,
                limit: args.limit,
            };
            let page = service.list_configs(&query).await?;
            output::write_page(&page, json, out)
        }

        Command::Simulate(args) => {
            let request = SimulationRequest {
                amounts: if args.amounts.is_empty() {
                    default_amounts()
                } else {
                    args.amounts
                },
                tenant_id: args.tenant,
                channel_bundle_id: args.bundle,
                current_date: args.at,
                future_date: args.future,
            };
            let report = service.simulate_fee_impact(&request).await?;
            output::write_simulation(&report, json, out)
        }

        Command::Bulk(args) => {
            let transactions: Vec<BulkTransaction> = read_input(&args.file).await?;
            info!(count = transactions.len(), "bulk calculation requested");
            let results = service.calculate_bulk_transaction_fees(&transactions).await;
            output::write_bulk(&results, json, out)
        }

        Command::Analytics(args) => {
            let query = AnalyticsQuery {
                scope: args.scope,
                tenant_id: args.tenant,
                created_from: args.from,
                created_to: args.to,
            };
            let analytics = service.fee_analytics(&query).await?;
            output::write_analytics(&analytics, json, out)
        }

        Command::Recommend(args) => {
            let transaction_history = match &args.file {
                Some(path) => read_input(path).await?,
                None => args.amounts,
            };
            let request = RecommendationRequest {
                tenant_id: args.tenant,
                channel_bundle_id: args.bundle,
                transaction_history,
                target_fee_percentage: args.target_rate,
                target_revenue: args.target_revenue,
            };
            let report = service.fee_recommendations(&request).await?;
            output::write_recommendations(&report, json, out)
        }
    }
}

// ---------------------------------------------------------------------------
// Terms from flags
// ---------------------------------------------------------------------------

fn terms_from_flags(args: &TermsArgs) -> Result<NewFeeConfig, CliError> {
    let from = args
        .from
        .ok_or_else(|| CliError::Usage("--from is required unless --file is given".into()))?;
    let mut terms = match (args.percentage, args.fixed) {
        (Some(rate), None) => NewFeeConfig::percentage(from, rate),
        (None, Some(amount)) => NewFeeConfig::fixed(from, amount),
        _ => {
            return Err(CliError::Usage(
                "give exactly one of --percentage or --fixed; tiered fees need --file".into(),
            ))
        }
    };
    overlay_flags(&mut terms, args);
    Ok(terms)
}

/// Copy every flag that was given onto `terms`.
fn overlay_flags(terms: &mut NewFeeConfig, args: &TermsArgs) {
    if let Some(tenant) = &args.tenant {
        terms.scope = feeconf::Scope::Tenant;
        terms.tenant_id = Some(tenant.clone());
    }
    if let Some(bundle) = &args.bundle {
        terms.channel_bundle_id = Some(bundle.clone());
    }
    if let Some(from) = args.from {
        terms.effective_from = from;
    }
    if let Some(to) = args.to {
        terms.effective_to = Some(to);
    }
    if let Some(rate) = args.percentage {
        terms.fee_type = FeeType::Percentage;
        terms.percentage_rate = Some(rate);
        terms.fixed_amount = None;
        terms.tiered_rates.clear();
    }
    if let Some(amount) = args.fixed {
        terms.fee_type = FeeType::Fixed;
        terms.fixed_amount = Some(amount);
        terms.percentage_rate = None;
        terms.tiered_rates.clear();
    }
    if args.min_fee.is_some() {
        terms.min_fee = args.min_fee;
    }
    if args.max_fee.is_some() {
        terms.max_fee = args.max_fee;
    }
    if args.currency.is_some() {
        terms.currency = args.currency;
    }
    if let Some(reason) = &args.reason {
        terms.change_reason = Some(reason.clone());
    }
    if let Some(notes) = &args.notes {
        terms.admin_notes = Some(notes.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use feeconf::ConfigStatus;
    use rust_decimal_macros::dec;

    struct TempStore(PathBuf);

    impl TempStore {
        fn new(name: &str) -> Self {
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos();
            let path = std::env::temp_dir().join(format!(
                "feectl-{name}-{}-{nanos}.json",
                std::process::id()
            ));
            Self(path)
        }
    }

    impl Drop for TempStore {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    async fn invoke(store: &TempStore, argv: &[&str]) -> Result<serde_json::Value, CliError> {
        let mut full = vec!["feectl", "--json"];
        full.extend_from_slice(argv);
        let cli = Cli::parse_from(full);
        let options = RunOptions::resolve(Some(store.0.clone()), cli.json);
        let mut out = Vec::new();
        run(cli.command, &options, EngineConfig::default(), &mut out).await?;
        Ok(serde_json::from_slice(&out).unwrap())
    }

    // ---- store file ----

    #[tokio::test]
    async fn test_missing_store_file_is_empty() {
        let store = TempStore::new("missing");
        let loaded = load_store(&store.0).await.unwrap();
        assert!(loaded.is_empty().await);
    }

    #[tokio::test]
    async fn test_read_only_command_does_not_create_file() {
        let store = TempStore::new("readonly");
        let listed = invoke(&store, &["list"]).await.unwrap();
        assert_eq!(listed["totalDocs"], 0);
        assert!(!store.0.exists());
    }

    // ---- end to end ----

    #[tokio::test]
    async fn test_create_approve_calculate_persists_usage() {
        let store = TempStore::new("e2e");

        let created = invoke(
            &store,
            &["create", "--from", "2024-01-01", "--percentage", "2.5", "--by", "admin-1"],
        )
        .await
        .unwrap();
        assert_eq!(created["status"], "draft");
        let config_id = created["configId"].as_str().unwrap().to_string();

        let approved = invoke(&store, &["approve", &config_id, "--by", "admin-2"])
            .await
            .unwrap();
        assert_eq!(approved["status"], "active");

        let calc = invoke(&store, &["calculate", "1000", "--at", "2024-03-01"])
            .await
            .unwrap();
        let fee: rust_decimal::Decimal = calc["platformFee"].as_str().unwrap().parse().unwrap();
        assert_eq!(fee, dec!(25));
        assert_eq!(calc["configUsed"]["configId"], config_id.as_str());

        let saved = load_store(&store.0).await.unwrap().snapshot().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].status, ConfigStatus::Active);
        assert_eq!(saved[0].usage_stats.transactions_affected, 1);
        assert_eq!(saved[0].usage_stats.total_fees_collected, dec!(25));
    }

    #[tokio::test]
    async fn test_failed_command_leaves_store_untouched() {
        let store = TempStore::new("failed");
        let err = invoke(&store, &["approve", "fee_missing"]).await.unwrap_err();
        assert!(matches!(err, CliError::Fee(feeconf::FeeError::NotFound(_))));
        assert!(!store.0.exists());
    }

    #[tokio::test]
    async fn test_recommend_is_read_only() {
        let store = TempStore::new("recommend");
        let report = invoke(&store, &["recommend", "--amounts", "100,200,300,400"])
            .await
            .unwrap();
        assert_eq!(report["transactionAnalysis"]["totalTransactions"], 4);
        let kinds: Vec<&str> = report["recommendations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["type"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["tiered", "fixed"]);
        assert!(!store.0.exists());
    }

    // ---- flags ----

    #[test]
    fn test_terms_need_exactly_one_value() {
        let cli = Cli::parse_from(["feectl", "create", "--from", "2024-01-01"]);
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        assert!(matches!(terms_from_flags(&args.terms), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_overlay_switches_fee_type() {
        let cli = Cli::parse_from([
            "feectl", "update", "fee_1", "--fixed", "15", "--max-fee", "100",
        ]);
        let Command::Update(args) = cli.command else {
            panic!("expected update");
        };
        let from = chrono::Utc::now();
        let mut terms = NewFeeConfig::percentage(from, dec!(2));
        overlay_flags(&mut terms, &args.terms);
        assert_eq!(terms.fee_type, FeeType::Fixed);
        assert_eq!(terms.fixed_amount, Some(dec!(15)));
        assert_eq!(terms.percentage_rate, None);
        assert_eq!(terms.max_fee, Some(dec!(100)));
    }
}
