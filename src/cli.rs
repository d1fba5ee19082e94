use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use feeconf::{ConfigStatus, Currency, Scope};
use rust_decimal::Decimal;

/// feectl: manage time-versioned fee configurations and calculate fees.
#[derive(Parser, Debug)]
#[command(name = "feectl", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// JSON store file (default: $FEECONF_STORE_PATH, then ./fee_configs.json)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Output as JSON instead of TSV
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Calculate the platform fee for one transaction
    Calculate(CalculateArgs),

    /// Show the configuration governing a context
    Active(ContextArgs),

    /// Create a draft configuration
    Create(CreateArgs),

    /// Replace the terms of a draft
    Update(UpdateArgs),

    /// Approve a draft, superseding the active configuration it replaces
    Approve(ApproveArgs),

    /// Draft a new version of an existing configuration
    NewVersion(NewVersionArgs),

    /// Expire an active configuration now
    Expire(IdArgs),

    /// Delete a draft
    Delete(IdArgs),

    /// Show every configuration of a scope, newest first
    History(HistoryArgs),

    /// List configurations with filters and pagination
    List(ListArgs),

    /// Compare fees for sample amounts now and at a future date
    Simulate(SimulateArgs),

    /// Calculate fees for a JSON array of transactions
    Bulk(BulkArgs),

    /// Usage totals per scope and status
    Analytics(AnalyticsArgs),

    /// Suggest fee structures from a transaction amount history
    Recommend(RecommendArgs),
}

/// Tenant / bundle / instant selecting the governing configuration.
#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Tenant id
    #[arg(long)]
    pub tenant: Option<String>,

    /// Channel bundle id
    #[arg(long)]
    pub bundle: Option<String>,

    /// Transaction instant (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long, value_parser = parse_instant)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct CalculateArgs {
    /// Transaction amount
    #[arg(allow_hyphen_values = true)]
    pub amount: Decimal,

    #[command(flatten)]
    pub context: ContextArgs,

    /// Skip the resolution cache
    #[arg(long)]
    pub no_cache: bool,
}

/// Draft terms given as flags. Tiered structures need `--file`.
#[derive(Args, Debug)]
pub struct TermsArgs {
    /// Tenant id (makes the configuration tenant-scoped)
    #[arg(long)]
    pub tenant: Option<String>,

    /// Channel bundle id
    #[arg(long)]
    pub bundle: Option<String>,

    /// Start of the effective window
    #[arg(long, value_parser = parse_instant)]
    pub from: Option<DateTime<Utc>>,

    /// End of the effective window (exclusive)
    #[arg(long, value_parser = parse_instant)]
    pub to: Option<DateTime<Utc>>,

    /// Percentage rate (0-100)
    #[arg(long, conflicts_with = "fixed")]
    pub percentage: Option<Decimal>,

    /// Fixed fee amount
    #[arg(long)]
    pub fixed: Option<Decimal>,

    #[arg(long)]
    pub min_fee: Option<Decimal>,

    #[arg(long)]
    pub max_fee: Option<Decimal>,

    /// INR, USD or EUR
    #[arg(long)]
    pub currency: Option<Currency>,

    /// Reason for the change
    #[arg(long)]
    pub reason: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// JSON file with the draft terms ("-" for stdin); overrides the flags
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub terms: TermsArgs,

    /// Creating admin
    #[arg(long, default_value = "feectl")]
    pub by: String,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Business id (configId) of the draft
    pub config_id: String,

    /// JSON file with the replacement terms ("-" for stdin); overrides the flags
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub terms: TermsArgs,
}

#[derive(Args, Debug)]
pub struct ApproveArgs {
    pub config_id: String,

    /// Approving admin
    #[arg(long, default_value = "feectl")]
    pub by: String,

    /// Appended to the admin notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args, Debug)]
pub struct NewVersionArgs {
    /// configId of the configuration to build on
    pub config_id: String,

    /// Start of the new version
    #[arg(long, value_parser = parse_instant)]
    pub from: DateTime<Utc>,

    #[arg(long)]
    pub reason: String,

    /// JSON file with field overrides
    #[arg(long)]
    pub overrides: Option<PathBuf>,

    /// New percentage rate
    #[arg(long)]
    pub percentage: Option<Decimal>,

    /// New fixed amount
    #[arg(long)]
    pub fixed: Option<Decimal>,

    #[arg(long, default_value = "feectl")]
    pub by: String,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    pub config_id: String,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// global or tenant
    #[arg(long, default_value = "global")]
    pub scope: Scope,

    #[arg(long)]
    pub tenant: Option<String>,

    #[arg(long)]
    pub bundle: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortArg {
    EffectiveFrom,
    Version,
    CreatedAt,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OrderArg {
    Asc,
    Desc,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub scope: Option<Scope>,

    #[arg(long)]
    pub tenant: Option<String>,

    #[arg(long)]
    pub bundle: Option<String>,

    #[arg(long)]
    pub status: Option<ConfigStatus>,

    #[arg(long, value_enum, default_value = "effective-from")]
    pub sort_by: SortArg,

    #[arg(long, value_enum, default_value = "desc")]
    pub order: OrderArg,

    /// 1-based page number
    #[arg(long, default_value = "1")]
    pub page: usize,

    #[arg(long, default_value = "10")]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Comma-separated amounts (default 100,500,1000,5000,10000)
    #[arg(long, value_delimiter = ',')]
    pub amounts: Vec<Decimal>,

    #[arg(long)]
    pub tenant: Option<String>,

    #[arg(long)]
    pub bundle: Option<String>,

    /// Current instant (default now)
    #[arg(long, value_parser = parse_instant)]
    pub at: Option<DateTime<Utc>>,

    /// Future instant to compare against
    #[arg(long, value_parser = parse_instant)]
    pub future: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct BulkArgs {
    /// JSON array of transactions ("-" for stdin)
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct AnalyticsArgs {
    #[arg(long)]
    pub scope: Option<Scope>,

    #[arg(long)]
    pub tenant: Option<String>,

    /// Only configurations created at or after this instant
    #[arg(long, value_parser = parse_instant)]
    pub from: Option<DateTime<Utc>>,

    /// Only configurations created at or before this instant
    #[arg(long, value_parser = parse_instant)]
    pub to: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// Comma-separated transaction amounts
    #[arg(long, value_delimiter = ',', required_unless_present = "file")]
    pub amounts: Vec<Decimal>,

    /// JSON array of transaction amounts ("-" for stdin)
    #[arg(long, conflicts_with = "amounts")]
    pub file: Option<PathBuf>,

    #[arg(long)]
    pub tenant: Option<String>,

    #[arg(long)]
    pub bundle: Option<String>,

    /// Percentage rate for a flat percentage suggestion
    #[arg(long)]
    pub target_rate: Option<Decimal>,

    /// Revenue over the history to solve a percentage rate for
    #[arg(long, conflicts_with = "target_rate")]
    pub target_revenue: Option<Decimal>,
}

/// RFC 3339 instant, or a bare date taken as midnight UTC.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid instant {raw:?}: expected RFC 3339 or YYYY-MM-DD"))
}
