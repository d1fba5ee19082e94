//! Rendering of command results: TSV rows by default, pretty JSON with `--json`.

use std::io::Write;

use chrono::{DateTime, Utc};
use feeconf::{
    BulkFeeResult, FeeCalculation, FeeConfiguration, FeeRecommendation, FeeType, PageResult,
    RecommendationReport, ScopeAnalytics, SimulationReport,
};
use serde::Serialize;

use crate::error::CliError;

/// Pretty-print any serializable value followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// TSV: amount \t fee \t net \t fee_type \t currency \t config_id \t version
pub fn write_calculation<W: Write>(
    calc: &FeeCalculation,
    json_mode: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    if json_mode {
        return write_json(writer, calc);
    }
    let mut buf = String::with_capacity(96);
    push_calculation(&mut buf, calc);
    buf.push('\n');
    writer.write_all(buf.as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn push_calculation(buf: &mut String, calc: &FeeCalculation) {
    buf.push_str(&calc.transaction_amount.to_string());
    buf.push('\t');
    buf.push_str(&calc.platform_fee.to_string());
    buf.push('\t');
    buf.push_str(&calc.net_amount.to_string());
    buf.push('\t');
    buf.push_str(&calc.fee_type.to_string());
    buf.push('\t');
    buf.push_str(&calc.currency.to_string());
    buf.push('\t');
    match &calc.config_used {
        Some(used) => {
            buf.push_str(&used.config_id);
            buf.push('\t');
            buf.push_str(&used.version.to_string());
        }
        None => buf.push_str("-\t-"),
    }
}

/// One configuration, or `-` when nothing governs the context.
pub fn write_optional_config<W: Write>(
    config: Option<&FeeConfiguration>,
    json_mode: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    match config {
        Some(config) => write_configs(std::slice::from_ref(config), json_mode, writer),
        None if json_mode => write_json(writer, &serde_json::Value::Null),
        None => {
            writer.write_all(b"-\n")?;
            writer.flush()?;
            Ok(())
        }
    }
}

/// TSV: config_id \t version \t status \t scope \t tenant \t bundle \t from \t to \t terms
pub fn write_configs<W: Write>(
    configs: &[FeeConfiguration],
    json_mode: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    if json_mode {
        return match configs {
            [single] => write_json(writer, single),
            _ => write_json(writer, configs),
        };
    }
    let mut buf = String::with_capacity(128);
    for config in configs {
        buf.clear();
        push_config_row(&mut buf, config);
        buf.push('\n');
        writer.write_all(buf.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_page<W: Write>(
    page: &PageResult<FeeConfiguration>,
    json_mode: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    if json_mode {
        return write_json(writer, page);
    }
    write_configs(&page.items, false, writer)?;
    writeln!(
        writer,
        "# page {}/{} ({} total)",
        page.page,
        page.total_pages.max(1),
        page.total_docs
    )?;
    writer.flush()?;
    Ok(())
}

fn push_config_row(buf: &mut String, config: &FeeConfiguration) {
    buf.push_str(&config.config_id);
    buf.push('\t');
    buf.push_str(&config.version.to_string());
    buf.push('\t');
    buf.push_str(&config.status.to_string());
    buf.push('\t');
    buf.push_str(&config.scope.to_string());
    buf.push('\t');
    buf.push_str(config.tenant_id.as_deref().unwrap_or("-"));
    buf.push('\t');
    buf.push_str(config.channel_bundle_id.as_deref().unwrap_or("-"));
    buf.push('\t');
    push_instant(buf, Some(config.effective_from));
    buf.push('\t');
    push_instant(buf, config.effective_to);
    buf.push('\t');
    push_terms(buf, config);
}

fn push_instant(buf: &mut String, at: Option<DateTime<Utc>>) {
    match at {
        Some(at) => buf.push_str(&at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
        None => buf.push('-'),
    }
}

fn push_terms(buf: &mut String, config: &FeeConfiguration) {
    match config.fee_type {
        FeeType::Percentage => {
            buf.push_str(&config.percentage_rate.unwrap_or_default().to_string());
            buf.push('%');
        }
        FeeType::Fixed => {
            buf.push_str(&config.fixed_amount.unwrap_or_default().to_string());
            buf.push(' ');
            buf.push_str(&config.currency.to_string());
        }
        FeeType::Tiered => {
            buf.push_str(&config.tiered_rates.len().to_string());
            buf.push_str(" tiers");
        }
    }
    if config.min_fee.is_some() || config.max_fee.is_some() {
        buf.push_str(" [");
        match config.min_fee {
            Some(min) => buf.push_str(&min.to_string()),
            None => buf.push('-'),
        }
        buf.push_str(", ");
        match config.max_fee {
            Some(max) => buf.push_str(&max.to_string()),
            None => buf.push('-'),
        }
        buf.push(']');
    }
}

/// TSV: transaction_id \t ok \t calculation...  or  transaction_id \t error \t message
pub fn write_bulk<W: Write>(
    results: &[BulkFeeResult],
    json_mode: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    if json_mode {
        return write_json(writer, results);
    }
    let mut buf = String::with_capacity(128);
    for result in results {
        buf.clear();
        buf.push_str(&result.transaction_id);
        buf.push('\t');
        match (&result.fee_calculation, &result.error) {
            (Some(calc), _) => {
                buf.push_str("ok\t");
                push_calculation(&mut buf, calc);
            }
            (None, error) => {
                buf.push_str("error\t");
                buf.push_str(error.as_deref().unwrap_or("unknown error"));
            }
        }
        buf.push('\n');
        writer.write_all(buf.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// TSV: amount \t current_fee \t future_fee \t difference \t percentage_change
pub fn write_simulation<W: Write>(
    report: &SimulationReport,
    json_mode: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    if json_mode {
        return write_json(writer, report);
    }
    let mut buf = String::with_capacity(96);
    if let Some(comparison) = &report.comparison {
        for row in comparison {
            buf.clear();
            buf.push_str(&row.amount.to_string());
            for value in [row.current_fee, row.future_fee, row.difference] {
                buf.push('\t');
                push_optional(&mut buf, value);
            }
            buf.push('\t');
            match (row.percentage_change, &row.error) {
                (Some(pct), _) => {
                    buf.push_str(&pct.to_string());
                    buf.push('%');
                }
                (None, Some(error)) => buf.push_str(error),
                (None, None) => buf.push('-'),
            }
            buf.push('\n');
            writer.write_all(buf.as_bytes())?;
        }
    } else {
        for point in &report.current {
            buf.clear();
            buf.push_str(&point.amount.to_string());
            buf.push('\t');
            match (&point.calculation, &point.error) {
                (Some(calc), _) => buf.push_str(&calc.platform_fee.to_string()),
                (None, error) => buf.push_str(error.as_deref().unwrap_or("-")),
            }
            buf.push('\n');
            writer.write_all(buf.as_bytes())?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn push_optional(buf: &mut String, value: Option<rust_decimal::Decimal>) {
    match value {
        Some(v) => buf.push_str(&v.to_string()),
        None => buf.push('-'),
    }
}

/// TSV: scope \t status \t configs \t transactions \t fees, with a `total` row per scope.
pub fn write_analytics<W: Write>(
    scopes: &[ScopeAnalytics],
    json_mode: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    if json_mode {
        return write_json(writer, scopes);
    }
    for scope in scopes {
        for row in &scope.status_breakdown {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                scope.scope, row.status, row.count, row.total_transactions, row.total_fees_collected
            )?;
        }
        writeln!(
            writer,
            "{}\ttotal\t{}\t{}\t{}",
            scope.scope, scope.total_configs, scope.grand_total_transactions, scope.grand_total_fees
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per suggestion: type, terms, projected revenue. A `#` header
/// line carries the history summary.
pub fn write_recommendations<W: Write>(
    report: &RecommendationReport,
    json_mode: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    if json_mode {
        return write_json(writer, report);
    }
    let a = &report.transaction_analysis;
    writeln!(
        writer,
        "# {} transactions, total {}, average {}, median {}, current revenue {}",
        a.total_transactions, a.total_amount, a.average_amount, a.median_amount, report.current_revenue
    )?;
    let mut buf = String::with_capacity(96);
    for rec in &report.recommendations {
        buf.clear();
        buf.push_str(rec.kind());
        buf.push('\t');
        match rec {
            FeeRecommendation::Percentage { percentage_rate, .. } => {
                buf.push_str(&percentage_rate.to_string());
                buf.push('%');
            }
            FeeRecommendation::Fixed {
                fixed_amount,
                currency,
                ..
            } => {
                buf.push_str(&fixed_amount.to_string());
                buf.push(' ');
                buf.push_str(&currency.to_string());
            }
            FeeRecommendation::Tiered { tiered_rates, .. } => {
                for (i, tier) in tiered_rates.iter().enumerate() {
                    if i > 0 {
                        buf.push(',');
                    }
                    buf.push_str(&tier.min_amount.to_string());
                    buf.push_str("..");
                    push_optional(&mut buf, tier.max_amount);
                    buf.push('@');
                    buf.push_str(&tier.rate.to_string());
                    buf.push('%');
                }
            }
        }
        buf.push('\t');
        buf.push_str(&rec.projected_revenue().to_string());
        buf.push('\n');
        writer.write_all(buf.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}
