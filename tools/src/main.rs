//! report-runner: headless fraud and segmentation report over a transaction CSV.
//!
//! Usage:
//!   report-runner --input transactions.csv --out-dir reports
//!   report-runner --input transactions.csv --db analytics.db --date 2024-01-02
//!   report-runner --generate 5000 --seed 7 --out-dir reports --json
//!   report-runner --input day2.csv --db analytics.db --replace

use anyhow::Result;
use fraud_analytics_core::{
    engine::{new_run_id, ReportEngine},
    ingest::read_transactions_from_path,
    report::{parse_report_date, AnalysisSummary, DailyFraudReport},
    store::TxnStore,
    synth::{SyntheticConfig, SyntheticGenerator},
    AnalyticsConfig, AnalyticsError,
};
use std::{env, path::Path};

#[derive(serde::Serialize)]
struct RunOutput<'a> {
    summary: &'a AnalysisSummary,
    daily_report: Option<&'a DailyFraudReport>,
    customer_segments_path: String,
    fraud_patterns_path: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let input = string_arg(&args, "--input");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let out_dir = string_arg(&args, "--out-dir").unwrap_or("./reports");
    let date = string_arg(&args, "--date");
    let generate = parse_arg(&args, "--generate", 0usize);
    let seed = parse_arg(&args, "--seed", 42u64);
    let json = args.iter().any(|a| a == "--json");
    let replace = args.iter().any(|a| a == "--replace");

    if input.is_none() && generate == 0 {
        anyhow::bail!("usage: report-runner (--input <csv> | --generate <n>) [--db <path>] [--data-dir <dir>] [--out-dir <dir>] [--date YYYY-MM-DD] [--seed <n>] [--replace] [--json]");
    }

    let config = if Path::new(&format!("{data_dir}/analytics/analytics_config.json")).exists() {
        AnalyticsConfig::load(data_dir)?
    } else {
        log::warn!("No config under {data_dir}; using defaults");
        AnalyticsConfig::default()
    };

    let store = TxnStore::open(db)?;
    store.migrate()?;
    let engine = ReportEngine::new(new_run_id(), config, store);

    if !json {
        println!("Fraud Analytics: report-runner");
        println!("  run_id:    {}", engine.run_id);
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!("  out_dir:   {out_dir}");
        println!();
    }

    let txns = match input {
        Some(path) => match read_transactions_from_path(path) {
            Ok(txns) => txns,
            Err(AnalyticsError::Validation(errors)) => {
                eprintln!("{} row(s) failed validation in {path}:", errors.len());
                for err in &errors {
                    eprintln!("  {err}");
                }
                anyhow::bail!("input rejected; nothing was stored");
            }
            Err(e) => return Err(e.into()),
        },
        None => SyntheticGenerator::new(SyntheticConfig {
            seed,
            transactions: generate,
            ..SyntheticConfig::default()
        })
        .generate(),
    };

    let existing = engine.store.transaction_count()?;
    let ingested = if replace {
        engine.replace(&txns)?
    } else {
        if existing > 0 {
            log::warn!(
                "{db} already holds {existing} transactions; this load is added to them \
                 (pass --replace to start from an empty set)"
            );
        }
        engine.ingest(&txns)?
    };
    log::info!("Ingested {ingested} rows");

    let summary = engine.run_summary()?;
    let daily = match date {
        Some(raw) => Some(engine.daily_fraud_report(parse_report_date(raw)?)?),
        None => None,
    };
    let outcome = engine.export_all(Path::new(out_dir))?;

    if json {
        let output = RunOutput {
            summary: &summary,
            daily_report: daily.as_ref(),
            customer_segments_path: outcome.customer_segments_path.display().to_string(),
            fraud_patterns_path: outcome.fraud_patterns_path.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_summary(&summary);
    if let Some(report) = &daily {
        print_daily_report(report);
    }
    println!();
    println!("=== EXPORTS ===");
    println!(
        "  {} ({} rows)",
        outcome.customer_segments_path.display(),
        outcome.customer_segments_rows
    );
    println!(
        "  {} ({} rows)",
        outcome.fraud_patterns_path.display(),
        outcome.fraud_patterns_rows
    );
    Ok(())
}

fn print_summary(summary: &AnalysisSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  transactions:   {}", summary.transaction_count);
    println!("  fraudulent:     {}", summary.fraud_count);
    println!("  customers:      {}", summary.customer_count);
    println!("  high-risk:      {}", summary.high_risk_customer_count);
    println!(
        "  discrepancies:  {} flagged of {} checked",
        summary.discrepancies_flagged, summary.discrepancies_checked
    );

    println!();
    println!("=== TYPE DISTRIBUTION ===");
    for t in &summary.type_distribution {
        println!(
            "  {:<9} | {:>8} txns | {:>6.2}% | avg ${:.2} | total ${:.2}",
            t.txn_type.as_str(),
            t.count,
            t.percentage_of_total,
            t.average_amount,
            t.total_volume
        );
    }

    println!();
    println!("=== SEGMENTS ===");
    for s in &summary.segment_population {
        println!(
            "  {:<9} | {:>6} customers | ${:.2}",
            s.segment.as_str(),
            s.customers,
            s.total_amount
        );
    }

    println!();
    println!("=== FRAUD RATE BY TYPE ===");
    for r in &summary.fraud_rates {
        let avg = r
            .avg_fraud_amount
            .map(|a| format!("${a:.2}"))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "  {:<9} | {:>6} of {:>8} | {:>7.3}% | avg fraud {}",
            r.txn_type.as_str(),
            r.fraud_count,
            r.total_count,
            r.fraud_rate,
            avg
        );
    }

    let flags = &summary.flag_effectiveness;
    println!();
    println!("=== FLAG EFFECTIVENESS ===");
    println!(
        "  flagged {} | fraud {} | true positives {} | precision {} | recall {}",
        flags.flagged_count,
        flags.fraud_count,
        flags.true_positives,
        fmt_ratio(flags.precision),
        fmt_ratio(flags.recall)
    );
}

fn print_daily_report(report: &DailyFraudReport) {
    println!();
    println!(
        "=== DAILY FRAUD REPORT {} ({} transactions) ===",
        report.date, report.transaction_count
    );
    if report.summary.is_empty() {
        println!("  (No fraudulent transactions on this date)");
        return;
    }
    for s in &report.summary {
        println!(
            "  {:<9} | {:>5} fraudulent | avg ${:.2}",
            s.txn_type.as_str(),
            s.fraud_count,
            s.average_amount
        );
    }
    println!("  Top {}:", report.top_transactions.len());
    for t in &report.top_transactions {
        println!(
            "    #{:<8} {:<9} ${:>14.2}  {} -> {}",
            t.txn_id,
            t.txn_type.as_str(),
            t.amount,
            t.origin_id,
            t.dest_id
        );
    }
}

fn fmt_ratio(ratio: Option<f64>) -> String {
    ratio
        .map(|r| format!("{:.2}%", r * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
