//! Console summary of a finished run

use serde_json::Value;
use std::path::Path;

use crate::core::executor::{CoverageSummary, ExecutionRecord, RunReport};

pub const SAMPLE_COUNT: usize = 3;

pub fn format_summary(summary: &CoverageSummary) -> String {
    [
        "Scraping results:".to_string(),
        format!("  Successful queries: {}", summary.successful),
        format!("  Failed queries: {}", summary.failed),
        format!("  Skipped mutations: {}", summary.skipped),
        format!("  Total coverage: {:.2}%", summary.coverage),
    ]
    .join("\n")
}

/// Up to `limit` successful records, in execution order
pub fn sample_successes(report: &RunReport, limit: usize) -> Vec<&ExecutionRecord> {
    report
        .records
        .iter()
        .filter(|record| record.succeeded)
        .take(limit)
        .collect()
}

/// Top-level keys of the `data` member of a response
pub fn response_keys(record: &ExecutionRecord) -> Vec<&str> {
    match record.data() {
        Some(Value::Object(map)) => map.keys().map(String::as_str).collect(),
        _ => Vec::new(),
    }
}

pub fn print_report(report: &RunReport, output_dir: Option<&Path>) {
    println!();
    println!("{}", format_summary(&report.summary));
    if let Some(dir) = output_dir {
        println!("  Results saved to {}/", dir.display());
    }

    let samples = sample_successes(report, SAMPLE_COUNT);
    if samples.is_empty() {
        return;
    }

    println!();
    println!("Sample successful queries:");
    for (i, record) in samples.into_iter().enumerate() {
        println!();
        println!("--- Query {} ---", i + 1);
        println!("Query: {}", record.operation.text);
        println!("Response keys: {:?}", response_keys(record));
    }
}
