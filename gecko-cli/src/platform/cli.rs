//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示和运行摘要。

use gecko_api::{ErrorReport, GeckoError, RunSummary};
use serde::Serialize;

/// 打印构建或加载错误
pub fn print_error(e: &GeckoError) {
    let report = e.to_report();
    eprintln!("❌ {report}");
    eprintln!("   {}", report.error_kind);
}

/// One tick error, flattened for JSON output
#[derive(Debug, Serialize)]
pub struct TickErrorOutput {
    pub tick: u64,
    pub origin: String,
    #[serde(flatten)]
    pub report: ErrorReport,
}

/// 运行摘要（JSON 格式）
#[derive(Debug, Serialize)]
pub struct SummaryOutput {
    pub ticks: u64,
    pub delivered: usize,
    pub errors: Vec<TickErrorOutput>,
}

impl From<&RunSummary> for SummaryOutput {
    fn from(summary: &RunSummary) -> Self {
        Self {
            ticks: summary.ticks,
            delivered: summary.delivered,
            errors: summary
                .errors
                .iter()
                .map(|e| TickErrorOutput {
                    tick: e.tick,
                    origin: e.origin.clone(),
                    report: e.error.to_report(),
                })
                .collect(),
        }
    }
}

/// 打印运行摘要
pub fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(&SummaryOutput::from(summary)) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("❌ cannot serialize summary: {e}"),
        }
        return;
    }

    for error in &summary.errors {
        eprintln!("❌ tick {} {}: {}", error.tick, error.origin, error.error.to_report().to_short());
    }
    let mark = if summary.is_ok() { "✅" } else { "⚠️" };
    println!(
        "{mark} {} tick(s), {} message(s) delivered, {} error(s)",
        summary.ticks,
        summary.delivered,
        summary.errors.len()
    );
}
