//! Report Module
//!
//! Summary box printed at the end of a batch run.

use crate::progress::format_duration;
use console::style;
use std::time::Duration;

/// Aggregate figures of one batch run, as shown to the user.
#[derive(Debug, Clone, Default)]
pub struct SummaryReport<'a> {
    pub operation: &'a str,
    pub status: &'a str,
    pub converted: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub total_time: Duration,
    pub average_time: Duration,
    pub failures: Vec<(String, String)>,
}

impl SummaryReport<'_> {
    pub fn attempted(&self) -> usize {
        self.converted + self.failed
    }

    pub fn success_rate(&self) -> f64 {
        if self.attempted() == 0 {
            100.0
        } else {
            self.converted as f64 / self.attempted() as f64 * 100.0
        }
    }
}

pub fn render_summary_report(report: &SummaryReport<'_>) -> String {
    let mut out = String::new();
    let rule = "═".repeat(60);
    out.push_str(&format!("╔{}╗\n", rule));
    out.push_str(&format!("  📊 {} Summary ({})\n", report.operation, report.status));
    out.push_str(&format!("╠{}╣\n", rule));
    out.push_str(&format!("  ✅ Converted:       {:>10}\n", report.converted));
    out.push_str(&format!("  ❌ Failed:          {:>10}\n", report.failed));
    out.push_str(&format!("  ⏭️  Skipped:         {:>10}\n", report.skipped));
    if report.cancelled > 0 {
        out.push_str(&format!("  ⛔ Cancelled:       {:>10}\n", report.cancelled));
    }
    out.push_str(&format!("  📈 Success Rate:    {:>9.1}%\n", report.success_rate()));
    out.push_str(&format!("╠{}╣\n", rule));
    out.push_str(&format!(
        "  ⏱️  Total Time:      {:>10}\n",
        format_duration(report.total_time)
    ));
    out.push_str(&format!(
        "  ⏱️  Avg Time/File:   {:>9.2}s\n",
        report.average_time.as_secs_f64()
    ));
    out.push_str(&format!("╚{}╝\n", rule));

    if !report.failures.is_empty() {
        out.push_str("\n❌ Failed files:\n");
        for (name, reason) in &report.failures {
            out.push_str(&format!("   {} → {}\n", name, reason));
        }
    }
    out
}

pub fn print_summary_report(report: &SummaryReport<'_>) {
    let rendered = render_summary_report(report);
    if report.failed > 0 {
        println!("{}", style(rendered).yellow());
    } else {
        println!("{}", style(rendered).green());
    }
}
