//! Run summary for the console and the log

use crate::crawler::CrawlReport;
use std::collections::BTreeMap;

/// Counters derived from a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatistics {
    pub pages_scraped: usize,
    pub pages_failed: usize,
    pub emails_found: usize,
    /// Failure kind name to count
    pub failures_by_kind: BTreeMap<&'static str, usize>,
    pub elements_clicked: usize,
    pub elements_failed: usize,
    pub frames_skipped: usize,
    pub duration_seconds: i64,
}

impl RunStatistics {
    pub fn from_report(report: &CrawlReport) -> Self {
        let diagnostics = &report.diagnostics;
        let mut failures_by_kind = BTreeMap::new();
        for failed in &diagnostics.failed_pages {
            *failures_by_kind.entry(failed.kind.as_str()).or_insert(0) += 1;
        }

        Self {
            pages_scraped: report.pages.len(),
            pages_failed: diagnostics.failed_pages.len(),
            emails_found: report.emails.len(),
            failures_by_kind,
            elements_clicked: diagnostics.expansion.clicked,
            elements_failed: diagnostics.expansion.failed,
            frames_skipped: diagnostics.discovery.frames_skipped,
            duration_seconds: (report.finished_at - report.started_at).num_seconds(),
        }
    }

    /// Share of frontier pages that were scraped, as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.pages_scraped + self.pages_failed;
        if total == 0 {
            return 0.0;
        }
        (self.pages_scraped as f64 / total as f64) * 100.0
    }
}

/// Formats the console summary: totals, then each scraped page with the
/// number of emails first seen there
pub fn format_summary(report: &CrawlReport) -> String {
    let mut out = String::new();
    out.push_str("Scraping Summary:\n");
    out.push_str(&format!("Total pages scraped: {}\n", report.pages.len()));
    out.push_str(&format!("Total emails found: {}\n", report.emails.len()));
    out.push_str("\nScraped pages:\n");

    for page in &report.pages {
        out.push_str(&format!("- {}\n", page.url));
        let count = report.emails_on(&page.url);
        if count > 0 {
            out.push_str(&format!("  Emails found: {}\n", count));
        }
    }
    out
}

/// Prints the console summary to stdout
pub fn print_summary(report: &CrawlReport) {
    println!();
    print!("{}", format_summary(report));
}

/// Logs the contained failures of a run
pub fn log_diagnostics(report: &CrawlReport) {
    let stats = RunStatistics::from_report(report);

    tracing::info!(
        "Run took {}s: {} pages scraped, {} failed ({:.1}% success), {} emails",
        stats.duration_seconds,
        stats.pages_scraped,
        stats.pages_failed,
        stats.success_rate(),
        stats.emails_found
    );
    tracing::info!(
        "Expansion clicked {} elements, {} failed; {} frames skipped",
        stats.elements_clicked,
        stats.elements_failed,
        stats.frames_skipped
    );

    for (kind, count) in &stats.failures_by_kind {
        tracing::info!("  {}: {}", kind, count);
    }
    for failed in &report.diagnostics.failed_pages {
        tracing::warn!("Failed {} ({}): {}", failed.url, failed.kind.as_str(), failed.reason);
    }
    if report.diagnostics.sessions_lost > 0 {
        tracing::warn!(
            "{} extraction sessions were lost to crashed tasks",
            report.diagnostics.sessions_lost
        );
    }
    if report.diagnostics.teardown_failures > 0 {
        tracing::warn!(
            "{} sessions failed to close cleanly",
            report.diagnostics.teardown_failures
        );
    }
}
