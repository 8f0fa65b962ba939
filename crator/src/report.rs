use crate::handlers::CrawlSummary;
use colored::Colorize;

/// Human-readable summary of a crawl
pub fn generate_summary_report(summary: &CrawlSummary) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!(
        "  Pages fetched: {}\n",
        summary.pages.len().saturating_sub(summary.fetch_errors)
    ));
    report.push_str(&format!("  Fetch errors: {}\n", summary.fetch_errors));
    report.push_str(&format!("  Pages saved: {}\n", summary.saver.saved));
    report.push_str(&format!("  Save failures: {}\n", summary.saver.failed));
    if summary.contract_violations > 0 {
        report.push_str(&format!(
            "  Uncomparable pages: {}\n",
            summary.contract_violations
        ));
    }

    report.push_str("\n# Verdicts:\n");
    for (verdict, count) in summary.verdict_counts() {
        report.push_str(&format!("  {:<20} {}\n", verdict, count));
    }

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    for page in &summary.pages {
        let status = match (page.verdict, &page.error) {
            (Some(verdict), None) if verdict.is_accepted() => verdict.as_str().green(),
            (Some(verdict), None) => verdict.as_str().yellow(),
            (_, Some(_)) => "error".red(),
            (None, None) => "unknown".dimmed(),
        };

        let mut line = format!("  {} {}", status, page.url);
        if let Some(identifier) = page.identifier {
            line.push_str(&format!(" -> {}.html", identifier));
        }
        if let Some(ref error) = page.error {
            line.push_str(&format!(" ({})", error.as_str().dimmed()));
        }
        report.push_str(&line);
        report.push('\n');
    }

    report
}
