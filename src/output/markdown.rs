//! Markdown report generation
//!
//! This module generates a human-readable markdown report of a load run,
//! including run metadata, traffic totals and the metric table.

use crate::metrics::TrendSummary;
use crate::output::stats::millis;
use crate::output::{OutputResult, RunSummary};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report of a run
///
/// # Arguments
///
/// * `summary` - The run summary
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn generate_markdown_report(summary: &RunSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_report(summary: &RunSummary) -> String {
    let mut md = String::new();
    let metrics = &summary.metrics;

    md.push_str("# Loadstorm Run Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Site**: {}\n", summary.site_url));
    md.push_str(&format!("- **Sitemap**: {}\n", summary.sitemap_url));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        summary.duration_seconds
    ));
    md.push_str(&format!("- **Virtual Users**: {}\n", summary.vus));
    md.push_str(&format!("- **Config Hash**: {}\n", summary.config_hash));
    if summary.interrupted {
        md.push_str("- **Status**: interrupted\n");
    } else {
        md.push_str("- **Status**: completed\n");
    }
    md.push('\n');

    // Traffic totals
    md.push_str("## Traffic\n\n");
    md.push_str(&format!("- **Sitemap Pages**: {}\n", summary.sitemap_pages));
    md.push_str(&format!("- **Iterations**: {}\n", summary.iterations));
    md.push_str(&format!("- **Pages Visited**: {}\n", summary.pages_visited));
    md.push_str(&format!("- **Pages Failed**: {}\n", summary.pages_failed));
    md.push_str(&format!(
        "- **Assets Requested**: {}\n",
        summary.assets_requested
    ));
    md.push_str(&format!(
        "- **Requests**: {} ({:.2}/s)\n",
        metrics.requests,
        summary.request_rate()
    ));
    md.push_str(&format!(
        "- **Data Received**: {} bytes\n\n",
        metrics.bytes_received
    ));

    // Rates and counters
    md.push_str("## Checks\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!(
        "| {} | {:.2}% ({} of {}) |\n",
        metrics.errors.name,
        summary.error_rate(),
        metrics.errors.passes,
        metrics.errors.total
    ));
    md.push_str(&format!("| errorCounter | {} |\n", metrics.error_count));
    md.push_str(&format!(
        "| {} | {:.2}% ({} of {}) |\n\n",
        metrics.response_cached.name,
        summary.cache_hit_rate(),
        metrics.response_cached.passes,
        metrics.response_cached.total
    ));

    // Latency trends
    md.push_str("## Response Times\n\n");
    md.push_str("| Metric | Count | Avg | Min | Med | Max | p(90) | p(95) |\n");
    md.push_str("|--------|-------|-----|-----|-----|-----|-------|-------|\n");
    md.push_str(&trend_row(&metrics.page_response_time));
    md.push_str(&trend_row(&metrics.asset_response_time));
    md.push('\n');

    md.push_str("---\n\n");
    md.push_str(&format!(
        "*Generated by loadstorm {}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    md
}

fn trend_row(trend: &TrendSummary) -> String {
    format!(
        "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
        trend.name,
        trend.count,
        millis(trend.avg),
        millis(trend.min),
        millis(trend.med),
        millis(trend.max),
        millis(trend.p90),
        millis(trend.p95)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::sample_summary;
    use tempfile::tempdir;

    #[test]
    fn test_format_markdown_report() {
        let md = format_markdown_report(&sample_summary());

        assert!(md.starts_with("# Loadstorm Run Report"));
        assert!(md.contains("- **Site**: https://example.com/"));
        assert!(md.contains("- **Config Hash**: abc123"));
        assert!(md.contains("- **Status**: completed"));
        assert!(md.contains("| errors | 25.00% (1 of 4) |"));
        assert!(md.contains("| PageResponseTime | 2 | 100.00ms | 80.00ms |"));
        assert!(md.contains("| AssetResponseTime | 1 |"));
    }

    #[test]
    fn test_generate_markdown_report_writes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.md");

        let summary = sample_summary();

        generate_markdown_report(&summary, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, format_markdown_report(&summary));
    }

    #[test]
    fn test_generate_markdown_report_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("summary.md");

        assert!(generate_markdown_report(&sample_summary(), &path).is_err());
    }
}
