//! End-of-test summary printed to stdout

use crate::metrics::{RateSummary, TrendSummary};
use crate::output::RunSummary;
use std::time::Duration;

/// Prints the run summary in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    print!("{}", format_summary(summary));
}

/// Renders the run summary as plain text
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let metrics = &summary.metrics;

    out.push_str("=== Load Test Summary ===\n\n");

    out.push_str("Run:\n");
    out.push_str(&format!("  Site: {}\n", summary.site_url));
    out.push_str(&format!("  Sitemap: {} ({} pages)\n", summary.sitemap_url, summary.sitemap_pages));
    out.push_str(&format!("  Virtual users: {}\n", summary.vus));
    out.push_str(&format!("  Duration: {:.1}s\n", summary.duration_seconds));
    if summary.interrupted {
        out.push_str("  Interrupted: yes\n");
    }
    out.push('\n');

    out.push_str("Traffic:\n");
    out.push_str(&format!("  Iterations: {}\n", summary.iterations));
    out.push_str(&format!(
        "  Pages visited: {} ({} failed)\n",
        summary.pages_visited, summary.pages_failed
    ));
    out.push_str(&format!("  Assets requested: {}\n", summary.assets_requested));
    out.push_str(&format!(
        "  Requests: {} ({:.2}/s)\n",
        metrics.requests,
        summary.request_rate()
    ));
    out.push_str(&format!("  Data received: {} bytes\n\n", metrics.bytes_received));

    out.push_str("Metrics:\n");
    out.push_str(&rate_line(&metrics.errors));
    out.push_str(&format!("  {:<20} {}\n", "errorCounter", metrics.error_count));
    out.push_str(&rate_line(&metrics.response_cached));
    out.push_str(&trend_line(&metrics.page_response_time));
    out.push_str(&trend_line(&metrics.asset_response_time));

    out
}

fn rate_line(rate: &RateSummary) -> String {
    format!(
        "  {:<20} {:.2}% ({} of {})\n",
        rate.name,
        rate.rate() * 100.0,
        rate.passes,
        rate.total
    )
}

fn trend_line(trend: &TrendSummary) -> String {
    format!(
        "  {:<20} avg={} min={} med={} max={} p(90)={} p(95)={} count={}\n",
        trend.name,
        millis(trend.avg),
        millis(trend.min),
        millis(trend.med),
        millis(trend.max),
        millis(trend.p90),
        millis(trend.p95),
        trend.count
    )
}

/// Formats a duration as milliseconds with two decimals
pub(crate) fn millis(d: Duration) -> String {
    format!("{:.2}ms", d.as_secs_f64() * 1000.0)
}
