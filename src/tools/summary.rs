//! Text digest for the conversational side of the dashboard.

use netwatch_types::{Filter, HealthOverview, TopTalker};

/// Applications listed in the digest.
const DIGEST_APPLICATIONS: usize = 5;
/// Talkers listed in the digest.
const DIGEST_TALKERS: usize = 3;

/// Compact count: `950`, `1.5K`, `2.3M`.
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Decimal byte size: `512 B`, `1.5 KB`, `3.2 MB`, `1.1 GB`.
pub fn format_bytes(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.1} GB", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.1} MB", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1} KB", n as f64 / 1_000.0)
    } else {
        format!("{} B", n)
    }
}

/// Plain-text summary of a dashboard load.
pub fn digest(overview: &HealthOverview, talkers: &[TopTalker], filter: &Filter) -> String {
    let mut scope = filter.describe_window();
    if let Some(ip) = filter.sensor_ip() {
        scope.push_str(&format!(", sensor {}", ip));
    }
    if let Some(name) = filter.sensor_name() {
        scope.push_str(&format!(", sensor \"{}\"", name));
    }

    let mut lines = vec![
        format!("Network Health Dashboard ({})", scope),
        String::new(),
        "Overview:".to_string(),
        format!(
            "- Total Transactions: {}",
            format_number(overview.total_transactions)
        ),
        format!(
            "- Error Rate: {:.2}% ({} errors)",
            overview.error_rate,
            format_number(overview.error_count)
        ),
        format!(
            "- Avg Latency: {:.1}ms (P95: {:.1}ms)",
            overview.avg_latency_ms, overview.p95_latency_ms
        ),
        format!(
            "- Unique Clients: {} | Servers: {}",
            overview.unique_clients, overview.unique_servers
        ),
        format!("- Applications: {}", overview.applications.len()),
        String::new(),
    ];

    if !overview.applications.is_empty() {
        lines.push("Top Applications:".to_string());
        for (i, app) in overview
            .applications
            .iter()
            .take(DIGEST_APPLICATIONS)
            .enumerate()
        {
            lines.push(format!(
                "{}. {} - {} transactions, {:.1}% errors",
                i + 1,
                app.application_name,
                format_number(app.total_transactions),
                app.error_rate()
            ));
        }
        lines.push(String::new());
    }

    if !talkers.is_empty() {
        lines.push("Top Talkers (by traffic):".to_string());
        for (i, talker) in talkers.iter().take(DIGEST_TALKERS).enumerate() {
            lines.push(format!(
                "{}. {} → {}: {}",
                i + 1,
                talker.client_ip,
                talker.server_ip,
                format_bytes(talker.bytes)
            ));
        }
        lines.push(String::new());
    }

    lines.push(
        "The interactive dashboard shows traffic trends and detailed breakdowns.".to_string(),
    );
    lines.join("\n")
}
