// Report generation from database

use crate::data::{Database, SessionInfo};
use crate::error::{CoreError, Result};
use outlink_scanner::{EntryState, Frontier, FrontierStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(CoreError::Config(format!("Unknown report format '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionInfo>,
    pub frontier: FrontierStats,
    pub link_counts: LinkCounts,
    pub hosts: Vec<HostCount>,
    pub failed_urls: Vec<FailedUrl>,
    pub links: Vec<LinkEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkCounts {
    pub total: i64,
    pub homes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostCount {
    pub host: String,
    pub links: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEntry {
    pub url: String,
    pub is_home: bool,
}

/// Collect everything a report shows.
///
/// Links and frontier state are global to the database; the session only
/// supplies run metadata. Without an explicit id the most recent session is
/// used, if any.
pub fn gather_report_data(db: &Database, session_id: Option<&str>) -> Result<ReportData> {
    let session = match session_id {
        Some(id) => db.get_session(id)?,
        None => db.latest_session()?,
    };

    let frontier = db.frontier().stats()?;
    let (total, homes) = db.count_links()?;

    let records = db.get_links()?;

    // Hosts ordered by link count, then name
    let mut by_host: BTreeMap<String, usize> = BTreeMap::new();
    for record in &records {
        let host = url::Url::parse(&record.url)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
            .unwrap_or_else(|| "unknown".to_string());
        *by_host.entry(host).or_default() += 1;
    }
    let mut hosts: Vec<HostCount> = by_host
        .into_iter()
        .map(|(host, links)| HostCount { host, links })
        .collect();
    hosts.sort_by(|a, b| b.links.cmp(&a.links).then_with(|| a.host.cmp(&b.host)));

    let failed_urls = db
        .get_frontier_entries(EntryState::Failed)?
        .into_iter()
        .map(|entry| FailedUrl {
            url: entry.url,
            attempts: entry.attempts,
        })
        .collect();

    let links = records
        .into_iter()
        .map(|record| LinkEntry {
            url: record.url,
            is_home: record.is_home,
        })
        .collect();

    Ok(ReportData {
        session,
        frontier,
        link_counts: LinkCounts { total, homes },
        hosts,
        failed_urls,
        links,
    })
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    // Header
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                          OUTLINK CRAWL REPORT\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // Session info
    match &data.session {
        Some(session) => {
            report.push_str(&format!("Session ID:   {}\n", session.id));
            report.push_str(&format!("Status:       {}\n", status_to_string(&session.status)));
            report.push_str(&format!("Crawl Date:   {}\n", format_timestamp(session.start_time)));

            if let Some(end_time) = session.end_time {
                let duration = end_time - session.start_time;
                report.push_str(&format!("Duration:     {} seconds\n", duration));
            }

            report.push_str(&format!("Seeds:        {}\n", format_targets(&session.seed_urls)));
        }
        None => report.push_str("Session:      none recorded\n"),
    }
    report.push('\n');

    // Frontier
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("FRONTIER\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str(&format!("  Crawled:    {}\n", data.frontier.done));
    report.push_str(&format!("  Pending:    {}\n", data.frontier.pending));
    report.push_str(&format!("  In flight:  {}\n", data.frontier.in_flight));
    report.push_str(&format!("  Failed:     {}\n", data.frontier.failed));
    report.push_str(&format!("  Total:      {}\n\n", data.frontier.total()));

    // Summary
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("EXTERNAL LINKS\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str(&format!("Total Links: {}\n", data.link_counts.total));
    report.push_str(&format!("Home Pages:  {}\n", data.link_counts.homes));
    report.push_str(&format!("Hosts:       {}\n\n", data.hosts.len()));

    if !data.hosts.is_empty() {
        report.push_str("Top hosts:\n");
        for host in data.hosts.iter().take(20) {
            report.push_str(&format!("  {:>6}  {}\n", host.links, host.host));
        }
        report.push('\n');
    }

    if !data.links.is_empty() {
        report.push_str("────────────────────────────────────────────────────────────────────────────────\n\n");
        for link in &data.links {
            let marker = if link.is_home { "[home]" } else { "      " };
            report.push_str(&format!("  {} {}\n", marker, link.url));
        }
        report.push('\n');
    }

    // Failures
    if !data.failed_urls.is_empty() {
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        report.push_str("FAILED URLS\n");
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
        for failed in &data.failed_urls {
            report.push_str(&format!("  ✗ {}  ({} attempts)\n", failed.url, failed.attempts));
        }
        report.push('\n');
    }

    // Footer
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                            End of Report\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("\nGenerated by outlink\n\n");

    report
}

pub fn generate_json_report(data: &ReportData) -> std::result::Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "outlink",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "session": data.session.as_ref().map(|session| serde_json::json!({
                "id": session.id,
                "status": session.status,
                "start_time": format_iso8601_timestamp(session.start_time),
                "end_time": session.end_time.map(format_iso8601_timestamp),
                "duration_seconds": session.end_time.map(|end| end - session.start_time),
                "seeds": parse_targets(&session.seed_urls)
            })),
            "frontier": data.frontier,
            "summary": {
                "total_links": data.link_counts.total,
                "home_pages": data.link_counts.homes,
                "hosts": data.hosts.len(),
                "failed_urls": data.failed_urls.len()
            },
            "hosts": data.hosts,
            "failed_urls": data.failed_urls,
            "links": data.links
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn status_to_string(status: &str) -> &'static str {
    match status {
        "completed" => "Completed",
        "failed" => "Failed",
        "running" => "Running",
        "cancelled" => "Cancelled",
        _ => "Unknown",
    }
}

fn format_timestamp(timestamp: i64) -> String {
    use chrono::{DateTime, Utc};
    let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn format_targets(seed_urls: &str) -> String {
    match serde_json::from_str::<Vec<String>>(seed_urls) {
        Ok(urls) if urls.len() == 1 => urls[0].clone(),
        Ok(urls) => format!("{} URLs", urls.len()),
        Err(_) => "Unknown".to_string(),
    }
}

fn format_iso8601_timestamp(timestamp: i64) -> String {
    use chrono::{DateTime, Utc};
    let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    datetime.to_rfc3339()
}

fn parse_targets(seed_urls_json: &str) -> serde_json::Value {
    serde_json::from_str::<Vec<String>>(seed_urls_json)
        .map(|urls| serde_json::json!(urls))
        .unwrap_or_else(|_| serde_json::json!([]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_targets() {
        assert_eq!(format_targets(r#"["https://a.com/"]"#), "https://a.com/");
        assert_eq!(format_targets(r#"["https://a.com/", "https://b.com/"]"#), "2 URLs");
        assert_eq!(format_targets("not json"), "Unknown");
    }
}
