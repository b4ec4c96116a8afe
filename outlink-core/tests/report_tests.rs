// Tests for report generation functionality

use outlink_core::data::Database;
use outlink_core::report::{
    ReportFormat, gather_report_data, generate_json_report, generate_text_report, save_report,
};
use outlink_scanner::{Frontier, LinkRecord, LinkStore};
use tempfile::TempDir;

fn populated_db() -> (TempDir, Database, String) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("test.db")).unwrap();

    let session_id = db
        .create_session("[\"https://www.myblog.com/\"]", None)
        .unwrap();

    let store = db.link_store();
    for (url, is_home) in [
        ("https://friend.org/", true),
        ("https://friend.org/post/1", false),
        ("https://friend.org/post/2", false),
        ("https://other.net/", true),
    ] {
        store
            .record_if_absent(&LinkRecord {
                url: url.to_string(),
                is_home,
            })
            .unwrap();
    }

    let frontier = db.frontier();
    frontier.enqueue_if_absent("https://www.myblog.com/").unwrap();
    frontier.enqueue_if_absent("https://down.example/").unwrap();
    let done = frontier.dequeue_next().unwrap().unwrap();
    frontier.report_success(&done).unwrap();
    let down = frontier.dequeue_next().unwrap().unwrap();
    frontier.report_failure(&down, 1).unwrap();

    db.complete_session(&session_id).unwrap();
    (temp_dir, db, session_id)
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_parse() {
    assert!(matches!("text".parse::<ReportFormat>(), Ok(ReportFormat::Text)));
    assert!(matches!("txt".parse::<ReportFormat>(), Ok(ReportFormat::Text)));
    assert!(matches!("Json".parse::<ReportFormat>(), Ok(ReportFormat::Json)));
}

#[test]
fn test_report_format_parse_invalid() {
    assert!("csv".parse::<ReportFormat>().is_err());
    assert!("".parse::<ReportFormat>().is_err());
}

// ============================================================================
// Data Gathering Tests
// ============================================================================

#[test]
fn test_gather_report_data() {
    let (_temp_dir, db, session_id) = populated_db();

    let data = gather_report_data(&db, Some(&session_id)).unwrap();

    assert_eq!(data.session.as_ref().map(|s| s.id.as_str()), Some(session_id.as_str()));
    assert_eq!(data.link_counts.total, 4);
    assert_eq!(data.link_counts.homes, 2);
    assert_eq!(data.frontier.done, 1);
    assert_eq!(data.frontier.failed, 1);

    assert_eq!(data.hosts.len(), 2);
    assert_eq!(data.hosts[0].host, "friend.org");
    assert_eq!(data.hosts[0].links, 3);
    assert_eq!(data.hosts[1].host, "other.net");

    assert_eq!(data.failed_urls.len(), 1);
    assert_eq!(data.failed_urls[0].url, "https://down.example/");
    assert_eq!(data.failed_urls[0].attempts, 1);
}

#[test]
fn test_gather_defaults_to_latest_session() {
    let (_temp_dir, db, session_id) = populated_db();
    let data = gather_report_data(&db, None).unwrap();
    assert_eq!(data.session.map(|s| s.id), Some(session_id));
}

#[test]
fn test_gather_empty_database() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("test.db")).unwrap();

    let data = gather_report_data(&db, None).unwrap();
    assert!(data.session.is_none());
    assert_eq!(data.link_counts.total, 0);
    assert!(data.hosts.is_empty());
    assert!(data.links.is_empty());
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_contents() {
    let (_temp_dir, db, session_id) = populated_db();
    let data = gather_report_data(&db, Some(&session_id)).unwrap();

    let report = generate_text_report(&data);

    assert!(report.contains("OUTLINK CRAWL REPORT"));
    assert!(report.contains(&session_id));
    assert!(report.contains("Completed"));
    assert!(report.contains("https://www.myblog.com/"));
    assert!(report.contains("Total Links: 4"));
    assert!(report.contains("Home Pages:  2"));
    assert!(report.contains("[home] https://other.net/"));
    assert!(report.contains("FAILED URLS"));
    assert!(report.contains("https://down.example/"));
    assert!(report.contains("End of Report"));
}

#[test]
fn test_text_report_without_session() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("test.db")).unwrap();
    let data = gather_report_data(&db, None).unwrap();

    let report = generate_text_report(&data);
    assert!(report.contains("none recorded"));
    assert!(!report.contains("FAILED URLS"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_structure() {
    let (_temp_dir, db, session_id) = populated_db();
    let data = gather_report_data(&db, Some(&session_id)).unwrap();

    let json = generate_json_report(&data).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    let report = &parsed["report"];

    assert_eq!(report["metadata"]["generator"], "outlink");
    assert_eq!(report["session"]["id"], session_id.as_str());
    assert_eq!(report["session"]["status"], "completed");
    assert_eq!(report["session"]["seeds"][0], "https://www.myblog.com/");
    assert_eq!(report["summary"]["total_links"], 4);
    assert_eq!(report["summary"]["home_pages"], 2);
    assert_eq!(report["frontier"]["failed"], 1);
    assert_eq!(report["links"].as_array().unwrap().len(), 4);
    assert_eq!(report["hosts"][0]["host"], "friend.org");
}

#[test]
fn test_save_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.txt");

    save_report("hello report", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello report");
}
