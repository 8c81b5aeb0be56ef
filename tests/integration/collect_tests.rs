//! Integration tests for the collector
//!
//! These tests use wiremock to stand up mock portals and run the whole
//! collection cycle end-to-end: login, listing, details, grouping,
//! rendering and persistence.

use chrono::{NaiveDate, NaiveDateTime};
use dock_tally::config::load_config_with_hash;
use dock_tally::output::load_statistics;
use dock_tally::storage::{RunStatus, SqliteStorage, Storage};
use dock_tally::{Collector, GroupStatus, SourceOutcome};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_FORM: &str = r#"<html><body><form method="post">
<input type="text" name="identity">
<input type="password" name="credential">
<input type="hidden" name="redirect" value="/shipments/incoming/">
</form></body></html>"#;

fn run_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn row(id: &str, created: &str, started: &str, closed: &str, status: &str) -> String {
    format!(
        r#"<tr>
  <td class="cell-externalId"><a href="/shipments/view/{id}">{id}</a></td>
  <td class="cell-createdAt">{created}</td>
  <td class="cell-unloadStartedAt">{started}</td>
  <td class="cell-closedAt">{closed}</td>
  <td class="cell-status">{status}</td>
</tr>"#
    )
}

fn listing(rows: &[String]) -> String {
    format!(
        r#"<html><body><table id="list-table"><thead><tr><th>Shipment</th></tr></thead><tbody>{}</tbody></table></body></html>"#,
        rows.concat()
    )
}

fn detail(sent: u64, received: u64, excess: u64) -> String {
    format!(
        r#"<html><body><div id="packsInfoContainer"><dl>
<dt>Sent</dt><dd>{sent}</dd>
<dt>Received</dt><dd>{received}</dd>
<dt>Excess</dt><dd>{excess}</dd>
</dl></div></body></html>"#
    )
}

/// Writes a config for the given `(id, base-url, own username)` sources
fn write_config(sources: &[(&str, String, Option<&str>)], db_path: &Path) -> NamedTempFile {
    let mut toml = format!(
        r#"
[collector]
max-concurrent-sources = 15
max-concurrent-details = 5
page-size = 20
page-delay-ms = 0
request-timeout-secs = 1
login-timeout-secs = 5

[user-agent]
name = "DockTallyTest"
version = "1.0"

[credentials]
username = "operator"
password = "secret"

[output]
database-path = "{}"
"#,
        db_path.display()
    );

    for (id, base_url, username) in sources {
        toml.push_str(&format!("\n[[source]]\nid = \"{}\"\nbase-url = \"{}\"\n", id, base_url));
        if let Some(username) = username {
            toml.push_str(&format!("username = \"{}\"\npassword = \"pw\"\n", username));
        }
    }

    let mut file = NamedTempFile::new().expect("Failed to create config file");
    file.write_all(toml.as_bytes())
        .expect("Failed to write config file");
    file
}

async fn mount_login(server: &MockServer, accepted: bool) {
    Mock::given(method("GET"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FORM))
        .mount(server)
        .await;

    let body = if accepted {
        "<html><body><h1>Incoming shipments</h1></body></html>"
    } else {
        LOGIN_FORM
    };
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: &str, body: String, delay: Option<Duration>) {
    let mut response = ResponseTemplate::new(200).set_body_string(body);
    if let Some(delay) = delay {
        response = response.set_delay(delay);
    }
    Mock::given(method("GET"))
        .and(path(format!("/shipments/view/{}", id)))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Portal with two night shipments and three day shipments
///
/// The detail page of N2 answers after the request deadline.
async fn scenario_portal() -> MockServer {
    let server = MockServer::start().await;
    mount_login(&server, true).await;

    let rows = vec![
        row("D3", "2024-05-10 11:00:00", "-", "-", "pending"),
        row("D2", "2024-05-10 09:40:00", "-", "2024-05-10 10:00:00", "closed"),
        row("D1", "2024-05-10 09:00:00", "2024-05-10 09:10:00", "-", "in_progress"),
        row("N2", "2024-05-10 02:50:00", "-", "2024-05-10 03:00:00", "closed"),
        row("N1", "2024-05-10 02:10:00", "2024-05-10 02:15:00", "2024-05-10 02:40:00", "closed"),
        row("Y1", "2024-05-09 23:10:00", "-", "2024-05-09 23:50:00", "closed"),
    ];
    Mock::given(method("GET"))
        .and(path("/shipments/incoming/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&rows)))
        .mount(&server)
        .await;

    mount_detail(&server, "D3", detail(4, 0, 0), None).await;
    mount_detail(&server, "D2", detail(6, 6, 0), None).await;
    mount_detail(&server, "D1", detail(10, 8, 1), None).await;
    mount_detail(&server, "N1", detail(20, 19, 2), None).await;
    mount_detail(
        &server,
        "N2",
        detail(99, 99, 99),
        Some(Duration::from_secs(3)),
    )
    .await;

    server
}

fn outcome<'a>(outcomes: &'a [SourceOutcome], id: &str) -> &'a SourceOutcome {
    outcomes
        .iter()
        .find(|o| o.source_id == id)
        .expect("Missing outcome")
}

#[tokio::test]
async fn test_full_collection_groups_and_persists() {
    let good = scenario_portal().await;
    let rejected = MockServer::start().await;
    mount_login(&rejected, false).await;
    Mock::given(method("GET"))
        .and(path("/shipments/incoming/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&rejected)
        .await;

    let db_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = db_dir.path().join("collect.db");
    let config_file = write_config(
        &[
            ("good", good.uri(), None),
            ("rejected", rejected.uri(), None),
        ],
        &db_path,
    );

    let (config, hash) = load_config_with_hash(config_file.path()).expect("Config should load");
    let collector = Collector::from_config(config, hash.clone()).expect("Collector should start");
    let outcomes = collector.run_at(run_time()).await;

    assert_eq!(outcomes.len(), 2);

    // Failed login stays confined to its source
    let failed = outcome(&outcomes, "rejected");
    assert!(failed.result.is_err());
    assert_eq!(failed.message(), "Error rejected: Login failed");

    let report = outcome(&outcomes, "good")
        .result
        .as_ref()
        .expect("Source should succeed");
    assert_eq!(report.units.len(), 3);

    // Latest group first: [D3], [D1, D2], night [N1, N2]
    let latest = &report.units[0].summary;
    assert_eq!(latest.count, 1);
    assert_eq!(latest.status, GroupStatus::Pending);
    assert_eq!(latest.sent, 4);

    let morning = &report.units[1].summary;
    assert_eq!(morning.count, 2);
    assert_eq!(morning.status, GroupStatus::InProgress);
    assert_eq!(morning.closed_at, None);
    assert_eq!(morning.duration.seconds, 2 * 3600 + 50 * 60);
    assert!(!morning.duration.is_final);
    assert_eq!((morning.sent, morning.received, morning.excess), (16, 14, 1));

    // The timed-out detail page contributes zeros but N2 stays a member
    let night = &report.units[2].summary;
    assert_eq!(night.count, 2);
    assert_eq!(night.status, GroupStatus::Closed);
    assert_eq!(night.duration.seconds, 2700);
    assert!(night.duration.is_final);
    assert_eq!((night.sent, night.received, night.excess), (20, 19, 2));

    assert!(report.text.starts_with("📍 Source: good\n\nGroup: 1\n"));
    assert!(report.text.contains("Arrival window: 09:00 – 09:40\n"));
    assert!(report.text.contains("Arrival window: 02:10 – 02:50\n"));
    assert!(report.text.contains("Unload duration: 0:45:00\n"));
    assert!(report.text.contains("Status: In_progress\n"));

    drop(collector);

    let storage = SqliteStorage::new(&db_path).expect("Database should open");
    let groups = storage
        .groups_for_date(run_time().date())
        .expect("Groups should load");
    assert_eq!(groups.len(), 3);
    assert!(groups.iter().all(|g| g.source_id == "good"));

    assert_eq!(groups[1].report_id, "GROUP_20240510_120000_good_2");
    assert_eq!(groups[1].unload_duration_seconds, 0);
    assert_eq!(groups[1].closed_at, None);

    assert_eq!(groups[2].report_id, "GROUP_20240510_120000_good_3");
    assert_eq!(groups[2].created_at, "2024-05-10 02:10:00");
    assert_eq!(groups[2].closed_at.as_deref(), Some("2024-05-10 03:00:00"));
    assert_eq!(groups[2].unload_duration_seconds, 2700);
    assert_eq!(groups[2].boxes_count, 2);

    let run = storage
        .latest_run()
        .expect("Run query should work")
        .expect("Run should be recorded");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, hash);
    assert_eq!((run.sources_ok, run.sources_failed), (1, 1));
}

#[tokio::test]
async fn test_rerun_with_same_stamp_replaces_groups() {
    let good = scenario_portal().await;
    let db_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = db_dir.path().join("collect.db");
    let config_file = write_config(&[("good", good.uri(), None)], &db_path);

    let (config, hash) = load_config_with_hash(config_file.path()).expect("Config should load");
    let collector = Collector::from_config(config, hash).expect("Collector should start");

    collector.run_at(run_time()).await;
    collector.run_at(run_time()).await;

    let storage = collector.store().lock().expect("Storage lock");
    assert_eq!(storage.count_groups().expect("Count should work"), 3);
}

#[tokio::test]
async fn test_statistics_count_each_group_once_across_runs() {
    let server = MockServer::start().await;
    mount_login(&server, true).await;
    Mock::given(method("GET"))
        .and(path("/shipments/incoming/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[row(
            "S1",
            "2024-05-10 08:00:00",
            "-",
            "-",
            "pending",
        )])))
        .mount(&server)
        .await;
    mount_detail(&server, "S1", detail(5, 0, 0), None).await;

    let db_dir = TempDir::new().expect("Failed to create temp dir");
    let config_file = write_config(&[("site1", server.uri(), None)], &db_dir.path().join("collect.db"));

    let (config, hash) = load_config_with_hash(config_file.path()).expect("Config should load");
    let collector = Collector::from_config(config, hash).expect("Collector should start");

    let day = run_time().date();
    collector
        .run_at(day.and_hms_opt(11, 0, 0).expect("valid time"))
        .await;
    collector
        .run_at(day.and_hms_opt(12, 0, 0).expect("valid time"))
        .await;

    let storage = collector.store().lock().expect("Storage lock");
    let stats = load_statistics(&*storage, day).expect("Statistics should load");

    assert_eq!(stats.total_groups, 2);
    assert_eq!(stats.by_source["site1"].groups, 1);
    assert_eq!(stats.by_source["site1"].sent, 5);
}

#[tokio::test]
async fn test_per_source_credentials_and_empty_day() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FORM))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .and(body_string_contains("identity=alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Welcome</h1>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shipments/incoming/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[row(
            "Y1",
            "2024-05-09 18:00:00",
            "-",
            "-",
            "pending",
        )])))
        .mount(&server)
        .await;

    let db_dir = TempDir::new().expect("Failed to create temp dir");
    let config_file = write_config(
        &[("site7", server.uri(), Some("alice"))],
        &db_dir.path().join("collect.db"),
    );

    let (config, hash) = load_config_with_hash(config_file.path()).expect("Config should load");
    let collector = Collector::from_config(config, hash).expect("Collector should start");
    let outcomes = collector.run_at(run_time()).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0].message(),
        "Error site7: No shipments found for today"
    );

    let storage = collector.store().lock().expect("Storage lock");
    let run = storage
        .latest_run()
        .expect("Run query should work")
        .expect("Run should be recorded");
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(storage.count_groups().expect("Count should work"), 0);
}
