use crator::handlers::*;
use crator::generate_summary_report;
use crator_core::{StatsSnapshot, Verdict};
use crator_scanner::FetchOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    let result = parse_url_line("example.onion");
    assert_eq!(result, Some("http://example.onion".to_string()));
}

#[test]
fn test_parse_url_line_invalid() {
    let result = parse_url_line("not a valid url!!!");
    assert_eq!(result, None);
}

#[test]
fn test_load_urls_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://example.com")?;
    writeln!(temp_file, "market.onion")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "http://forum.onion/index")?;

    let path = PathBuf::from(temp_file.path());
    let urls = load_urls_from_file(&path)?;

    assert_eq!(urls.len(), 3);
    assert_eq!(urls[0], "https://example.com");
    assert_eq!(urls[1], "http://market.onion");
    assert_eq!(urls[2], "http://forum.onion/index");

    Ok(())
}

#[test]
fn test_load_urls_from_file_empty() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();

    let path = PathBuf::from(temp_file.path());
    let result = load_urls_from_file(&path);

    assert!(result.is_err());
    assert!(result.unwrap_err().contains("No valid URLs"));
}

#[test]
fn test_load_urls_from_source_single_url() {
    let url = Url::parse("http://example.onion").unwrap();
    let result = load_urls_from_source(Some(&url), None).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0], "http://example.onion/");
}

#[test]
fn test_load_urls_from_source_no_input() {
    let result = load_urls_from_source(None, None);
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .contains("Either --url or --hosts-file must be provided")
    );
}

#[test]
fn test_generate_summary_report() {
    let summary = CrawlSummary {
        pages: vec![
            PageOutcome {
                url: "http://a.onion/".to_string(),
                verdict: Some(Verdict::Valid),
                identifier: Some(0),
                error: None,
            },
            PageOutcome {
                url: "http://a.onion/shop".to_string(),
                verdict: Some(Verdict::Captcha),
                identifier: None,
                error: None,
            },
            PageOutcome {
                url: "http://down.onion/".to_string(),
                verdict: None,
                identifier: None,
                error: Some("timed out".to_string()),
            },
        ],
        fetch_errors: 1,
        contract_violations: 0,
        saver: StatsSnapshot {
            enqueued: 1,
            submitted: 1,
            saved: 1,
            failed: 0,
        },
    };

    let report = generate_summary_report(&summary);

    assert!(report.contains("Pages fetched: 2"));
    assert!(report.contains("Fetch errors: 1"));
    assert!(report.contains("Pages saved: 1"));
    assert!(report.contains("http://a.onion/shop"));
    assert!(report.contains("0.html"));
    assert!(report.contains("timed out"));
    assert!(!report.contains("Uncomparable"));
}

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_bytes(body.as_bytes()),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_execute_crawl_saves_only_legitimate_pages() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_html(&mock_server, "/", "<html><body>Welcome to the market</body></html>").await;
    mount_html(&mock_server, "/mirror", "<html><body>Welcome to the market</body></html>").await;
    mount_html(
        &mock_server,
        "/shop",
        r#"<html><body><img src="/img/captcha.jpg"></body></html>"#,
    )
    .await;
    mount_html(&mock_server, "/login", "<html><body><form></form></body></html>").await;
    mount_html(&mock_server, "/forum", "<html><body>Forum index</body></html>").await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/forum"))
        .mount(&mock_server)
        .await;

    let save_dir = TempDir::new().unwrap();
    let urls = vec![
        format!("{}/", base),
        format!("{}/mirror", base),
        format!("{}/shop", base),
        format!("{}/gone", base),
        format!("{}/account", base),
        format!("{}/forum", base),
    ];

    let options = CrawlOptions {
        urls,
        save_dir: save_dir.path().to_path_buf(),
        workers: 2,
        login_url: Some(format!("{}/login", base)),
        fetch: FetchOptions {
            timeout_secs: 5,
            ..FetchOptions::default()
        },
        poll_interval: Duration::from_millis(10),
        submit_interval: Duration::ZERO,
        show_progress_bars: false,
    };

    let summary = execute_crawl(options).await.unwrap();

    let verdicts: Vec<Option<Verdict>> = summary.pages.iter().map(|p| p.verdict).collect();
    assert_eq!(
        verdicts,
        vec![
            Some(Verdict::Valid),
            Some(Verdict::Duplicate),
            Some(Verdict::Captcha),
            Some(Verdict::Unreachable(404)),
            Some(Verdict::AnomalousRedirect),
            Some(Verdict::Valid),
        ]
    );
    assert_eq!(summary.fetch_errors, 0);
    assert_eq!(summary.saver.saved, 2);

    assert_eq!(
        std::fs::read_to_string(save_dir.path().join("0.html")).unwrap(),
        "<html><body>Welcome to the market</body></html>"
    );
    assert_eq!(
        std::fs::read_to_string(save_dir.path().join("5.html")).unwrap(),
        "<html><body>Forum index</body></html>"
    );
    assert!(!save_dir.path().join("1.html").exists());
    assert!(!save_dir.path().join("2.html").exists());
}

#[tokio::test]
async fn test_execute_crawl_records_fetch_errors() {
    let save_dir = TempDir::new().unwrap();
    let options = CrawlOptions {
        // Nothing listens on port 9 of localhost
        urls: vec!["http://127.0.0.1:9/".to_string()],
        save_dir: save_dir.path().to_path_buf(),
        workers: 1,
        login_url: None,
        fetch: FetchOptions {
            timeout_secs: 2,
            ..FetchOptions::default()
        },
        poll_interval: Duration::from_millis(10),
        submit_interval: Duration::ZERO,
        show_progress_bars: false,
    };

    let summary = execute_crawl(options).await.unwrap();

    assert_eq!(summary.fetch_errors, 1);
    assert!(summary.pages[0].error.is_some());
    assert_eq!(summary.saver.saved, 0);
}
