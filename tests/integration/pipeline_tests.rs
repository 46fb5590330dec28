//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to stand in for the e-shops and run jobs through
//! the downloader, the strategies and the CSV table end-to-end.

use price_ripple::config::{parse_json, Config, PacingConfig};
use price_ripple::crawler::{Downloader, DownloaderOptions, FetchError, Orchestrator, RetryPolicy};
use price_ripple::extract::StrategyRegistry;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a product page with one JSON-LD Product entity
fn product_page(name: &str, price: &str, availability: &str) -> String {
    format!(
        r#"<html><head><title>{name}</title>
        <script type="application/ld+json">
        {{"@context": "https://schema.org", "@type": "Product", "name": "{name}",
          "image": "https://img.test/{price}.jpg",
          "offers": {{"@type": "Offer", "price": "{price}", "priceCurrency": "CZK",
                      "availability": "https://schema.org/{availability}"}}}}
        </script></head>
        <body><h1>{name}</h1><p>Product description</p></body></html>"#
    )
}

/// Creates a test configuration writing into `dir`
///
/// Pauses and backoff are disabled so the tests run quickly.
fn create_test_config(dir: &TempDir, stores: &str, retry_count: u32) -> Config {
    let mut config = parse_json(&format!(r#"{{"stores": {}}}"#, stores))
        .expect("Failed to parse test config");
    config.output_dir = dir.path().join("output").to_string_lossy().into_owned();
    config.logs_dir = dir.path().join("logs").to_string_lossy().into_owned();
    config.num_processes = 3;
    config.retry_count = retry_count;
    config.backoff_factor = 0.0;
    config.pacing = PacingConfig::none();
    config
}

fn test_options(max_retries: u32) -> Arc<DownloaderOptions> {
    Arc::new(DownloaderOptions {
        timeout: Duration::from_secs(5),
        retry: RetryPolicy {
            max_retries,
            backoff_factor: 0.0,
            max_backoff: Duration::ZERO,
        },
        pacing: PacingConfig::none(),
        ..DownloaderOptions::default()
    })
}

/// Reads the results table, header included
fn read_results(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("Failed to open results");
    reader
        .records()
        .map(|r| {
            r.expect("Malformed CSV record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}

async fn mount_home(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Home</html>"))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_alza_product_row() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    mount_page(&server, "/p/1", 200, product_page("Test Product", "100", "InStock")).await;

    let dir = TempDir::new().unwrap();
    let url = format!("{}/p/1", server.uri());
    let config = create_test_config(&dir, &format!(r#"[{{"type": "alza", "urls": ["{}"]}}]"#, url), 0);

    let orchestrator = Orchestrator::new(config, StrategyRegistry::with_defaults()).unwrap();
    let summary = orchestrator.run().await.expect("Harvest failed");
    assert_eq!(summary.succeeded, 1);

    let rows = read_results(orchestrator.results_path());
    assert_eq!(
        rows,
        vec![
            vec!["url", "name", "price", "availability", "image", "store", "error"],
            vec![
                url.as_str(),
                "Test Product",
                "100,-",
                "Skladem",
                "https://img.test/100.jpg",
                "alza",
                ""
            ],
        ]
    );
}

#[tokio::test]
async fn test_one_row_per_job_with_unknown_store() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    mount_page(&server, "/a", 200, product_page("Kettle", "599", "InStock")).await;
    mount_page(&server, "/b", 200, product_page("Toaster", "899", "OutOfStock")).await;
    mount_page(&server, "/c", 200, product_page("Mixer", "1299", "PreOrder")).await;
    mount_page(&server, "/d", 200, product_page("Blender", "2490.5", "InStock")).await;

    let base = server.uri();
    let stores = format!(
        r#"[{{"type": "datart", "urls": ["{base}/a", "{base}/b"]}},
            {{"type": "czc", "urls": ["{base}/x"]}},
            {{"type": "mall", "urls": ["{base}/c"]}},
            {{"type": "mironet", "urls": ["{base}/d"]}}]"#
    );
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &stores, 0);
    let job_count = config.job_count();

    let orchestrator = Orchestrator::new(config, StrategyRegistry::with_defaults()).unwrap();
    let summary = orchestrator.run().await.expect("Harvest failed");

    assert_eq!(summary.total_jobs, job_count);
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures_by_store.get("czc"), Some(&1));

    let rows = read_results(orchestrator.results_path());
    assert_eq!(rows.len(), job_count + 1);

    for row in &rows[1..] {
        assert_eq!(row.len(), 7);
        let has_product = !row[1].is_empty();
        let has_error = !row[6].is_empty();
        assert!(has_product != has_error, "row must hold a product or an error: {:?}", row);
    }

    let by_url = |suffix: &str| {
        rows.iter()
            .find(|r| r[0] == format!("{}{}", base, suffix))
            .cloned()
            .expect("missing row")
    };

    let unknown = by_url("/x");
    assert_eq!(unknown[5], "czc");
    assert_eq!(unknown[6], "no extraction strategy registered for store type 'czc'");

    assert_eq!(by_url("/b")[3], "Nedostupné");
    assert_eq!(by_url("/c")[2], "1299 CZK");
    assert_eq!(by_url("/c")[3], "Předobjednávka");
    assert_eq!(by_url("/d")[2], "2490.5,-");
}

#[tokio::test]
async fn test_rerun_discards_previous_results() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    mount_page(&server, "/a", 200, product_page("Kettle", "599", "InStock")).await;
    mount_page(&server, "/b", 200, product_page("Toaster", "899", "InStock")).await;

    let base = server.uri();
    let dir = TempDir::new().unwrap();

    let config = create_test_config(
        &dir,
        &format!(r#"[{{"type": "alza", "urls": ["{base}/a", "{base}/b"]}}]"#),
        0,
    );
    let orchestrator = Orchestrator::new(config, StrategyRegistry::with_defaults()).unwrap();
    orchestrator.run().await.unwrap();
    assert_eq!(read_results(orchestrator.results_path()).len(), 3);

    let config = create_test_config(&dir, &format!(r#"[{{"type": "alza", "urls": ["{base}/b"]}}]"#), 0);
    let orchestrator = Orchestrator::new(config, StrategyRegistry::with_defaults()).unwrap();
    orchestrator.run().await.unwrap();

    let rows = read_results(orchestrator.results_path());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][1], "Toaster");
}

#[tokio::test]
async fn test_empty_config_writes_header_only() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, "[]", 0);

    let orchestrator = Orchestrator::new(config, StrategyRegistry::with_defaults()).unwrap();
    let summary = orchestrator.run().await.unwrap();

    assert_eq!(summary.rows_written(), 0);
    assert_eq!(read_results(orchestrator.results_path()).len(), 1);
    assert!(dir.path().join("logs").is_dir());
}

#[tokio::test]
async fn test_error_classification_rows() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    mount_page(&server, "/blocked", 403, "Forbidden".to_string()).await;
    mount_page(&server, "/missing", 404, "Not here".to_string()).await;
    mount_page(&server, "/broken", 500, "Oops".to_string()).await;
    mount_page(
        &server,
        "/challenge",
        200,
        "<html><p>Please complete the CAPTCHA to continue</p></html>".to_string(),
    )
    .await;

    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &dir,
        &format!(
            r#"[{{"type": "alza", "urls": ["{base}/blocked", "{base}/missing", "{base}/broken", "{base}/challenge"]}}]"#
        ),
        0,
    );

    let orchestrator = Orchestrator::new(config, StrategyRegistry::with_defaults()).unwrap();
    let summary = orchestrator.run().await.unwrap();
    assert_eq!(summary.failed, 4);

    let rows = read_results(orchestrator.results_path());
    let error_for = |suffix: &str| {
        rows.iter()
            .find(|r| r[0] == format!("{}{}", base, suffix))
            .map(|r| r[6].clone())
            .expect("missing row")
    };

    assert_eq!(
        error_for("/blocked"),
        "Blocked by anti-bot protection on 127.0.0.1 (HTTP 403)"
    );
    assert!(error_for("/missing").starts_with("Page not found"));
    assert_eq!(error_for("/broken"), "HTTP 500");
    assert_eq!(error_for("/challenge"), "Captcha challenge detected on 127.0.0.1");
}

#[tokio::test]
async fn test_warm_up_once_per_domain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Home</html>"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/a", 200, product_page("Kettle", "599", "InStock")).await;
    mount_page(&server, "/b", 200, product_page("Toaster", "899", "InStock")).await;

    let mut downloader = Downloader::new(test_options(0)).unwrap();
    for page in ["/a", "/b", "/a"] {
        let url = format!("{}{}", server.uri(), page);
        assert!(downloader.fetch(&url, "datart").await.is_ok());
    }

    assert_eq!(downloader.session().warmed_count(), 1);
    // The `expect(1)` on the home page is verified when the server drops
}

#[tokio::test]
async fn test_warmed_requests_look_same_origin() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    let root = format!("{}/", server.uri());

    Mock::given(method("GET"))
        .and(path("/p"))
        .and(header("sec-fetch-site", "same-origin"))
        .and(header("referer", root.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("Kettle", "599", "InStock")))
        .mount(&server)
        .await;

    let mut downloader = Downloader::new(test_options(0)).unwrap();
    let result = downloader.fetch(&format!("{}/p", server.uri()), "mall").await;
    assert!(result.is_ok(), "unexpected result: {:?}", result.err());
}

#[tokio::test]
async fn test_failed_warm_up_still_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_page(&server, "/p", 200, product_page("Kettle", "599", "InStock")).await;

    let mut downloader = Downloader::new(test_options(0)).unwrap();
    let result = downloader.fetch(&format!("{}/p", server.uri()), "alza").await;

    assert!(result.is_ok());
    assert_eq!(downloader.session().warmed_count(), 0);
}

#[tokio::test]
async fn test_cookies_persist_within_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "visitor=abc123; Path=/")
                .set_body_string("<html>Home</html>"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p"))
        .and(header("cookie", "visitor=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page("Kettle", "599", "InStock")))
        .mount(&server)
        .await;

    let mut downloader = Downloader::new(test_options(0)).unwrap();
    let result = downloader.fetch(&format!("{}/p", server.uri()), "alza").await;
    assert!(result.is_ok(), "unexpected result: {:?}", result.err());
}

#[tokio::test]
async fn test_retry_recovers_from_transient_error() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    Mock::given(method("GET"))
        .and(path("/p"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/p", 200, product_page("Kettle", "599", "InStock")).await;

    let mut downloader = Downloader::new(test_options(1)).unwrap();
    let result = downloader.fetch(&format!("{}/p", server.uri()), "alza").await;

    assert!(result.is_ok());
    assert_eq!(downloader.session().rotations(), 0);
}

#[tokio::test]
async fn test_block_rotates_session_before_retry() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    Mock::given(method("GET"))
        .and(path("/p"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/p", 200, product_page("Kettle", "599", "InStock")).await;

    let mut downloader = Downloader::new(test_options(1)).unwrap();
    let result = downloader.fetch(&format!("{}/p", server.uri()), "alza").await;

    assert!(result.is_ok());
    assert_eq!(downloader.session().rotations(), 1);
    // The new session warmed the domain again
    assert_eq!(downloader.session().warmed_count(), 1);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut downloader = Downloader::new(test_options(3)).unwrap();
    let result = downloader.fetch(&format!("{}/gone", server.uri()), "alza").await;

    assert!(matches!(result, Err(FetchError::NotFound { .. })));
}

#[tokio::test]
async fn test_retries_exhausted_reports_last_error() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    Mock::given(method("GET"))
        .and(path("/p"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let mut downloader = Downloader::new(test_options(2)).unwrap();
    let result = downloader.fetch(&format!("{}/p", server.uri()), "alza").await;

    assert_eq!(result, Err(FetchError::HttpStatus { status: 502 }));
}

#[tokio::test]
async fn test_transport_errors_become_rows() {
    let server = MockServer::start().await;
    mount_home(&server).await;
    mount_page(&server, "/ok", 200, product_page("Kettle", "599", "InStock")).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(product_page("Toaster", "899", "InStock"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let base = server.uri();
    let refused = "http://127.0.0.1:1/p";
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(
        &dir,
        &format!(r#"[{{"type": "alza", "urls": ["{base}/slow", "{refused}", "{base}/ok"]}}]"#),
        0,
    );
    config.timeout = 1;

    let orchestrator = Orchestrator::new(config, StrategyRegistry::with_defaults()).unwrap();
    let summary = orchestrator.run().await.expect("Harvest failed");
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 2);

    let rows = read_results(orchestrator.results_path());
    assert_eq!(rows.len(), 4);
    let row_for = |url: &str| {
        rows.iter()
            .find(|r| r[0] == url)
            .cloned()
            .expect("missing row")
    };

    for url in [format!("{}/slow", base), refused.to_string()] {
        let row = row_for(&url);
        assert!(row[1..5].iter().all(String::is_empty), "product fields set: {:?}", row);
        assert!(row[6].starts_with("Transport error"), "unexpected error: {:?}", row);
    }
    assert_eq!(
        row_for(&format!("{}/slow", base))[6],
        "Transport error: Request timeout after 1s"
    );
    assert!(row_for(refused)[6].starts_with("Transport error: Connection failed"));

    let ok = row_for(&format!("{}/ok", base));
    assert_eq!(ok[1], "Kettle");
    assert_eq!(ok[6], "");
}

#[tokio::test]
async fn test_each_origin_on_a_host_is_warmed() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    for server in [&first, &second] {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Home</html>"))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/p"))
            .and(header("sec-fetch-site", "same-origin"))
            .and(header("referer", format!("{}/", server.uri()).as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(product_page("Kettle", "599", "InStock")),
            )
            .mount(server)
            .await;
    }

    let mut downloader = Downloader::new(test_options(0)).unwrap();
    for server in [&first, &second] {
        let result = downloader.fetch(&format!("{}/p", server.uri()), "datart").await;
        assert!(result.is_ok(), "unexpected result: {:?}", result.err());
    }

    assert_eq!(downloader.session().warmed_count(), 2);
}
