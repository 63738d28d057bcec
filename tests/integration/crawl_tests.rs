//! Integration tests for the load pipeline
//!
//! Sitemap resolution and the HTTP transport run against a wiremock server.
//! Page crawls use a scripted in-memory transport because asset URLs are
//! always rewritten to https, which the mock server does not speak.

use async_trait::async_trait;
use loadstorm::config::{PauseConfig, RequestConfig};
use loadstorm::crawler::{
    run_load, BatchRequest, HttpTransport, LoadPlan, PageCrawler, ResponseRecord,
    SitemapResolver, Transport, TransportFactory,
};
use loadstorm::{CrawlStage, DomainFilter, LoadstormError, Metrics, MetricsRecorder};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_transport() -> HttpTransport {
    HttpTransport::new(&RequestConfig::default()).expect("Failed to build transport")
}

async fn mount_xml(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("content-type", "application/xml")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{}</loc></url>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

#[tokio::test]
async fn test_resolve_flat_sitemap() {
    let server = MockServer::start().await;
    let base = server.uri();
    let pages = vec![format!("{}/", base), format!("{}/about", base)];
    mount_xml(&server, "/sitemap.xml", 200, urlset(&pages)).await;

    let transport = http_transport();
    let urls = SitemapResolver::new(&transport)
        .resolve(&format!("{}/sitemap.xml", base))
        .await
        .expect("Sitemap should resolve");

    assert_eq!(urls, pages);
}

#[tokio::test]
async fn test_resolve_sitemap_index_follows_nested_in_order() {
    let server = MockServer::start().await;
    let base = server.uri();

    let index = format!(
        r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{base}/post-sitemap.xml</loc></sitemap>
  <sitemap><loc>{base}/page-sitemap.xml</loc></sitemap>
</sitemapindex>"#
    );
    mount_xml(&server, "/sitemap.xml", 200, index).await;
    mount_xml(
        &server,
        "/post-sitemap.xml",
        200,
        urlset(&[format!("{}/post-1", base), format!("{}/post-2", base)]),
    )
    .await;
    mount_xml(
        &server,
        "/page-sitemap.xml",
        200,
        urlset(&[format!("{}/contact", base)]),
    )
    .await;

    let transport = http_transport();
    let urls = SitemapResolver::new(&transport)
        .resolve(&format!("{}/sitemap.xml", base))
        .await
        .expect("Sitemap index should resolve");

    assert_eq!(
        urls,
        vec![
            format!("{}/post-1", base),
            format!("{}/post-2", base),
            format!("{}/contact", base),
        ]
    );
}

#[tokio::test]
async fn test_resolve_mixed_sitemap_puts_nested_first() {
    let server = MockServer::start().await;
    let base = server.uri();

    let mixed = format!(
        r#"<urlset>
  <url><loc>{base}/top</loc></url>
  <sitemap><loc>{base}/nested.xml</loc></sitemap>
</urlset>"#
    );
    mount_xml(&server, "/sitemap.xml", 200, mixed).await;
    mount_xml(
        &server,
        "/nested.xml",
        200,
        urlset(&[format!("{}/deep", base)]),
    )
    .await;

    let transport = http_transport();
    let urls = SitemapResolver::new(&transport)
        .resolve(&format!("{}/sitemap.xml", base))
        .await
        .expect("Mixed sitemap should resolve");

    assert_eq!(urls, vec![format!("{}/deep", base), format!("{}/top", base)]);
}

#[tokio::test]
async fn test_resolve_image_sitemap_lists_only_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
  <url>
    <loc>{base}/gallery</loc>
    <image:image><image:loc>{base}/wp-content/uploads/pic.jpg</image:loc></image:image>
    <image:image><image:loc>{base}/wp-content/uploads/pic2.jpg</image:loc></image:image>
  </url>
  <url><loc>{base}/contact</loc></url>
</urlset>"#
    );
    mount_xml(&server, "/sitemap.xml", 200, sitemap).await;

    let transport = http_transport();
    let urls = SitemapResolver::new(&transport)
        .resolve(&format!("{}/sitemap.xml", base))
        .await
        .expect("Image sitemap should resolve");

    assert_eq!(
        urls,
        vec![format!("{}/gallery", base), format!("{}/contact", base)]
    );
}

#[tokio::test]
async fn test_resolve_skips_broken_nested_sitemap() {
    let server = MockServer::start().await;
    let base = server.uri();

    let index = format!(
        r#"<sitemapindex>
  <sitemap><loc>{base}/gone.xml</loc></sitemap>
  <sitemap><loc>{base}/ok.xml</loc></sitemap>
</sitemapindex>"#
    );
    mount_xml(&server, "/sitemap.xml", 200, index).await;
    mount_xml(&server, "/gone.xml", 500, String::new()).await;
    mount_xml(&server, "/ok.xml", 200, urlset(&[format!("{}/ok", base)])).await;

    let transport = http_transport();
    let urls = SitemapResolver::new(&transport)
        .resolve(&format!("{}/sitemap.xml", base))
        .await
        .expect("Sitemap should resolve despite one broken child");

    assert_eq!(urls, vec![format!("{}/ok", base)]);
}

#[tokio::test]
async fn test_resolve_not_found_is_fetch_error() {
    let server = MockServer::start().await;
    mount_xml(&server, "/sitemap.xml", 404, String::new()).await;

    let transport = http_transport();
    let err = SitemapResolver::new(&transport)
        .resolve(&format!("{}/sitemap.xml", server.uri()))
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    match err {
        LoadstormError::Fetch {
            status, message, ..
        } => {
            assert_eq!(status, Some(404));
            assert!(message.contains("did not return 200 status"));
        }
        other => panic!("Expected Fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_resolve_empty_sitemap_is_error() {
    let server = MockServer::start().await;
    mount_xml(&server, "/sitemap.xml", 200, urlset(&[])).await;

    let transport = http_transport();
    let err = SitemapResolver::new(&transport)
        .resolve(&format!("{}/sitemap.xml", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, LoadstormError::EmptySitemap { .. }));
}

#[tokio::test]
async fn test_resolve_malformed_sitemap_is_parse_error() {
    let server = MockServer::start().await;
    mount_xml(
        &server,
        "/sitemap.xml",
        200,
        "<urlset><url><loc>x</url></urlset>".to_string(),
    )
    .await;

    let transport = http_transport();
    let err = SitemapResolver::new(&transport)
        .resolve(&format!("{}/sitemap.xml", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, LoadstormError::SitemapParse { .. }));
}

#[tokio::test]
async fn test_http_transport_batch_is_index_aligned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.css"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/css")
                .insert_header("cf-cache-status", "HIT")
                .set_body_string("body{}"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.js"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let transport = http_transport();
    let results = transport
        .batch_get(vec![
            BatchRequest::get(format!("{}/missing.js", server.uri())),
            BatchRequest::get(format!("{}/a.css", server.uri())),
        ])
        .await;

    assert_eq!(results.len(), 2);
    let missing = results[0].as_ref().expect("404 is still a response");
    assert_eq!(missing.status, 404);

    let css = results[1].as_ref().expect("Stylesheet should load");
    assert!(css.is_ok());
    assert_eq!(css.body, "body{}");
    assert_eq!(css.header("CF-Cache-Status"), Some("HIT"));
}

#[tokio::test]
async fn test_http_transport_connection_refused_is_error() {
    // Bind then drop a server so the port is closed
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let transport = HttpTransport::from_client(reqwest::Client::new());
    assert!(transport.get(&format!("{}/", uri)).await.is_err());
}

// Scripted transport for page crawls

type Script = HashMap<String, (u16, Vec<(String, String)>, String)>;

#[derive(Clone, Default)]
struct Site {
    script: Arc<Script>,
    requested: Arc<Mutex<Vec<String>>>,
}

struct ScriptedTransport {
    site: Site,
}

impl Site {
    fn new(entries: Vec<(&str, u16, &str, &str)>) -> Self {
        let mut script = Script::new();
        for (url, status, content_type, body) in entries {
            script.insert(
                url.to_string(),
                (
                    status,
                    vec![("Content-Type".to_string(), content_type.to_string())],
                    body.to_string(),
                ),
            );
        }
        Self {
            script: Arc::new(script),
            requested: Arc::default(),
        }
    }

    fn with_header(mut self, url: &str, name: &str, value: &str) -> Self {
        let script = Arc::make_mut(&mut self.script);
        if let Some((_, headers, _)) = script.get_mut(url) {
            headers.push((name.to_string(), value.to_string()));
        }
        self
    }

    fn transport(&self) -> Box<dyn Transport> {
        Box::new(ScriptedTransport { site: self.clone() })
    }

    fn factory(&self) -> TransportFactory {
        let site = self.clone();
        Arc::new(move || Ok(site.transport()))
    }

    fn requests_for(&self, url: &str) -> usize {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    fn total_requests(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

impl ScriptedTransport {
    fn respond(&self, url: &str) -> Result<ResponseRecord, LoadstormError> {
        self.site.requested.lock().unwrap().push(url.to_string());
        match self.site.script.get(url) {
            Some((status, headers, body)) => Ok(ResponseRecord {
                url: url.to_string(),
                status: *status,
                headers: headers.clone(),
                duration: Duration::from_millis(5),
                body: body.clone(),
            }),
            None => Err(LoadstormError::Fetch {
                url: url.to_string(),
                status: None,
                message: "connection refused".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<ResponseRecord, LoadstormError> {
        self.respond(url)
    }

    async fn batch_get(
        &self,
        requests: Vec<BatchRequest>,
    ) -> Vec<Result<ResponseRecord, LoadstormError>> {
        requests.iter().map(|r| self.respond(&r.url)).collect()
    }
}

const HOME_URL: &str = "https://shop.test/";
const ABOUT_URL: &str = "https://shop.test/about";

const HOME: &str = r#"<html><head>
    <link rel="stylesheet" href="//cdn.test/site.css">
    <script src="https://cdn.test/app.js"></script>
    <script src="https://fonts.googleapis.com/loader.js"></script>
</head><body>
    <img src="http://cdn.test/logo.png">
    <img src="/relative.png">
</body></html>"#;

const ABOUT: &str = r#"<html><head>
    <link rel="stylesheet" href="//cdn.test/site.css">
</head><body>
    <img src="https://cdn.test/team.jpg">
</body></html>"#;

fn shop() -> Site {
    Site::new(vec![
        (HOME_URL, 200, "text/html; charset=UTF-8", HOME),
        (ABOUT_URL, 200, "text/html; charset=UTF-8", ABOUT),
        ("https://cdn.test/site.css", 200, "text/css", "body{}"),
        ("https://cdn.test/app.js", 200, "application/javascript", ""),
        ("https://cdn.test/logo.png", 200, "image/png", ""),
        ("https://cdn.test/team.jpg", 200, "image/jpeg", ""),
    ])
}

fn plan(vus: u32, iterations: u32) -> LoadPlan {
    LoadPlan {
        vus,
        duration: Duration::from_secs(60),
        iterations,
        pause: PauseConfig::default(),
        domain_filter: DomainFilter::new(["googleapis.com"]),
        debug_responses: false,
    }
}

fn pages() -> Arc<Vec<String>> {
    Arc::new(vec![HOME_URL.to_string(), ABOUT_URL.to_string()])
}

#[tokio::test]
async fn test_page_crawl_shares_cache_across_pages() {
    let site = shop();
    let metrics = Arc::new(Metrics::new());
    let mut crawler = PageCrawler::new(
        site.transport(),
        MetricsRecorder::new(metrics.clone()),
        DomainFilter::new(["googleapis.com"]),
    );

    let home = crawler.crawl_page(HOME_URL).await;
    assert_eq!(home.stage, CrawlStage::Done);
    assert_eq!(home.assets_requested, 3);

    let about = crawler.crawl_page(ABOUT_URL).await;
    assert_eq!(about.stage, CrawlStage::Done);
    // site.css came from the home page
    assert_eq!(about.assets_requested, 1);

    assert_eq!(site.requests_for("https://cdn.test/site.css"), 1);
    assert_eq!(site.requests_for("https://fonts.googleapis.com/loader.js"), 0);
    assert_eq!(crawler.cache().len(), 4);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.page_response_time.count, 2);
    assert_eq!(snapshot.asset_response_time.count, 4);
    assert_eq!(snapshot.errors.total, 6);
    assert_eq!(snapshot.errors.passes, 0);
}

#[tokio::test]
async fn test_run_load_gives_each_vu_its_own_cache() {
    let site = shop();
    let metrics = Arc::new(Metrics::new());
    let (_stop_tx, stop_rx) = watch::channel(false);

    let stats = run_load(
        plan(2, 2),
        pages(),
        site.factory(),
        MetricsRecorder::new(metrics.clone()),
        stop_rx,
    )
    .await
    .expect("Run should complete");

    assert_eq!(stats.vus, 2);
    assert_eq!(stats.totals.iterations, 4);
    assert_eq!(stats.totals.pages_visited, 8);
    assert_eq!(stats.totals.pages_failed, 0);
    assert!(!stats.interrupted);

    // Each VU loads every asset once, on its first pass only
    assert_eq!(site.requests_for("https://cdn.test/site.css"), 2);
    assert_eq!(site.requests_for("https://cdn.test/team.jpg"), 2);
    assert_eq!(site.requests_for(HOME_URL), 4);
    // 2 VUs x (4 pages + 4 assets)
    assert_eq!(site.total_requests(), 16);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.requests, 16);
    assert_eq!(snapshot.page_response_time.count, 8);
    assert_eq!(snapshot.asset_response_time.count, 8);
    assert_eq!(snapshot.error_count, 0);
}

#[tokio::test]
async fn test_run_load_counts_failed_pages_and_cache_hits() {
    let site = Site::new(vec![
        (HOME_URL, 200, "text/html", HOME),
        (ABOUT_URL, 503, "text/html", ABOUT),
        ("https://cdn.test/site.css", 200, "text/css", ""),
        ("https://cdn.test/app.js", 200, "application/javascript", ""),
        ("https://cdn.test/logo.png", 200, "image/png", ""),
    ])
    .with_header("https://cdn.test/logo.png", "X-Cache", "hit");

    let metrics = Arc::new(Metrics::new());
    let (_stop_tx, stop_rx) = watch::channel(false);

    let stats = run_load(
        plan(1, 1),
        pages(),
        site.factory(),
        MetricsRecorder::new(metrics.clone()),
        stop_rx,
    )
    .await
    .expect("Run should complete");

    assert_eq!(stats.totals.pages_visited, 2);
    assert_eq!(stats.totals.pages_failed, 1);
    // The failing about page never had its assets fetched
    assert_eq!(site.requests_for("https://cdn.test/team.jpg"), 0);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.error_count, 1);
    assert_eq!(snapshot.errors.passes, 1);
    assert_eq!(snapshot.errors.total, 5);
    assert_eq!(snapshot.response_cached.passes, 1);
    assert_eq!(snapshot.response_cached.total, 4);
}

#[tokio::test]
async fn test_run_load_stops_immediately_when_signalled() {
    let site = shop();
    let (_stop_tx, stop_rx) = watch::channel(true);

    let stats = run_load(
        plan(3, 0),
        pages(),
        site.factory(),
        MetricsRecorder::default(),
        stop_rx,
    )
    .await
    .expect("Run should complete");

    assert!(stats.interrupted);
    assert_eq!(stats.totals.pages_visited, 0);
    assert_eq!(site.total_requests(), 0);
}

#[tokio::test]
async fn test_run_load_stops_at_deadline() {
    let site = shop();
    let (_stop_tx, stop_rx) = watch::channel(false);
    let mut short = plan(1, 0);
    short.duration = Duration::from_millis(200);
    short.pause = PauseConfig { min: 1, max: 1 };

    let stats = run_load(
        short,
        pages(),
        site.factory(),
        MetricsRecorder::default(),
        stop_rx,
    )
    .await
    .expect("Run should complete");

    // The pause is cut short by the deadline after the first page
    assert_eq!(stats.totals.pages_visited, 1);
    assert!(stats.elapsed < Duration::from_secs(1));
    assert!(!stats.interrupted);
}

#[tokio::test]
async fn test_run_load_keeps_going_when_stop_sender_is_dropped() {
    let site = shop();
    let (stop_tx, stop_rx) = watch::channel(false);
    drop(stop_tx);

    let mut paced = plan(1, 0);
    paced.duration = Duration::from_millis(2500);
    paced.pause = PauseConfig { min: 1, max: 1 };

    let stats = run_load(
        paced,
        pages(),
        site.factory(),
        MetricsRecorder::default(),
        stop_rx,
    )
    .await
    .expect("Run should complete");

    // Pages at roughly 0s, 1s and 2s
    assert!(stats.totals.pages_visited > 1);
    assert!(!stats.interrupted);
    assert!(stats.elapsed >= Duration::from_secs(2));
}
