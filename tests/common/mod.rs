//! Common test utilities

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use sitemap_indexer::config::{Config, SitemapConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Throwaway service-account key used only by tests
pub const FIXTURE_KEY: &str = include_str!("../fixtures/service_account.json");

/// Path of the mocked Indexing API
pub const PUBLISH_PATH: &str = "/v3/urlNotifications:publish";

/// Path of the mocked token endpoint
pub const TOKEN_PATH: &str = "/token";

/// Write the fixture key with its token URI pointed at `token_uri`
pub fn write_key_file(dir: &Path, token_uri: &str) -> PathBuf {
    let mut key: serde_json::Value = serde_json::from_str(FIXTURE_KEY).unwrap();
    key["token_uri"] = serde_json::Value::String(token_uri.to_string());

    let path = dir.join("key.json");
    std::fs::write(&path, serde_json::to_string_pretty(&key).unwrap()).unwrap();
    path
}

/// `n` page URLs on `host`
pub fn page_urls(host: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://{host}/posts/{i}")).collect()
}

/// Render a urlset sitemap
pub fn sitemap_xml(urls: &[String]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for url in urls {
        xml.push_str(&format!(
            "  <url><loc>{url}</loc><changefreq>weekly</changefreq></url>\n"
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Serve a sitemap document at `route`
pub async fn mount_sitemap(server: &MockServer, route: &str, urls: &[String]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(sitemap_xml(urls))
                .insert_header("content-type", "application/xml; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Token endpoint that accepts any assertion
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.test-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

/// Indexing API answering every notification with `status`
pub async fn mount_publish_endpoint(server: &MockServer, status: u16, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(PUBLISH_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
            "urlNotificationMetadata": {"url": "https://example.com/"}
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Config pointing every endpoint at the mock server and every file at `dir`
pub fn test_config(server: &MockServer, dir: &Path, sitemaps: Vec<SitemapConfig>) -> Config {
    let mut config = Config::default();
    config.indexing.key_file = write_key_file(dir, &format!("{}{TOKEN_PATH}", server.uri()));
    config.indexing.endpoint = format!("{}{PUBLISH_PATH}", server.uri());
    config.indexing.workers = 5;
    config.indexing.request_timeout_secs = 5;
    config.fetcher.request_timeout_secs = 5;
    config.output.log_file = dir.join("submission_log.txt");
    config.sitemaps = sitemaps;
    config
}

/// Log file lines, sorted since completion order is not deterministic
pub fn sorted_log_lines(path: &Path) -> Vec<String> {
    let mut lines: Vec<String> = std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l.to_string())
        .collect();
    lines.sort();
    lines
}
