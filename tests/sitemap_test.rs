//! Integration tests for SitemapFetcher using wiremock

mod common;

use sitemap_indexer::config::DEFAULT_USER_AGENT;
use sitemap_indexer::error::FetchError;
use sitemap_indexer::sitemap::SitemapFetcher;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> SitemapFetcher {
    SitemapFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap()
}

/// Test successful fetch keeps document order
#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;
    let urls = common::page_urls("example.com", 3);
    common::mount_sitemap(&mock_server, "/sitemap.xml", &urls).await;

    let result = fetcher()
        .fetch(&format!("{}/sitemap.xml", mock_server.uri()))
        .await;

    assert!(result.is_ok(), "Fetch should succeed: {:?}", result.err());
    assert_eq!(result.unwrap(), urls);
}

/// Test the fixed User-Agent is sent
#[tokio::test]
async fn test_user_agent_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ua-test.xml"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(common::sitemap_xml(&[
                "https://example.com/".to_string(),
            ])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let urls = fetcher()
        .fetch(&format!("{}/ua-test.xml", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(urls, vec!["https://example.com/"]);
}

/// Test 404 is an error and fetch_or_empty skips it
#[tokio::test]
async fn test_404_is_skipped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.xml"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing.xml", mock_server.uri());
    let fetcher = fetcher();

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert!(matches!(err, FetchError::Status(404)));

    assert!(fetcher.fetch_or_empty(&url).await.is_empty());
}

/// Test server errors are not retried
#[tokio::test]
async fn test_server_error_no_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let urls = fetcher()
        .fetch_or_empty(&format!("{}/broken.xml", mock_server.uri()))
        .await;

    assert!(urls.is_empty());
}

/// Test malformed XML yields a parse error
#[tokio::test]
async fn test_malformed_xml() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bad.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<urlset><url><loc>https://example.com/</loc></urx></urlset>"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/bad.xml", mock_server.uri());
    let err = fetcher().fetch(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::Parse { .. }));
    assert!(fetcher().fetch_or_empty(&url).await.is_empty());
}

/// Test image sitemap entries are returned alongside page entries
#[tokio::test]
async fn test_image_sitemap() {
    let mock_server = MockServer::start().await;
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
  <url>
    <loc>https://example.com/sample.html</loc>
    <image:image>
      <image:loc>https://example.com/image.jpg</image:loc>
    </image:image>
  </url>
</urlset>"#;

    Mock::given(method("GET"))
        .and(path("/image-sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(xml))
        .mount(&mock_server)
        .await;

    let urls = fetcher()
        .fetch(&format!("{}/image-sitemap.xml", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(
        urls,
        vec!["https://example.com/sample.html", "https://example.com/image.jpg"]
    );
}

/// Test EUC-KR sitemap decoding from the Content-Type charset
#[tokio::test]
async fn test_declared_charset() {
    let mock_server = MockServer::start().await;

    let mut body = b"<urlset><url><loc>https://example.com/".to_vec();
    // "한글" in EUC-KR
    body.extend_from_slice(&[0xC7, 0xD1, 0xB1, 0xDB]);
    body.extend_from_slice(b"</loc></url></urlset>");

    Mock::given(method("GET"))
        .and(path("/euc-kr.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/xml; charset=euc-kr"),
        )
        .mount(&mock_server)
        .await;

    let urls = fetcher()
        .fetch(&format!("{}/euc-kr.xml", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(urls, vec!["https://example.com/한글"]);
}

/// Test a Latin-1 sitemap named only by its XML declaration
#[tokio::test]
async fn test_xml_declaration_encoding() {
    let mock_server = MockServer::start().await;

    let mut body = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<urlset>".to_vec();
    body.extend_from_slice(b"<url><loc>https://example.com/caf");
    body.push(0xE9);
    body.extend_from_slice(b"</loc></url><url><loc>https://example.com/menu</loc></url></urlset>");

    Mock::given(method("GET"))
        .and(path("/latin1.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/xml"))
        .mount(&mock_server)
        .await;

    let urls = fetcher()
        .fetch(&format!("{}/latin1.xml", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(urls, vec!["https://example.com/café", "https://example.com/menu"]);
}
