use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect},
    routing::get,
};
use flate2::{Compression, write::GzEncoder};
use tokio::net::TcpListener;

use embed_proxy::ProxyProfile;
use embed_proxy::server::error::Error;
use embed_proxy::server::services::FetchServiceTrait;
use embed_proxy::server::services::fetch_services::{FetchService, FetchSettings};

async fn echo(headers: HeaderMap) -> String {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none")
            .to_string()
    };
    format!(
        "cookie={}\nreferer={}\nua={}\ncustom={}",
        get("cookie"),
        get("referer"),
        get("user-agent"),
        get("x-custom")
    )
}

async fn zipped() -> impl IntoResponse {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"<html>zipped</html>").unwrap();
    let body = encoder.finish().unwrap();

    (
        [
            (header::CONTENT_TYPE, "text/html"),
            (header::CONTENT_ENCODING, "gzip"),
        ],
        body,
    )
}

async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/page", get(echo))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "nope") }))
        .route("/broken", get(|| async { (StatusCode::BAD_GATEWAY, "down") }))
        .route("/big", get(|| async { "x".repeat(4096) }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        )
        .route("/hop", get(|| async { Redirect::temporary("/page") }))
        .route("/loop", get(|| async { Redirect::temporary("/loop") }))
        .route("/zipped", get(zipped));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn settings() -> FetchSettings {
    FetchSettings {
        timeout: Duration::from_secs(10),
        max_redirects: 5,
        max_body_bytes: 1024 * 1024,
        accept_status_below: 400,
    }
}

// reqwest ignores the port of a resolve override, so urls carry the test server's port
fn service(addr: SocketAddr, settings: FetchSettings) -> FetchService {
    let http = FetchService::client_builder(&settings)
        .resolve("miravd.com", addr)
        .resolve("plain.test", addr)
        .build()
        .unwrap();

    FetchService::with_client(http, Arc::new(ProxyProfile::default()), settings)
}

#[tokio::test]
async fn test_sends_clearance_cookie_to_video_hosts() {
    let addr = spawn_upstream().await;
    let fetcher = service(addr, settings());

    let url = format!("http://miravd.com:{}/page", addr.port());
    let result = fetcher.fetch(&url, &[]).await.unwrap();
    let body = result.text();

    assert_eq!(result.status_code, 200);
    assert!(body.contains("cookie=cf_clearance="));
    assert!(body.contains("legitimate_user=true"));
    assert!(body.contains("referer=https://3isk.onl/"));
    assert!(body.contains("Chrome/131"));
}

#[tokio::test]
async fn test_leaves_cookie_off_for_other_hosts() {
    let addr = spawn_upstream().await;
    let fetcher = service(addr, settings());

    let url = format!("http://plain.test:{}/page", addr.port());
    let body = fetcher.fetch(&url, &[]).await.unwrap().text();

    assert!(body.contains("cookie=none"));
}

#[tokio::test]
async fn test_applies_caller_overrides() {
    let addr = spawn_upstream().await;
    let fetcher = service(addr, settings());

    let url = format!("http://miravd.com:{}/page", addr.port());
    let overrides = vec![
        ("X-Custom".to_string(), "hello".to_string()),
        ("Cookie".to_string(), "mine=1".to_string()),
    ];
    let body = fetcher.fetch(&url, &overrides).await.unwrap().text();

    assert!(body.contains("custom=hello"));
    assert!(body.contains("cookie=mine=1"));
}

#[tokio::test]
async fn test_fails_on_upstream_error_status() {
    let addr = spawn_upstream().await;
    let fetcher = service(addr, settings());

    let url = format!("http://plain.test:{}/missing", addr.port());
    let err = fetcher.fetch(&url, &[]).await.unwrap_err();

    assert!(matches!(err, Error::Upstream { status: 404, .. }));
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_honours_a_higher_status_threshold() {
    let addr = spawn_upstream().await;
    let fetcher = service(
        addr,
        FetchSettings {
            accept_status_below: 500,
            ..settings()
        },
    );

    let missing = format!("http://plain.test:{}/missing", addr.port());
    let result = fetcher.fetch(&missing, &[]).await.unwrap();
    assert_eq!(result.status_code, 404);

    let broken = format!("http://plain.test:{}/broken", addr.port());
    let err = fetcher.fetch(&broken, &[]).await.unwrap_err();
    assert!(matches!(err, Error::Upstream { status: 502, .. }));
}

#[tokio::test]
async fn test_follows_redirects_up_to_the_limit() {
    let addr = spawn_upstream().await;
    let fetcher = service(addr, settings());

    let hop = format!("http://plain.test:{}/hop", addr.port());
    let result = fetcher.fetch(&hop, &[]).await.unwrap();
    assert!(result.final_url.ends_with("/page"));

    let looping = format!("http://plain.test:{}/loop", addr.port());
    let err = fetcher.fetch(&looping, &[]).await.unwrap_err();
    assert!(matches!(err, Error::Network { .. }));
}

#[tokio::test]
async fn test_caps_the_body_size() {
    let addr = spawn_upstream().await;
    let fetcher = service(
        addr,
        FetchSettings {
            max_body_bytes: 1024,
            ..settings()
        },
    );

    let url = format!("http://plain.test:{}/big", addr.port());
    let err = fetcher.fetch(&url, &[]).await.unwrap_err();

    assert!(matches!(err, Error::BodyTooLarge { limit: 1024, .. }));
}

#[tokio::test]
async fn test_times_out_slow_upstreams() {
    let addr = spawn_upstream().await;
    let fetcher = service(
        addr,
        FetchSettings {
            timeout: Duration::from_millis(300),
            ..settings()
        },
    );

    let url = format!("http://plain.test:{}/slow", addr.port());
    let err = fetcher.fetch(&url, &[]).await.unwrap_err();

    assert!(matches!(err, Error::Timeout { .. }));
}

#[tokio::test]
async fn test_decodes_compressed_bodies() {
    let addr = spawn_upstream().await;
    let fetcher = service(addr, settings());

    let url = format!("http://plain.test:{}/zipped", addr.port());
    let result = fetcher.fetch(&url, &[]).await.unwrap();

    assert_eq!(result.text(), "<html>zipped</html>");
    assert!(result.is_html());
}

#[tokio::test]
async fn test_reports_unreachable_hosts() {
    // grab a free port and close it again so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = service(addr, settings());
    let url = format!("http://127.0.0.1:{}/page", addr.port());
    let err = fetcher.fetch(&url, &[]).await.unwrap_err();

    assert!(matches!(err, Error::Network { .. }));
}

#[tokio::test]
async fn test_refuses_non_http_urls() {
    let addr = spawn_upstream().await;
    let fetcher = service(addr, settings());

    let err = fetcher.fetch("ftp://plain.test/file", &[]).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    let err = fetcher.fetch("not a url", &[]).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
}
