use axum::{
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    profile::ProxyProfile,
    server::{error::Error, utils::page_utils::error_page},
};

const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// rewritten pages must be embeddable and never cached, the upstream changes under us
pub fn rewritten_html_response(html: String, frame_options: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_str(frame_options)
            .unwrap_or_else(|_| HeaderValue::from_static("SAMEORIGIN")),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

    (StatusCode::OK, headers, html).into_response()
}

/// the html flavour of an error, used by the video routes. status follows the error kind
pub fn error_page_response(
    error: &Error,
    requested_url: Option<&str>,
    profile: &ProxyProfile,
) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    let page = error_page(&error.to_string(), requested_url, profile);

    (error.status_code(), headers, page).into_response()
}

/// non html responses from the generic proxy, sent back byte for byte
pub fn passthrough_response(content_type: Option<String>, body: Vec<u8>) -> Response {
    let mut headers = HeaderMap::new();
    let content_type = content_type
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_TYPE, content_type);

    (StatusCode::OK, headers, body).into_response()
}
