// generic proxy, same fetcher and rewriter as /video but without the iframe hop
use axum::{
    Extension, Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use serde::Deserialize;
use tracing::{debug, error};

use crate::server::{
    error::{AppResult, Error},
    extractors::UpstreamHeaders,
    services::{AppServices, ProxiedContent},
    utils::response_utils::{passthrough_response, rewritten_html_response},
};

#[derive(Deserialize)]
struct ProxyQuery {
    url: Option<String>,
}

pub struct ProxyController;

impl ProxyController {
    pub fn app() -> Router {
        Router::new().route("/proxy", get(Self::proxy_get).options(Self::proxy_options))
    }

    async fn proxy_get(
        Extension(services): Extension<AppServices>,
        Query(params): Query<ProxyQuery>,
        UpstreamHeaders(overrides): UpstreamHeaders,
    ) -> AppResult<Response> {
        let raw_url = params
            .url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::MissingParameter("url".to_string()))?;

        let target_url = Self::decode_url(raw_url.trim())?;

        if !target_url.starts_with("http://") && !target_url.starts_with("https://") {
            return Err(Error::BadRequest("Invalid URL format".to_string()));
        }

        debug!("Proxying: {}", target_url);

        match services.pipeline.proxy(&target_url, &overrides).await? {
            ProxiedContent::Html(html) => Ok(rewritten_html_response(
                html,
                &services.profile.deployment.frame_options,
            )),
            ProxiedContent::Passthrough { content_type, body } => {
                Ok(passthrough_response(content_type, body))
            }
        }
    }

    async fn proxy_options() -> impl IntoResponse {
        StatusCode::NO_CONTENT
    }

    // plain urls come through as is (the query extractor already percent decoded them), anything
    // else is treated as unpadded url safe base64
    fn decode_url(url_param: &str) -> AppResult<String> {
        if url_param.starts_with("http://") || url_param.starts_with("https://") {
            return Ok(url_param.to_string());
        }

        let mut padded = url_param.to_string();
        while !padded.len().is_multiple_of(4) {
            padded.push('=');
        }

        URL_SAFE
            .decode(&padded)
            .map_err(|e| {
                error!("Failed to decode base64: {}", e);
                Error::BadRequest("Invalid URL encoding".to_string())
            })
            .and_then(|bytes| {
                String::from_utf8(bytes).map_err(|e| {
                    error!("Failed to parse UTF-8: {}", e);
                    Error::BadRequest("Invalid URL encoding".to_string())
                })
            })
    }
}
