use axum::{
    Extension, Router,
    extract::{Path, Query},
    response::Response,
    routing::get,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::server::{
    error::Error,
    extractors::UpstreamHeaders,
    services::AppServices,
    utils::response_utils::{error_page_response, rewritten_html_response},
};

#[derive(Deserialize)]
struct VideoQuery {
    url: Option<String>,
}

pub struct VideoController;

impl VideoController {
    pub fn app() -> Router {
        Router::new()
            .route("/video", get(Self::video))
            .route("/embed/{server}/{id}/{episode}", get(Self::embed))
    }

    /// everything on these routes answers with html, errors included
    async fn video(
        Extension(services): Extension<AppServices>,
        Query(params): Query<VideoQuery>,
        overrides: Result<UpstreamHeaders, Error>,
    ) -> Response {
        let target = params
            .url
            .filter(|url| !url.trim().is_empty())
            .or_else(|| services.profile.deployment.default_video_url.clone());

        let Some(target) = target else {
            let e = Error::MissingParameter("url".to_string());
            return error_page_response(&e, None, &services.profile);
        };

        Self::render(&services, &target, overrides).await
    }

    async fn embed(
        Extension(services): Extension<AppServices>,
        Path((server, id, episode)): Path<(String, String, String)>,
        overrides: Result<UpstreamHeaders, Error>,
    ) -> Response {
        let target = services.profile.embed_url(&server, &id, &episode);
        info!("embed {}/{}/{} -> {}", server, id, episode, target);

        Self::render(&services, &target, overrides).await
    }

    async fn render(
        services: &AppServices,
        target: &str,
        overrides: Result<UpstreamHeaders, Error>,
    ) -> Response {
        let overrides = match overrides {
            Ok(UpstreamHeaders(overrides)) => overrides,
            Err(e) => return error_page_response(&e, Some(target), &services.profile),
        };

        match services.pipeline.run(target, &overrides).await {
            Ok(html) => {
                info!("served rewritten page for {} ({} bytes)", target, html.len());
                rewritten_html_response(html, &services.profile.deployment.frame_options)
            }
            Err(e) => {
                error!("video request for {} failed: {}", target, e);
                error_page_response(&e, Some(target), &services.profile)
            }
        }
    }
}
