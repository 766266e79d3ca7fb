pub mod api;
pub mod dtos;
pub mod error;
pub mod extractors;
pub mod services;
pub mod utils;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::{
    Extension, Router, ServiceExt,
    extract::Request,
    http::{
        HeaderName, HeaderValue, Method,
        header::{ACCEPT, CONTENT_TYPE, ORIGIN},
    },
    routing::get,
};
use once_cell::sync::Lazy;
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{config::AppConfig, profile::ProxyProfile};

use api::{
    health_controller::health_endpoint, landing_controller::landing_endpoint,
    proxy_controller::ProxyController, video_controller::VideoController,
};
use services::AppServices;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

pub fn get_uptime_seconds() -> u64 {
    STARTED_AT.elapsed().as_secs()
}

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub struct ApplicationServer;

impl ApplicationServer {
    pub async fn serve(config: Arc<AppConfig>, profile: Arc<ProxyProfile>) -> anyhow::Result<()> {
        Lazy::force(&STARTED_AT);

        let services = AppServices::new(config.clone(), profile)?;

        let app = Self::app(services);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        info!("routes ready, listening on http://{}", addr);

        axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
            .with_graceful_shutdown(Self::shutdown_signal())
            .await
            .context("error while running the server")?;

        info!("server stopped");
        Ok(())
    }

    /// the router as it is served. trailing slashes get trimmed before routing so
    /// /embed/1/2/3/ and /embed/1/2/3 match, which a layer on the router itself can't do
    pub fn app(services: AppServices) -> NormalizePath<Router> {
        NormalizePathLayer::trim_trailing_slash().layer(Self::router(services))
    }

    pub fn router(services: AppServices) -> Router {
        let cors = Self::cors_layer(&services.config.cors_origin);

        Router::new()
            .route("/", get(landing_endpoint))
            .route("/health", get(health_endpoint))
            .merge(VideoController::app())
            .merge(ProxyController::app())
            .layer(Extension(services))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    fn cors_layer(cors_origin: &str) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([
                ORIGIN,
                HeaderName::from_static("x-requested-with"),
                CONTENT_TYPE,
                ACCEPT,
            ]);

        if cors_origin.trim() == "*" {
            return layer.allow_origin(Any);
        }

        let origins: Vec<HeaderValue> = cors_origin
            .split(',')
            .filter_map(|origin| {
                let origin = origin.trim();
                origin.parse().map_err(|_| warn!("skipping bad cors origin {}", origin)).ok()
            })
            .collect();

        layer.allow_origin(origins)
    }

    // nothing is kept between requests so there is nothing to flush, just stop accepting
    async fn shutdown_signal() {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    warn!("failed to listen for sigterm: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        info!("shutdown signal received");
    }
}
