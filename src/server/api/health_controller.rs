use axum::Extension;
use axum::Json;
use chrono::Utc;

use crate::logger::environment_name;
use crate::server::dtos::health_dto::{HealthResponse, HealthStatus};
use crate::server::services::AppServices;
use crate::server::{get_app_version, get_uptime_seconds};

/// nothing is stateful so the only thing to report is that the process answers
pub async fn health_endpoint(Extension(services): Extension<AppServices>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        timestamp: Utc::now(),
        uptime_seconds: get_uptime_seconds(),
        version: get_app_version().to_string(),
        environment: environment_name(services.config.cargo_env).to_string(),
    })
}
