use axum::Extension;
use axum::response::Html;

use crate::server::services::AppServices;
use crate::server::utils::page_utils::landing_page;

pub async fn landing_endpoint(Extension(services): Extension<AppServices>) -> Html<String> {
    Html(landing_page(&services.profile, services.config.port))
}
