use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

pub type AppResult<T> = Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing required query parameter: {0}")]
    MissingParameter(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("network error while fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("timed out after {seconds}s while fetching {url}")]
    Timeout { url: String, seconds: u64 },

    #[error("upstream returned HTTP {status} for {url}")]
    Upstream { url: String, status: u16 },

    #[error("response from {url} exceeded the {limit} byte limit")]
    BodyTooLarge { url: String, limit: usize },

    #[error("{0}")]
    InternalServerErrorWithContext(String),

    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingParameter(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Network { .. }
            | Error::Timeout { .. }
            | Error::Upstream { .. }
            | Error::BodyTooLarge { .. }
            | Error::InternalServerErrorWithContext(_)
            | Error::AnyhowError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
