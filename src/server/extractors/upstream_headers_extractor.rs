use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::{debug, error};

use crate::server::error::{AppResult, Error};

const HEADER_PARAM_PREFIX: &str = "header_";

/// caller supplied outbound headers, `?header_X_Requested_With=v` becomes `X-Requested-With: v`
///
/// these get merged over the browser profile by the fetcher, so a caller can replace any of the
/// spoofed values (cookie included)
pub struct UpstreamHeaders(pub Vec<(String, String)>);

pub fn parse_header_params(pairs: Vec<(String, String)>) -> AppResult<Vec<(String, String)>> {
    let mut headers = Vec::new();

    for (key, value) in pairs {
        let Some(raw_name) = key.strip_prefix(HEADER_PARAM_PREFIX) else {
            continue;
        };
        let name = raw_name.replace('_', "-");

        if name.is_empty() || HeaderName::from_bytes(name.as_bytes()).is_err() {
            error!("rejecting header override with invalid name: {}", key);
            return Err(Error::BadRequest(format!("invalid header parameter: {}", key)));
        }
        if HeaderValue::from_str(&value).is_err() {
            error!("rejecting header override with invalid value for {}", name);
            return Err(Error::BadRequest(format!("invalid value for header {}", name)));
        }

        headers.push((name, value));
    }

    Ok(headers)
}

impl<S> FromRequestParts<S> for UpstreamHeaders
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs): Query<Vec<(String, String)>> =
            Query::from_request_parts(parts, state)
                .await
                .map_err(|e| Error::BadRequest(e.to_string()))?;

        let headers = parse_header_params(pairs)?;
        if !headers.is_empty() {
            debug!("{} caller header override(s)", headers.len());
        }

        Ok(UpstreamHeaders(headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn translates_underscores_to_dashes() {
        let headers = parse_header_params(vec![
            pair("url", "https://site.test/"),
            pair("header_X_Requested_With", "XMLHttpRequest"),
            pair("header_Referer", "https://other.test/"),
        ])
        .unwrap();

        assert_eq!(
            headers,
            vec![
                pair("X-Requested-With", "XMLHttpRequest"),
                pair("Referer", "https://other.test/"),
            ]
        );
    }

    #[test]
    fn rejects_bad_header_names() {
        let result = parse_header_params(vec![pair("header_", "x")]);
        assert!(matches!(result, Err(Error::BadRequest(_))));

        let result = parse_header_params(vec![pair("header_bad name", "x")]);
        assert!(matches!(result, Err(Error::BadRequest(_))));
    }
}
