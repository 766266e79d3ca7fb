use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use mockall::automock;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use tracing::{debug, error, info};

use crate::{
    config::AppConfig,
    profile::ProxyProfile,
    server::{
        error::{AppResult, Error},
        utils::decompress_utils::ContentEncoding,
    },
};

pub type DynFetchService = Arc<dyn FetchServiceTrait + Send + Sync>;

/// one upstream response, lives for a single request
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub final_url: String,
    pub content_type: Option<String>,
}

impl FetchResult {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// trusts the content type when there is one, otherwise sniffs the start of the body
    pub fn is_html(&self) -> bool {
        match self.content_type.as_deref() {
            Some(content_type) => {
                let content_type = content_type.to_ascii_lowercase();
                content_type.contains("text/html") || content_type.contains("application/xhtml")
            }
            None => {
                let head: String = String::from_utf8_lossy(&self.body[..self.body.len().min(256)])
                    .trim_start()
                    .to_ascii_lowercase();
                head.starts_with("<!doctype html") || head.starts_with("<html")
            }
        }
    }
}

#[automock]
#[async_trait]
pub trait FetchServiceTrait {
    /// GET `url` with the browser header profile, `overrides` win over every default header
    async fn fetch(&self, url: &str, overrides: &[(String, String)]) -> AppResult<FetchResult>;
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub max_redirects: usize,
    pub max_body_bytes: usize,
    pub accept_status_below: u16,
}

impl FetchSettings {
    pub fn from_config(config: &AppConfig, profile: &ProxyProfile) -> Self {
        Self {
            timeout: Duration::from_secs(config.upstream_timeout_secs),
            max_redirects: config.max_redirects,
            max_body_bytes: config.max_body_bytes,
            accept_status_below: profile.deployment.accept_status_below,
        }
    }
}

pub struct FetchService {
    http: reqwest::Client,
    profile: Arc<ProxyProfile>,
    settings: FetchSettings,
}

impl FetchService {
    pub fn new(profile: Arc<ProxyProfile>, settings: FetchSettings) -> anyhow::Result<Self> {
        let http = Self::client_builder(&settings)
            .build()
            .context("failed to build upstream http client")?;

        Ok(Self::with_client(http, profile, settings))
    }

    /// timeout and redirect cap, headers are set per request from the profile
    pub fn client_builder(settings: &FetchSettings) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
    }

    pub fn with_client(
        http: reqwest::Client,
        profile: Arc<ProxyProfile>,
        settings: FetchSettings,
    ) -> Self {
        Self {
            http,
            profile,
            settings,
        }
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            error!("fetch of {} timed out", url);
            Error::Timeout {
                url: url.to_string(),
                seconds: self.settings.timeout.as_secs(),
            }
        } else {
            error!("fetch of {} failed: {}", url, e);
            Error::Network {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }

    fn too_large(&self, url: &str) -> Error {
        error!(
            "response from {} is over the {} byte limit",
            url, self.settings.max_body_bytes
        );
        Error::BodyTooLarge {
            url: url.to_string(),
            limit: self.settings.max_body_bytes,
        }
    }

    async fn read_body(&self, url: &str, mut response: reqwest::Response) -> AppResult<Vec<u8>> {
        let limit = self.settings.max_body_bytes;

        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(self.too_large(url));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(url, e))? {
            if body.len() + chunk.len() > limit {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

#[async_trait]
impl FetchServiceTrait for FetchService {
    async fn fetch(&self, url: &str, overrides: &[(String, String)]) -> AppResult<FetchResult> {
        let parsed = url::Url::parse(url).map_err(|e| {
            error!("refusing to fetch {}: {}", url, e);
            Error::BadRequest(format!("invalid url {}: {}", url, e))
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::BadRequest(format!(
                "only http and https urls can be proxied, got {}",
                url
            )));
        }

        let host = parsed.host_str().unwrap_or_default();
        let profile = &self.profile;

        let headers = profile
            .header_profile
            .build(
                host,
                &profile.referer,
                &profile.cookie_policy,
                overrides,
                chrono::Utc::now().timestamp(),
            )
            .map_err(|e| Error::BadRequest(format!("{:#}", e)))?;

        if profile.cookie_policy.applies_to(host) {
            debug!("using clearance cookie for {}", host);
        }

        info!("fetching {} (host: {})", url, host);

        let response = self
            .http
            .get(parsed)
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        debug!("{} answered with {}", url, status);

        if status.as_u16() >= self.settings.accept_status_below {
            error!("upstream {} returned {}", url, status);
            return Err(Error::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let encoding = ContentEncoding::from_header(
            response
                .headers()
                .get(CONTENT_ENCODING)
                .and_then(|v| v.to_str().ok()),
        );

        let raw = self.read_body(url, response).await?;
        let raw_len = raw.len();

        let body = encoding
            .decode(raw, self.settings.max_body_bytes)
            .map_err(|e| {
                error!("failed to decode {:?} body from {}: {}", encoding, url, e);
                Error::InternalServerErrorWithContext(format!(
                    "failed to decode {:?} response from {}",
                    encoding, url
                ))
            })?;

        if body.len() > self.settings.max_body_bytes {
            return Err(self.too_large(url));
        }

        debug!(
            "read {} bytes from {} ({} after decoding)",
            raw_len,
            final_url,
            body.len()
        );

        Ok(FetchResult {
            status_code: status.as_u16(),
            body,
            final_url,
            content_type,
        })
    }
}
