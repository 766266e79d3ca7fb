use std::sync::Arc;

use tracing::{error, info, warn};

use crate::server::{
    error::{AppResult, Error},
    services::{
        fetch_services::DynFetchService, locator_services::IframeLocator,
        rewrite_services::PageRewriter,
    },
};

/// what the generic proxy hands back
#[derive(Debug)]
pub enum ProxiedContent {
    Html(String),
    Passthrough {
        content_type: Option<String>,
        body: Vec<u8>,
    },
}

/// fetch -> locate -> fetch iframe -> rewrite
///
/// every stage is strictly sequential and a failure anywhere aborts the whole request, nothing is
/// retried
#[derive(Clone)]
pub struct VideoPipeline {
    fetcher: DynFetchService,
    locator: Arc<IframeLocator>,
    rewriter: Arc<PageRewriter>,
}

impl VideoPipeline {
    pub fn new(
        fetcher: DynFetchService,
        locator: Arc<IframeLocator>,
        rewriter: Arc<PageRewriter>,
    ) -> Self {
        Self {
            fetcher,
            locator,
            rewriter,
        }
    }

    pub async fn run(&self, url: &str, overrides: &[(String, String)]) -> AppResult<String> {
        info!("processing video request for {}", url);

        let main = self.fetcher.fetch(url, overrides).await?;
        let main_html = main.text();

        // an empty src is no iframe, resolving it would just fetch the main page again
        let located = self
            .locator
            .locate(&main_html)
            .filter(|found| !found.trim().is_empty());

        let content = match located {
            Some(found) => {
                let iframe_url = Self::resolve(&main.final_url, &found)?;
                info!("found iframe, fetching {}", iframe_url);
                self.fetcher.fetch(&iframe_url, overrides).await?.text()
            }
            None => {
                warn!("no iframe found in {}, serving the main page", url);
                main_html
            }
        };

        Ok(self.rewriter.rewrite(&content))
    }

    /// single fetch, html gets rewritten and anything else goes back untouched
    pub async fn proxy(
        &self,
        url: &str,
        overrides: &[(String, String)],
    ) -> AppResult<ProxiedContent> {
        let fetched = self.fetcher.fetch(url, overrides).await?;

        if fetched.is_html() {
            info!("rewriting html from {}", fetched.final_url);
            Ok(ProxiedContent::Html(self.rewriter.rewrite(&fetched.text())))
        } else {
            info!(
                "passing through {} bytes of {:?} from {}",
                fetched.body.len(),
                fetched.content_type,
                fetched.final_url
            );
            Ok(ProxiedContent::Passthrough {
                content_type: fetched.content_type,
                body: fetched.body,
            })
        }
    }

    /// iframe srcs are often relative or protocol relative, they get resolved against wherever
    /// the main page ended up after redirects
    pub fn resolve(base: &str, found: &str) -> AppResult<String> {
        let joined = match url::Url::parse(base) {
            Ok(base) => base.join(found.trim()),
            Err(_) => url::Url::parse(found.trim()),
        };

        joined.map(|u| u.to_string()).map_err(|e| {
            error!("failed to resolve iframe url {} against {}: {}", found, base, e);
            Error::InternalServerErrorWithContext(format!("invalid iframe url {}: {}", found, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_iframe_urls() {
        assert_eq!(
            VideoPipeline::resolve("https://site.test/embed/1/2/3/", "/player.html?id=4").unwrap(),
            "https://site.test/player.html?id=4"
        );
        assert_eq!(
            VideoPipeline::resolve("https://site.test/embed/", "//cdn.test/e.html").unwrap(),
            "https://cdn.test/e.html"
        );
        assert_eq!(
            VideoPipeline::resolve("https://site.test/", "https://host.test/embed-x.html").unwrap(),
            "https://host.test/embed-x.html"
        );
    }
}
