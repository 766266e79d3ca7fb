use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::profile::ProxyProfile;

static IFRAME_WITH_SRC: Lazy<Selector> =
    Lazy::new(|| Selector::parse("iframe[src]").expect("static selector should parse"));

/// finds the player iframe inside an embed page
///
/// the dom is checked first, the regex matchers only run when the page has no iframe element at
/// all (players that get written in by script still leave their url somewhere in the markup)
pub struct IframeLocator {
    matchers: Vec<Regex>,
}

impl IframeLocator {
    /// matchers are tried in order, the first capture group of the first hit wins
    pub fn new(matchers: Vec<Regex>) -> Self {
        Self { matchers }
    }

    /// video host pattern first, then the profile's extra patterns (embed, player)
    pub fn from_profile(profile: &ProxyProfile) -> anyhow::Result<Self> {
        let mut matchers = Vec::with_capacity(profile.locator.extra_patterns.len() + 1);

        let hosts = &profile.cookie_policy.video_hosts;
        if !hosts.is_empty() {
            let alternation = hosts
                .iter()
                .map(|host| regex::escape(host))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r#"src=["']([^"']*(?:{})[^"']*)["']"#, alternation);
            matchers.push(Regex::new(&pattern).context("failed to build video host pattern")?);
        }

        for pattern in &profile.locator.extra_patterns {
            matchers.push(
                Regex::new(pattern)
                    .with_context(|| format!("invalid locator pattern: {}", pattern))?,
            );
        }

        Ok(Self::new(matchers))
    }

    pub fn locate(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        if let Some(iframe) = document.select(&IFRAME_WITH_SRC).next() {
            let src = iframe.value().attr("src").unwrap_or_default().to_string();
            info!("found iframe element: {}", src);
            return Some(src);
        }

        for (index, matcher) in self.matchers.iter().enumerate() {
            if let Some(captures) = matcher.captures(html) {
                let Some(found) = captures.get(1).or_else(|| captures.get(0)) else {
                    continue;
                };
                info!("found iframe url with fallback pattern {}: {}", index, found.as_str());
                return Some(found.as_str().to_string());
            }
        }

        debug!("no iframe element and no fallback pattern matched");
        None
    }
}
