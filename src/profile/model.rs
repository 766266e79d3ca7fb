use anyhow::{Context, anyhow};
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, REFERER};
use serde::{Deserialize, Serialize};

/// everything that differs between deployments of the proxy lives in here
///
/// built once at startup (compiled in defaults or a json file) and then only ever read. the
/// fetcher, locator and rewriter all take their tables from this so none of them hardcode the
/// literal values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyProfile {
    pub portal_origin: String,
    pub referer: String,
    pub header_profile: HeaderProfile,
    pub cookie_policy: CookiePolicy,
    pub deny_list: DenyList,
    pub resource_fixes: ResourceFixes,
    pub locator: LocatorPatterns,
    pub injection: InjectionSettings,
    pub deployment: DeploymentSettings,
}

/// spoofed browser fingerprint, kept ordered so the outbound request looks like the browser it
/// copies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderProfile {
    pub headers: Vec<(String, String)>,
}

/// fake clearance cookie sent to known video hosts
///
/// this is NOT a solved challenge, the token never rotates and only the timestamp changes. it's
/// kept because the hosts sometimes let it through, nothing should depend on it working
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookiePolicy {
    pub video_hosts: Vec<String>,
    pub clearance_prefix: String,
    pub clearance_suffix: String,
    pub flags: Vec<(String, String)>,
}

/// fixed strings that mark ad, analytics, challenge and adblock detection markup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DenyList {
    /// matched against every attribute value and the bodies of script, style and noscript
    pub domains: Vec<String>,
    /// cloudflare challenge scripts, script src only
    pub challenge_paths: Vec<String>,
    /// inline script bodies only
    pub inline_markers: Vec<String>,
    pub guarded_markers: Vec<GuardedMarker>,
    /// removed no matter what they contain
    pub banner_selectors: Vec<String>,
    pub banner_texts: Vec<BannerText>,
}

/// `marker` denies an inline script unless the script also mentions `unless`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardedMarker {
    pub marker: String,
    pub unless: String,
}

/// elements matching `selector` get removed when their text contains `text`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerText {
    pub selector: String,
    pub text: String,
}

/// first party resources that 404 once the page is served from somewhere else
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceFixes {
    pub broken_css_prefixes: Vec<String>,
    pub broken_script_prefixes: Vec<String>,
    pub script_pins: Vec<ScriptPin>,
}

/// a script whose src starts with `path_prefix` and contains `needle` gets swapped for `cdn_url`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptPin {
    pub path_prefix: String,
    pub needle: String,
    pub cdn_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorPatterns {
    /// tried in order after the video host pattern, each needs one capture group
    pub extra_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionSettings {
    pub cdn_scripts: Vec<String>,
    pub jwplayer_key: String,
    pub player_id: String,
    pub banner_selector: String,
    pub overlay_selector: String,
    pub overlay_keyword: String,
    pub banner_poll_ms: u64,
    pub player_poll_ms: u64,
    pub page_cookies: Vec<(String, String)>,
    pub jquery_cookies: Vec<(String, String)>,
}

/// the knobs the old per-site copies of the proxy disagreed on
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentSettings {
    /// upstream statuses at or above this are failures (400 or 500 depending on the site)
    pub accept_status_below: u16,
    pub frame_options: String,
    /// `{server}`, `{id}` and `{episode}` are filled from the /embed path
    pub embed_url_template: String,
    pub default_video_url: Option<String>,
}

impl ProxyProfile {
    /// checks the parts that would otherwise only blow up mid request
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in &self.header_profile.headers {
            HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid header name in profile: {}", name))?;
            HeaderValue::from_str(value)
                .with_context(|| format!("invalid value for profile header {}", name))?;
        }

        HeaderValue::from_str(&self.referer).context("invalid referer in profile")?;
        HeaderValue::from_str(&self.cookie_policy.cookie_value(0))
            .context("invalid cookie policy in profile")?;

        if !self.deployment.embed_url_template.contains("{id}") {
            return Err(anyhow!(
                "embed_url_template must contain an {{id}} placeholder"
            ));
        }

        Ok(())
    }

    pub fn embed_url(&self, server: &str, id: &str, episode: &str) -> String {
        self.deployment
            .embed_url_template
            .replace("{server}", server)
            .replace("{id}", id)
            .replace("{episode}", episode)
    }
}

impl HeaderProfile {
    /// builds the outbound header set for one fetch
    ///
    /// order of precedence, last one wins: fixed profile, referer, clearance cookie, caller
    /// overrides. the profile itself is never touched
    pub fn build(
        &self,
        host: &str,
        referer: &str,
        cookie_policy: &CookiePolicy,
        overrides: &[(String, String)],
        now: i64,
    ) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(self.headers.len() + overrides.len() + 2);

        for (name, value) in &self.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        headers.insert(REFERER, HeaderValue::from_str(referer)?);

        if cookie_policy.applies_to(host) {
            headers.insert(COOKIE, HeaderValue::from_str(&cookie_policy.cookie_value(now))?);
        }

        for (name, value) in overrides {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("invalid header name: {}", name))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("invalid value for header {}", name))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

impl CookiePolicy {
    pub fn applies_to(&self, host: &str) -> bool {
        self.video_hosts.iter().any(|vh| host.contains(vh.as_str()))
    }

    pub fn cookie_value(&self, now: i64) -> String {
        let mut cookie = format!(
            "cf_clearance={}-{}-{}",
            self.clearance_prefix, now, self.clearance_suffix
        );
        for (name, value) in &self.flags {
            cookie.push_str("; ");
            cookie.push_str(name);
            cookie.push('=');
            cookie.push_str(value);
        }
        cookie
    }
}

impl DenyList {
    pub fn src_denied(&self, src: &str) -> bool {
        self.domains
            .iter()
            .chain(self.challenge_paths.iter())
            .any(|needle| !needle.is_empty() && src.contains(needle.as_str()))
    }

    pub fn domain_denied(&self, text: &str) -> bool {
        self.domains
            .iter()
            .any(|domain| !domain.is_empty() && text.contains(domain.as_str()))
    }

    pub fn inline_denied(&self, text: &str) -> bool {
        self.domain_denied(text)
            || self
                .inline_markers
                .iter()
                .any(|needle| !needle.is_empty() && text.contains(needle.as_str()))
            || self.guarded_markers.iter().any(|guarded| {
                !guarded.marker.is_empty()
                    && text.contains(guarded.marker.as_str())
                    && !text.contains(guarded.unless.as_str())
            })
    }
}
