// built in tables for the 3isk.onl deployment, a json profile can replace any of these
use super::model::{
    BannerText, CookiePolicy, DenyList, DeploymentSettings, GuardedMarker, HeaderProfile,
    InjectionSettings, LocatorPatterns, ProxyProfile, ResourceFixes, ScriptPin,
};

const PORTAL_ORIGIN: &str = "https://3isk.onl";

const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const JQUERY_CDN: &str = "https://cdnjs.cloudflare.com/ajax/libs/jquery/3.6.0/jquery.min.js";
const JQUERY_COOKIE_CDN: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/jquery-cookie/1.4.1/jquery.cookie.min.js";
const JWPLAYER_CDN: &str = "https://cdnjs.cloudflare.com/ajax/libs/jwplayer/8.24.0/jwplayer.js";

const CLEARANCE_PREFIX: &str = "ZYvGjWD614gjjWzzaHcAcgTwSH0CNtIjnamT..CIhso";
const CLEARANCE_SUFFIX: &str = "1.2.1.1-PuAT98NFZLgoUfLXNMtOem5MWcbsPS9a_UM41_nzNHoT70td41BfST4dZXpJm_5SFx_bRKahIshzCJ3ShnyRbJ0SgEk8mcDFL18cfb6Mch4V1hONV0wlHCKhHVqH7VU4IU30hwtdhZdeXQuu2__ffCzuVPgF7UUfHKtP.He0ntIkroHkt6GUvUmoSnmZ6bJBdw14Y5yiYiF.NCcLwDOFVgRz.mKGGVVNXvWF1fXMwwszaqEEGEfwa9CE9MuNoHJBRtcnpvD.ls0hJaKZwO5P.6ZhGeFJrGQgvydUzY1IzQnL0pbiF5ZMq81H_qzDx.reodNgne9whLX9Feu81ox2pOf6JGJyEVSlgCbB64aLPBg";

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ProxyProfile {
    fn default() -> Self {
        Self {
            portal_origin: PORTAL_ORIGIN.to_string(),
            referer: format!("{}/", PORTAL_ORIGIN),
            header_profile: HeaderProfile::default(),
            cookie_policy: CookiePolicy::default(),
            deny_list: DenyList::default(),
            resource_fixes: ResourceFixes::default(),
            locator: LocatorPatterns::default(),
            injection: InjectionSettings::default(),
            deployment: DeploymentSettings::default(),
        }
    }
}

impl Default for HeaderProfile {
    fn default() -> Self {
        // br is left out on purpose, only gzip/deflate/zstd get decoded on our side
        Self {
            headers: pairs(&[
                (
                    "sec-ch-ua",
                    "\"Google Chrome\";v=\"131\", \"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\"",
                ),
                ("sec-ch-ua-mobile", "?0"),
                ("sec-ch-ua-platform", "\"macOS\""),
                ("Upgrade-Insecure-Requests", "1"),
                ("User-Agent", CHROME_USER_AGENT),
                (
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
                ),
                ("Sec-Fetch-Site", "cross-site"),
                ("Sec-Fetch-Mode", "navigate"),
                ("Sec-Fetch-Dest", "iframe"),
                ("Accept-Encoding", "gzip, deflate, zstd"),
                ("Accept-Language", "en-GB,en-US;q=0.9,en;q=0.8,ar;q=0.7"),
            ]),
        }
    }
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            video_hosts: strings(&[
                "miravd.com",
                "mwdy.cc",
                "vidroba.com",
                "streamtape.com",
                "doodstream.com",
                "streamwish.com",
            ]),
            clearance_prefix: CLEARANCE_PREFIX.to_string(),
            clearance_suffix: CLEARANCE_SUFFIX.to_string(),
            flags: pairs(&[("adb_detection", "false"), ("legitimate_user", "true")]),
        }
    }
}

impl Default for DenyList {
    fn default() -> Self {
        Self {
            domains: strings(&[
                "bvtpk.com",
                "pteefoagha.com",
                "ccg90.com",
                "rtmark.net",
                "tzegilo.com",
            ]),
            challenge_paths: strings(&["/cdn-cgi/", "challenge-platform"]),
            inline_markers: strings(&["popunder"]),
            guarded_markers: vec![GuardedMarker {
                marker: "adb".to_string(),
                unless: "jwplayer".to_string(),
            }],
            banner_selectors: strings(&["#adbd"]),
            banner_texts: vec![BannerText {
                selector: ".overdiv".to_string(),
                text: "Disable ADBlock".to_string(),
            }],
        }
    }
}

impl Default for ResourceFixes {
    fn default() -> Self {
        Self {
            broken_css_prefixes: strings(&["/css/"]),
            broken_script_prefixes: strings(&["/js/"]),
            script_pins: vec![
                ScriptPin {
                    path_prefix: "/js/".to_string(),
                    needle: "jquery.min.js".to_string(),
                    cdn_url: JQUERY_CDN.to_string(),
                },
                ScriptPin {
                    path_prefix: "/js/".to_string(),
                    needle: "jquery.cookie.js".to_string(),
                    cdn_url: JQUERY_COOKIE_CDN.to_string(),
                },
                ScriptPin {
                    path_prefix: "/player/jw8/".to_string(),
                    needle: "jwplayer.js".to_string(),
                    cdn_url: JWPLAYER_CDN.to_string(),
                },
            ],
        }
    }
}

impl Default for LocatorPatterns {
    fn default() -> Self {
        Self {
            extra_patterns: strings(&[
                r#"src=["']([^"']*embed[^"']*)["']"#,
                r#"src=["']([^"']*player[^"']*)["']"#,
            ]),
        }
    }
}

impl Default for InjectionSettings {
    fn default() -> Self {
        Self {
            cdn_scripts: strings(&[JQUERY_CDN, JQUERY_COOKIE_CDN, JWPLAYER_CDN]),
            jwplayer_key: "ITWMv7t88JGzI0xPwW8I0+LveiXX9SWbfdmt0ArUSyc=".to_string(),
            player_id: "vplayer".to_string(),
            banner_selector: "#adbd".to_string(),
            overlay_selector: ".overdiv".to_string(),
            overlay_keyword: "disable".to_string(),
            banner_poll_ms: 1000,
            player_poll_ms: 3000,
            page_cookies: pairs(&[
                ("adb_detection", "false"),
                ("legitimate_user", "true"),
                ("popunder_shown", "true"),
            ]),
            jquery_cookies: pairs(&[
                ("file_id", "386532"),
                ("aff", "20"),
                ("ref_url", "3isk.onl"),
            ]),
        }
    }
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            accept_status_below: 400,
            frame_options: "SAMEORIGIN".to_string(),
            embed_url_template: format!("{}/embed/{{server}}/{{id}}/{{episode}}/", PORTAL_ORIGIN),
            default_video_url: Some(format!("{}/embed/1/193981/1/", PORTAL_ORIGIN)),
        }
    }
}
