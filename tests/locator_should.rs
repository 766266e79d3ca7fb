use embed_proxy::ProxyProfile;
use embed_proxy::server::services::IframeLocator;
use regex::Regex;

fn default_locator() -> IframeLocator {
    IframeLocator::from_profile(&ProxyProfile::default()).unwrap()
}

#[test]
fn test_returns_iframe_src_verbatim() {
    let html = r#"<html><body>
        <div class="player"><iframe width="100%" src="https://host.test/embed-x.html?v=2" allowfullscreen></iframe></div>
    </body></html>"#;

    assert_eq!(
        default_locator().locate(html).as_deref(),
        Some("https://host.test/embed-x.html?v=2")
    );
}

#[test]
fn test_skips_iframes_without_src() {
    let html = r#"<iframe name="empty"></iframe><iframe src="/first.html"></iframe><iframe src="/second.html"></iframe>"#;

    assert_eq!(default_locator().locate(html).as_deref(), Some("/first.html"));
}

#[test]
fn test_prefers_video_hosts_over_embed_pattern() {
    // no iframe element, the player is written in by script
    let html = r#"<script src="https://cdn.test/embed-lib.js"></script>
        <script>document.write('<div data-src="x"></div>');</script>
        <script src="https://miravd.com/v/abc123"></script>"#;

    assert_eq!(
        default_locator().locate(html).as_deref(),
        Some("https://miravd.com/v/abc123")
    );
}

#[test]
fn test_falls_back_to_embed_then_player() {
    let embed_and_player = r#"<img src="/img/player-logo.png"><script src='/static/embed.js'></script>"#;
    assert_eq!(
        default_locator().locate(embed_and_player).as_deref(),
        Some("/static/embed.js")
    );

    let player_only = r#"<img src="/img/player-logo.png"><img src="/img/cat.png">"#;
    assert_eq!(
        default_locator().locate(player_only).as_deref(),
        Some("/img/player-logo.png")
    );
}

#[test]
fn test_returns_none_when_nothing_matches() {
    let html = r#"<html><head><title>nothing</title></head><body><img src="/cat.png"><p>hello</p></body></html>"#;

    assert_eq!(default_locator().locate(html), None);
    assert_eq!(default_locator().locate(""), None);
}

#[test]
fn test_uses_custom_matchers_in_order() {
    let locator = IframeLocator::new(vec![
        Regex::new(r#"data-video="([^"]+)""#).unwrap(),
        Regex::new(r#"https://fallback\.test/\w+"#).unwrap(),
    ]);

    assert_eq!(
        locator
            .locate(r#"<div data-video="https://v.test/1"></div> https://fallback.test/abc"#)
            .as_deref(),
        Some("https://v.test/1")
    );

    // no capture group, the whole match is used
    assert_eq!(
        locator.locate("see https://fallback.test/abc").as_deref(),
        Some("https://fallback.test/abc")
    );
}

#[test]
fn test_rejects_bad_profile_patterns() {
    let mut profile = ProxyProfile::default();
    profile.locator.extra_patterns.push("src=(unclosed".to_string());

    assert!(IframeLocator::from_profile(&profile).is_err());
}
