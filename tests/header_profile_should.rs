use embed_proxy::ProxyProfile;
use reqwest::header::{COOKIE, REFERER, USER_AGENT};

const NOW: i64 = 1_700_000_000;

fn overrides(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn build_for(host: &str, extra: &[(String, String)]) -> reqwest::header::HeaderMap {
    let profile = ProxyProfile::default();
    profile
        .header_profile
        .build(host, &profile.referer, &profile.cookie_policy, extra, NOW)
        .unwrap()
}

#[test]
fn test_sends_clearance_cookie_to_video_hosts() {
    let headers = build_for("www.miravd.com", &[]);
    let cookie = headers.get(COOKIE).unwrap().to_str().unwrap();

    assert!(cookie.starts_with("cf_clearance="));
    assert!(cookie.contains("-1700000000-"));
    assert!(cookie.contains("adb_detection=false"));
    assert!(cookie.contains("legitimate_user=true"));
}

#[test]
fn test_skips_cookie_for_other_hosts() {
    let headers = build_for("3isk.onl", &[]);

    assert!(headers.get(COOKIE).is_none());
    assert_eq!(headers.get(REFERER).unwrap(), "https://3isk.onl/");
    assert!(
        headers
            .get(USER_AGENT)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("Chrome/131")
    );
}

#[test]
fn test_overrides_win_over_every_default() {
    let extra = overrides(&[
        ("User-Agent", "curl/8.0"),
        ("Referer", "https://elsewhere.test/"),
        ("Cookie", "session=abc"),
        ("X-Extra", "1"),
    ]);
    let headers = build_for("streamtape.com", &extra);

    assert_eq!(headers.get(USER_AGENT).unwrap(), "curl/8.0");
    assert_eq!(headers.get(REFERER).unwrap(), "https://elsewhere.test/");
    assert_eq!(headers.get(COOKIE).unwrap(), "session=abc");
    assert_eq!(headers.get("x-extra").unwrap(), "1");
    assert_eq!(headers.get_all(USER_AGENT).iter().count(), 1);
}

#[test]
fn test_leaves_the_profile_untouched() {
    let profile = ProxyProfile::default();
    let before = profile.header_profile.headers.clone();

    let _ = profile.header_profile.build(
        "miravd.com",
        &profile.referer,
        &profile.cookie_policy,
        &overrides(&[("User-Agent", "curl/8.0")]),
        NOW,
    );

    assert_eq!(profile.header_profile.headers, before);
}

#[test]
fn test_rejects_bad_override_headers() {
    let profile = ProxyProfile::default();

    let result = profile.header_profile.build(
        "miravd.com",
        &profile.referer,
        &profile.cookie_policy,
        &overrides(&[("Bad Header", "x")]),
        NOW,
    );

    assert!(result.is_err());
}

#[test]
fn test_fills_the_embed_template() {
    let profile = ProxyProfile::default();

    assert_eq!(
        profile.embed_url("1", "193981", "2"),
        "https://3isk.onl/embed/1/193981/2/"
    );
}

#[test]
fn test_loads_partial_profiles_over_the_defaults() {
    let path = std::env::temp_dir().join(format!("embed-proxy-profile-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{ "deployment": { "accept_status_below": 500, "frame_options": "ALLOWALL" } }"#,
    )
    .unwrap();

    let profile = ProxyProfile::load(Some(&path)).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(profile.deployment.accept_status_below, 500);
    assert_eq!(profile.deployment.frame_options, "ALLOWALL");
    assert_eq!(
        profile.deployment.embed_url_template,
        "https://3isk.onl/embed/{server}/{id}/{episode}/"
    );
    assert_eq!(profile.deny_list.domains.len(), 5);
}

#[test]
fn test_rejects_invalid_profiles() {
    let mut profile = ProxyProfile::default();
    profile
        .header_profile
        .headers
        .push(("Bad Header".to_string(), "x".to_string()));
    assert!(profile.validate().is_err());

    let mut profile = ProxyProfile::default();
    profile.deployment.embed_url_template = "https://3isk.onl/embed/".to_string();
    assert!(profile.validate().is_err());

    assert!(ProxyProfile::load(None).is_ok());
}

#[test]
fn test_matches_the_deny_list() {
    let deny = ProxyProfile::default().deny_list;

    assert!(deny.src_denied("https://bvtpk.com/pop.js"));
    assert!(deny.src_denied("/cdn-cgi/challenge-platform/h/b/orchestrate.js"));
    assert!(!deny.src_denied("https://cdnjs.cloudflare.com/ajax/libs/jquery/3.6.0/jquery.min.js"));

    assert!(deny.inline_denied("var z = 'rtmark.net';"));
    assert!(deny.inline_denied("function popunder() {}"));
    assert!(deny.inline_denied("if (adb) { wall(); }"));
    assert!(!deny.inline_denied("jwplayer('vplayer').setup({ adb: false });"));
    assert!(!deny.inline_denied("console.log('hello');"));
}
