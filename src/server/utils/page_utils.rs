// landing and error pages, kept deliberately plain
use crate::{profile::ProxyProfile, server::utils::html_utils::escape_html};

const PAGE_STYLE: &str = r#"
        body {
            font-family: Arial, sans-serif; background: #1d1f2b; color: #f2f2f2;
            text-align: center; padding: 50px; margin: 0;
        }
        .card {
            background: rgba(0,0,0,0.6); padding: 40px; border-radius: 12px;
            display: inline-block; max-width: 760px; text-align: left;
        }
        .btn {
            background: #4caf50; color: white; padding: 10px 22px; margin: 6px 0;
            border-radius: 6px; text-decoration: none; display: inline-block;
        }
        code { background: rgba(255,255,255,0.1); padding: 2px 6px; border-radius: 4px; }
"#;

fn sample_links(profile: &ProxyProfile) -> String {
    (1..=3)
        .map(|server| {
            let target = profile.embed_url(&server.to_string(), "193981", "1");
            format!(
                "<a class=\"btn\" href=\"/video?url={}\">Server {}</a><br>\n",
                urlencoding::encode(&target),
                server
            )
        })
        .collect()
}

pub fn landing_page(profile: &ProxyProfile, port: u16) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Embed Proxy</title>
    <style>{style}</style>
</head>
<body>
    <div class="card">
        <h1>Embed Proxy</h1>
        <p>Fetches an embed page, follows its player iframe and serves it without the ad and
        adblock detection scripts.</p>
        <h3>Usage</h3>
        <ul>
            <li><code>/video?url=EMBED_URL</code></li>
            <li><code>/embed/SERVER/ID/EPISODE/</code></li>
            <li><code>/proxy?url=ANY_URL</code></li>
            <li><code>header_Name_Here=value</code> adds <code>Name-Here: value</code> to the
            upstream request</li>
        </ul>
        <h3>Samples</h3>
        {samples}
        <p><small>listening on port {port}</small></p>
    </div>
</body>
</html>"#,
        style = PAGE_STYLE,
        samples = sample_links(profile),
        port = port,
    )
}

pub fn error_page(message: &str, requested_url: Option<&str>, profile: &ProxyProfile) -> String {
    let requested = requested_url.unwrap_or("none given");
    let retry = match requested_url {
        Some(url) => format!(
            "<a class=\"btn\" href=\"/video?url={}\">Retry</a>",
            urlencoding::encode(url)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Video Proxy Error</title>
    <style>{style}</style>
</head>
<body>
    <div class="card">
        <h2>Video Proxy Error</h2>
        <p><strong>Error:</strong> {message}</p>
        <p><strong>URL:</strong> {url}</p>
        {retry}
        <h3>Try these instead</h3>
        {samples}
    </div>
</body>
</html>"#,
        style = PAGE_STYLE,
        message = escape_html(message),
        url = escape_html(requested),
        retry = retry,
        samples = sample_links(profile),
    )
}
