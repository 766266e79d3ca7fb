// the block that gets dropped into every rewritten page. rendered once at startup, the rewriter
// only ever copies the finished string
use serde_json::json;

use crate::{
    profile::{DenyList, InjectionSettings},
    server::utils::html_utils::{escape_for_raw_text, escape_html},
};

/// attribute carried by the injected bypass script, one per rewritten page
pub const INJECTION_MARKER: &str = r#"data-embed-proxy="bypass""#;

const STYLE_TEMPLATE: &str = r#"<style data-embed-proxy="style">
__BANNER__ {
    display: none !important;
    visibility: hidden !important;
    opacity: 0 !important;
    height: 0 !important;
    overflow: hidden !important;
}
#__PLAYER__, .jwplayer, video {
    display: block !important;
    visibility: visible !important;
    opacity: 1 !important;
    z-index: 9999 !important;
}
html, body {
    margin: 0 !important;
    padding: 0 !important;
    width: 100% !important;
    height: 100% !important;
    background: #000 !important;
    overflow: hidden !important;
}
#__PLAYER__, .Video, iframe, video {
    width: 100vw !important;
    height: 100vh !important;
    border: none !important;
    position: relative !important;
}
video {
    object-fit: contain !important;
    background: #000 !important;
}
.social-box, .copy, a[href*="premium.html"] {
    display: none !important;
}
</style>"#;

const SCRIPT_TEMPLATE: &str = r#"<script data-embed-proxy="bypass">
(function () {
    var cfg = __CONFIG__;

    if (window.jwplayer && cfg.jwplayerKey) {
        try { window.jwplayer.key = cfg.jwplayerKey; } catch (e) {}
    }

    ["adblock", "adb", "AdBlock", "adBlockEnabled", "adBlockDetected"].forEach(function (flag) {
        window[flag] = false;
    });
    window.checkAdb = function () { return false; };
    window.detectAdBlock = function () { return false; };
    window.showAdbMessage = function () {};

    function plantDecoys() {
        if (!document.body) {
            setTimeout(plantDecoys, 100);
            return;
        }
        var box = document.createElement("div");
        box.className = "adsbox";
        box.style.cssText = "position:absolute;left:-9999px;width:1px;height:1px;";
        box.innerHTML = "advertisement";
        document.body.appendChild(box);

        var slot = document.createElement("div");
        slot.id = "ads";
        slot.style.display = "none";
        document.body.appendChild(slot);
    }
    plantDecoys();

    window.open = function () {
        return { close: function () {}, focus: function () {} };
    };

    var originalFetch = window.fetch;
    if (originalFetch) {
        window.fetch = function (input) {
            var target = typeof input === "string" ? input : (input && input.url) || "";
            for (var i = 0; i < cfg.blockedHosts.length; i++) {
                if (target.indexOf(cfg.blockedHosts[i]) !== -1) {
                    return Promise.reject(new Error("blocked"));
                }
            }
            return originalFetch.apply(this, arguments);
        };
    }

    function hideBanners() {
        if (!document.body) return;
        var banner = document.querySelector(cfg.bannerSelector);
        if (banner) banner.style.display = "none";
        document.querySelectorAll(cfg.overlaySelector).forEach(function (el) {
            if (el.textContent && el.textContent.toLowerCase().indexOf(cfg.overlayKeyword) !== -1) {
                el.style.display = "none";
            }
        });
    }

    var playerHooked = false;
    function showPlayer() {
        if (!document.body) return;
        var player = document.getElementById(cfg.playerId);
        if (!player) return;
        player.style.cssText = "display:block!important;visibility:visible!important;opacity:1!important;";
        if (playerHooked || !window.jwplayer) return;
        try {
            var jwp = window.jwplayer(cfg.playerId);
            if (jwp && jwp.getState) {
                playerHooked = true;
                jwp.on("ready", function () {
                    setTimeout(function () { jwp.play(); }, 1000);
                });
            }
        } catch (e) {}
    }

    hideBanners();
    showPlayer();
    setInterval(hideBanners, cfg.bannerPollMs);
    setInterval(showPlayer, cfg.playerPollMs);

    setTimeout(function () {
        cfg.pageCookies.forEach(function (c) {
            document.cookie = c[0] + "=" + c[1] + "; path=/";
        });
    }, 1000);

    function setJqueryCookies() {
        if (window.$ && window.$.cookie) {
            try {
                cfg.jqueryCookies.forEach(function (c) {
                    window.$.cookie(c[0], c[1], { expires: 10 });
                });
            } catch (e) {}
        } else {
            setTimeout(setJqueryCookies, 500);
        }
    }
    if (cfg.jqueryCookies.length) setJqueryCookies();
})();
</script>"#;

/// style, cdn scripts and the bypass script, in that order
pub fn render_injection(settings: &InjectionSettings, deny_list: &DenyList) -> String {
    let style = STYLE_TEMPLATE
        .replace("__BANNER__", &escape_for_raw_text(&settings.banner_selector))
        .replace("__PLAYER__", &escape_for_raw_text(&settings.player_id));

    let cdn_scripts: String = settings
        .cdn_scripts
        .iter()
        .map(|src| format!("<script src=\"{}\"></script>\n", escape_html(src)))
        .collect();

    let config = json!({
        "jwplayerKey": settings.jwplayer_key,
        "playerId": settings.player_id,
        "bannerSelector": settings.banner_selector,
        "overlaySelector": settings.overlay_selector,
        "overlayKeyword": settings.overlay_keyword.to_lowercase(),
        "bannerPollMs": settings.banner_poll_ms,
        "playerPollMs": settings.player_poll_ms,
        "blockedHosts": deny_list.domains,
        "pageCookies": settings.page_cookies,
        "jqueryCookies": settings.jquery_cookies,
    });

    // denied domains must never show up verbatim in a rewritten page, the browser decodes the
    // escaped dots back before the fetch wrapper compares
    let mut config = escape_for_raw_text(&config.to_string());
    for domain in &deny_list.domains {
        if domain.is_empty() {
            continue;
        }
        config = config.replace(domain.as_str(), &domain.replace('.', "\\u002e"));
    }

    let script = SCRIPT_TEMPLATE.replace("__CONFIG__", &config);

    format!("{}\n{}{}\n", style, cdn_scripts, script)
}
