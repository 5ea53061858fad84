use crate::download::{Channel, DownloadView, PlatformDownload};
use crate::i18n::{Catalog, Locale};
use crate::platform::Platform;
use crate::resolver::ResolvedVersion;

const USER_DOCS_URL: &str = "https://cwdocs.rinlit.cn/about/";
const DEV_DOCS_URL: &str = "https://cwdocs.rinlit.cn/dev/";

/// Release tags and asset names come from the release API and are escaped;
/// catalog strings are trusted and may carry markup.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Query string that reproduces the page with one choice changed.
fn page_query(channel: Channel, use_proxy: bool, tab: Platform) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("version", channel.as_str())
        .append_pair("proxy", if use_proxy { "true" } else { "false" })
        .append_pair("tab", tab.hash())
        .finish()
}

fn format_header(locale: Locale, catalog: &Catalog, current_path: &str) -> String {
    let nav = [
        (locale.localized_path("/"), catalog.t("navs.home")),
        (locale.localized_path("/download"), catalog.t("navs.download")),
        (USER_DOCS_URL.to_string(), catalog.t("navs.user_docs")),
        (DEV_DOCS_URL.to_string(), catalog.t("navs.dev_docs")),
    ]
    .iter()
    .map(|(href, label)| {
        let active = if *href == current_path { " class=\"active\"" } else { "" };
        format!(r#"<a href="{}"{}>{}</a>"#, href, active, label)
    })
    .collect::<Vec<_>>()
    .join("\n");

    let switcher = Locale::ALL
        .iter()
        .map(|l| {
            let active = if *l == locale { " class=\"active\"" } else { "" };
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("redirect", current_path)
                .finish();
            format!(
                r#"<a href="/lang/{}?{}"{}>{}</a>"#,
                l.code(),
                query,
                active,
                l.native_name()
            )
        })
        .collect::<Vec<_>>()
        .join("");

    format!(
        r#"<header>
        <nav>{}</nav>
        <div class="lang-switcher">{}</div>
    </header>"#,
        nav, switcher
    )
}

fn format_version_card(
    label: &str,
    version: &ResolvedVersion,
    href: &str,
    selected: bool,
    badge_class: &str,
    catalog: &Catalog,
) -> String {
    let published = version
        .published
        .as_ref()
        .map(|d| {
            format!(
                r#"<span class="published">{}: {}</span>"#,
                catalog.t("version.published"),
                escape_html(d)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<a class="version-card{}" href="{}">
            <span class="version-tag">{}: {}</span>
            <span class="badge {}">{}</span>
            {}
        </a>"#,
        if selected { " selected" } else { "" },
        href,
        label,
        escape_html(&version.tag),
        badge_class,
        label,
        published
    )
}

fn format_platform_panel(download: &PlatformDownload, active: bool, catalog: &Catalog) -> String {
    let entries = download
        .downloads
        .iter()
        .map(|d| {
            format!(
                r#"<div class="download-entry">
                    <span class="download-name">{}</span>
                    <span class="badge stable">{}</span>
                    <a class="download-button" href="{}">{}</a>
                </div>"#,
                escape_html(&d.name),
                escape_html(&d.kind),
                escape_html(&d.url),
                catalog.t("download.download_button")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<section class="platform-panel" id="panel-{}"{}>
            <h2>{}</h2>
            <p class="description">{}</p>
            {}
        </section>"#,
        download.platform.id(),
        if active { "" } else { " hidden" },
        download.title,
        download.description,
        entries
    )
}

pub fn format_download_page(view: &DownloadView, locale: Locale, catalog: &Catalog) -> String {
    let current_path = locale.localized_path("/download");
    let channel = view.channel();
    let use_proxy = view.use_proxy();
    let tab = view.tab();

    let version_cards = match view.summary() {
        None => format!(
            r#"<span class="loading">{}</span>"#,
            catalog.t("version.loading")
        ),
        Some(summary) => {
            let stable = format_version_card(
                catalog.t("version.latest"),
                &summary.stable,
                &format!("?{}", page_query(Channel::Stable, use_proxy, tab)),
                channel == Channel::Stable || summary.prerelease.is_none(),
                "stable",
                catalog,
            );
            let prerelease = summary
                .prerelease
                .as_ref()
                .map(|pre| {
                    format_version_card(
                        catalog.t("version.pre_release"),
                        pre,
                        &format!("?{}", page_query(Channel::Prerelease, use_proxy, tab)),
                        channel == Channel::Prerelease,
                        "prerelease",
                        catalog,
                    )
                })
                .unwrap_or_default();
            format!("{}\n{}", stable, prerelease)
        }
    };

    let tabs = Platform::ALL
        .iter()
        .map(|p| {
            format!(
                r#"<button data-platform="{}" data-hash="{}"{}>{}</button>"#,
                p.id(),
                p.hash(),
                if *p == tab { " class=\"active\"" } else { "" },
                p.display_name()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let panels = if view.is_loading() {
        format!(
            r#"<p class="loading">{}</p>"#,
            catalog.t("download.loading")
        )
    } else {
        view.downloads(catalog)
            .iter()
            .map(|d| format_platform_panel(d, d.platform == tab, catalog))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r##"<!DOCTYPE html>
<html lang="{}">
<head>
    <meta charset="utf-8">
    <title>{}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif; max-width: 960px; margin: 0 auto; padding: 20px; background: #111; color: #eee; }}
        a {{ color: #8cc8ff; text-decoration: none; }}
        header {{ display: flex; justify-content: space-between; margin-bottom: 30px; }}
        nav a, .lang-switcher a {{ margin-right: 12px; }}
        .active {{ font-weight: 600; text-decoration: underline; }}
        .version-card {{ display: inline-block; padding: 12px 16px; margin: 0 12px 12px 0; border: 1px solid #444; border-radius: 8px; color: #eee; }}
        .version-card.selected {{ border-color: #ccc; background: #222; }}
        .badge {{ padding: 2px 8px; border-radius: 4px; font-size: 0.8em; }}
        .badge.stable {{ background: #1f3d2a; color: #86efac; }}
        .badge.prerelease {{ background: #3d2a1f; color: #fdba74; }}
        .published {{ display: block; color: #999; font-size: 0.9em; }}
        .tabs button {{ padding: 8px 20px; border: none; border-radius: 6px; background: #222; color: #ccc; cursor: pointer; }}
        .tabs button.active {{ background: #fff; color: #000; }}
        .description {{ white-space: pre-line; color: #bbb; }}
        .download-entry {{ display: flex; align-items: center; gap: 12px; padding: 12px; margin: 8px 0; border: 1px solid #333; border-radius: 8px; }}
        .download-button {{ margin-left: auto; background: #fff; color: #000; padding: 6px 14px; border-radius: 6px; }}
        footer {{ margin-top: 40px; text-align: center; color: #888; }}
    </style>
</head>
<body>
    {}
    <h1>{}</h1>
    <p>{}</p>
    <div class="versions">
        {}
    </div>
    <p class="proxy-toggle">
        <a href="?{}">[{}] {}</a>
    </p>
    <div class="tabs">
        {}
    </div>
    <div class="panels">
        {}
    </div>
    <footer>
        <p>{}</p>
        <p><small>{}</small></p>
    </footer>
    <script>
        (function () {{
            var hashes = {{ "#win": "windows", "#macos": "macos", "#linux": "linux" }};
            function show(id) {{
                document.querySelectorAll(".tabs button").forEach(function (b) {{
                    b.classList.toggle("active", b.dataset.platform === id);
                }});
                document.querySelectorAll(".platform-panel").forEach(function (p) {{
                    p.hidden = p.id !== "panel-" + id;
                }});
            }}
            function fromHash() {{
                var id = hashes[window.location.hash];
                if (id) show(id);
            }}
            document.querySelectorAll(".tabs button").forEach(function (b) {{
                b.addEventListener("click", function () {{
                    show(b.dataset.platform);
                    history.replaceState(null, "", "#" + b.dataset.hash);
                }});
            }});
            window.addEventListener("hashchange", fromHash);
            fromHash();
        }})();
    </script>
</body>
</html>"##,
        locale.code(),
        catalog.t("download.title"),
        format_header(locale, catalog, &current_path),
        catalog.t("download.title"),
        catalog.t("download.description"),
        version_cards,
        page_query(channel, !use_proxy, tab),
        if use_proxy { "x" } else { " " },
        catalog.t("download.use_proxy"),
        tabs,
        panels,
        catalog.t("download.footer.help"),
        catalog.t("download.footer.security"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DownloadConfig;
    use crate::i18n::Translations;
    use crate::release::{Asset, Release};
    use chrono::{TimeZone, Utc};

    fn view_with_prerelease() -> DownloadView {
        let mut view = DownloadView::new(DownloadConfig::default());
        view.complete(Ok(vec![
            Release {
                tag_name: "v2.0.0-beta<1>".to_string(),
                name: None,
                published_at: Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
                html_url: None,
                prerelease: true,
                draft: false,
                assets: vec![Asset {
                    name: "ClassWidgets-Linux-x64_5.zip".to_string(),
                    browser_download_url: "https://objects.example.com/linux.zip".to_string(),
                }],
            },
            Release {
                tag_name: "v1.9.0".to_string(),
                name: None,
                published_at: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
                html_url: None,
                prerelease: false,
                draft: false,
                assets: vec![],
            },
        ]));
        view
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_loading_page_shows_placeholders() {
        let translations = Translations::load().unwrap();
        let catalog = translations.catalog(Locale::En);
        let view = DownloadView::new(DownloadConfig::default());

        let html = format_download_page(&view, Locale::En, catalog);
        assert!(html.contains(catalog.t("version.loading")));
        assert!(html.contains(catalog.t("download.loading")));
        assert!(!html.contains(r#"class="download-entry""#));
    }

    #[test]
    fn test_page_lists_both_versions_and_selected_tab() {
        let translations = Translations::load().unwrap();
        let catalog = translations.catalog(Locale::Ja);
        let mut view = view_with_prerelease();
        view.select_version(Channel::Prerelease);
        view.select_tab(Platform::Linux);

        let html = format_download_page(&view, Locale::Ja, catalog);
        assert!(html.contains(r#"<html lang="ja">"#));
        assert!(html.contains("v1.9.0"));
        assert!(html.contains("v2.0.0-beta&lt;1&gt;"));
        assert!(!html.contains("v2.0.0-beta<1>"));
        assert!(html.contains("https://ghfile.geekertao.top/https://objects.example.com/linux.zip"));
        assert!(html.contains(r#"<section class="platform-panel" id="panel-linux">"#));
        assert!(html.contains(r#"<section class="platform-panel" id="panel-windows" hidden>"#));
        assert!(html.contains("?version=prerelease&proxy=false&tab=linux"));
    }

    #[test]
    fn test_prerelease_card_hidden_when_not_surfaced() {
        let translations = Translations::load().unwrap();
        let catalog = translations.catalog(Locale::En);
        let mut view = DownloadView::new(DownloadConfig::default());
        view.complete(Ok(Vec::new()));

        let html = format_download_page(&view, Locale::En, catalog);
        assert!(html.contains("v1.2.0.1"));
        assert!(!html.contains("badge prerelease"));
    }

    #[test]
    fn test_page_carries_hash_routing_script() {
        let translations = Translations::load().unwrap();
        let catalog = translations.catalog(Locale::En);
        let mut view = DownloadView::new(DownloadConfig::default());
        view.complete(Ok(Vec::new()));

        let html = format_download_page(&view, Locale::En, catalog);
        assert!(html.contains(r##"var hashes = { "#win": "windows", "#macos": "macos", "#linux": "linux" };"##));
        assert!(html.contains(r##"history.replaceState(null, "", "#" + b.dataset.hash);"##));
        assert!(html.contains(r#"window.addEventListener("hashchange", fromHash);"#));
        assert!(html.trim_end().ends_with("</html>"));
    }
}
