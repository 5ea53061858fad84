//! Per-page-view download state: the loading flag, the one fetch result, and
//! the visitor's choices (version channel, proxy toggle, platform tab).

use crate::i18n::Catalog;
use crate::platform::Platform;
use crate::release::{Asset, FetchError, Release};
use crate::resolver::{ReleaseSummary, resolve_asset_url, with_proxy};
use serde::{Deserialize, Serialize};

pub const DEFAULT_VERSION: &str = "v1.2.0.1";
pub const DEFAULT_PROXY_PREFIX: &str = "https://ghfile.geekertao.top/";
pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/Class-Widgets/Class-Widgets";

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub repository_url: String,
    pub proxy_prefix: String,
    pub default_version: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            proxy_prefix: DEFAULT_PROXY_PREFIX.to_string(),
            default_version: DEFAULT_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Stable,
    Prerelease,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Stable => "stable",
            Channel::Prerelease => "prerelease",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformDownload {
    pub platform: Platform,
    pub title: String,
    pub description: String,
    pub downloads: Vec<DownloadEntry>,
}

#[derive(Debug, Clone)]
pub struct DownloadView {
    config: DownloadConfig,
    summary: Option<ReleaseSummary>,
    channel: Channel,
    use_proxy: bool,
    tab: Platform,
}

impl DownloadView {
    /// A view still waiting on its release fetch.
    pub fn new(config: DownloadConfig) -> Self {
        Self {
            config,
            summary: None,
            channel: Channel::Stable,
            use_proxy: true,
            tab: Platform::Windows,
        }
    }

    /// Applies the fetch result. Failures are logged and replaced by the
    /// fallback summary so callers only ever see a complete state.
    pub fn complete(&mut self, result: Result<Vec<Release>, FetchError>) {
        let summary = match result {
            Ok(releases) => ReleaseSummary::from_releases(&releases, &self.config.default_version),
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch releases, using fallback version");
                ReleaseSummary::fallback(&self.config.default_version)
            }
        };
        self.summary = Some(summary);
    }

    pub fn is_loading(&self) -> bool {
        self.summary.is_none()
    }

    pub fn summary(&self) -> Option<&ReleaseSummary> {
        self.summary.as_ref()
    }

    pub fn select_version(&mut self, channel: Channel) {
        self.channel = channel;
    }

    pub fn set_proxy(&mut self, use_proxy: bool) {
        self.use_proxy = use_proxy;
    }

    pub fn select_tab(&mut self, tab: Platform) {
        self.tab = tab;
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn use_proxy(&self) -> bool {
        self.use_proxy
    }

    pub fn tab(&self) -> Platform {
        self.tab
    }

    /// Version tag whose downloads are offered. Selecting the prerelease
    /// channel without a surfaced prerelease keeps the stable tag.
    pub fn active_version(&self) -> &str {
        match &self.summary {
            Some(summary) => match (&self.channel, &summary.prerelease) {
                (Channel::Prerelease, Some(pre)) => &pre.tag,
                _ => &summary.stable.tag,
            },
            None => &self.config.default_version,
        }
    }

    /// Assets searched before falling back to the conventional URL. Only a
    /// selected prerelease contributes any.
    fn candidate_assets(&self) -> &[Asset] {
        match (&self.channel, self.summary.as_ref().and_then(|s| s.prerelease.as_ref())) {
            (Channel::Prerelease, Some(pre)) => pre.assets.as_slice(),
            _ => &[],
        }
    }

    pub fn platform_download(&self, platform: Platform, catalog: &Catalog) -> PlatformDownload {
        let version = self.active_version();
        let assets = self.candidate_assets();

        let downloads = platform
            .builds()
            .iter()
            .map(|(arch, label)| {
                let url = resolve_asset_url(
                    assets,
                    platform,
                    *arch,
                    version,
                    &self.config.repository_url,
                );
                DownloadEntry {
                    name: version.to_string(),
                    kind: label.to_string(),
                    url: with_proxy(&url, self.use_proxy, &self.config.proxy_prefix),
                }
            })
            .collect();

        PlatformDownload {
            platform,
            title: catalog.t(&format!("download.{}.title", platform.id())).to_string(),
            description: catalog
                .t(&format!("download.{}.description", platform.id()))
                .to_string(),
            downloads,
        }
    }

    pub fn downloads(&self, catalog: &Catalog) -> Vec<PlatformDownload> {
        Platform::ALL
            .into_iter()
            .map(|p| self.platform_download(p, catalog))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn release(tag: &str, prerelease: bool, day: u32, assets: &[&str]) -> Release {
        Release {
            tag_name: tag.to_string(),
            name: None,
            published_at: Utc.with_ymd_and_hms(2025, 4, day, 0, 0, 0).unwrap(),
            html_url: None,
            prerelease,
            draft: false,
            assets: assets
                .iter()
                .map(|n| Asset {
                    name: n.to_string(),
                    browser_download_url: format!("https://objects.example.com/{}", n),
                })
                .collect(),
        }
    }

    fn urls(download: &PlatformDownload) -> Vec<&str> {
        download.downloads.iter().map(|d| d.url.as_str()).collect()
    }

    #[test]
    fn test_new_view_is_loading() {
        let view = DownloadView::new(DownloadConfig::default());
        assert!(view.is_loading());
        assert!(view.summary().is_none());
        assert!(view.use_proxy());
    }

    #[test]
    fn test_failed_fetch_completes_with_fallback() {
        let mut view = DownloadView::new(DownloadConfig::default());
        view.complete(Err(FetchError::Status(reqwest::StatusCode::BAD_GATEWAY)));

        assert!(!view.is_loading());
        let summary = view.summary().unwrap();
        assert_eq!(summary.stable.tag, DEFAULT_VERSION);
        assert_eq!(summary.stable.published, None);
        assert_eq!(summary.prerelease, None);
    }

    #[test]
    fn test_stable_downloads_use_conventional_urls() {
        let mut view = DownloadView::new(DownloadConfig::default());
        view.set_proxy(false);
        view.complete(Ok(vec![release(
            "v1.3.0",
            false,
            1,
            &["ClassWidgets-Windows-x64.zip"],
        )]));

        let windows = view.platform_download(Platform::Windows, &Catalog::default());
        assert_eq!(windows.title, "download.windows.title");
        assert_eq!(
            urls(&windows),
            [
                "https://github.com/Class-Widgets/Class-Widgets/releases/download/v1.3.0/ClassWidgets-Windows-x64.zip",
                "https://github.com/Class-Widgets/Class-Widgets/releases/download/v1.3.0/ClassWidgets-Windows-x86.zip",
            ]
        );
        assert!(windows.downloads.iter().all(|d| d.name == "v1.3.0"));
    }

    #[test]
    fn test_prerelease_downloads_prefer_matching_assets() {
        let mut view = DownloadView::new(DownloadConfig::default());
        view.complete(Ok(vec![
            release(
                "v1.4.0-beta",
                true,
                20,
                &["ClassWidgets-Macos-arm64_88.zip", "ClassWidgets-Linux-x64_88.zip"],
            ),
            release("v1.3.0", false, 1, &[]),
        ]));
        view.select_version(Channel::Prerelease);
        view.set_proxy(false);

        let macos = view.platform_download(Platform::Macos, &Catalog::default());
        assert_eq!(
            urls(&macos),
            [
                "https://objects.example.com/ClassWidgets-Macos-arm64_88.zip",
                "https://github.com/Class-Widgets/Class-Widgets/releases/download/v1.4.0-beta/ClassWidgets-macOS-x64.zip",
            ]
        );
        let kinds: Vec<&str> = macos.downloads.iter().map(|d| d.kind.as_str()).collect();
        assert_eq!(kinds, ["Apple Silicon", "Intel"]);

        view.select_version(Channel::Stable);
        let linux = view.platform_download(Platform::Linux, &Catalog::default());
        assert_eq!(
            urls(&linux),
            ["https://github.com/Class-Widgets/Class-Widgets/releases/download/v1.3.0/ClassWidgets-Linux-x64.zip"]
        );
    }

    #[test]
    fn test_prerelease_channel_without_prerelease_keeps_stable() {
        let mut view = DownloadView::new(DownloadConfig::default());
        view.complete(Ok(vec![
            release("v1.3.0", false, 10, &[]),
            release("v1.3.0-rc", true, 2, &["ClassWidgets-Linux-x64.zip"]),
        ]));
        view.select_version(Channel::Prerelease);

        assert_eq!(view.active_version(), "v1.3.0");
        assert!(view.candidate_assets().is_empty());
    }

    #[test]
    fn test_proxy_toggle_applies_to_every_entry() {
        let mut view = DownloadView::new(DownloadConfig::default());
        view.complete(Ok(Vec::new()));

        let proxied = view.downloads(&Catalog::default());
        view.set_proxy(false);
        let direct = view.downloads(&Catalog::default());
        view.set_proxy(true);
        let proxied_again = view.downloads(&Catalog::default());

        assert_eq!(proxied, proxied_again);
        for (p, d) in proxied.iter().zip(&direct) {
            for (pe, de) in p.downloads.iter().zip(&d.downloads) {
                assert_eq!(pe.url, format!("{}{}", DEFAULT_PROXY_PREFIX, de.url));
            }
        }
        let order: Vec<Platform> = direct.iter().map(|d| d.platform).collect();
        assert_eq!(order, Platform::ALL);
    }
}
