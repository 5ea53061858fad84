//! Release selection and download URL resolution.
//!
//! Everything here is a pure function of the fetched release list and the
//! caller's choices; nothing is cached between calls.

use crate::platform::{Arch, Platform};
use crate::release::{Asset, Release};
use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedVersion {
    pub tag: String,
    pub published: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<Asset>,
}

/// Stable and (if newer) prerelease versions picked from one release listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseSummary {
    pub stable: ResolvedVersion,
    pub prerelease: Option<ResolvedVersion>,
}

impl ReleaseSummary {
    pub fn from_releases(releases: &[Release], default_version: &str) -> Self {
        let stable = select_stable(releases);
        let prerelease = select_prerelease(releases, stable);

        Self {
            stable: match stable {
                Some(r) => ResolvedVersion {
                    tag: r.tag_name.clone(),
                    published: Some(format_published_date(r.published_at)),
                    assets: Vec::new(),
                },
                None => Self::fallback_version(default_version),
            },
            prerelease: prerelease.map(|r| ResolvedVersion {
                tag: r.tag_name.clone(),
                published: Some(format_published_date(r.published_at)),
                assets: r.assets.clone(),
            }),
        }
    }

    /// State used when the release listing could not be obtained.
    pub fn fallback(default_version: &str) -> Self {
        Self {
            stable: Self::fallback_version(default_version),
            prerelease: None,
        }
    }

    fn fallback_version(default_version: &str) -> ResolvedVersion {
        ResolvedVersion {
            tag: default_version.to_string(),
            published: None,
            assets: Vec::new(),
        }
    }
}

pub fn select_stable(releases: &[Release]) -> Option<&Release> {
    releases.iter().find(|r| !r.prerelease)
}

/// The first prerelease, but only when it was published strictly after the
/// stable release.
pub fn select_prerelease<'a>(
    releases: &'a [Release],
    stable: Option<&Release>,
) -> Option<&'a Release> {
    let stable = stable?;
    releases
        .iter()
        .find(|r| r.prerelease)
        .filter(|pre| pre.published_at > stable.published_at)
}

/// Short `zh-CN` date, e.g. `2025/3/1`.
pub fn format_published_date(published_at: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}",
        published_at.year(),
        published_at.month(),
        published_at.day()
    )
}

/// Case-insensitive search for `ClassWidgets-{platform}-{arch}[_{build}].zip`
/// anywhere in the asset name.
pub fn asset_matches(asset_name: &str, platform: Platform, arch: Arch) -> bool {
    let pattern = format!(
        r"(?i)ClassWidgets-{}-{}(?:_\d+)?\.zip",
        regex::escape(platform.asset_name()),
        regex::escape(arch.as_str())
    );
    Regex::new(&pattern).is_ok_and(|re| re.is_match(asset_name))
}

pub fn conventional_url(repository_url: &str, version: &str, platform: Platform, arch: Arch) -> String {
    format!(
        "{}/releases/download/{}/ClassWidgets-{}-{}.zip",
        repository_url.trim_end_matches('/'),
        version,
        platform.display_name(),
        arch.as_str()
    )
}

/// Download URL for one platform/arch pair, before any proxy rewrite.
pub fn resolve_asset_url(
    assets: &[Asset],
    platform: Platform,
    arch: Arch,
    version: &str,
    repository_url: &str,
) -> String {
    assets
        .iter()
        .find(|a| asset_matches(&a.name, platform, arch))
        .map(|a| a.browser_download_url.clone())
        .unwrap_or_else(|| conventional_url(repository_url, version, platform, arch))
}

pub fn with_proxy(url: &str, use_proxy: bool, proxy_prefix: &str) -> String {
    if use_proxy {
        format!("{}{}", proxy_prefix, url)
    } else {
        url.to_string()
    }
}
