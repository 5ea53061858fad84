use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

/// One entry of the GitHub releases listing. Only the fields the download
/// page needs are required; everything else GitHub sends is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub html_url: Option<String>,
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("release API returned status: {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed release payload: {0}")]
    Decode(#[source] reqwest::Error),
}

pub async fn fetch_releases(client: &Client, url: &str) -> Result<Vec<Release>, FetchError> {
    tracing::debug!(%url, "fetching releases");

    let response = client
        .get(url)
        .header("Accept", "application/vnd.github.v3+json")
        .send()
        .await
        .map_err(FetchError::Request)?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    let releases: Vec<Release> = response.json().await.map_err(FetchError::Decode)?;
    tracing::debug!(count = releases.len(), "fetched releases");

    Ok(releases)
}
