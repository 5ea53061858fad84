use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod download;
mod format_html;
mod i18n;
mod platform;
mod release;
mod resolver;

use download::{Channel, DownloadConfig, DownloadView, PlatformDownload};
use i18n::{Locale, Translations};
use platform::Platform;
use resolver::ResolvedVersion;

const DEFAULT_RELEASES_URL: &str =
    "https://api.github.com/repos/Class-Widgets/Class-Widgets/releases";
const LANG_COOKIE_MAX_AGE: u32 = 31_536_000;

#[derive(Parser, Debug)]
#[command(name = "cw-site")]
#[command(about = "Download page server for Class Widgets", version, long_about = None)]
struct Args {
    /// Server port
    #[arg(short, long, env = "CW_SITE_PORT", default_value = "3000")]
    port: u16,

    /// Server host
    #[arg(long, env = "CW_SITE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Release listing endpoint (GitHub releases API)
    #[arg(long, env = "CW_SITE_RELEASES_URL", default_value = DEFAULT_RELEASES_URL)]
    releases_url: String,

    /// Repository base used to build conventional download URLs
    #[arg(long, env = "CW_SITE_REPOSITORY_URL", default_value = download::DEFAULT_REPOSITORY_URL)]
    repository_url: String,

    /// Prefix prepended to URLs when the proxy is in use
    #[arg(long, env = "CW_SITE_PROXY_PREFIX", default_value = download::DEFAULT_PROXY_PREFIX)]
    proxy_prefix: String,

    /// Version shown when the release listing is unavailable
    #[arg(long, env = "CW_SITE_DEFAULT_VERSION", default_value = download::DEFAULT_VERSION)]
    default_version: String,

    /// Fetch the release listing through the proxy prefix
    #[arg(long, env = "CW_SITE_FETCH_VIA_PROXY", default_value_t = true, action = clap::ArgAction::Set)]
    fetch_via_proxy: bool,
}

pub struct AppState {
    pub client: reqwest::Client,
    pub releases_url: String,
    pub download: DownloadConfig,
    pub translations: Translations,
}

#[derive(Debug, Default, Deserialize)]
struct DownloadQuery {
    version: Option<Channel>,
    proxy: Option<bool>,
    tab: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SwitchQuery {
    redirect: Option<String>,
}

#[derive(Serialize)]
struct DownloadState<'a> {
    locale: Locale,
    loading: bool,
    channel: Channel,
    use_proxy: bool,
    tab: Platform,
    active_version: &'a str,
    stable: Option<&'a ResolvedVersion>,
    prerelease: Option<&'a ResolvedVersion>,
    platforms: Vec<PlatformDownload>,
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn parse_locale(lang: &str) -> Result<Locale, (StatusCode, String)> {
    Locale::from_code(lang).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("Unsupported language: {}", lang),
        )
    })
}

fn cookie_locale(headers: &HeaderMap) -> Option<Locale> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix("lang="))
        .find_map(Locale::from_code)
}

fn preferred_locale(headers: &HeaderMap) -> Locale {
    cookie_locale(headers)
        .or_else(|| {
            headers
                .get(header::ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok())
                .and_then(Locale::from_accept_language)
        })
        .unwrap_or(Locale::DEFAULT)
}

/// Builds the view for one page load: one release fetch, then the visitor's
/// choices from the query string.
async fn load_view(state: &AppState, query: &DownloadQuery, headers: &HeaderMap) -> DownloadView {
    let mut view = DownloadView::new(state.download.clone());
    view.complete(release::fetch_releases(&state.client, &state.releases_url).await);

    if let Some(channel) = query.version {
        view.select_version(channel);
    }
    if let Some(use_proxy) = query.proxy {
        view.set_proxy(use_proxy);
    }

    let tab = query
        .tab
        .as_deref()
        .and_then(Platform::from_hash)
        .unwrap_or_else(|| {
            let user_agent = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok());
            Platform::detect_from_user_agent(user_agent)
        });
    view.select_tab(tab);

    view
}

async fn root(headers: HeaderMap) -> Redirect {
    let locale = preferred_locale(&headers);
    Redirect::temporary(&locale.localized_path("/download"))
}

/// `/{lang}/` has no page of its own; it lands on that locale's download page.
async fn locale_home(Path(lang): Path<String>) -> Result<Redirect, (StatusCode, String)> {
    let locale = parse_locale(&lang)?;
    Ok(Redirect::temporary(&locale.localized_path("/download")))
}

async fn download_page(
    Path(lang): Path<String>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, (StatusCode, String)> {
    let locale = parse_locale(&lang)?;
    let view = load_view(&state, &query, &headers).await;
    let catalog = state.translations.catalog(locale);

    Ok(Html(format_html::format_download_page(&view, locale, catalog)))
}

async fn download_json(
    Path(lang): Path<String>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, (StatusCode, String)> {
    let locale = parse_locale(&lang)?;
    let view = load_view(&state, &query, &headers).await;
    let catalog = state.translations.catalog(locale);

    let body = DownloadState {
        locale,
        loading: view.is_loading(),
        channel: view.channel(),
        use_proxy: view.use_proxy(),
        tab: view.tab(),
        active_version: view.active_version(),
        stable: view.summary().map(|s| &s.stable),
        prerelease: view.summary().and_then(|s| s.prerelease.as_ref()),
        platforms: view.downloads(catalog),
    };

    Ok(Json(body).into_response())
}

async fn switch_language(
    Path(code): Path<String>,
    Query(query): Query<SwitchQuery>,
) -> Result<Response, (StatusCode, String)> {
    let locale = parse_locale(&code)?;
    let target = i18n::switch_language_path(query.redirect.as_deref().unwrap_or("/"), locale);
    tracing::debug!(lang = locale.code(), %target, "switching language");

    let cookie = format!(
        "lang={}; Path=/; Max-Age={}; SameSite=Lax",
        locale.code(),
        LANG_COOKIE_MAX_AGE
    );
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(&target)).into_response())
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/lang/:code", get(switch_language))
        .route("/:lang/", get(locale_home))
        .route("/:lang/download", get(download_page))
        .route("/:lang/download.json", get(download_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();

    url::Url::parse(&args.repository_url).context("Invalid --repository-url")?;
    url::Url::parse(&args.proxy_prefix).context("Invalid --proxy-prefix")?;
    url::Url::parse(&args.releases_url).context("Invalid --releases-url")?;

    let releases_url = if args.fetch_via_proxy {
        format!("{}{}", args.proxy_prefix, args.releases_url)
    } else {
        args.releases_url.clone()
    };

    let state = Arc::new(AppState {
        client: reqwest::Client::builder()
            .user_agent(concat!("cw-site/", env!("CARGO_PKG_VERSION")))
            .build()?,
        releases_url,
        download: DownloadConfig {
            repository_url: args.repository_url.clone(),
            proxy_prefix: args.proxy_prefix.clone(),
            default_version: args.default_version.clone(),
        },
        translations: Translations::load()?,
    });

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!(%addr, "server listening");
    tracing::info!(releases_url = %state.releases_url, "release source");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
