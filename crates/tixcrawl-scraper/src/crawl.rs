//! The crawler: one proxied HTTP identity plus its live session, driving
//! both collection phases sequentially.

use std::time::Duration;

use tixcrawl_core::{AppConfig, Profile};

use crate::error::ScraperError;
use crate::session::{BrowserApi, SessionManager};

/// Maximum pages fetched for a single unit (location or event) before the
/// run errors out. Prevents infinite loops against an endpoint that never
/// reports completion. Each page may additionally be retried up to the
/// attempt cap.
pub const MAX_PAGES: u32 = 200;

/// Knobs the crawler needs from application configuration.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub site_base_url: String,
    pub request_timeout_secs: u64,
    /// Attempts per page request before the run aborts. At least 1.
    pub retry_attempts: u32,
    /// Pause between successive page requests of one unit. Zero disables
    /// pacing.
    pub inter_request_delay_ms: u64,
}

impl From<&AppConfig> for CrawlerConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            site_base_url: config.site_base_url.clone(),
            request_timeout_secs: config.request_timeout_secs,
            retry_attempts: config.retry_attempts,
            inter_request_delay_ms: config.inter_request_delay_ms,
        }
    }
}

/// Drives the search and listing phases for one profile.
///
/// All site traffic goes through the profile's proxy; session and rotation
/// traffic goes out directly via the [`BrowserApi`]. All mutable state lives
/// on the value itself, so a second crawler over a different profile is just
/// a second value.
pub struct Crawler {
    pub(crate) http: reqwest::Client,
    pub(crate) site_base: String,
    pub(crate) attempts: u32,
    pub(crate) delay_ms: u64,
    pub(crate) session: SessionManager,
}

impl Crawler {
    /// Connect through the profile's proxy (the production path) and
    /// establish the initial session.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the proxy URL is invalid or the
    /// client cannot be built, and [`ScraperError::AuthRefresh`] if the
    /// initial session fetch fails.
    pub async fn connect(
        config: CrawlerConfig,
        profile: Profile,
        api: BrowserApi,
    ) -> Result<Self, ScraperError> {
        let proxy = reqwest::Proxy::all(&profile.proxy)?;
        Self::connect_with(config, profile, api, Some(proxy)).await
    }

    /// Connect without a proxy. For tests and local debugging against a
    /// stand-in server; the profile's proxy field is ignored.
    ///
    /// # Errors
    ///
    /// Same as [`Crawler::connect`], minus proxy construction.
    pub async fn connect_direct(
        config: CrawlerConfig,
        profile: Profile,
        api: BrowserApi,
    ) -> Result<Self, ScraperError> {
        Self::connect_with(config, profile, api, None).await
    }

    async fn connect_with(
        config: CrawlerConfig,
        profile: Profile,
        api: BrowserApi,
        proxy: Option<reqwest::Proxy>,
    ) -> Result<Self, ScraperError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10));
        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy);
        }
        let http = builder.build()?;

        let session = SessionManager::connect(profile, api).await?;

        Ok(Self {
            http,
            site_base: config.site_base_url.trim_end_matches('/').to_string(),
            attempts: config.retry_attempts.max(1),
            delay_ms: config.inter_request_delay_ms,
            session,
        })
    }

    #[must_use]
    pub fn session_manager(&self) -> &SessionManager {
        &self.session
    }

    /// Sleep out the configured pacing delay; called before every page
    /// request of a unit except its first.
    pub(crate) async fn pace(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }
}
