//! Session acquisition and refresh.
//!
//! Cookies and the user agent come from a local browser-automation service
//! that keeps one warmed browser profile per crawl identity. We only talk to
//! its HTTP API; driving the browser itself is the service's problem. Calls
//! to the service and to the proxy-rotation endpoint go out directly, never
//! through the crawl proxy.

use std::time::Duration;

use serde::Deserialize;
use tixcrawl_core::Profile;

use crate::error::ScraperError;

/// The live credential pair authorizing site requests. Replaced wholesale on
/// refresh; a request is always built from one coherent pair.
#[derive(Debug, Clone)]
pub struct Session {
    /// Cookie header value, `name=value; name=value; ...`.
    pub cookies: String,
    pub user_agent: String,
}

/// Response envelope used by every browser-automation API endpoint.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SessionData {
    cookies: String,
    user_agent: String,
}

/// Client for the browser-automation service's local HTTP API.
pub struct BrowserApi {
    base_url: String,
    pub(crate) http: reqwest::Client,
}

impl BrowserApi {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying client cannot be
    /// constructed.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ScraperError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// One round trip to mint a fresh cookie jar and user agent for a
    /// profile.
    ///
    /// # Errors
    ///
    /// Any failure (transport, non-2xx status, or an error envelope)
    /// surfaces as [`ScraperError::AuthRefresh`]. Refresh failures are never
    /// retried; the caller aborts the run.
    pub async fn fetch_session(&self, profile_id: &str) -> Result<Session, ScraperError> {
        let url = format!(
            "{}/api/v1/browser/cookies?user_id={profile_id}",
            self.base_url
        );
        let envelope: ApiEnvelope<SessionData> = self.call(&url, None).await?;
        let data = envelope.data.ok_or_else(|| ScraperError::AuthRefresh {
            reason: format!("browser API response from {url} carried no session data"),
        })?;
        Ok(Session {
            cookies: data.cookies,
            user_agent: data.user_agent,
        })
    }

    /// Release the profile's browser on the automation service.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::AuthRefresh`] if the service rejects the call.
    pub async fn stop_browser(&self, profile_id: &str) -> Result<(), ScraperError> {
        let url = format!("{}/api/v1/browser/stop?user_id={profile_id}", self.base_url);
        self.call::<serde_json::Value>(&url, None).await?;
        tracing::info!(profile_id, "browser session released");
        Ok(())
    }

    /// Delete the profile from the automation service entirely.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::AuthRefresh`] if the service rejects the call.
    pub async fn delete_profile(&self, profile_id: &str) -> Result<(), ScraperError> {
        let url = format!("{}/api/v1/user/delete", self.base_url);
        let body = serde_json::json!({ "user_ids": [profile_id] });
        self.call::<serde_json::Value>(&url, Some(&body)).await?;
        tracing::info!(profile_id, "profile deleted");
        Ok(())
    }

    /// Issue a GET (or POST when `body` is given), check the HTTP status and
    /// the envelope's `code`, and hand the envelope back. `data` may be
    /// absent; some endpoints acknowledge without a payload.
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiEnvelope<T>, ScraperError> {
        let request = match body {
            Some(json) => self.http.post(url).json(json),
            None => self.http.get(url),
        };
        let response = request.send().await.map_err(|e| ScraperError::AuthRefresh {
            reason: format!("browser API unreachable at {url}: {e}"),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::AuthRefresh {
                reason: format!("browser API returned {status} for {url}"),
            });
        }
        let envelope: ApiEnvelope<T> =
            response
                .json()
                .await
                .map_err(|e| ScraperError::AuthRefresh {
                    reason: format!("browser API sent an unreadable response from {url}: {e}"),
                })?;
        if envelope.code != 0 {
            return Err(ScraperError::AuthRefresh {
                reason: format!("browser API error {}: {}", envelope.code, envelope.msg),
            });
        }
        Ok(envelope)
    }
}

/// Owns a profile's live [`Session`] and the machinery to replace it.
pub struct SessionManager {
    profile: Profile,
    api: BrowserApi,
    session: Session,
}

impl SessionManager {
    /// Establish the first session for a profile: best-effort proxy
    /// rotation, then a cookie fetch from the browser API.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::AuthRefresh`] if the cookie fetch fails.
    pub async fn connect(profile: Profile, api: BrowserApi) -> Result<Self, ScraperError> {
        rotate_proxy_once(&api, &profile).await;
        let session = api.fetch_session(&profile.id).await?;
        tracing::info!(profile = %profile.id, "session established");
        Ok(Self {
            profile,
            api,
            session,
        })
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The proxy all site traffic for this profile egresses through.
    #[must_use]
    pub fn proxy_url(&self) -> &str {
        &self.profile.proxy
    }

    /// Rotate the proxy (best-effort) and replace the session wholesale.
    ///
    /// The new session is fully built before the old one is dropped, so no
    /// request ever observes a half-updated cookie/user-agent pair.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::AuthRefresh`] if the cookie fetch fails; the
    /// previous session is left in place in that case, but the caller is
    /// expected to abort rather than reuse it.
    pub async fn refresh(&mut self) -> Result<&Session, ScraperError> {
        rotate_proxy_once(&self.api, &self.profile).await;
        let fresh = self.api.fetch_session(&self.profile.id).await?;
        self.session = fresh;
        tracing::info!(profile = %self.profile.id, "session refreshed");
        Ok(&self.session)
    }

    /// Ask the proxy provider for a new egress IP. Best-effort: a failed or
    /// unacknowledged rotation is logged and the crawl proceeds on the
    /// current IP. Returns whether the provider acknowledged with HTTP 200.
    pub async fn rotate_proxy(&self) -> bool {
        rotate_proxy_once(&self.api, &self.profile).await
    }

    /// Release the profile's browser on the automation service.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::AuthRefresh`] if the service rejects the call.
    pub async fn release(&self) -> Result<(), ScraperError> {
        self.api.stop_browser(&self.profile.id).await
    }
}

async fn rotate_proxy_once(api: &BrowserApi, profile: &Profile) -> bool {
    let Some(url) = profile.rotation_url.as_deref() else {
        return false;
    };
    match api.http.get(url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => {
            tracing::debug!(profile = %profile.id, "proxy rotation acknowledged");
            true
        }
        Ok(response) => {
            tracing::warn!(
                profile = %profile.id,
                status = response.status().as_u16(),
                "proxy rotation not acknowledged, continuing on current egress IP"
            );
            false
        }
        Err(err) => {
            tracing::warn!(
                profile = %profile.id,
                error = %err,
                "proxy rotation request failed, continuing on current egress IP"
            );
            false
        }
    }
}
