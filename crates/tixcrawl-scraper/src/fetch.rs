//! The failure policy for page requests: retry with a session refresh
//! interposed.
//!
//! Any failed attempt (a transport error or a non-2xx status) is taken as a
//! sign the session or proxy has gone stale, so the session is refreshed
//! before the next attempt and the request is rebuilt from the new
//! credentials. A refresh failure is not a page failure and propagates
//! immediately. Exhausting the attempt cap returns the last page error; by
//! policy the caller aborts the whole run at that point rather than skipping
//! the unit.

use crate::error::ScraperError;
use crate::session::{Session, SessionManager};

/// Send a request up to `attempts` times, rebuilding it from the current
/// session each time.
///
/// `build` must derive every credential-bearing header from the [`Session`]
/// it is handed, so a refresh between attempts is picked up automatically.
///
/// # Attempt accounting (`attempts = 3`)
///
/// | Attempt | On failure |
/// |---------|------------|
/// | 1       | refresh, retry |
/// | 2       | refresh, retry |
/// | 3       | return the error |
pub(crate) async fn send_with_refresh<F>(
    session: &mut SessionManager,
    attempts: u32,
    url: &str,
    build: F,
) -> Result<reqwest::Response, ScraperError>
where
    F: Fn(&Session) -> reqwest::RequestBuilder,
{
    let mut attempt = 1u32;
    loop {
        let failure = match build(session.session()).send().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => ScraperError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_owned(),
            },
            Err(err) => ScraperError::Http(err),
        };

        if attempt >= attempts {
            tracing::error!(
                url,
                attempt,
                error = %failure,
                "page request failed on final attempt, aborting run"
            );
            return Err(failure);
        }

        tracing::warn!(
            url,
            attempt,
            attempts,
            error = %failure,
            "page request failed, refreshing session before retry"
        );
        session.refresh().await?;
        attempt += 1;
    }
}
