//! Search phase: paginated event discovery around each sweep coordinate.
//!
//! One GET per page against the explore endpoint, page cursor starting at 0.
//! Pagination for a location ends when the endpoint reports zero remaining
//! results; the whole sweep ends early once the global event cap fills.

use reqwest::header;
use serde::Deserialize;
use tixcrawl_core::LocationQuery;

use crate::collect::{EventCollector, EVENT_CAP};
use crate::crawl::{Crawler, MAX_PAGES};
use crate::error::ScraperError;
use crate::fetch::send_with_refresh;
use crate::geo::encode_coordinate;
use crate::persist::SnapshotWriter;
use crate::types::EventRef;

/// One page from the explore endpoint.
///
/// Both keys are required: a response missing either is malformed and aborts
/// the run without a retry.
#[derive(Debug, Deserialize)]
pub struct ExploreResponse {
    pub events: Vec<ExploreEvent>,
    /// Events left beyond this page for the same query. Zero ends the
    /// location's pagination.
    pub remaining: i64,
}

/// An event entry on an explore page. The endpoint sends more fields; only
/// the url is load-bearing here.
#[derive(Debug, Deserialize)]
pub struct ExploreEvent {
    pub url: String,
}

impl Crawler {
    /// Sweep the given locations in order, collecting up to [`EVENT_CAP`]
    /// event refs.
    ///
    /// Every successful page rewrites the event snapshots before the cursor
    /// advances, so a fatal error leaves the last completed page on disk as
    /// the usable partial result.
    ///
    /// # Errors
    ///
    /// Propagates the page error after the attempt cap is exhausted,
    /// [`ScraperError::AuthRefresh`] from a failed mid-crawl refresh,
    /// [`ScraperError::Deserialize`] on a malformed response, and
    /// [`ScraperError::Persist`] on snapshot failure. Any error aborts the
    /// sweep; there is no skip-and-continue.
    pub async fn collect_event_urls(
        &mut self,
        locations: &[LocationQuery],
        snapshots: &SnapshotWriter,
    ) -> Result<Vec<EventRef>, ScraperError> {
        let mut collector = EventCollector::new();
        tracing::info!(locations = locations.len(), "starting event discovery sweep");

        'sweep: for location in locations {
            collector.begin_location();
            let lat = encode_coordinate(location.latitude);
            let lon = encode_coordinate(location.longitude);
            let mut page = 0u32;
            tracing::debug!(
                state = %location.state,
                latitude = location.latitude,
                longitude = location.longitude,
                "sweeping location"
            );

            loop {
                if page >= MAX_PAGES {
                    return Err(ScraperError::PaginationLimit {
                        url: format!(
                            "{}/explore?method=getExploreEvents&lat={lat}&lon={lon}",
                            self.site_base
                        ),
                        max_pages: MAX_PAGES,
                    });
                }
                if page > 0 {
                    self.pace().await;
                }
                let response = self.fetch_explore_page(&lat, &lon, page, &location.state).await?;
                tracing::info!(
                    state = %location.state,
                    page,
                    events = response.events.len(),
                    remaining = response.remaining,
                    "explore page fetched"
                );

                for event in &response.events {
                    collector.insert(&event.url, &location.state);
                }
                snapshots.write_events(collector.events())?;

                if collector.at_cap() {
                    tracing::info!(cap = EVENT_CAP, "event cap reached, ending sweep");
                    break 'sweep;
                }
                if response.remaining == 0 {
                    tracing::debug!(state = %location.state, "no events remaining for location");
                    break;
                }
                page += 1;
            }
        }

        tracing::info!(events = collector.len(), "event discovery complete");
        Ok(collector.into_events())
    }

    async fn fetch_explore_page(
        &mut self,
        lat: &str,
        lon: &str,
        page: u32,
        state: &str,
    ) -> Result<ExploreResponse, ScraperError> {
        // The coordinate tokens are pre-escaped for URL embedding; building
        // the query by hand keeps them byte-exact.
        let url = format!(
            "{}/explore?method=getExploreEvents&lat={lat}&lon={lon}&page={page}",
            self.site_base
        );

        let (http, session) = (&self.http, &mut self.session);
        let response = send_with_refresh(session, self.attempts, &url, |session| {
            http.get(&url)
                .header(header::ACCEPT, "*/*")
                .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, &session.cookies)
                .header(header::USER_AGENT, &session.user_agent)
        })
        .await?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ScraperError::Deserialize {
            context: format!("explore page {page} for state {state}"),
            source: e,
        })
    }
}
