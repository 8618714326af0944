//! Command handlers: wire configuration, profile selection, and the crawler
//! together. On a fatal error the process exits non-zero and the last
//! persisted snapshots stay on disk as the usable partial result.

use std::path::Path;

use anyhow::Context;
use rand::seq::IndexedRandom;

use tixcrawl_core::AppConfig;
use tixcrawl_scraper::{BrowserApi, Crawler, CrawlerConfig, EventRef, SnapshotWriter};

/// Full pipeline: search phase into listing phase on one session.
pub async fn run(config: &AppConfig, locations_path: &Path) -> anyhow::Result<()> {
    let locations = tixcrawl_core::load_locations(locations_path)?;
    let snapshots = SnapshotWriter::new(&config.output_dir);
    let mut crawler = connect(config).await?;

    let events = crawler.collect_event_urls(&locations, &snapshots).await?;
    let book = crawler.collect_listings(&events, &snapshots).await?;
    tracing::info!(
        events = events.len(),
        states = book.state_count(),
        listings = book.total_listings(),
        "run complete"
    );

    release(&crawler).await;
    Ok(())
}

/// Search phase only.
pub async fn events(config: &AppConfig, locations_path: &Path) -> anyhow::Result<()> {
    let locations = tixcrawl_core::load_locations(locations_path)?;
    let snapshots = SnapshotWriter::new(&config.output_dir);
    let mut crawler = connect(config).await?;

    let events = crawler.collect_event_urls(&locations, &snapshots).await?;
    tracing::info!(events = events.len(), "event discovery complete");

    release(&crawler).await;
    Ok(())
}

/// Listing phase only, resuming from a saved event snapshot.
pub async fn listings(config: &AppConfig, events_path: Option<&Path>) -> anyhow::Result<()> {
    let default_path = config.output_dir.join(tixcrawl_scraper::persist::EVENT_URLS_JSON);
    let events_path = events_path.unwrap_or(&default_path);
    let events = load_event_snapshot(events_path)?;
    let snapshots = SnapshotWriter::new(&config.output_dir);
    let mut crawler = connect(config).await?;

    let book = crawler.collect_listings(&events, &snapshots).await?;
    tracing::info!(
        states = book.state_count(),
        listings = book.total_listings(),
        "listing collection complete"
    );

    release(&crawler).await;
    Ok(())
}

/// Delete a profile on the browser-automation service.
pub async fn drop_profile(config: &AppConfig, profile_id: &str) -> anyhow::Result<()> {
    let api = BrowserApi::new(&config.browser_api_url, config.request_timeout_secs)?;
    api.delete_profile(profile_id).await?;
    Ok(())
}

/// Pick a random profile and establish a proxied crawler session for it.
async fn connect(config: &AppConfig) -> anyhow::Result<Crawler> {
    let profiles = tixcrawl_core::load_profiles(&config.profiles_path)?;
    let profile = profiles
        .choose(&mut rand::rng())
        .cloned()
        .context("no crawl profiles available")?;
    tracing::info!(profile = %profile.id, "selected crawl profile");

    let api = BrowserApi::new(&config.browser_api_url, config.request_timeout_secs)?;
    let crawler = Crawler::connect(CrawlerConfig::from(config), profile, api).await?;
    tracing::debug!(
        proxy = %crawler.session_manager().proxy_url(),
        "crawler connected"
    );
    Ok(crawler)
}

fn load_event_snapshot(path: &Path) -> anyhow::Result<Vec<EventRef>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read event snapshot {}", path.display()))?;
    let events: Vec<EventRef> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse event snapshot {}", path.display()))?;
    anyhow::ensure!(!events.is_empty(), "event snapshot {} is empty", path.display());
    Ok(events)
}

/// Best-effort release of the profile's browser at the end of a run.
async fn release(crawler: &Crawler) {
    if let Err(err) = crawler.session_manager().release().await {
        tracing::warn!(error = %err, "failed to release browser session");
    }
}
