//! Listing phase: per-event paginated ticket inventory.
//!
//! One POST per page against the event's own URL, page cursor starting at 1.
//! Pagination for an event ends at the first page with zero items. The
//! request body and browser-mimicry headers reproduce what the site's own
//! frontend sends.

use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collect::TicketBook;
use crate::crawl::{Crawler, MAX_PAGES};
use crate::error::ScraperError;
use crate::fetch::send_with_refresh;
use crate::persist::SnapshotWriter;
use crate::types::EventRef;

const PAGE_SIZE: u32 = 20;
const TICKET_QUANTITY: u32 = 2;
const PRICE_RANGE: &str = "0,100";
const SORT_BY: &str = "NEWPRICE";
/// Opaque visit marker the inventory endpoint expects on every request.
const PAGE_VISIT_ID: &str = "8B9A160A-F8B7-4256-9412-827CB48FD137";

const SEC_CH_UA: &str =
    r#""Google Chrome";v="131", "Chromium";v="131", "Not_A Brand";v="24""#;

/// Inventory request body. Field names serialize in the endpoint's
/// PascalCase wire format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingRequest {
    show_all_tickets: bool,
    hide_duplicate_tickets_v2: bool,
    quantity: u32,
    is_initial_quantity_change: bool,
    page_visit_id: &'static str,
    page_size: u32,
    current_page: u32,
    sort_by: &'static str,
    sort_direction: u32,
    sections: &'static str,
    rows: &'static str,
    seats: &'static str,
    seat_types: &'static str,
    ticket_classes: &'static str,
    listing_notes: &'static str,
    price_range: &'static str,
    instant_delivery: bool,
    estimated_fees: bool,
    better_value_tickets: bool,
    price_option: &'static str,
    has_flexible_pricing: bool,
    exclude_sold_listings: bool,
    remove_obstructed_view: bool,
    new_listings_only: bool,
    price_drop_listings_only: bool,
    select_best_listing: bool,
    concierge_tickets: bool,
    favorites: bool,
    method: &'static str,
}

impl ListingRequest {
    #[must_use]
    pub fn for_page(page: u32) -> Self {
        Self {
            show_all_tickets: true,
            hide_duplicate_tickets_v2: false,
            quantity: TICKET_QUANTITY,
            is_initial_quantity_change: false,
            page_visit_id: PAGE_VISIT_ID,
            page_size: PAGE_SIZE,
            current_page: page,
            sort_by: SORT_BY,
            sort_direction: 0,
            sections: "",
            rows: "",
            seats: "",
            seat_types: "",
            ticket_classes: "",
            listing_notes: "",
            price_range: PRICE_RANGE,
            instant_delivery: false,
            estimated_fees: false,
            better_value_tickets: true,
            price_option: "",
            has_flexible_pricing: false,
            exclude_sold_listings: false,
            remove_obstructed_view: false,
            new_listings_only: false,
            price_drop_listings_only: false,
            select_best_listing: false,
            concierge_tickets: false,
            favorites: false,
            method: "IndexSh",
        }
    }
}

/// One page of inventory. The `items` key is required; a response without
/// it is malformed and aborts the run. Items are kept opaque since the site
/// owns their schema.
#[derive(Debug, Deserialize)]
pub struct ListingPageResponse {
    pub items: Vec<Value>,
}

impl Crawler {
    /// Walk each event's ticket inventory in order, grouping listing batches
    /// by state.
    ///
    /// The ticket snapshot is rewritten after every successful page, the
    /// empty final page included; a crash loses at most the in-flight page.
    ///
    /// # Errors
    ///
    /// Same fatal taxonomy as
    /// [`collect_event_urls`](Crawler::collect_event_urls): any error aborts
    /// the run, leaving the last written snapshot as the partial result.
    pub async fn collect_listings(
        &mut self,
        events: &[EventRef],
        snapshots: &SnapshotWriter,
    ) -> Result<TicketBook, ScraperError> {
        let mut book = TicketBook::new();
        tracing::info!(events = events.len(), "starting listing collection");

        for event in events {
            book.begin_event(&event.state);
            let mut page = 1u32;
            tracing::debug!(url = %event.url, state = %event.state, "collecting event listings");

            loop {
                if page > MAX_PAGES {
                    return Err(ScraperError::PaginationLimit {
                        url: event.url.clone(),
                        max_pages: MAX_PAGES,
                    });
                }
                if page > 1 {
                    self.pace().await;
                }
                let response = self.fetch_listing_page(&event.url, page).await?;
                tracing::info!(
                    url = %event.url,
                    page,
                    items = response.items.len(),
                    "listing page fetched"
                );

                if response.items.is_empty() {
                    snapshots.write_tickets(&book)?;
                    tracing::debug!(url = %event.url, "no more listings for event");
                    break;
                }
                book.push_page(&event.state, response.items);
                snapshots.write_tickets(&book)?;
                page += 1;
            }
        }

        tracing::info!(
            states = book.state_count(),
            listings = book.total_listings(),
            "listing collection complete"
        );
        Ok(book)
    }

    async fn fetch_listing_page(
        &mut self,
        event_url: &str,
        page: u32,
    ) -> Result<ListingPageResponse, ScraperError> {
        let referer = format!("{event_url}/?quantity={TICKET_QUANTITY}");
        let body = ListingRequest::for_page(page);

        let (http, session, origin) = (&self.http, &mut self.session, &self.site_base);
        let response = send_with_refresh(session, self.attempts, event_url, |session| {
            http.post(event_url)
                .header(header::ACCEPT, "*/*")
                .header(header::ACCEPT_LANGUAGE, "en-GB,en-US;q=0.9,en;q=0.8")
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, &session.cookies)
                .header(header::ORIGIN, origin)
                .header(header::PRAGMA, "no-cache")
                .header("priority", "u=1, i")
                .header(header::REFERER, &referer)
                .header("sec-ch-ua", SEC_CH_UA)
                .header("sec-ch-ua-mobile", "?0")
                .header("sec-ch-ua-platform", "\"Windows\"")
                .header("sec-fetch-dest", "empty")
                .header("sec-fetch-mode", "cors")
                .header("sec-fetch-site", "same-origin")
                .header(header::USER_AGENT, &session.user_agent)
                .json(&body)
        })
        .await?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ScraperError::Deserialize {
            context: format!("listing page {page} from {event_url}"),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_the_wire_field_names() {
        let value = serde_json::to_value(ListingRequest::for_page(3)).unwrap();
        assert_eq!(value["CurrentPage"], 3);
        assert_eq!(value["PageSize"], 20);
        assert_eq!(value["Quantity"], 2);
        assert_eq!(value["ShowAllTickets"], true);
        assert_eq!(value["HideDuplicateTicketsV2"], false);
        assert_eq!(value["SortBy"], "NEWPRICE");
        assert_eq!(value["PriceRange"], "0,100");
        assert_eq!(value["Method"], "IndexSh");
    }

    #[test]
    fn missing_items_key_is_a_parse_error() {
        let result: Result<ListingPageResponse, _> = serde_json::from_str(r#"{"total": 5}"#);
        assert!(result.is_err(), "items is a required key");
    }

    #[test]
    fn unknown_response_fields_are_ignored() {
        let raw = r#"{"items": [{"seat": "A1"}], "total": 41, "currentPage": 1}"#;
        let page: ListingPageResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(page.items.len(), 1);
    }
}
