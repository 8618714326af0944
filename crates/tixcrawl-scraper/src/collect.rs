//! Result accumulation: event dedup and cap, and the state-grouped ticket
//! book.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::types::EventRef;

/// Hard cap on events collected per run, across all locations. Later sweep
/// points get truncated or skipped entirely once earlier ones fill the cap,
/// so input order matters.
pub const EVENT_CAP: usize = 100;

/// Collects event refs across the search sweep.
///
/// Dedup is scoped to one location: the seen-set resets on
/// [`EventCollector::begin_location`], so the same event discovered from two
/// sweep points is recorded once per point. The cap is global.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<EventRef>,
    seen: HashSet<String>,
}

impl EventCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new location query, resetting the dedup scope.
    pub fn begin_location(&mut self) {
        self.seen.clear();
    }

    /// Record an event if its url is new for the current location and the
    /// cap has room. Returns whether the event was added.
    pub fn insert(&mut self, url: &str, state: &str) -> bool {
        if self.events.len() >= EVENT_CAP {
            return false;
        }
        if !self.seen.insert(url.to_owned()) {
            return false;
        }
        self.events.push(EventRef {
            url: url.to_owned(),
            state: state.to_owned(),
        });
        true
    }

    #[must_use]
    pub fn at_cap(&self) -> bool {
        self.events.len() >= EVENT_CAP
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn events(&self) -> &[EventRef] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<EventRef> {
        self.events
    }
}

/// Ticket listings grouped by state, one batch per event, never flattened:
/// the batch boundary records which listings belong to which event. A state
/// key maps to its events' batches in collection order; an event with no
/// listings keeps its empty batch.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct TicketBook {
    by_state: BTreeMap<String, Vec<Vec<Value>>>,
}

impl TicketBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new batch for an event in `state`.
    pub fn begin_event(&mut self, state: &str) {
        self.by_state
            .entry(state.to_owned())
            .or_default()
            .push(Vec::new());
    }

    /// Append one page of listings to the state's current event batch.
    pub fn push_page(&mut self, state: &str, items: Vec<Value>) {
        let batches = self.by_state.entry(state.to_owned()).or_default();
        match batches.last_mut() {
            Some(batch) => batch.extend(items),
            None => batches.push(items),
        }
    }

    #[must_use]
    pub fn batches(&self, state: &str) -> Option<&[Vec<Value>]> {
        self.by_state.get(state).map(Vec::as_slice)
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.by_state.len()
    }

    #[must_use]
    pub fn total_listings(&self) -> usize {
        self.by_state
            .values()
            .flat_map(|batches| batches.iter())
            .map(Vec::len)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn duplicate_url_within_location_is_recorded_once() {
        let mut collector = EventCollector::new();
        collector.begin_location();
        assert!(collector.insert("https://site/event/1", "NY"));
        assert!(!collector.insert("https://site/event/1", "NY"));
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn dedup_scope_resets_per_location() {
        let mut collector = EventCollector::new();
        collector.begin_location();
        assert!(collector.insert("https://site/event/1", "NY"));
        collector.begin_location();
        assert!(
            collector.insert("https://site/event/1", "NJ"),
            "a new location starts with a fresh seen-set"
        );
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn cap_stops_collection_at_exactly_one_hundred() {
        let mut collector = EventCollector::new();
        collector.begin_location();
        for i in 0..150 {
            collector.insert(&format!("https://site/event/{i}"), "NY");
        }
        assert_eq!(collector.len(), EVENT_CAP);
        assert!(collector.at_cap());
        assert!(!collector.insert("https://site/event/extra", "NY"));
    }

    #[test]
    fn cap_is_global_across_locations() {
        let mut collector = EventCollector::new();
        collector.begin_location();
        for i in 0..70 {
            collector.insert(&format!("https://site/event/a{i}"), "NY");
        }
        collector.begin_location();
        for i in 0..70 {
            collector.insert(&format!("https://site/event/b{i}"), "CA");
        }
        assert_eq!(collector.len(), EVENT_CAP);
        let ca = collector
            .events()
            .iter()
            .filter(|e| e.state == "CA")
            .count();
        assert_eq!(ca, 30, "second location only fills what the cap left");
    }

    #[test]
    fn ticket_book_keeps_batch_boundaries() {
        let mut book = TicketBook::new();
        book.begin_event("NY");
        book.push_page("NY", vec![json!({"id": 1}), json!({"id": 2})]);
        book.push_page("NY", vec![json!({"id": 3})]);
        book.begin_event("NY");
        book.push_page("NY", vec![json!({"id": 4})]);

        let batches = book.batches("NY").unwrap();
        assert_eq!(batches.len(), 2, "two events, two batches");
        assert_eq!(batches[0].len(), 3, "pages of one event merge into its batch");
        assert_eq!(batches[1].len(), 1);
        assert_eq!(book.total_listings(), 4);
    }

    #[test]
    fn event_with_no_listings_keeps_empty_batch() {
        let mut book = TicketBook::new();
        book.begin_event("TX");
        let batches = book.batches("TX").unwrap();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].is_empty());
    }

    #[test]
    fn ticket_book_serializes_as_plain_state_map() {
        let mut book = TicketBook::new();
        book.begin_event("NY");
        book.push_page("NY", vec![json!({"seat": "A1"})]);
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value, json!({"NY": [[{"seat": "A1"}]]}));
    }
}
