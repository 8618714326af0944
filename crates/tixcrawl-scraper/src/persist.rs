//! Snapshot artifacts.
//!
//! Three files in the output directory, each fully rewritten after every
//! successful page (snapshot semantics, not append semantics). Writes go to
//! a `.part` sibling first and are renamed into place, so a crash never
//! leaves a torn artifact; the previous snapshot survives until the new one
//! is complete.

use std::path::PathBuf;

use crate::collect::TicketBook;
use crate::error::ScraperError;
use crate::types::EventRef;

/// Tabular `Url,State` view of the discovered events.
pub const EVENTS_CSV: &str = "events_urls.csv";
/// JSON array of `{"Url": .., "State": ..}` records.
pub const EVENT_URLS_JSON: &str = "event_urls.json";
/// State-keyed object of per-event listing batches.
pub const TICKET_DETAILS_JSON: &str = "ticket_details.json";

/// Writes the run's snapshot artifacts into one directory.
pub struct SnapshotWriter {
    dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Rewrite both event-URL artifacts (tabular and JSON) from the
    /// accumulated event list.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Persist`] on any I/O failure.
    pub fn write_events(&self, events: &[EventRef]) -> Result<(), ScraperError> {
        let json = serde_json::to_vec_pretty(events)
            .map_err(|e| self.persist_error(EVENT_URLS_JSON, e.into()))?;
        self.replace_file(EVENT_URLS_JSON, &json)?;
        self.replace_file(EVENTS_CSV, render_csv(events).as_bytes())?;
        tracing::debug!(events = events.len(), "event snapshots rewritten");
        Ok(())
    }

    /// Rewrite the state-grouped ticket artifact from the accumulated book.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Persist`] on any I/O failure.
    pub fn write_tickets(&self, book: &TicketBook) -> Result<(), ScraperError> {
        let json = serde_json::to_vec_pretty(book)
            .map_err(|e| self.persist_error(TICKET_DETAILS_JSON, e.into()))?;
        self.replace_file(TICKET_DETAILS_JSON, &json)?;
        tracing::debug!(listings = book.total_listings(), "ticket snapshot rewritten");
        Ok(())
    }

    fn replace_file(&self, name: &str, bytes: &[u8]) -> Result<(), ScraperError> {
        let part = self.dir.join(format!("{name}.part"));
        std::fs::write(&part, bytes).map_err(|e| self.persist_error(name, e))?;
        std::fs::rename(&part, self.dir.join(name)).map_err(|e| self.persist_error(name, e))
    }

    fn persist_error(&self, name: &str, source: std::io::Error) -> ScraperError {
        ScraperError::Persist {
            path: self.dir.join(name).display().to_string(),
            source,
        }
    }
}

fn render_csv(events: &[EventRef]) -> String {
    let mut out = String::from("Url,State\n");
    for event in events {
        out.push_str(&csv_field(&event.url));
        out.push(',');
        out.push_str(&csv_field(&event.state));
        out.push('\n');
    }
    out
}

/// Quote a field only when it needs it (comma, quote, or newline inside).
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::collect::TicketBook;

    fn event(url: &str, state: &str) -> EventRef {
        EventRef {
            url: url.to_string(),
            state: state.to_string(),
        }
    }

    #[test]
    fn event_snapshot_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());
        let events = vec![
            event("https://site/event/1", "NY"),
            event("https://site/event/2", "CA"),
        ];
        writer.write_events(&events).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(EVENT_URLS_JSON)).unwrap();
        let read: Vec<EventRef> = serde_json::from_str(&raw).unwrap();
        assert_eq!(read, events);
        assert!(
            raw.contains("\"Url\""),
            "snapshot keeps the original field casing"
        );
    }

    #[test]
    fn csv_snapshot_has_header_and_one_row_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());
        writer
            .write_events(&[event("https://site/event/1", "NY")])
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join(EVENTS_CSV)).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines, vec!["Url,State", "https://site/event/1,NY"]);
    }

    #[test]
    fn csv_quotes_fields_containing_commas() {
        let raw = render_csv(&[event("https://site/q?a=1,b=2", "NY")]);
        assert!(raw.contains("\"https://site/q?a=1,b=2\",NY"));
    }

    #[test]
    fn rewrite_replaces_rather_than_appends() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());
        writer
            .write_events(&[
                event("https://site/event/1", "NY"),
                event("https://site/event/2", "NY"),
            ])
            .unwrap();
        writer.write_events(&[event("https://site/event/1", "NY")]).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(EVENT_URLS_JSON)).unwrap();
        let read: Vec<EventRef> = serde_json::from_str(&raw).unwrap();
        assert_eq!(read.len(), 1, "snapshot reflects current state only");
    }

    #[test]
    fn no_part_file_remains_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());
        writer.write_events(&[event("https://site/event/1", "NY")]).unwrap();
        assert!(!dir.path().join(format!("{EVENT_URLS_JSON}.part")).exists());
        assert!(!dir.path().join(format!("{EVENTS_CSV}.part")).exists());
    }

    #[test]
    fn ticket_snapshot_matches_book_contents() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(dir.path());
        let mut book = TicketBook::new();
        book.begin_event("NY");
        book.push_page("NY", vec![json!({"seat": "A1"}), json!({"seat": "A2"})]);
        writer.write_tickets(&book).unwrap();

        let raw = std::fs::read_to_string(dir.path().join(TICKET_DETAILS_JSON)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, json!({"NY": [[{"seat": "A1"}, {"seat": "A2"}]]}));
    }

    #[test]
    fn write_into_missing_directory_fails_with_persist_error() {
        let writer = SnapshotWriter::new("/nonexistent/tixcrawl-output");
        let result = writer.write_events(&[event("https://site/event/1", "NY")]);
        assert!(matches!(result, Err(ScraperError::Persist { .. })));
    }
}
