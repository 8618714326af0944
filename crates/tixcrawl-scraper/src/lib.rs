pub mod collect;
pub mod crawl;
pub mod error;
pub mod explore;
mod fetch;
pub mod geo;
pub mod listings;
pub mod persist;
pub mod session;
pub mod types;

pub use collect::{EventCollector, TicketBook, EVENT_CAP};
pub use crawl::{Crawler, CrawlerConfig, MAX_PAGES};
pub use error::ScraperError;
pub use geo::encode_coordinate;
pub use persist::SnapshotWriter;
pub use session::{BrowserApi, Session, SessionManager};
pub use types::EventRef;
