//! Shared crawl output types.

use serde::{Deserialize, Serialize};

/// A discovered event page, tagged with the sweep state that found it.
///
/// Serializes with the artifact's established `Url`/`State` field casing so
/// snapshots stay readable by downstream consumers of the original format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventRef {
    pub url: String,
    pub state: String,
}
