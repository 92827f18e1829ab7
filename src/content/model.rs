//! Journal entry and page models

use serde::Serialize;

use super::metadata::{JournalEntryMetadata, PageMetadata};

/// A compiled journal entry.
///
/// Constructed once from disk and held in the store's cache; listing queries
/// hand out clones and never mutate the cached value.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    /// Directory name under the journal root; the entry's unique key.
    pub slug: String,
    pub metadata: JournalEntryMetadata,
    /// Compiled body HTML.
    pub content_html: String,
    /// Compiled deprecation note, present only when the metadata carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_note_html: Option<String>,
    /// Filled in by the route layer, not the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_recently_updated: Option<bool>,
}

/// A compiled static page. Never cached; recompiled on every request.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub metadata: PageMetadata,
    pub content_html: String,
}
