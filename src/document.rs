//! Knowledge-base document supplied by the external storage layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult};

/// A knowledge-base entry (incident record, runbook note, fix description)
/// as supplied by the surrounding storage/UI layer.
///
/// The `id` is the document's immutable identity; everything else may change
/// between submissions. Token sequences and document lengths are derived
/// state owned by the index: re-adding a document with the same id replaces
/// the previous version and recomputes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document id (owned by the external persistence layer)
    pub id: String,

    /// Entry title
    pub title: String,

    /// Entry body text
    pub content: String,

    /// Single-valued classification tag (empty = uncategorized)
    #[serde(default)]
    pub category: String,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Last modification timestamp
    pub last_updated: DateTime<Utc>,
}

impl Document {
    /// Create a new document with the given identity, title and content.
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            category: String::new(),
            tags: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the tags
    pub fn with_tags(mut self, tags: Vec<impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(|t| t.into()).collect();
        self
    }

    /// Set the last-updated timestamp
    pub fn with_last_updated(mut self, at: DateTime<Utc>) -> Self {
        self.last_updated = at;
        self
    }

    /// Validate the document contract. A missing id is a programming error
    /// on the caller's side and fails fast at insertion.
    pub fn validate(&self) -> SearchResult<()> {
        if self.id.trim().is_empty() {
            return Err(SearchError::InvalidDocument(
                "document id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The text that gets indexed: title and body, in that order.
    pub(crate) fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}
