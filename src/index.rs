//! In-memory inverted index and corpus statistics
//!
//! Maps terms to postings lists and maintains exact corpus statistics
//! (document frequency, average document length) after every mutation.
//! The index holds no durable state; the external persistence layer
//! replays documents after a restart.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::document::Document;
use crate::error::SearchResult;
use crate::tokenizer::Tokenizer;

/// A single entry in a term's postings list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Id of the document containing the term
    pub doc_id: String,
    /// Number of times the term appears in that document
    pub term_frequency: u32,
}

/// Index statistics surfaced to the consuming layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of indexed documents
    pub total_documents: usize,
    /// Number of distinct terms across the corpus
    pub total_terms: usize,
    /// Mean token count per document
    pub average_document_length: f32,
}

/// A document as held by the index: the external record plus the derived
/// token sequence and length, recomputed on every (re-)add.
#[derive(Debug, Clone)]
pub(crate) struct StoredDocument {
    pub document: Document,
    pub tokens: Vec<String>,
    pub length: u32,
    /// Monotonic insertion ordinal; the stable tie-break for ranking.
    pub ordinal: u64,
}

impl StoredDocument {
    /// True if `words` occur as a contiguous token run in this document.
    pub fn contains_phrase(&self, words: &[String]) -> bool {
        if words.is_empty() || words.len() > self.tokens.len() {
            return false;
        }
        self.tokens.windows(words.len()).any(|w| w == words)
    }
}

/// Inverted index with single-owner mutation semantics. Concurrent access
/// is coordinated by the search service, which wraps the index in a
/// read-write lock so readers always observe postings and statistics from
/// the same consistent state.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<Posting>>,
    documents: HashMap<String, StoredDocument>,
    total_tokens: u64,
    next_ordinal: u64,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a document. Re-adding an existing id replaces the previous
    /// version (remove-then-add), so postings are never duplicated and the
    /// corpus statistics stay exact.
    pub fn add_document(
        &mut self,
        tokenizer: &Tokenizer,
        document: Document,
    ) -> SearchResult<()> {
        document.validate()?;
        self.remove_document(&document.id);

        let tokens = tokenizer.tokenize(&document.searchable_text());
        let length = tokens.len() as u32;
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;

        let mut frequencies: HashMap<&str, u32> = HashMap::new();
        for token in &tokens {
            *frequencies.entry(token.as_str()).or_insert(0) += 1;
        }
        for (term, term_frequency) in frequencies {
            self.postings.entry(term.to_string()).or_default().push(Posting {
                doc_id: document.id.clone(),
                term_frequency,
            });
        }

        self.total_tokens += u64::from(length);
        self.documents.insert(
            document.id.clone(),
            StoredDocument {
                document,
                tokens,
                length,
                ordinal,
            },
        );
        Ok(())
    }

    /// Remove a document by id. Missing ids are a no-op and return `false`.
    /// Only the removed document's own terms are touched.
    pub fn remove_document(&mut self, id: &str) -> bool {
        let Some(stored) = self.documents.remove(id) else {
            return false;
        };
        let mut seen: Vec<&str> = stored.tokens.iter().map(String::as_str).collect();
        seen.sort_unstable();
        seen.dedup();
        for term in seen {
            if let Some(list) = self.postings.get_mut(term) {
                list.retain(|p| p.doc_id != id);
                if list.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
        self.total_tokens -= u64::from(stored.length);
        true
    }

    /// Postings list for a term, in document-insertion order. Unknown terms
    /// yield an empty slice.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of documents containing the term at least once.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map(Vec::len).unwrap_or(0)
    }

    /// Mean token count over the current document set (0.0 when empty).
    pub fn average_document_length(&self) -> f32 {
        if self.documents.is_empty() {
            return 0.0;
        }
        self.total_tokens as f32 / self.documents.len() as f32
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub(crate) fn get(&self, id: &str) -> Option<&StoredDocument> {
        self.documents.get(id)
    }

    pub(crate) fn document_ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Dictionary terms starting with `prefix` (case-insensitive), with
    /// their document frequencies. Backs trailing-`*` wildcards and
    /// suggestions.
    pub fn terms_with_prefix(&self, prefix: &str) -> Vec<(&str, usize)> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let needle = prefix.to_lowercase();
        let mut terms: Vec<(&str, usize)> = self
            .postings
            .iter()
            .filter(|(term, _)| term.to_lowercase().starts_with(&needle))
            .map(|(term, list)| (term.as_str(), list.len()))
            .collect();
        terms.sort_unstable_by(|a, b| a.0.cmp(b.0));
        terms
    }

    /// Drop all documents and statistics.
    pub fn clear(&mut self) {
        self.postings.clear();
        self.documents.clear();
        self.total_tokens = 0;
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_documents: self.documents.len(),
            total_terms: self.postings.len(),
            average_document_length: self.average_document_length(),
        }
    }
}
