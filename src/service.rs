//! Main search service implementation
//!
//! Orchestrates the search pipeline: tokenize the query, retrieve
//! candidates from the inverted index, rank them with BM25, apply filters
//! and pagination, and attach highlighted snippets to the returned page
//! only. Index mutations are serialized behind a write lock; searches run
//! concurrently under read locks and observe the index and its statistics
//! as one consistent snapshot.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use strum_macros::Display;
use tracing::debug;

use crate::bm25::Bm25Scorer;
use crate::config::SearchConfig;
use crate::document::Document;
use crate::error::{SearchError, SearchResult};
use crate::index::{IndexStats, InvertedIndex};
use crate::query::{QueryNode, SearchQuery, SearchSort};
use crate::snippet::SnippetExtractor;
use crate::tokenizer::Tokenizer;

/// Pipeline stage of a search call. Emitted with tracing events so slow or
/// failing searches can be attributed to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SearchPhase {
    Tokenizing,
    Retrieving,
    Ranking,
    Snippeting,
}

/// A single search result hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Document id
    pub id: String,

    /// Document title
    pub title: String,

    /// Document body text
    pub content: String,

    /// Classification tag (empty = uncategorized)
    pub category: String,

    /// Tags (never null; empty when absent)
    pub tags: Vec<String>,

    /// Last modification timestamp
    pub last_updated: DateTime<Utc>,

    /// BM25 relevance score
    pub score: f32,

    /// Highlighted excerpt (empty when highlighting is disabled)
    pub snippet: String,
}

/// Search response with results and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The returned page of results
    pub hits: Vec<SearchHit>,

    /// Total number of matches before pagination
    pub total_hits: usize,

    /// The query text that was executed
    pub query: String,

    /// Offset used for pagination
    pub offset: usize,

    /// Limit used for pagination
    pub limit: usize,

    /// Search execution time in milliseconds
    pub search_time_ms: u64,
}

/// Prefix completion for autocomplete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSuggestion {
    /// Completed term
    pub text: String,

    /// Number of documents containing the term
    pub document_frequency: usize,
}

/// Main search service
pub struct SearchService {
    config: SearchConfig,
    tokenizer: Tokenizer,
    extractor: SnippetExtractor,
    index: RwLock<InvertedIndex>,
}

impl SearchService {
    /// Create a new search service. Fails fast on invalid configuration.
    pub fn new(config: SearchConfig) -> SearchResult<Self> {
        config.validate()?;
        let tokenizer = Tokenizer::new(&config.tokenizer);
        let extractor = SnippetExtractor::new(config.snippet.clone());
        Ok(Self {
            config,
            tokenizer,
            extractor,
            index: RwLock::new(InvertedIndex::new()),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Index a document. Re-adding an id replaces the previous version.
    pub fn add_document(&self, document: Document) -> SearchResult<()> {
        let id = document.id.clone();
        let mut index = self.index.write();
        index.add_document(&self.tokenizer, document)?;
        debug!(doc_id = %id, total = index.document_count(), "document indexed");
        Ok(())
    }

    /// Index a batch of documents under a single writer pass, so readers
    /// observe either none or all of the batch.
    pub fn add_documents(&self, documents: Vec<Document>) -> SearchResult<usize> {
        let mut index = self.index.write();
        let mut indexed = 0;
        for document in documents {
            index.add_document(&self.tokenizer, document)?;
            indexed += 1;
        }
        debug!(indexed, total = index.document_count(), "batch indexed");
        Ok(indexed)
    }

    /// Remove a document. Missing ids are a no-op and return `false`.
    pub fn remove_document(&self, id: &str) -> bool {
        let removed = self.index.write().remove_document(id);
        if removed {
            debug!(doc_id = %id, "document removed");
        }
        removed
    }

    /// Drop all indexed documents.
    pub fn clear(&self) {
        self.index.write().clear();
    }

    pub fn document_count(&self) -> usize {
        self.index.read().document_count()
    }

    pub fn stats(&self) -> IndexStats {
        self.index.read().stats()
    }

    /// Execute a search. Malformed query text never errors: it normalizes
    /// to fewer terms or to an empty result set.
    pub fn search(&self, query: &SearchQuery) -> SearchResult<SearchResponse> {
        let started = Instant::now();

        debug!(phase = %SearchPhase::Tokenizing, query = %query.query, "parsing query");
        let ast = QueryNode::parse(&self.tokenizer, &query.query);

        // One read guard for the whole pipeline: candidates, statistics and
        // stored documents all come from the same index state.
        let index = self.index.read();

        let Some(ast) = ast else {
            return Ok(Self::empty_response(query, started));
        };

        debug!(phase = %SearchPhase::Retrieving, "collecting candidates");
        let candidates = ast.evaluate(&index);
        let scoring_terms = ast.scoring_terms(&index);
        if candidates.is_empty() || scoring_terms.is_empty() {
            return Ok(Self::empty_response(query, started));
        }

        debug!(
            phase = %SearchPhase::Ranking,
            candidates = candidates.len(),
            terms = scoring_terms.len(),
            "scoring candidates"
        );
        let scorer = Bm25Scorer::new(
            self.config.bm25,
            index.document_count(),
            index.average_document_length(),
        );
        let mut scores: HashMap<&str, f32> = HashMap::new();
        for term in &scoring_terms {
            let document_frequency = index.document_frequency(term);
            for posting in index.postings(term) {
                let id = posting.doc_id.as_str();
                if !candidates.contains(id) {
                    continue;
                }
                let stored = index.get(id).ok_or_else(|| {
                    SearchError::IndexCorruption(format!(
                        "term '{term}' references unknown document '{id}'"
                    ))
                })?;
                *scores.entry(id).or_insert(0.0) +=
                    scorer.term_score(document_frequency, posting.term_frequency, stored.length);
            }
        }

        let mut ranked = Vec::with_capacity(scores.len());
        for (id, score) in scores {
            if score <= 0.0 {
                continue;
            }
            let stored = index.get(id).ok_or_else(|| {
                SearchError::IndexCorruption(format!("scored document '{id}' is missing"))
            })?;
            if !matches_filters(query, &stored.document) {
                continue;
            }
            ranked.push((stored, score));
        }

        match query.sort {
            SearchSort::Relevance => ranked.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.0.ordinal.cmp(&b.0.ordinal))
            }),
            SearchSort::Updated => ranked.sort_by(|a, b| {
                b.0.document
                    .last_updated
                    .cmp(&a.0.document.last_updated)
                    .then(a.0.ordinal.cmp(&b.0.ordinal))
            }),
        }

        let total_hits = ranked.len();
        let limit = query.limit.min(self.config.max_results);
        let page = ranked.into_iter().skip(query.offset).take(limit);

        debug!(phase = %SearchPhase::Snippeting, "building result page");
        let hits: Vec<SearchHit> = page
            .map(|(stored, score)| {
                let snippet = if query.highlight {
                    self.extractor
                        .extract(&self.tokenizer, &stored.document.content, &scoring_terms)
                } else {
                    String::new()
                };
                SearchHit {
                    id: stored.document.id.clone(),
                    title: stored.document.title.clone(),
                    content: stored.document.content.clone(),
                    category: stored.document.category.clone(),
                    tags: stored.document.tags.clone(),
                    last_updated: stored.document.last_updated,
                    score,
                    snippet,
                }
            })
            .collect();

        Ok(SearchResponse {
            hits,
            total_hits,
            query: query.query.clone(),
            offset: query.offset,
            limit: query.limit,
            search_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Prefix completions from the index dictionary, most frequent first.
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<SearchSuggestion> {
        let prefix = prefix.trim();
        if prefix.is_empty() || limit == 0 {
            return Vec::new();
        }
        let index = self.index.read();
        let mut terms = index.terms_with_prefix(prefix);
        terms.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        terms
            .into_iter()
            .take(limit)
            .map(|(term, document_frequency)| SearchSuggestion {
                text: term.to_string(),
                document_frequency,
            })
            .collect()
    }

    fn empty_response(query: &SearchQuery, started: Instant) -> SearchResponse {
        SearchResponse {
            hits: Vec::new(),
            total_hits: 0,
            query: query.query.clone(),
            offset: query.offset,
            limit: query.limit,
            search_time_ms: started.elapsed().as_millis() as u64,
        }
    }
}

fn matches_filters(query: &SearchQuery, document: &Document) -> bool {
    if let Some(ref category) = query.category {
        if !document.category.eq_ignore_ascii_case(category) {
            return false;
        }
    }
    if let Some(ref tags) = query.tags {
        if !tags.is_empty() {
            let matched = document
                .tags
                .iter()
                .any(|t| tags.iter().any(|wanted| t.eq_ignore_ascii_case(wanted)));
            if !matched {
                return false;
            }
        }
    }
    true
}
