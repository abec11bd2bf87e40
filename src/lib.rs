//! Domain-aware full-text search for mainframe knowledge bases
//!
//! This crate indexes and ranks short technical documents written in
//! mainframe jargon (incident records and knowledge-base entries full of
//! JCL, COBOL, CICS and dataset names) and is consumed as a library by
//! the surrounding storage/UI layer:
//!
//! - **Domain Tokenization**: acronyms, dataset names (`PROD.PAYROLL.DATA`),
//!   symbolic parameters and abend codes survive as single tokens; ordinary
//!   words are stemmed
//! - **Inverted Index**: postings plus exact corpus statistics after every
//!   mutation, replayed by the external persistence layer on restart
//! - **BM25 Ranking**: tunable `k1`/`b`/`epsilon`, stable tie-breaking
//! - **Query Language**: terms, quoted phrases, `AND`/`OR`/`NOT`,
//!   parentheses and trailing-`*` wildcards; malformed input degrades
//!   instead of raising
//! - **Snippets & Highlighting**: relevance-picked excerpts with merged,
//!   well-formed highlight spans
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           SearchService (facade)                 │
//! ├─────────────────────────────────────────────────┤
//! │  tokenize → retrieve → rank → filter/paginate   │
//! │           → snippet the returned page           │
//! └─────────────────────────────────────────────────┘
//!        │               │                │
//!        ▼               ▼                ▼
//! ┌────────────┐  ┌─────────────┐  ┌──────────────┐
//! │ Tokenizer  │  │ Inverted    │  │ Bm25Scorer / │
//! │ (domain    │  │ Index +     │  │ Snippet-     │
//! │ dictionary)│  │ corpus stats│  │ Extractor    │
//! └────────────┘  └─────────────┘  └──────────────┘
//! ```
//!
//! Mutations are serialized behind a write lock; searches run concurrently
//! under read locks against a consistent snapshot of postings and
//! statistics.
//!
//! # Example
//!
//! ```
//! use mainframe_kb_search::{Document, SearchConfig, SearchQuery, SearchService};
//!
//! # fn main() -> Result<(), mainframe_kb_search::SearchError> {
//! let service = SearchService::new(SearchConfig::default())?;
//!
//! service.add_document(
//!     Document::new(
//!         "kb-001",
//!         "S0C7 abend in nightly payroll",
//!         "Data exception in COMP-3 field; check PROD.PAYROLL.DATA(+1) input",
//!     )
//!     .with_category("abend")
//!     .with_tags(vec!["cobol", "batch"]),
//! )?;
//!
//! let results = service.search(&SearchQuery::new("payroll abend").with_limit(20))?;
//! assert_eq!(results.total_hits, 1);
//! # Ok(())
//! # }
//! ```

pub mod bm25;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod query;
pub mod service;
pub mod snippet;
pub mod tokenizer;

pub use bm25::{Bm25Params, Bm25Scorer};
pub use config::{SearchConfig, SearchConfigBuilder};
pub use document::Document;
pub use error::{SearchError, SearchResult};
pub use index::{IndexStats, InvertedIndex, Posting};
pub use query::{QueryNode, SearchQuery, SearchSort};
pub use service::{
    SearchHit, SearchPhase, SearchResponse, SearchService, SearchSuggestion,
};
pub use snippet::{SnippetConfig, SnippetExtractor};
pub use tokenizer::{Tokenizer, TokenizerConfig};
