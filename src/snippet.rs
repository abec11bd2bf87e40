//! Relevance-aware snippet extraction and term highlighting
//!
//! Selects the excerpt of a document that best covers the query terms:
//! windows containing more distinct terms win, and among those, windows
//! where the matches cluster tighter win. Matched spans are wrapped in the
//! configured highlight tag; overlapping or adjacent matches merge into a
//! single well-formed span. Matching is case-insensitive (via the engine
//! tokenizer, so stemmed and domain forms match) while the original source
//! casing is preserved inside the markup.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{SearchError, SearchResult};
use crate::tokenizer::Tokenizer;

/// Snippet configuration, fixed at engine construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetConfig {
    /// Maximum excerpt length in characters (highlight markup and ellipsis
    /// markers are not counted against the cap)
    pub max_length: usize,

    /// Words of context kept on each side of the selected match cluster
    pub context_words: usize,

    /// Tag name wrapped around matched spans, e.g. `mark` → `<mark>..</mark>`
    pub highlight_tag: String,

    /// Marker appended (and prepended) where the excerpt was cut
    pub ellipsis: String,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            max_length: 280,
            context_words: 10,
            highlight_tag: "mark".to_string(),
            ellipsis: "...".to_string(),
        }
    }
}

impl SnippetConfig {
    /// Fail fast on unusable settings.
    pub fn validate(&self) -> SearchResult<()> {
        if self.max_length == 0 {
            return Err(SearchError::InvalidConfiguration(
                "snippet max_length must be greater than zero".to_string(),
            ));
        }
        if self.highlight_tag.trim().is_empty() {
            return Err(SearchError::InvalidConfiguration(
                "snippet highlight_tag must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// One word of source text: its byte range within the content.
type WordSpan = (usize, usize);

/// A word that matched at least one query term.
struct WordMatch {
    word_index: usize,
    terms: Vec<String>,
}

/// A run of matches considered as one excerpt candidate.
struct Cluster {
    first_word: usize,
    last_word: usize,
    distinct_terms: usize,
    match_count: usize,
}

impl Cluster {
    fn spread(&self) -> usize {
        self.last_word - self.first_word
    }

    /// More distinct terms wins; on ties, tighter clustering, then more
    /// total matches. Earlier clusters win full ties.
    fn beats(&self, other: &Cluster) -> bool {
        if self.distinct_terms != other.distinct_terms {
            return self.distinct_terms > other.distinct_terms;
        }
        if self.spread() != other.spread() {
            return self.spread() < other.spread();
        }
        self.match_count > other.match_count
    }
}

/// Extracts highlighted excerpts. Stateless between calls; safe to share
/// across concurrent searches.
#[derive(Debug, Clone)]
pub struct SnippetExtractor {
    config: SnippetConfig,
}

impl SnippetExtractor {
    pub fn new(config: SnippetConfig) -> Self {
        Self { config }
    }

    /// Extract the best excerpt of `content` for `query_terms` (already
    /// normalized by the engine tokenizer). Empty content yields an empty
    /// string; content without any match yields a plain leading substring.
    pub fn extract(&self, tokenizer: &Tokenizer, content: &str, query_terms: &[String]) -> String {
        if content.is_empty() {
            return String::new();
        }

        let spans = word_spans(content);
        let matches = self.find_matches(tokenizer, content, &spans, query_terms);
        let total_chars = content.chars().count();

        if matches.is_empty() {
            if total_chars <= self.config.max_length {
                return content.to_string();
            }
            let cut = char_cap(content, 0, self.config.max_length);
            return format!("{}{}", &content[..cut], self.config.ellipsis);
        }

        if total_chars <= self.config.max_length {
            return self.render(content, 0, content.len(), &spans, &matches);
        }

        let cluster = self.best_cluster(&matches);
        let window_start = cluster.first_word.saturating_sub(self.config.context_words);
        let window_end = (cluster.last_word + self.config.context_words).min(spans.len() - 1);
        let start_byte = spans[window_start].0;
        let mut end_byte = spans[window_end].1;
        end_byte = char_cap(content, start_byte, self.config.max_length).min(end_byte);

        let body = self.render(content, start_byte, end_byte, &spans, &matches);
        let mut snippet = String::new();
        if start_byte > 0 {
            snippet.push_str(&self.config.ellipsis);
        }
        snippet.push_str(&body);
        if end_byte < content.len() {
            snippet.push_str(&self.config.ellipsis);
        }
        snippet
    }

    /// Words whose normalized tokens intersect the query terms.
    fn find_matches(
        &self,
        tokenizer: &Tokenizer,
        content: &str,
        spans: &[WordSpan],
        query_terms: &[String],
    ) -> Vec<WordMatch> {
        if query_terms.is_empty() {
            return Vec::new();
        }
        let wanted: HashSet<&str> = query_terms.iter().map(String::as_str).collect();
        let mut matches = Vec::new();
        for (word_index, &(start, end)) in spans.iter().enumerate() {
            let terms: Vec<String> = tokenizer
                .tokenize(&content[start..end])
                .into_iter()
                .filter(|token| wanted.contains(token.as_str()))
                .collect();
            if !terms.is_empty() {
                matches.push(WordMatch { word_index, terms });
            }
        }
        matches
    }

    /// Group matches into clusters (a gap of more than twice the context
    /// width starts a new one) and pick the best.
    fn best_cluster(&self, matches: &[WordMatch]) -> Cluster {
        let join_gap = self.config.context_words.max(1) * 2;
        let mut best: Option<Cluster> = None;
        let mut index = 0;
        while index < matches.len() {
            let mut end = index;
            while end + 1 < matches.len()
                && matches[end + 1].word_index - matches[end].word_index <= join_gap
            {
                end += 1;
            }
            let members = &matches[index..=end];
            let distinct: HashSet<&str> = members
                .iter()
                .flat_map(|m| m.terms.iter().map(String::as_str))
                .collect();
            let cluster = Cluster {
                first_word: members[0].word_index,
                last_word: members[members.len() - 1].word_index,
                distinct_terms: distinct.len(),
                match_count: members.len(),
            };
            best = Some(match best {
                None => cluster,
                Some(current) if cluster.beats(&current) => cluster,
                Some(current) => current,
            });
            index = end + 1;
        }
        // find_matches guaranteed non-empty before this is called
        best.unwrap_or(Cluster {
            first_word: 0,
            last_word: 0,
            distinct_terms: 0,
            match_count: 0,
        })
    }

    /// Render `content[start..end]` with matched words wrapped in the
    /// highlight tag. Overlapping and whitespace-adjacent match ranges are
    /// merged first, so the output never nests or interleaves tags.
    fn render(
        &self,
        content: &str,
        start: usize,
        end: usize,
        spans: &[WordSpan],
        matches: &[WordMatch],
    ) -> String {
        let mut ranges: Vec<(usize, usize)> = matches
            .iter()
            .map(|m| spans[m.word_index])
            .filter(|&(s, e)| s >= start && e <= end)
            .collect();
        ranges = merge_ranges(content, ranges);

        let tag = &self.config.highlight_tag;
        let mut out = String::with_capacity(end - start + ranges.len() * (tag.len() * 2 + 5));
        let mut cursor = start;
        for (s, e) in ranges {
            out.push_str(&content[cursor..s]);
            out.push('<');
            out.push_str(tag);
            out.push('>');
            out.push_str(&content[s..e]);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
            cursor = e;
        }
        out.push_str(&content[cursor..end]);
        out
    }
}

/// Byte spans of whitespace-separated words.
fn word_spans(content: &str) -> Vec<WordSpan> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (index, c) in content.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push((s, index));
            }
        } else if start.is_none() {
            start = Some(index);
        }
    }
    if let Some(s) = start {
        spans.push((s, content.len()));
    }
    spans
}

/// Merge ranges that overlap or are separated only by whitespace (a phrase
/// match and a constituent-word match collapse into one span).
fn merge_ranges(content: &str, mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (s, e) in ranges {
        match merged.last_mut() {
            Some(last)
                if s <= last.1
                    || content[last.1..s].chars().all(char::is_whitespace) =>
            {
                last.1 = last.1.max(e);
            }
            _ => merged.push((s, e)),
        }
    }
    merged
}

/// Byte index after at most `max_chars` characters starting at `from`.
fn char_cap(content: &str, from: usize, max_chars: usize) -> usize {
    content[from..]
        .char_indices()
        .nth(max_chars)
        .map(|(offset, _)| from + offset)
        .unwrap_or(content.len())
}
