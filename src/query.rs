//! Query parsing and search options
//!
//! The query surface accepts bare terms (`JCL`), quoted phrases
//! (`"job control language"`), boolean `AND`/`OR`/`NOT` with parentheses,
//! and trailing-`*` prefix wildcards (`program*`). Parsing produces a typed
//! AST; malformed operator sequences are normalized or dropped instead of
//! raising, so a bad query degrades to fewer (or no) results, never an
//! error for the caller.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::index::InvertedIndex;
use crate::tokenizer::Tokenizer;

/// Sorting options for search results. Both orders are descending and
/// tie-broken by document insertion order, so repeated calls against an
/// unchanged corpus page stably.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchSort {
    /// BM25 score, highest first
    #[default]
    Relevance,
    /// `last_updated`, newest first
    Updated,
}

/// Caller-facing search request: the query text plus filter, sort and
/// pagination options. Filters are post-retrieval predicates and never
/// affect term statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query text (terms, phrases, booleans, wildcards)
    pub query: String,

    /// Restrict results to one category
    pub category: Option<String>,

    /// Restrict results to documents carrying at least one of these tags
    pub tags: Option<Vec<String>>,

    /// Sorting criteria
    pub sort: SearchSort,

    /// Page size
    pub limit: usize,

    /// Page offset
    pub offset: usize,

    /// Attach highlighted snippets to the returned page
    pub highlight: bool,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            tags: None,
            sort: SearchSort::default(),
            limit: 20,
            offset: 0,
            highlight: true,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<impl Into<String>>) -> Self {
        self.tags = Some(tags.into_iter().map(|t| t.into()).collect());
        self
    }

    pub fn with_sort(mut self, sort: SearchSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }
}

/// Typed query AST. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    /// Single normalized term
    Term(String),
    /// Contiguous token sequence
    Phrase(Vec<String>),
    /// Trailing-`*` wildcard, expanded against the index dictionary
    Prefix(String),
    And(Box<QueryNode>, Box<QueryNode>),
    Or(Box<QueryNode>, Box<QueryNode>),
    Not(Box<QueryNode>),
}

impl QueryNode {
    /// Parse a raw query string. Returns `None` when nothing searchable
    /// remains after normalization (empty input, operators only, pure
    /// punctuation).
    pub fn parse(tokenizer: &Tokenizer, input: &str) -> Option<QueryNode> {
        let tokens = balance(lex(input));
        let mut parser = Parser {
            tokenizer,
            tokens,
            position: 0,
        };
        parser.parse_or()
    }

    /// Candidate documents for this node. Boolean structure maps onto set
    /// operations over postings; phrases additionally require a contiguous
    /// token run in the stored document.
    pub(crate) fn evaluate<'a>(&self, index: &'a InvertedIndex) -> HashSet<&'a str> {
        match self {
            QueryNode::Term(term) => index
                .postings(term)
                .iter()
                .map(|p| p.doc_id.as_str())
                .collect(),
            QueryNode::Prefix(prefix) => {
                let mut docs = HashSet::new();
                for (term, _) in index.terms_with_prefix(prefix) {
                    docs.extend(index.postings(term).iter().map(|p| p.doc_id.as_str()));
                }
                docs
            }
            QueryNode::Phrase(words) => {
                let mut candidates: Option<HashSet<&str>> = None;
                for word in words {
                    let docs: HashSet<&str> = index
                        .postings(word)
                        .iter()
                        .map(|p| p.doc_id.as_str())
                        .collect();
                    candidates = Some(match candidates {
                        None => docs,
                        Some(existing) => existing.intersection(&docs).copied().collect(),
                    });
                }
                candidates
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|id| {
                        index
                            .get(id)
                            .map(|stored| stored.contains_phrase(words))
                            .unwrap_or(false)
                    })
                    .collect()
            }
            QueryNode::And(left, right) => {
                let left = left.evaluate(index);
                let right = right.evaluate(index);
                left.intersection(&right).copied().collect()
            }
            QueryNode::Or(left, right) => {
                let mut docs = left.evaluate(index);
                docs.extend(right.evaluate(index));
                docs
            }
            QueryNode::Not(inner) => {
                let excluded = inner.evaluate(index);
                index
                    .document_ids()
                    .filter(|id| !excluded.contains(id))
                    .collect()
            }
        }
    }

    /// Distinct positive terms of the query, in left-to-right order, with
    /// prefixes expanded against the index dictionary. Negated subtrees
    /// contribute nothing: their terms must not score or highlight.
    pub(crate) fn scoring_terms(&self, index: &InvertedIndex) -> Vec<String> {
        let mut terms = Vec::new();
        let mut seen = HashSet::new();
        self.collect_scoring_terms(index, &mut terms, &mut seen);
        terms
    }

    fn collect_scoring_terms(
        &self,
        index: &InvertedIndex,
        terms: &mut Vec<String>,
        seen: &mut HashSet<String>,
    ) {
        match self {
            QueryNode::Term(term) => {
                if seen.insert(term.clone()) {
                    terms.push(term.clone());
                }
            }
            QueryNode::Phrase(words) => {
                for word in words {
                    if seen.insert(word.clone()) {
                        terms.push(word.clone());
                    }
                }
            }
            QueryNode::Prefix(prefix) => {
                for (term, _) in index.terms_with_prefix(prefix) {
                    if seen.insert(term.to_string()) {
                        terms.push(term.to_string());
                    }
                }
            }
            QueryNode::And(left, right) | QueryNode::Or(left, right) => {
                left.collect_scoring_terms(index, terms, seen);
                right.collect_scoring_terms(index, terms, seen);
            }
            QueryNode::Not(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RawToken {
    Word(String),
    Phrase(String),
    LParen,
    RParen,
    And,
    Or,
    Not,
}

fn lex(input: &str) -> Vec<RawToken> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut position = 0;
    while position < chars.len() {
        let c = chars[position];
        if c.is_whitespace() {
            position += 1;
            continue;
        }
        match c {
            '(' => {
                tokens.push(RawToken::LParen);
                position += 1;
            }
            ')' => {
                tokens.push(RawToken::RParen);
                position += 1;
            }
            '"' => {
                position += 1;
                let mut phrase = String::new();
                while position < chars.len() && chars[position] != '"' {
                    phrase.push(chars[position]);
                    position += 1;
                }
                if position < chars.len() {
                    position += 1;
                }
                // An unclosed quote swallows the rest of the input.
                tokens.push(RawToken::Phrase(phrase));
            }
            _ => {
                let mut word = String::new();
                while position < chars.len() {
                    let c = chars[position];
                    if c.is_whitespace() || matches!(c, ')' | '"') {
                        break;
                    }
                    if c == '(' {
                        // A paren glued to a word is part of it only when it
                        // closes before the next whitespace, as in `MY.GDG(+1)`
                        // or `SYS1.PROCLIB(MYPROC)`. Otherwise it opens a group.
                        match paren_run(&chars, position) {
                            Some(end) if !word.is_empty() => {
                                while position <= end {
                                    word.push(chars[position]);
                                    position += 1;
                                }
                                continue;
                            }
                            _ => break,
                        }
                    }
                    word.push(c);
                    position += 1;
                }
                tokens.push(match word.as_str() {
                    w if w.eq_ignore_ascii_case("and") => RawToken::And,
                    w if w.eq_ignore_ascii_case("or") => RawToken::Or,
                    w if w.eq_ignore_ascii_case("not") => RawToken::Not,
                    _ => RawToken::Word(word),
                });
            }
        }
    }
    tokens
}

/// Index of the `)` closing a `(` at `start`, provided no whitespace, quote
/// or nested paren intervenes before it.
fn paren_run(chars: &[char], start: usize) -> Option<usize> {
    let mut position = start + 1;
    while position < chars.len() {
        match chars[position] {
            ')' => return Some(position),
            '(' | '"' => return None,
            c if c.is_whitespace() => return None,
            _ => position += 1,
        }
    }
    None
}

/// Drop close-parens with no matching open-paren. Unclosed open-parens are
/// tolerated by the parser itself (they close at end of input).
fn balance(tokens: Vec<RawToken>) -> Vec<RawToken> {
    let mut depth = 0usize;
    tokens
        .into_iter()
        .filter(|token| match token {
            RawToken::LParen => {
                depth += 1;
                true
            }
            RawToken::RParen => {
                if depth == 0 {
                    false
                } else {
                    depth -= 1;
                    true
                }
            }
            _ => true,
        })
        .collect()
}

struct Parser<'a> {
    tokenizer: &'a Tokenizer,
    tokens: Vec<RawToken>,
    position: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&RawToken> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<RawToken> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Option<QueryNode> {
        let mut node: Option<QueryNode> = None;
        loop {
            if let Some(operand) = self.parse_and() {
                node = Some(match node {
                    None => operand,
                    Some(left) => QueryNode::Or(Box::new(left), Box::new(operand)),
                });
            }
            match self.peek() {
                Some(RawToken::Or) => {
                    self.advance();
                }
                _ => break,
            }
        }
        node
    }

    fn parse_and(&mut self) -> Option<QueryNode> {
        let mut node: Option<QueryNode> = None;
        loop {
            match self.peek() {
                None | Some(RawToken::Or) | Some(RawToken::RParen) => break,
                Some(RawToken::And) => {
                    // Separator between operands; duplicates (`a AND AND b`)
                    // collapse here.
                    self.advance();
                    continue;
                }
                _ => {}
            }
            if let Some(operand) = self.parse_unary() {
                node = Some(match node {
                    None => operand,
                    Some(left) => QueryNode::And(Box::new(left), Box::new(operand)),
                });
            }
        }
        node
    }

    fn parse_unary(&mut self) -> Option<QueryNode> {
        let mut negate = false;
        while matches!(self.peek(), Some(RawToken::Not)) {
            self.advance();
            negate = !negate;
        }
        let primary = match self.peek() {
            Some(RawToken::LParen) => {
                self.advance();
                let inner = self.parse_or();
                if matches!(self.peek(), Some(RawToken::RParen)) {
                    self.advance();
                }
                inner
            }
            Some(RawToken::Word(_)) => match self.advance() {
                Some(RawToken::Word(word)) => self.word_node(&word),
                _ => None,
            },
            Some(RawToken::Phrase(_)) => match self.advance() {
                Some(RawToken::Phrase(phrase)) => self.phrase_node(&phrase),
                _ => None,
            },
            // A dangling NOT (`NOT`, `NOT OR x`): the operand is missing,
            // so the negation is dropped without consuming what follows.
            _ => None,
        };
        match primary {
            Some(node) if negate => Some(QueryNode::Not(Box::new(node))),
            other => other,
        }
    }

    fn word_node(&self, word: &str) -> Option<QueryNode> {
        if let Some(prefix) = word.strip_suffix('*') {
            let prefix = prefix.trim_matches('*');
            if prefix.is_empty() {
                return None;
            }
            return Some(QueryNode::Prefix(prefix.to_lowercase()));
        }
        let tokens = self.tokenizer.tokenize(word);
        fold_and(tokens.into_iter().map(QueryNode::Term))
    }

    fn phrase_node(&self, phrase: &str) -> Option<QueryNode> {
        let mut tokens = self.tokenizer.tokenize(phrase);
        match tokens.len() {
            0 => None,
            1 => Some(QueryNode::Term(tokens.remove(0))),
            _ => Some(QueryNode::Phrase(tokens)),
        }
    }
}

fn fold_and(nodes: impl Iterator<Item = QueryNode>) -> Option<QueryNode> {
    nodes.fold(None, |acc, node| {
        Some(match acc {
            None => node,
            Some(left) => QueryNode::And(Box::new(left), Box::new(node)),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TokenizerConfig;

    fn parse(input: &str) -> Option<QueryNode> {
        let tokenizer = Tokenizer::new(&TokenizerConfig::default());
        QueryNode::parse(&tokenizer, input)
    }

    fn term(t: &str) -> QueryNode {
        QueryNode::Term(t.to_string())
    }

    #[test]
    fn test_implicit_and_between_terms() {
        assert_eq!(
            parse("mainframe JCL"),
            Some(QueryNode::And(
                Box::new(term("mainfram")),
                Box::new(term("JCL"))
            ))
        );
    }

    #[test]
    fn test_explicit_boolean_operators() {
        assert_eq!(
            parse("JCL OR COBOL"),
            Some(QueryNode::Or(Box::new(term("JCL")), Box::new(term("COBOL"))))
        );
        assert_eq!(
            parse("JCL NOT COBOL"),
            Some(QueryNode::And(
                Box::new(term("JCL")),
                Box::new(QueryNode::Not(Box::new(term("COBOL"))))
            ))
        );
    }

    #[test]
    fn test_grouping() {
        assert_eq!(
            parse("(JCL OR COBOL) cics"),
            Some(QueryNode::And(
                Box::new(QueryNode::Or(
                    Box::new(term("JCL")),
                    Box::new(term("COBOL"))
                )),
                Box::new(term("CICS"))
            ))
        );
    }

    #[test]
    fn test_quoted_phrase() {
        assert_eq!(
            parse("\"job control language\""),
            Some(QueryNode::Phrase(vec![
                "job".to_string(),
                "control".to_string(),
                "languag".to_string()
            ]))
        );
        // A one-word phrase degrades to a plain term.
        assert_eq!(parse("\"JCL\""), Some(term("JCL")));
    }

    #[test]
    fn test_prefix_wildcard() {
        assert_eq!(parse("program*"), Some(QueryNode::Prefix("program".to_string())));
        assert_eq!(parse("*"), None);
    }

    #[test]
    fn test_malformed_operator_sequences_are_absorbed() {
        assert_eq!(
            parse("JCL AND AND COBOL"),
            Some(QueryNode::And(
                Box::new(term("JCL")),
                Box::new(term("COBOL"))
            ))
        );
        assert_eq!(parse("AND AND"), None);
        assert_eq!(parse("OR"), None);
        assert_eq!(parse("NOT"), None);
        assert_eq!(parse("JCL AND"), Some(term("JCL")));
        assert_eq!(parse("OR JCL"), Some(term("JCL")));
    }

    #[test]
    fn test_unbalanced_parens_are_tolerated() {
        assert_eq!(
            parse("(JCL OR COBOL"),
            Some(QueryNode::Or(Box::new(term("JCL")), Box::new(term("COBOL"))))
        );
        assert_eq!(parse("JCL) cobol)"), parse("JCL cobol"));
        assert_eq!(parse("()"), None);
    }

    #[test]
    fn test_dataset_member_word_is_not_a_group() {
        assert_eq!(
            parse("prod.payroll.data(+1)"),
            Some(term("PROD.PAYROLL.DATA(+1)"))
        );
        // A paren that opens a spaced expression still groups.
        assert_eq!(
            parse("jcl(restart OR rerun)"),
            Some(QueryNode::And(
                Box::new(term("JCL")),
                Box::new(QueryNode::Or(
                    Box::new(term("restart")),
                    Box::new(term("rerun"))
                ))
            ))
        );
    }

    #[test]
    fn test_unclosed_quote_takes_rest_of_input() {
        assert_eq!(
            parse("\"job control"),
            Some(QueryNode::Phrase(vec![
                "job".to_string(),
                "control".to_string()
            ]))
        );
    }

    #[test]
    fn test_double_negation_cancels() {
        assert_eq!(parse("NOT NOT JCL"), Some(term("JCL")));
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("!!! ???"), None);
    }

    #[test]
    fn test_search_query_builder() {
        let query = SearchQuery::new("vsam status 93")
            .with_category("abend")
            .with_tags(vec!["vsam", "batch"])
            .with_sort(SearchSort::Updated)
            .with_limit(50)
            .with_offset(10)
            .with_highlight(false);

        assert_eq!(query.query, "vsam status 93");
        assert_eq!(query.category.as_deref(), Some("abend"));
        assert_eq!(query.tags.as_ref().map(Vec::len), Some(2));
        assert_eq!(query.sort, SearchSort::Updated);
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 10);
        assert!(!query.highlight);
    }
}
