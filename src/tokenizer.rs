//! Domain-aware tokenization for mainframe text
//!
//! Splits raw text into normalized tokens while preserving mainframe
//! vocabulary: acronyms (JCL, CICS, VSAM, ...), dataset names
//! (`PROD.PAYROLL.DATA`, `SYS1.PROCLIB(MYPROC)`, `MY.GDG(+1)`), symbolic
//! parameters (`&SYSUID`) and alphanumeric compounds (`S0C7`, `VERSION1.2`).
//! Domain tokens are canonicalized to uppercase and never stemmed; ordinary
//! words are lowercased and optionally stemmed.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Dataset name: dot-separated qualifiers with an optional member or
/// relative-generation suffix, e.g. `SYS1.PROCLIB(MYPROC)` or `MY.GDG(+1)`.
static DATASET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[A-Z$#@][A-Z0-9$#@]{0,7}(?:\.[A-Z$#@][A-Z0-9$#@]{0,7})+(?:\((?:[+-]?\d{1,4}|[A-Z$#@][A-Z0-9$#@]{0,7})\))?$",
    )
    .expect("valid dataset regex")
});

/// Single-qualifier name with a member or relative-generation suffix,
/// e.g. `PROCLIB(MYPROC)` or `WEEKLY(+1)`.
static MEMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z$#@][A-Z0-9$#@]{0,7}\((?:[+-]?\d{1,4}|[A-Z$#@][A-Z0-9$#@]{0,7})\)$")
        .expect("valid member regex")
});

/// JCL symbolic parameter, e.g. `&SYSUID` or `&&TEMP`.
static SYMBOLIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^&&?[A-Z$#@][A-Z0-9$#@]{0,7}$").expect("valid symbolic regex"));

/// Dotted version literal, e.g. `VERSION1.2`, `V2.4.1` or `1.2`.
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{0,15}\d+(?:\.\d+)+$").expect("valid version regex"));

/// Ordinary word runs inside a chunk that is not a domain token.
static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").expect("valid word regex"));

static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// Acronyms and terms recognized out of the box. Terms containing `/` or
/// `-` are matched whole before any punctuation splitting applies.
const BUILTIN_TERMS: &[&str] = &[
    "JCL", "COBOL", "CICS", "VSAM", "QSAM", "BSAM", "DB2", "IMS", "MQ", "MVS", "TSO", "ISPF",
    "SDSF", "RACF", "REXX", "CLIST", "ABEND", "GDG", "PDS", "PDSE", "DASD", "DSN", "JES2", "JES3",
    "SMF", "RMF", "WLM", "IPL", "LPAR", "IDCAMS", "IEBGENER", "IEBCOPY", "IEFBR14", "DFSORT",
    "SYNCSORT", "SYSIN", "SYSOUT", "SYSPRINT", "SYSUDUMP", "SYSABEND", "STEPLIB", "JOBLIB",
    "PROCLIB", "LRECL", "BLKSIZE", "RECFM", "DISP", "DCB", "SPOOL", "SQLCODE", "SQLSTATE",
    "COMMAREA", "ENDEVOR", "CHANGEMAN", "Z/OS", "OS/390", "I/O", "CA-7", "CA-11", "DFSMS",
    "DFHSM", "HSM", "ICETOOL", "XPEDITER", "INTERTEST", "OMEGAMON", "NETVIEW", "VTAM", "SNA",
];

/// Tokenizer configuration, fixed at engine construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Additional domain terms preserved as single tokens (matched
    /// case-insensitively, emitted uppercase)
    #[serde(default)]
    pub custom_terms: Vec<String>,

    /// Apply suffix stemming to ordinary word tokens
    #[serde(default = "default_stemming")]
    pub stemming: bool,
}

fn default_stemming() -> bool {
    true
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            custom_terms: Vec::new(),
            stemming: true,
        }
    }
}

/// Deterministic, domain-aware tokenizer.
///
/// The same instance is used for documents and queries so both sides
/// normalize identically.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    dictionary: HashSet<String>,
    stemming: bool,
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Self {
        let mut dictionary: HashSet<String> =
            BUILTIN_TERMS.iter().map(|t| t.to_string()).collect();
        for term in &config.custom_terms {
            let canonical = term.trim().to_uppercase();
            if canonical.len() > 1 {
                dictionary.insert(canonical);
            }
        }
        Self {
            dictionary,
            stemming: config.stemming,
        }
    }

    /// Tokenize `text` into a normalized token sequence. Empty input and
    /// punctuation-only input yield an empty sequence.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for chunk in text.split_whitespace() {
            self.tokenize_chunk(chunk, &mut tokens);
        }
        tokens
    }

    fn tokenize_chunk(&self, chunk: &str, out: &mut Vec<String>) {
        // Domain matchers run against progressively trimmed forms so that
        // `MY.GDG(+1),` and `(JCL)` still match whole.
        if let Some(token) = self.match_domain(chunk) {
            out.push(token);
            return;
        }
        let bare = strip_trailing_punct(chunk);
        if bare != chunk {
            if let Some(token) = self.match_domain(bare) {
                out.push(token);
                return;
            }
        }
        let enclosed = strip_trailing_punct(strip_enclosing(chunk));
        if enclosed != bare {
            if let Some(token) = self.match_domain(enclosed) {
                out.push(token);
                return;
            }
        }

        for m in WORD_RE.find_iter(enclosed) {
            let word = m.as_str();
            if word.len() < 2 {
                continue;
            }
            if let Some(token) = self.match_dictionary(word) {
                out.push(token);
            } else if word.bytes().any(|b| b.is_ascii_digit()) {
                // Alphanumeric compound (S0C7, JCL123): preserved whole,
                // canonical uppercase, exempt from stemming.
                out.push(word.to_uppercase());
            } else {
                let lower = word.to_lowercase();
                if self.stemming && lower.len() > 2 {
                    out.push(STEMMER.stem(&lower).to_string());
                } else {
                    out.push(lower);
                }
            }
        }
    }

    /// Match a whole chunk as a domain token: dictionary term (optionally
    /// pluralized), dataset/member name, symbolic parameter, or version
    /// literal.
    fn match_domain(&self, s: &str) -> Option<String> {
        if s.len() < 2 {
            return None;
        }
        if let Some(token) = self.match_dictionary(s) {
            return Some(token);
        }
        if DATASET_RE.is_match(s)
            || MEMBER_RE.is_match(s)
            || SYMBOLIC_RE.is_match(s)
            || VERSION_RE.is_match(s)
        {
            return Some(s.to_uppercase());
        }
        None
    }

    /// Dictionary lookup, including pluralized acronyms: `jcls` matches the
    /// `JCL` entry and is emitted as `JCLs`, distinct from `JCL` and immune
    /// to stemming.
    fn match_dictionary(&self, s: &str) -> Option<String> {
        let upper = s.to_uppercase();
        if self.dictionary.contains(&upper) {
            return Some(upper);
        }
        if let Some(base) = upper.strip_suffix('S') {
            if self.dictionary.contains(base) {
                return Some(format!("{base}s"));
            }
        }
        None
    }
}

fn strip_trailing_punct(s: &str) -> &str {
    s.trim_end_matches(|c| matches!(c, '.' | ',' | ';' | ':' | '!' | '?'))
}

fn strip_enclosing(s: &str) -> &str {
    s.trim_matches(|c| {
        matches!(
            c,
            '(' | ')' | '[' | ']' | '{' | '}' | '<' | '>' | '"' | '\'' | '`' | ',' | ';' | '!' | '?'
        )
    })
}
