//! From-scratch BM25 ranking
//!
//! Okapi BM25 with the classic `k1`/`b` parameters plus an `epsilon` floor
//! on inverse document frequency so ubiquitous terms never contribute a
//! zero or negative weight. The scorer is a pure function over a snapshot
//! of the corpus statistics; it never mutates index state.

use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult};

/// BM25 tuning parameters, fixed at engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation: higher values let repeated terms
    /// contribute more before diminishing returns set in
    pub k1: f32,

    /// Document-length normalization strength in [0, 1]: 0 disables it,
    /// 1 normalizes fully
    pub b: f32,

    /// Lower bound on inverse document frequency
    pub epsilon: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.2,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

impl Bm25Params {
    /// Fail fast on out-of-range parameters.
    pub fn validate(&self) -> SearchResult<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(SearchError::InvalidConfiguration(format!(
                "k1 must be a non-negative number, got {}",
                self.k1
            )));
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(SearchError::InvalidConfiguration(format!(
                "b must be within [0, 1], got {}",
                self.b
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(SearchError::InvalidConfiguration(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Per-search scorer over a consistent snapshot of corpus statistics.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Scorer {
    params: Bm25Params,
    document_count: usize,
    average_document_length: f32,
}

impl Bm25Scorer {
    pub fn new(params: Bm25Params, document_count: usize, average_document_length: f32) -> Self {
        Self {
            params,
            document_count,
            average_document_length,
        }
    }

    /// Inverse document frequency with the epsilon floor:
    /// `max(epsilon, ln((N - df + 0.5) / (df + 0.5) + 1))`.
    pub fn idf(&self, document_frequency: usize) -> f32 {
        let n = self.document_count as f32;
        let df = document_frequency as f32;
        let raw = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
        raw.max(self.params.epsilon)
    }

    /// Score of one term occurrence profile in one document:
    /// `idf(t) * (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * len/avgLen))`.
    pub fn term_score(
        &self,
        document_frequency: usize,
        term_frequency: u32,
        document_length: u32,
    ) -> f32 {
        if term_frequency == 0 {
            return 0.0;
        }
        let tf = term_frequency as f32;
        let length_ratio = if self.average_document_length > 0.0 {
            document_length as f32 / self.average_document_length
        } else {
            1.0
        };
        let denominator =
            tf + self.params.k1 * (1.0 - self.params.b + self.params.b * length_ratio);
        self.idf(document_frequency) * tf * (self.params.k1 + 1.0) / denominator
    }
}
