//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::bm25::Bm25Params;
use crate::error::SearchResult;
use crate::snippet::SnippetConfig;
use crate::tokenizer::TokenizerConfig;

/// Search engine configuration. Built once at engine instantiation and
/// shared immutably by every component; there is no per-call configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Tokenizer dictionary and stemming options
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    /// BM25 ranking parameters
    #[serde(default)]
    pub bm25: Bm25Params,

    /// Snippet extraction options
    #[serde(default)]
    pub snippet: SnippetConfig,

    /// Hard cap on results returned from a single search
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    1000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerConfig::default(),
            bm25: Bm25Params::default(),
            snippet: SnippetConfig::default(),
            max_results: default_max_results(),
        }
    }
}

impl SearchConfig {
    /// Validate every section. Called by the service constructor so that
    /// bad parameters fail fast instead of skewing scores at query time.
    pub fn validate(&self) -> SearchResult<()> {
        self.bm25.validate()?;
        self.snippet.validate()?;
        if self.max_results == 0 {
            return Err(crate::error::SearchError::InvalidConfiguration(
                "max_results must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`SearchConfig`]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn custom_terms(mut self, terms: Vec<impl Into<String>>) -> Self {
        self.config.tokenizer.custom_terms = terms.into_iter().map(|t| t.into()).collect();
        self
    }

    pub fn stemming(mut self, enabled: bool) -> Self {
        self.config.tokenizer.stemming = enabled;
        self
    }

    pub fn k1(mut self, k1: f32) -> Self {
        self.config.bm25.k1 = k1;
        self
    }

    pub fn b(mut self, b: f32) -> Self {
        self.config.bm25.b = b;
        self
    }

    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.config.bm25.epsilon = epsilon;
        self
    }

    pub fn snippet_max_length(mut self, max_length: usize) -> Self {
        self.config.snippet.max_length = max_length;
        self
    }

    pub fn snippet_context_words(mut self, context_words: usize) -> Self {
        self.config.snippet.context_words = context_words;
        self
    }

    pub fn highlight_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.snippet.highlight_tag = tag.into();
        self
    }

    pub fn ellipsis(mut self, ellipsis: impl Into<String>) -> Self {
        self.config.snippet.ellipsis = ellipsis.into();
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SearchConfigBuilder::new()
            .custom_terms(vec!["PAYRL"])
            .k1(1.5)
            .b(0.5)
            .snippet_max_length(120)
            .highlight_tag("em")
            .max_results(50)
            .build();

        assert_eq!(config.tokenizer.custom_terms, vec!["PAYRL"]);
        assert_eq!(config.bm25.k1, 1.5);
        assert_eq!(config.bm25.b, 0.5);
        assert_eq!(config.snippet.max_length, 120);
        assert_eq!(config.snippet.highlight_tag, "em");
        assert_eq!(config.max_results, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_sections_propagate() {
        let config = SearchConfigBuilder::new().k1(-1.0).build();
        assert!(config.validate().is_err());

        let config = SearchConfigBuilder::new().max_results(0).build();
        assert!(config.validate().is_err());
    }
}
