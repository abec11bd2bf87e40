//! Error types for search operations

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations.
///
/// Malformed *query* input is never an error: the parser normalizes or
/// drops bad operator sequences and a query that matches nothing simply
/// returns no results. These variants cover genuine contract violations
/// detected at configuration or insertion time, plus internal-consistency
/// breaches that must halt a search rather than return a wrong score.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Invalid engine configuration (e.g. negative `k1`, `b` outside [0, 1])
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A supplied document violates the document contract (e.g. empty id)
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Index corruption: a posting references a document the index no
    /// longer holds. Non-recoverable.
    #[error("Index corruption detected: {0}")]
    IndexCorruption(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SearchError::InvalidConfiguration("k1 must be non-negative".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: k1 must be non-negative"
        );

        let err = SearchError::IndexCorruption("term 'jcl' references doc 'kb-9'".to_string());
        assert!(err.to_string().starts_with("Index corruption detected"));
    }
}
