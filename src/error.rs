//! Error handling for rate queries
//!
//! Rate queries never propagate plumbing errors to their caller: everything
//! that can go wrong while computing a rate ends up as a [`QueryError`].
//! Internal plumbing (providers, config, CLI) keeps using anyhow for context
//! chaining.

use thiserror::Error;

/// Failure of a single rate query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Table is empty or lacks the value column the rate needs
    #[error("validation error: {0}")]
    Validation(String),

    /// The time-series source could not deliver the series
    #[error("provider error: {0}")]
    Provider(String),

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// Holds the rejected kind as given by the caller
    #[error("invalid rate \"{0}\"! Use \"selic\", \"ipca\" or \"cdi\".")]
    InvalidKind(String),
}

/// Result type alias for plumbing operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = QueryError::Validation("series X returned no rows".to_string());
        assert_eq!(err.to_string(), "validation error: series X returned no rows");
    }

    #[test]
    fn test_invalid_kind_names_the_kind() {
        let err = QueryError::InvalidKind("bogus".to_string());
        assert_eq!(
            err.to_string(),
            "invalid rate \"bogus\"! Use \"selic\", \"ipca\" or \"cdi\"."
        );
    }

    #[test]
    fn test_query_error_variants() {
        let provider_err = QueryError::Provider("timeout".to_string());
        assert!(provider_err.to_string().starts_with("provider error"));

        let arithmetic_err = QueryError::Arithmetic("overflow".to_string());
        assert!(arithmetic_err.to_string().starts_with("arithmetic error"));
    }

    #[test]
    fn test_anyhow_chain_flattens_into_provider_error() {
        use anyhow::Context;
        let result: Result<()> =
            Err(anyhow::anyhow!("connection refused")).context("failed to fetch BM12_TJCDI12");
        let err = result.map_err(|e| QueryError::Provider(format!("{:#}", e)));
        match err {
            Err(QueryError::Provider(msg)) => {
                assert!(msg.contains("failed to fetch BM12_TJCDI12"));
                assert!(msg.contains("connection refused"));
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }
}
