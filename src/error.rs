//! Error types for the nowcast feature pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, NowcastError>;

/// Main error type for the feature pipeline
///
/// Configuration errors surface at pipeline construction, before any data is
/// touched. Data integrity and alignment errors abort the run for the affected
/// dataset entirely; the pipeline never emits partially transformed output.
/// Expected null propagation (missing raw observations, trailing lag-window
/// nulls, incomplete rolling windows, incomplete final-quarter vintages) is
/// not an error and is preserved verbatim.
#[derive(Error, Debug)]
pub enum NowcastError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Alignment error: {0}")]
    Alignment(String),
}
