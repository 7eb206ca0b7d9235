//! Error types for the APD analysis engine

use std::fmt;

/// Errors that can occur during trace analysis
///
/// Per-beat problems (incomplete beats, exhausted threshold searches) are not
/// errors: the affected beat is dropped and counted in the result metadata.
/// These variants cover whole-trace failures only.
#[derive(Debug, Clone)]
pub enum ApdError {
    /// Invalid input parameters (mismatched arrays, non-monotonic time, bad config)
    InvalidInput(String),

    /// Processing error during analysis
    ProcessingError(String),
}

impl fmt::Display for ApdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApdError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ApdError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

impl std::error::Error for ApdError {}
