//! Error types for the widget binding layer
//!
//! Only `Configuration` errors ever escape `initialize` - remote fetch
//! failures are recovered inside the search pipeline and surfaced to the
//! widget as an empty result page instead.

use std::fmt;

/// Errors that can occur while managing a select widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    /// Missing or invalid control configuration (empty control id,
    /// no backing element for the control, etc.)
    Configuration(String),
    /// Network failure while fetching a result page
    Network(String),
    /// Remote payload could not be parsed as a paginated result set
    Parse(String),
}

impl SelectError {
    /// True if this error is visible to the host as an initialization failure
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for SelectError {}
