//! Error types for the Pozyx link layer

use thiserror::Error;

/// Result type for Pozyx link operations
pub type Result<T> = std::result::Result<T, LinkError>;

/// Errors surfaced at the transport boundary of a Pozyx link.
///
/// Decode-side failures never appear here: a bad checksum or a malformed
/// field increments a [`crate::LinkStats`] counter and the decoder
/// resumes at the next `$` start marker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Serial transport failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Baud-rate reconfiguration failure
    #[error("Baud error: {0}")]
    Baud(String),
}

impl LinkError {
    /// Create a new Transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        LinkError::Transport(msg.into())
    }

    /// Create a new Baud error
    pub fn baud(msg: impl Into<String>) -> Self {
        LinkError::Baud(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LinkError::transport("port closed");
        assert!(err.to_string().contains("Transport error"));

        let err = LinkError::baud("rate not supported");
        assert!(err.to_string().contains("Baud error"));
    }
}
