//! Application-wide error types.

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Startup configuration is missing or invalid. Fatal.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The live-status batch query failed. The current poll cycle is skipped.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A single notification send failed. Only the (room, group) pair is affected.
    #[error("Dispatch error for group {group_id}: {message}")]
    Dispatch { group_id: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    pub fn dispatch(group_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Dispatch {
            group_id: group_id.into(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::dispatch("123456", "HTTP 502");
        assert_eq!(err.to_string(), "Dispatch error for group 123456: HTTP 502");

        let err = Error::upstream("code -400");
        assert_eq!(err.to_string(), "Upstream error: code -400");
    }
}
