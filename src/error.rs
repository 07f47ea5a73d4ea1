//! Error type shared by every pipeline stage.
//!
//! Each variant carries enough context (kind + offending parameter) for a
//! front end to render a message without inspecting the inputs again.
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EcogError>;

#[derive(Debug, Error)]
pub enum EcogError {
    /// Invalid or nonsensical parameter (non-positive frequency, band above
    /// Nyquist, empty band selection, non-square grid, ...).
    #[error("invalid {parameter}: {reason}")]
    Configuration { parameter: String, reason: String },

    /// Not enough data to produce a result (no trials, every epoch outside
    /// the recording, empty series).
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("channel {channel} out of range (recording has {n_channels} channels)")]
    ChannelIndex { channel: usize, n_channels: usize },

    /// Failure surfaced from the channel store (missing interface,
    /// unreadable or unwritable container).
    #[error("store error: {0}")]
    Store(String),

    /// A background job ended without producing a result.
    #[error("job aborted: {0}")]
    Aborted(String),
}

impl EcogError {
    pub(crate) fn config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        EcogError::Configuration { parameter: parameter.into(), reason: reason.into() }
    }
}

impl From<std::io::Error> for EcogError {
    fn from(value: std::io::Error) -> Self {
        EcogError::Store(value.to_string())
    }
}

impl From<serde_json::Error> for EcogError {
    fn from(value: serde_json::Error) -> Self {
        EcogError::Store(format!("JSON: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_message_names_parameter() {
        let e = EcogError::config("notch", "must be positive, got -60");
        assert_eq!(e.to_string(), "invalid notch: must be positive, got -60");
    }

    #[test]
    fn io_errors_become_store_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(EcogError::from(io), EcogError::Store(_)));
    }

    #[test]
    fn json_errors_do_not_blame_the_header() {
        let json = serde_json::from_str::<Vec<usize>>("[1,").unwrap_err();
        let msg = EcogError::from(json).to_string();
        assert!(msg.starts_with("store error: JSON:"), "{msg}");
        assert!(!msg.contains("header"), "{msg}");
    }
}
