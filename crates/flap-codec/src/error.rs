//! Error types for capture and descriptor parsing

use thiserror::Error;

/// Errors that can occur while turning a capture or descriptor into a request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No frequency field in the source
    #[error("missing frequency")]
    MissingFrequency,

    /// Capture has no pulse-duration sequence
    #[error("missing capture data (no RAW_Data sequence)")]
    MissingCaptureData,

    /// None of the accepted payload sources is present
    #[error("missing payload: provide payload, payload_hex, payload_b64 or raw_durations_us")]
    MissingPayload,

    /// Unknown `tx_power_mode` value
    #[error("invalid power mode: {0}")]
    InvalidPowerMode(String),

    /// Modulation name not recognized
    #[error("unsupported modulation: {0}")]
    UnsupportedModulation(String),

    /// A field required by the selected mode is absent
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field is present but its value cannot be used
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Base64 payload failed to decode
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),

    /// Descriptor is not a well-formed JSON object of the expected shape
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// File suffix is not one of the replayable formats
    #[error("unsupported file type for replay: {0}")]
    UnsupportedFileType(String),

    /// Source file could not be read
    #[error("I/O error: {0}")]
    Io(String),
}

impl ParseError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidDescriptor(e.to_string())
    }
}
