//! Replayable file formats and suffix-based detection

use std::path::Path;

use tracing::info;

use crate::capture::{decode, DecodeOptions};
use crate::descriptor::parse_descriptor;
use crate::error::ParseError;
use crate::request::{RequestDefaults, TxRequest};

/// Kind of file a transmit request can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Flipper Zero `.sub` pulse-duration capture
    Capture,
    /// `.rfcat.json` transmit descriptor
    Descriptor,
}

impl SourceKind {
    /// Suffix identifying this kind, lowercase
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Capture => ".sub",
            Self::Descriptor => ".rfcat.json",
        }
    }

    /// Detect the kind from a file name, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        [Self::Descriptor, Self::Capture]
            .into_iter()
            .find(|kind| name.ends_with(kind.suffix()))
    }

    /// File name with the known suffix removed (handles `.rfcat.json`)
    pub fn stem(path: &Path) -> Option<String> {
        let name = path.file_name()?.to_string_lossy().into_owned();
        let lower = name.to_ascii_lowercase();
        let cut = [Self::Descriptor, Self::Capture]
            .into_iter()
            .find(|kind| lower.ends_with(kind.suffix()))
            .map(|kind| name.len() - kind.suffix().len());
        match cut {
            Some(end) => Some(name[..end].to_string()),
            None => path.file_stem().map(|s| s.to_string_lossy().into_owned()),
        }
    }
}

/// Build a request from file contents of a known kind
pub fn parse_source(
    kind: SourceKind,
    contents: &str,
    defaults: &RequestDefaults,
) -> Result<TxRequest, ParseError> {
    match kind {
        SourceKind::Capture => {
            decode(contents, &DecodeOptions::from(defaults))?.into_tx_request(defaults)
        }
        SourceKind::Descriptor => parse_descriptor(contents, defaults),
    }
}

/// Read a replay file and build its transmit request
pub fn load_tx_request(path: &Path, defaults: &RequestDefaults) -> Result<TxRequest, ParseError> {
    let kind = SourceKind::from_path(path).ok_or_else(|| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        ParseError::UnsupportedFileType(name)
    })?;

    let bytes = std::fs::read(path)?;
    let contents = String::from_utf8_lossy(&bytes);
    let request = parse_source(kind, &contents, defaults)?;
    info!(
        "Loaded {} ({:?}): {} bytes @ {} Hz",
        path.display(),
        kind,
        request.payload.len(),
        request.frequency_hz
    );
    Ok(request)
}
