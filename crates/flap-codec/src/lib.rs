//! Sub-GHz Replay Codec
//!
//! This crate turns stored RF sources into a canonical [`TxRequest`]:
//!
//! - **Captures** (`.sub`): Flipper Zero `RAW_Data` pulse-duration traces,
//!   sampled into 0/1 chips and packed into bytes for OOK replay
//! - **Descriptors** (`.rfcat.json`): explicit frequency, modem settings,
//!   payload and power intent
//!
//! # Architecture
//!
//! - [`bits`] packs chip streams into bytes in either bit order
//! - [`capture`] parses captures and decodes durations into payloads
//! - [`descriptor`] resolves descriptor JSON into a request
//! - [`source`] picks the right parser from a file name
//!
//! Power intent is carried through unresolved as a [`PowerSpec`]; turning it
//! into register writes is the job of the power engine.
//!
//! # Example
//!
//! ```rust
//! use flap_codec::{parse_descriptor, Modulation, PowerSpec, RequestDefaults};
//!
//! let req = parse_descriptor(
//!     r#"{"frequency": 433920000, "payload_hex": "0xa", "tx_power_mode": "default"}"#,
//!     &RequestDefaults::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(req.payload, vec![0x0a]);
//! assert_eq!(req.modulation, Modulation::AskOok);
//! assert_eq!(req.power, PowerSpec::Default);
//! ```

pub mod bits;
pub mod capture;
pub mod descriptor;
pub mod error;
pub mod request;
pub mod source;

pub use bits::{pack, BitOrder};
pub use capture::{
    decode, durations_to_chips, select_capture, CaptureFile, DecodeHints, DecodeOptions,
    DecodedCapture, MAX_CHIPS,
};
pub use descriptor::{
    hex_to_bytes, parse_descriptor, parse_patable, Descriptor, PowerFields, PATABLE_LEN,
};
pub use error::ParseError;
pub use request::{
    Band, Modulation, PatableSpec, PowerSpec, RequestDefaults, TxRequest, DEFAULT_DATA_RATE,
    DEFAULT_MAX_GAP_US, DEFAULT_REPEAT,
};
pub use source::{load_tx_request, parse_source, SourceKind};
