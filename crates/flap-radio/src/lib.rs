//! Radio Control Layer
//!
//! This crate defines the boundary to the transceiver hardware and runs the
//! per-trigger transmit sequence:
//!
//! 1. Apply modem settings from the [`TxRequest`](flap_codec::TxRequest)
//! 2. Resolve the power intent and apply it (max-power call, power code,
//!    or a FREND0/PATABLE register program)
//! 3. Send the payload
//! 4. Return to idle on every path
//!
//! Backends implement [`RadioControl`]; register access and direct power
//! codes are optional capabilities reported through
//! [`RadioControl::registers`] and [`RadioControl::power_code`].

pub mod error;
pub mod radio;
pub mod transmit;

pub use error::{RadioError, TxError};
pub use radio::{apply_program, PowerCodeControl, RadioControl, RegisterAccess};
pub use transmit::{transmit, TxReport};
