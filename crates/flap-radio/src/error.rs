//! Error types for the radio layer

use flap_power::PowerError;
use thiserror::Error;

/// Faults reported by a radio implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RadioError {
    /// The device rejected or failed an operation
    #[error("device error: {0}")]
    Device(String),

    /// A register write did not take
    #[error("register write rejected at 0x{addr:04X}")]
    WriteRejected { addr: u16 },

    /// The radio does not offer an optional capability
    #[error("capability not available: {0}")]
    CapabilityMissing(&'static str),
}

/// Errors that abort one transmission
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    /// Power settings could not be resolved
    #[error("power error: {0}")]
    Power(#[from] PowerError),

    /// The radio failed while configuring or transmitting
    #[error("radio error: {0}")]
    Radio(#[from] RadioError),
}
