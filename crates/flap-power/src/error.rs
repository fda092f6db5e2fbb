//! Error types for power resolution

use thiserror::Error;

/// Errors that abort power resolution for a transmission
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PowerError {
    /// A FREND0 bitfield value does not fit its field
    #[error("{field} out of range: {value} (max {max})")]
    PowerFieldOutOfRange {
        field: &'static str,
        value: i64,
        max: u8,
    },

    /// More PATABLE entries than the hardware has
    #[error("patable list too long: {0} entries (max 8)")]
    PatableTooLong(usize),

    /// Manual mode needs register read/write and the radio has none
    #[error("register access unavailable (required for manual power mode)")]
    RegisterAccessUnavailable,
}
