//! CC111x power register programs
//!
//! Register map (SWRS033H, XDATA space):
//! - `FREND0` at `0xDF1B`: bits [2:0] PA_POWER selects the PATABLE index used
//!   for transmit, bits [5:4] LODIV_BUF_CURRENT_TX set LO buffer current
//! - `PA_TABLE0..7` at `0xDF2E` down to `0xDF27`
//!
//! With ASK/OOK the radio switches between PATABLE index 0 (the "0" level)
//! and index PA_POWER (the "1" level), so index 0 has to stay off.

use flap_codec::{Modulation, PatableSpec, PATABLE_LEN};

use crate::error::PowerError;

/// FREND0 register address
pub const FREND0_ADDR: u16 = 0xDF1B;

/// PA_TABLE0 register address; entry `i` lives at `PA_TABLE0_ADDR - i`
pub const PA_TABLE0_ADDR: u16 = 0xDF2E;

/// FREND0.PA_POWER field mask (bits 2:0)
pub const PA_POWER_MASK: u8 = 0b0000_0111;

/// FREND0.LODIV_BUF_CURRENT_TX field mask (bits 5:4)
pub const LODIV_MASK: u8 = 0b0011_0000;

const LODIV_SHIFT: u8 = 4;

/// Largest PA_POWER value
pub const PA_POWER_MAX: u8 = 7;

/// Largest LODIV_BUF_CURRENT_TX value
pub const LODIV_MAX: u8 = 3;

/// PATABLE value for the carrier-off level
pub const PATABLE_OFF: u8 = 0x00;

/// Address of a PATABLE entry
pub fn patable_address(index: u8) -> u16 {
    PA_TABLE0_ADDR - u16::from(index)
}

fn check_field(field: &'static str, value: i64, max: u8) -> Result<u8, PowerError> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= max)
        .ok_or(PowerError::PowerFieldOutOfRange { field, value, max })
}

/// Check PA_POWER and LODIV against their field widths
pub fn validate_fields(pa_power: i64, lodiv: Option<i64>) -> Result<(u8, Option<u8>), PowerError> {
    let pa_power = check_field("frend0_pa_power", pa_power, PA_POWER_MAX)?;
    Ok((pa_power, validate_lodiv(lodiv)?))
}

/// Check LODIV against its field width
pub fn validate_lodiv(lodiv: Option<i64>) -> Result<Option<u8>, PowerError> {
    lodiv
        .map(|value| check_field("frend0_lodiv_buf_current_tx", value, LODIV_MAX))
        .transpose()
}

/// Merge PA_POWER and optional LODIV into a FREND0 read-back
///
/// Both fields are cleared before the new values go in; every other bit of
/// the read-back is kept. Without `lodiv` the LODIV field ends up zero.
pub fn frend0_value(readback: u8, pa_power: u8, lodiv: Option<u8>) -> u8 {
    let mut value = readback & !(PA_POWER_MASK | LODIV_MASK);
    value |= pa_power & PA_POWER_MASK;
    if let Some(lodiv) = lodiv {
        value |= (lodiv << LODIV_SHIFT) & LODIV_MASK;
    }
    value
}

/// Resolved power register writes for one transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterProgram {
    /// Value to write to FREND0
    pub frend0_value: u8,
    /// PATABLE writes as `(index, value)`, applied in order
    pub patable_writes: Vec<(u8, u8)>,
}

impl RegisterProgram {
    /// Program for manual mode
    pub fn manual(
        readback: u8,
        pa_power: i64,
        lodiv: Option<i64>,
        patable: &PatableSpec,
        modulation: Modulation,
    ) -> Result<Self, PowerError> {
        let (pa_power, lodiv) = validate_fields(pa_power, lodiv)?;

        let patable_writes = match patable {
            PatableSpec::Single(on) if modulation.is_ask() => std::iter::once((0, PATABLE_OFF))
                .chain((1..=pa_power).map(|i| (i, *on)))
                .collect(),
            PatableSpec::Single(on) => (0..=pa_power).map(|i| (i, *on)).collect(),
            PatableSpec::List(values) => {
                if values.len() > PATABLE_LEN {
                    return Err(PowerError::PatableTooLong(values.len()));
                }
                values.iter().enumerate().map(|(i, v)| (i as u8, *v)).collect()
            }
        };

        Ok(Self {
            frend0_value: frend0_value(readback, pa_power, lodiv),
            patable_writes,
        })
    }

    /// Program for a smart-mode table hit
    ///
    /// ASK/OOK transmits from index 1 with index 0 off; other modulations
    /// transmit from index 0.
    pub fn smart(
        readback: u8,
        code: u8,
        lodiv: Option<i64>,
        modulation: Modulation,
    ) -> Result<Self, PowerError> {
        let lodiv = validate_lodiv(lodiv)?;

        let (pa_power, patable_writes) = if modulation.is_ask() {
            (1, vec![(0, PATABLE_OFF), (1, code)])
        } else {
            (0, vec![(0, code)])
        };

        Ok(Self {
            frend0_value: frend0_value(readback, pa_power, lodiv),
            patable_writes,
        })
    }

    /// All writes as `(address, value)`: FREND0 first, then PATABLE in order
    pub fn writes(&self) -> impl Iterator<Item = (u16, u8)> + '_ {
        std::iter::once((FREND0_ADDR, self.frend0_value)).chain(
            self.patable_writes
                .iter()
                .map(|&(index, value)| (patable_address(index), value)),
        )
    }
}
