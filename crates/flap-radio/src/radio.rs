//! Radio control interface
//!
//! The operations every transceiver backend provides, plus two optional
//! capabilities exposed as trait objects so callers check for them once
//! instead of probing per call.

use flap_codec::Modulation;
use flap_power::RegisterProgram;
use tracing::debug;

use crate::error::RadioError;

/// Raw register access (CC111x XDATA peek/poke)
pub trait RegisterAccess {
    /// Read one register byte
    fn read_register(&mut self, addr: u16) -> Result<u8, RadioError>;

    /// Write one register byte
    fn write_register(&mut self, addr: u16, value: u8) -> Result<(), RadioError>;
}

/// Direct power-code control for radios without register access
pub trait PowerCodeControl {
    /// Set the PA output code used for transmit
    fn set_power_code(&mut self, code: u8) -> Result<(), RadioError>;
}

/// Operations a transceiver backend must provide
///
/// Calls are synchronous; one transmission owns the radio for its whole
/// sequence, so a read-modify-write of power registers is never interleaved
/// with other register traffic.
pub trait RadioControl {
    /// Tune the carrier
    fn set_frequency(&mut self, hz: u64) -> Result<(), RadioError>;

    /// Select modulation, with Manchester encoding on or off
    fn set_modulation(
        &mut self,
        modulation: Modulation,
        manchester: bool,
    ) -> Result<(), RadioError>;

    /// Set the modem data rate
    fn set_data_rate(&mut self, baud: u32) -> Result<(), RadioError>;

    /// Set FSK deviation (only called for 2FSK/GFSK)
    fn set_deviation(&mut self, hz: u32) -> Result<(), RadioError>;

    /// Select the sync-word mode
    fn set_sync_mode(&mut self, mode: u8) -> Result<(), RadioError>;

    /// Set the number of preamble bytes
    fn set_preamble_count(&mut self, count: u8) -> Result<(), RadioError>;

    /// Switch to the radio's maximum output power
    fn set_max_power(&mut self) -> Result<(), RadioError>;

    /// Configure fixed packet length
    fn set_packet_length(&mut self, len: usize) -> Result<(), RadioError>;

    /// Send the payload `repeat` times
    fn transmit(&mut self, payload: &[u8], repeat: u32) -> Result<(), RadioError>;

    /// Return to idle
    fn set_idle(&mut self) -> Result<(), RadioError>;

    /// Register access, if the radio has it
    fn registers(&mut self) -> Option<&mut dyn RegisterAccess> {
        None
    }

    /// Direct power-code control, if the radio has it
    fn power_code(&mut self) -> Option<&mut dyn PowerCodeControl> {
        None
    }
}

/// Write a register program: FREND0 first, then PATABLE entries in order
pub fn apply_program(
    regs: &mut dyn RegisterAccess,
    program: &RegisterProgram,
) -> Result<(), RadioError> {
    for (addr, value) in program.writes() {
        debug!("poke 0x{:04X} = 0x{:02X}", addr, value);
        regs.write_register(addr, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Registers {
        values: BTreeMap<u16, u8>,
        writes: Vec<(u16, u8)>,
        reject: Option<u16>,
    }

    impl RegisterAccess for Registers {
        fn read_register(&mut self, addr: u16) -> Result<u8, RadioError> {
            Ok(self.values.get(&addr).copied().unwrap_or(0))
        }

        fn write_register(&mut self, addr: u16, value: u8) -> Result<(), RadioError> {
            if self.reject == Some(addr) {
                return Err(RadioError::WriteRejected { addr });
            }
            self.values.insert(addr, value);
            self.writes.push((addr, value));
            Ok(())
        }
    }

    fn program() -> RegisterProgram {
        RegisterProgram {
            frend0_value: 0x13,
            patable_writes: vec![(0, 0x00), (1, 0xC0)],
        }
    }

    #[test]
    fn test_apply_program_order() {
        let mut regs = Registers::default();
        apply_program(&mut regs, &program()).unwrap();
        assert_eq!(regs.writes, vec![(0xDF1B, 0x13), (0xDF2E, 0x00), (0xDF2D, 0xC0)]);
    }

    #[test]
    fn test_apply_program_stops_on_rejected_write() {
        let mut regs = Registers {
            reject: Some(0xDF2E),
            ..Default::default()
        };
        assert_eq!(
            apply_program(&mut regs, &program()),
            Err(RadioError::WriteRejected { addr: 0xDF2E })
        );
        assert_eq!(regs.writes, vec![(0xDF1B, 0x13)]);
    }
}
