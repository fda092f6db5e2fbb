//! Virtual CC111x transceiver
//!
//! Records every operation in order and keeps an in-memory register file so
//! power programs can be checked byte for byte.

use std::collections::BTreeMap;

use flap_codec::Modulation;
use flap_power::{FREND0_ADDR, PA_TABLE0_ADDR};
use flap_radio::{PowerCodeControl, RadioControl, RadioError, RegisterAccess};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// MDMCFG2 Manchester enable bit
pub const MANCHESTER_EN: u8 = 0x08;

/// FREND0 value after reset (LODIV_BUF_CURRENT_TX = 1)
pub const FREND0_RESET: u8 = 0x10;

/// MDMCFG2 modulation-format bits for a modulation
pub fn mdmcfg2_mod_format(modulation: Modulation, manchester: bool) -> u8 {
    let format = match modulation {
        Modulation::Fsk2 => 0x00,
        Modulation::Gfsk => 0x10,
        Modulation::AskOok => 0x30,
        Modulation::Msk => 0x70,
    };
    if manchester {
        format | MANCHESTER_EN
    } else {
        format
    }
}

/// One operation performed on the virtual radio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioOp {
    SetFrequency(u64),
    SetModulation {
        modulation: Modulation,
        manchester: bool,
        mdmcfg2: u8,
    },
    SetDataRate(u32),
    SetDeviation(u32),
    SetSyncMode(u8),
    SetPreambleCount(u8),
    SetMaxPower,
    SetPowerCode(u8),
    SetPacketLength(usize),
    Transmit { payload: Vec<u8>, repeat: u32 },
    SetIdle,
    ReadRegister { addr: u16, value: u8 },
    WriteRegister { addr: u16, value: u8 },
}

/// Configuration for creating a virtual radio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualRadioConfig {
    /// Display name/identifier
    pub id: String,
    /// Whether register peek/poke is offered
    pub register_access: bool,
    /// Whether a direct power-code call is offered
    pub power_code: bool,
    /// FREND0 contents at start-up
    pub initial_frend0: u8,
}

impl Default for VirtualRadioConfig {
    fn default() -> Self {
        Self {
            id: "Virtual CC1111".to_string(),
            register_access: true,
            power_code: false,
            initial_frend0: FREND0_RESET,
        }
    }
}

/// Faults the virtual radio can be told to produce
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Faults {
    transmit: bool,
    idle: bool,
    reject_write: Option<u16>,
}

/// A simulated transceiver implementing [`RadioControl`]
#[derive(Debug)]
pub struct VirtualRadio {
    config: VirtualRadioConfig,
    registers: BTreeMap<u16, u8>,
    ops: Vec<RadioOp>,
    faults: Faults,
    power_code: Option<u8>,
    idle: bool,
}

impl VirtualRadio {
    /// Create a virtual radio with register access and default registers
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_config(VirtualRadioConfig {
            id: id.into(),
            ..Default::default()
        })
    }

    /// Create a virtual radio from configuration
    pub fn from_config(config: VirtualRadioConfig) -> Self {
        let mut registers = BTreeMap::new();
        registers.insert(FREND0_ADDR, config.initial_frend0);
        for index in 0..8u16 {
            registers.insert(PA_TABLE0_ADDR - index, 0x00);
        }
        Self {
            config,
            registers,
            ops: Vec::new(),
            faults: Faults::default(),
            power_code: None,
            idle: true,
        }
    }

    /// Get the radio's identifier
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Operations performed so far, oldest first
    pub fn ops(&self) -> &[RadioOp] {
        &self.ops
    }

    /// Take and clear the operation log
    pub fn take_ops(&mut self) -> Vec<RadioOp> {
        std::mem::take(&mut self.ops)
    }

    /// Register writes performed so far, as `(address, value)`
    pub fn register_writes(&self) -> Vec<(u16, u8)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RadioOp::WriteRegister { addr, value } => Some((*addr, *value)),
                _ => None,
            })
            .collect()
    }

    /// Current register value (unknown addresses read as zero)
    pub fn register(&self, addr: u16) -> u8 {
        self.registers.get(&addr).copied().unwrap_or(0)
    }

    /// Preload a register value without logging an operation
    pub fn preset_register(&mut self, addr: u16, value: u8) {
        self.registers.insert(addr, value);
    }

    /// PATABLE contents, index 0 first
    pub fn patable(&self) -> [u8; 8] {
        std::array::from_fn(|i| self.register(PA_TABLE0_ADDR - i as u16))
    }

    /// Last power code set through the direct capability
    pub fn power_code_value(&self) -> Option<u8> {
        self.power_code
    }

    /// Whether the radio is currently idle
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// Make the next `transmit` calls fail
    pub fn fail_transmit(&mut self, fail: bool) {
        self.faults.transmit = fail;
    }

    /// Make `set_idle` fail
    pub fn fail_idle(&mut self, fail: bool) {
        self.faults.idle = fail;
    }

    /// Reject writes to one register address
    pub fn reject_writes_to(&mut self, addr: Option<u16>) {
        self.faults.reject_write = addr;
    }

    fn record(&mut self, op: RadioOp) {
        trace!("{}: {:?}", self.config.id, op);
        self.ops.push(op);
    }
}

impl RadioControl for VirtualRadio {
    fn set_frequency(&mut self, hz: u64) -> Result<(), RadioError> {
        self.record(RadioOp::SetFrequency(hz));
        Ok(())
    }

    fn set_modulation(
        &mut self,
        modulation: Modulation,
        manchester: bool,
    ) -> Result<(), RadioError> {
        self.record(RadioOp::SetModulation {
            modulation,
            manchester,
            mdmcfg2: mdmcfg2_mod_format(modulation, manchester),
        });
        Ok(())
    }

    fn set_data_rate(&mut self, baud: u32) -> Result<(), RadioError> {
        self.record(RadioOp::SetDataRate(baud));
        Ok(())
    }

    fn set_deviation(&mut self, hz: u32) -> Result<(), RadioError> {
        self.record(RadioOp::SetDeviation(hz));
        Ok(())
    }

    fn set_sync_mode(&mut self, mode: u8) -> Result<(), RadioError> {
        self.record(RadioOp::SetSyncMode(mode));
        Ok(())
    }

    fn set_preamble_count(&mut self, count: u8) -> Result<(), RadioError> {
        self.record(RadioOp::SetPreambleCount(count));
        Ok(())
    }

    fn set_max_power(&mut self) -> Result<(), RadioError> {
        self.record(RadioOp::SetMaxPower);
        Ok(())
    }

    fn set_packet_length(&mut self, len: usize) -> Result<(), RadioError> {
        self.record(RadioOp::SetPacketLength(len));
        Ok(())
    }

    fn transmit(&mut self, payload: &[u8], repeat: u32) -> Result<(), RadioError> {
        self.idle = false;
        if self.faults.transmit {
            return Err(RadioError::Device("transmit failed".into()));
        }
        self.record(RadioOp::Transmit {
            payload: payload.to_vec(),
            repeat,
        });
        debug!("{}: sent {} bytes x{}", self.config.id, payload.len(), repeat);
        Ok(())
    }

    fn set_idle(&mut self) -> Result<(), RadioError> {
        if self.faults.idle {
            return Err(RadioError::Device("idle failed".into()));
        }
        self.idle = true;
        self.record(RadioOp::SetIdle);
        Ok(())
    }

    fn registers(&mut self) -> Option<&mut dyn RegisterAccess> {
        if self.config.register_access {
            Some(self)
        } else {
            None
        }
    }

    fn power_code(&mut self) -> Option<&mut dyn PowerCodeControl> {
        if self.config.power_code {
            Some(self)
        } else {
            None
        }
    }
}

impl RegisterAccess for VirtualRadio {
    fn read_register(&mut self, addr: u16) -> Result<u8, RadioError> {
        let value = self.register(addr);
        self.record(RadioOp::ReadRegister { addr, value });
        Ok(value)
    }

    fn write_register(&mut self, addr: u16, value: u8) -> Result<(), RadioError> {
        if self.faults.reject_write == Some(addr) {
            return Err(RadioError::WriteRejected { addr });
        }
        self.registers.insert(addr, value);
        self.record(RadioOp::WriteRegister { addr, value });
        Ok(())
    }
}

impl PowerCodeControl for VirtualRadio {
    fn set_power_code(&mut self, code: u8) -> Result<(), RadioError> {
        self.power_code = Some(code);
        self.record(RadioOp::SetPowerCode(code));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mdmcfg2_encoding() {
        assert_eq!(mdmcfg2_mod_format(Modulation::AskOok, false), 0x30);
        assert_eq!(mdmcfg2_mod_format(Modulation::Fsk2, true), 0x08);
        assert_eq!(mdmcfg2_mod_format(Modulation::Gfsk, false), 0x10);
        assert_eq!(mdmcfg2_mod_format(Modulation::Msk, true), 0x78);
    }

    #[test]
    fn test_reset_registers() {
        let radio = VirtualRadio::new("test");
        assert_eq!(radio.register(FREND0_ADDR), FREND0_RESET);
        assert_eq!(radio.patable(), [0; 8]);
        assert!(radio.is_idle());
        assert_eq!(radio.id(), "test");
    }

    #[test]
    fn test_register_roundtrip_is_logged() {
        let mut radio = VirtualRadio::new("test");
        radio.write_register(0xDF2D, 0x60).unwrap();
        assert_eq!(radio.read_register(0xDF2D).unwrap(), 0x60);
        assert_eq!(radio.patable()[1], 0x60);
        assert_eq!(
            radio.ops(),
            &[
                RadioOp::WriteRegister { addr: 0xDF2D, value: 0x60 },
                RadioOp::ReadRegister { addr: 0xDF2D, value: 0x60 },
            ]
        );
        assert_eq!(radio.register_writes(), vec![(0xDF2D, 0x60)]);
    }

    #[test]
    fn test_capabilities_follow_config() {
        let mut radio = VirtualRadio::from_config(VirtualRadioConfig {
            register_access: false,
            power_code: true,
            ..Default::default()
        });
        assert!(radio.registers().is_none());
        assert!(radio.power_code().is_some());

        let mut radio = VirtualRadio::new("regs");
        assert!(radio.registers().is_some());
        assert!(radio.power_code().is_none());
    }

    #[test]
    fn test_rejected_write_leaves_register() {
        let mut radio = VirtualRadio::new("test");
        radio.reject_writes_to(Some(FREND0_ADDR));
        assert_eq!(
            radio.write_register(FREND0_ADDR, 0x07),
            Err(RadioError::WriteRejected { addr: FREND0_ADDR })
        );
        assert_eq!(radio.register(FREND0_ADDR), FREND0_RESET);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: VirtualRadioConfig = serde_json::from_str(r#"{"power_code": true}"#).unwrap();
        assert!(config.register_access);
        assert!(config.power_code);
        assert_eq!(config.initial_frend0, FREND0_RESET);
    }
}
