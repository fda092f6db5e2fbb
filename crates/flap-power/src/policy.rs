//! Power intent resolution
//!
//! Turns a request's [`PowerSpec`] into one concrete [`PowerAction`]. The
//! decision is a single pass over the spec; the caller supplies what the
//! radio can do (a FREND0 read-back when registers are accessible, and
//! whether it offers a direct power-code call).

use std::fmt;

use flap_codec::{Band, Modulation, PowerSpec};
use tracing::{debug, warn};

use crate::band::{lookup, resolve_band};
use crate::error::PowerError;
use crate::program::{validate_fields, validate_lodiv, RegisterProgram};

/// What the radio layer should do about power
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerAction {
    /// Leave the power registers as they are
    Leave,
    /// Call the radio's maximum-power capability
    SetMaxPower,
    /// Call the radio's direct power-code capability
    SetPowerCode(u8),
    /// Write FREND0 and PATABLE
    Program(RegisterProgram),
}

/// Fallback chosen when smart mode cannot program registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartFallback {
    PowerCode,
    MaxPower,
}

/// Recoverable degradations surfaced alongside the action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerWarning {
    /// The band table has no exact entry for the target; using max power
    NoTableEntry { band: Band, target_dbm: i32 },
    /// Register access is missing; smart mode fell back
    RegistersUnavailable { fallback: SmartFallback },
}

impl fmt::Display for PowerWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTableEntry { band, target_dbm } => write!(
                f,
                "no power table entry for {} dBm in the {} band, using max power",
                target_dbm, band
            ),
            Self::RegistersUnavailable {
                fallback: SmartFallback::PowerCode,
            } => f.write_str("register access unavailable, using direct power code"),
            Self::RegistersUnavailable {
                fallback: SmartFallback::MaxPower,
            } => f.write_str("register access unavailable, using max power"),
        }
    }
}

/// What the radio offers to the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PowerContext {
    /// Current FREND0 value; `None` when registers cannot be accessed
    pub frend0_readback: Option<u8>,
    /// Whether a direct "set power code" call exists
    pub power_code_supported: bool,
}

/// A resolved power decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerPlan {
    pub action: PowerAction,
    pub warnings: Vec<PowerWarning>,
}

impl PowerPlan {
    fn new(action: PowerAction) -> Self {
        Self {
            action,
            warnings: Vec::new(),
        }
    }

    fn degraded(action: PowerAction, warning: PowerWarning) -> Self {
        warn!("Power: {}", warning);
        Self {
            action,
            warnings: vec![warning],
        }
    }
}

/// Resolve a power spec for one transmission
pub fn resolve_power(
    spec: &PowerSpec,
    frequency_hz: u64,
    modulation: Modulation,
    ctx: &PowerContext,
) -> Result<PowerPlan, PowerError> {
    match spec {
        PowerSpec::Max => Ok(PowerPlan::new(PowerAction::SetMaxPower)),
        PowerSpec::Default => Ok(PowerPlan::new(PowerAction::Leave)),
        PowerSpec::Manual {
            pa_power,
            lodiv,
            patable,
        } => {
            validate_fields(*pa_power, *lodiv)?;
            let readback = ctx
                .frend0_readback
                .ok_or(PowerError::RegisterAccessUnavailable)?;
            let program =
                RegisterProgram::manual(readback, *pa_power, *lodiv, patable, modulation)?;
            debug!(
                "Manual power: FREND0 0x{:02X} -> 0x{:02X}, {} PATABLE writes",
                readback,
                program.frend0_value,
                program.patable_writes.len()
            );
            Ok(PowerPlan::new(PowerAction::Program(program)))
        }
        PowerSpec::Smart {
            target_dbm,
            band_override,
            lodiv,
        } => {
            validate_lodiv(*lodiv)?;
            let band = resolve_band(*band_override, frequency_hz);

            let Some(code) = lookup(band, *target_dbm) else {
                return Ok(PowerPlan::degraded(
                    PowerAction::SetMaxPower,
                    PowerWarning::NoTableEntry {
                        band,
                        target_dbm: *target_dbm,
                    },
                ));
            };

            match ctx.frend0_readback {
                Some(readback) => {
                    let program = RegisterProgram::smart(readback, code, *lodiv, modulation)?;
                    debug!(
                        "Smart power: {} dBm in {} band -> code 0x{:02X}",
                        target_dbm, band, code
                    );
                    Ok(PowerPlan::new(PowerAction::Program(program)))
                }
                None if ctx.power_code_supported => Ok(PowerPlan::degraded(
                    PowerAction::SetPowerCode(code),
                    PowerWarning::RegistersUnavailable {
                        fallback: SmartFallback::PowerCode,
                    },
                )),
                None => Ok(PowerPlan::degraded(
                    PowerAction::SetMaxPower,
                    PowerWarning::RegistersUnavailable {
                        fallback: SmartFallback::MaxPower,
                    },
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flap_codec::PatableSpec;

    const F433: u64 = 433_920_000;

    fn with_registers(readback: u8) -> PowerContext {
        PowerContext {
            frend0_readback: Some(readback),
            power_code_supported: false,
        }
    }

    fn smart(target_dbm: i32) -> PowerSpec {
        PowerSpec::Smart {
            target_dbm,
            band_override: None,
            lodiv: None,
        }
    }

    #[test]
    fn test_max_and_default() {
        let ctx = PowerContext::default();
        let plan = resolve_power(&PowerSpec::Max, F433, Modulation::AskOok, &ctx).unwrap();
        assert_eq!(plan.action, PowerAction::SetMaxPower);
        assert!(plan.warnings.is_empty());

        let plan = resolve_power(&PowerSpec::Default, F433, Modulation::AskOok, &ctx).unwrap();
        assert_eq!(plan.action, PowerAction::Leave);
    }

    #[test]
    fn test_manual_programs_registers() {
        let spec = PowerSpec::Manual {
            pa_power: 5,
            lodiv: Some(3),
            patable: PatableSpec::Single(0xC0),
        };
        let plan =
            resolve_power(&spec, F433, Modulation::Fsk2, &with_registers(0b1100_1000)).unwrap();
        let PowerAction::Program(program) = plan.action else {
            panic!("expected register program");
        };
        assert_eq!(program.frend0_value, 0b1111_1101);
        assert_eq!(program.patable_writes.len(), 6);
    }

    #[test]
    fn test_manual_without_registers_is_fatal() {
        let spec = PowerSpec::Manual {
            pa_power: 1,
            lodiv: None,
            patable: PatableSpec::Single(0x60),
        };
        let ctx = PowerContext {
            frend0_readback: None,
            power_code_supported: true,
        };
        assert_eq!(
            resolve_power(&spec, F433, Modulation::AskOok, &ctx),
            Err(PowerError::RegisterAccessUnavailable)
        );
    }

    #[test]
    fn test_manual_range_checked_before_register_access() {
        let spec = PowerSpec::Manual {
            pa_power: 8,
            lodiv: None,
            patable: PatableSpec::Single(0x60),
        };
        assert!(matches!(
            resolve_power(&spec, F433, Modulation::AskOok, &PowerContext::default()),
            Err(PowerError::PowerFieldOutOfRange { .. })
        ));
    }

    #[test]
    fn test_smart_hit_ask() {
        let plan = resolve_power(&smart(0), F433, Modulation::AskOok, &with_registers(0)).unwrap();
        assert_eq!(
            plan.action,
            PowerAction::Program(RegisterProgram {
                frend0_value: 0x01,
                patable_writes: vec![(0, 0x00), (1, 0x60)],
            })
        );
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_smart_hit_fsk_with_override() {
        let spec = PowerSpec::Smart {
            target_dbm: 10,
            band_override: Some(Band::Mhz915),
            lodiv: Some(1),
        };
        let plan = resolve_power(&spec, F433, Modulation::Gfsk, &with_registers(0)).unwrap();
        assert_eq!(
            plan.action,
            PowerAction::Program(RegisterProgram {
                frend0_value: 0x10,
                patable_writes: vec![(0, 0xC0)],
            })
        );
    }

    #[test]
    fn test_smart_miss_degrades_to_max() {
        let plan = resolve_power(&smart(3), F433, Modulation::AskOok, &with_registers(0)).unwrap();
        assert_eq!(plan.action, PowerAction::SetMaxPower);
        assert_eq!(
            plan.warnings,
            vec![PowerWarning::NoTableEntry {
                band: Band::Mhz433,
                target_dbm: 3
            }]
        );
    }

    #[test]
    fn test_smart_without_registers() {
        let ctx = PowerContext {
            frend0_readback: None,
            power_code_supported: true,
        };
        let plan = resolve_power(&smart(5), 868_300_000, Modulation::AskOok, &ctx).unwrap();
        assert_eq!(plan.action, PowerAction::SetPowerCode(0x84));
        assert_eq!(
            plan.warnings,
            vec![PowerWarning::RegistersUnavailable {
                fallback: SmartFallback::PowerCode
            }]
        );

        let plan = resolve_power(
            &smart(5),
            868_300_000,
            Modulation::AskOok,
            &PowerContext::default(),
        )
        .unwrap();
        assert_eq!(plan.action, PowerAction::SetMaxPower);
        assert_eq!(
            plan.warnings,
            vec![PowerWarning::RegistersUnavailable {
                fallback: SmartFallback::MaxPower
            }]
        );
    }

    #[test]
    fn test_smart_rejects_bad_lodiv() {
        let spec = PowerSpec::Smart {
            target_dbm: 0,
            band_override: None,
            lodiv: Some(4),
        };
        assert!(resolve_power(&spec, F433, Modulation::AskOok, &with_registers(0)).is_err());
    }

    #[test]
    fn test_warning_display() {
        let w = PowerWarning::NoTableEntry {
            band: Band::Mhz433,
            target_dbm: 3,
        };
        assert_eq!(
            w.to_string(),
            "no power table entry for 3 dBm in the 433 MHz band, using max power"
        );
    }
}
