//! Transmit Power Engine
//!
//! Resolves a request's power intent into something the CC1110/CC1111 radio
//! can apply:
//!
//! - **max**: the radio's own maximum-power call
//! - **default**: leave power registers alone
//! - **manual**: FREND0 bitfields and PATABLE entries given directly
//! - **smart**: a dBm target mapped through a per-band code table
//!
//! # Architecture
//!
//! - [`band`] holds the static band/dBm code table and band inference
//! - [`program`] computes exact FREND0/PATABLE register values
//! - [`policy`] picks the action for a spec, degrading smart mode when needed
//!
//! # Example
//!
//! ```rust
//! use flap_codec::{Modulation, PowerSpec};
//! use flap_power::{resolve_power, PowerAction, PowerContext};
//!
//! let spec = PowerSpec::Smart { target_dbm: 0, band_override: None, lodiv: None };
//! let ctx = PowerContext { frend0_readback: Some(0x00), power_code_supported: false };
//!
//! let plan = resolve_power(&spec, 433_920_000, Modulation::AskOok, &ctx).unwrap();
//! let PowerAction::Program(program) = plan.action else { unreachable!() };
//! assert_eq!(program.patable_writes, vec![(0, 0x00), (1, 0x60)]);
//! ```

pub mod band;
pub mod error;
pub mod policy;
pub mod program;

pub use band::{infer_band, lookup, resolve_band, TARGET_DBM};
pub use error::PowerError;
pub use policy::{resolve_power, PowerAction, PowerContext, PowerPlan, PowerWarning, SmartFallback};
pub use program::{frend0_value, patable_address, RegisterProgram, FREND0_ADDR, PA_TABLE0_ADDR};
