//! Replay Simulation Library
//!
//! This crate provides a simulated CC111x transceiver for exercising the
//! transmit path without hardware. [`VirtualRadio`] implements
//! [`RadioControl`](flap_radio::RadioControl), keeps a register file and logs
//! every call, so tests and dry runs can see exactly what a real radio
//! would have been told.
//!
//! # Example
//!
//! ```rust
//! use flap_codec::{parse_descriptor, RequestDefaults};
//! use flap_sim::{RadioOp, VirtualRadio};
//!
//! let req = parse_descriptor(
//!     r#"{"frequency": 433920000, "payload": [1, 2, 3], "repeat": 2}"#,
//!     &RequestDefaults::default(),
//! )
//! .unwrap();
//!
//! let mut radio = VirtualRadio::new("CC1111");
//! flap_radio::transmit(&mut radio, &req).unwrap();
//!
//! assert!(radio.ops().contains(&RadioOp::SetMaxPower));
//! assert_eq!(radio.ops().last(), Some(&RadioOp::SetIdle));
//! ```

pub mod radio;

pub use radio::{mdmcfg2_mod_format, RadioOp, VirtualRadio, VirtualRadioConfig};
