//! Canonical transmit request representation
//!
//! Both capture files and descriptors resolve into a [`TxRequest`], which is
//! the only thing the power engine and the radio layer ever look at.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Default number of times a payload is repeated on air
pub const DEFAULT_REPEAT: u32 = 20;

/// Default chip/data rate in baud
pub const DEFAULT_DATA_RATE: u32 = 3333;

/// Longest pulse a capture may contribute, in microseconds
pub const DEFAULT_MAX_GAP_US: u32 = 30_000;

/// Modem modulation formats supported by the transceiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modulation {
    /// On-off keying
    AskOok,
    /// Binary frequency-shift keying
    Fsk2,
    /// Gaussian FSK
    Gfsk,
    /// Minimum-shift keying
    Msk,
}

impl Modulation {
    /// Returns the canonical descriptor spelling
    pub fn name(&self) -> &'static str {
        match self {
            Self::AskOok => "ASK_OOK",
            Self::Fsk2 => "2FSK",
            Self::Gfsk => "GFSK",
            Self::Msk => "MSK",
        }
    }

    /// Returns whether payload bits gate the carrier directly
    pub fn is_ask(&self) -> bool {
        matches!(self, Self::AskOok)
    }

    /// Returns whether a frequency deviation setting applies
    pub fn uses_deviation(&self) -> bool {
        matches!(self, Self::Fsk2 | Self::Gfsk)
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Modulation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASK_OOK" | "OOK" | "ASK" => Ok(Self::AskOok),
            "2FSK" | "FSK2" => Ok(Self::Fsk2),
            "GFSK" => Ok(Self::Gfsk),
            "MSK" => Ok(Self::Msk),
            _ => Err(ParseError::UnsupportedModulation(s.to_string())),
        }
    }
}

/// Coarse frequency bucket selecting a power-code table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Band {
    Mhz315,
    Mhz433,
    Mhz868,
    Mhz915,
}

impl Band {
    /// All bands, lowest first
    pub const ALL: [Band; 4] = [Band::Mhz315, Band::Mhz433, Band::Mhz868, Band::Mhz915];

    /// Nominal band centre in MHz
    pub fn mhz(&self) -> u32 {
        match self {
            Self::Mhz315 => 315,
            Self::Mhz433 => 433,
            Self::Mhz868 => 868,
            Self::Mhz915 => 915,
        }
    }

    /// Look up a band by its nominal MHz value
    pub fn from_mhz(mhz: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.mhz() == mhz)
    }

    /// Parse a band override; `"auto"` and anything unrecognized yield `None`
    pub fn parse_override(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        let digits = s.strip_suffix("mhz").unwrap_or(&s).trim();
        digits.parse::<u32>().ok().and_then(Self::from_mhz)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MHz", self.mhz())
    }
}

/// PATABLE contents requested by manual power mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatableSpec {
    /// One "on" code, spread across the active indices
    Single(u8),
    /// Explicit entries written at their positional index
    List(Vec<u8>),
}

/// How transmit power should be set for one request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PowerSpec {
    /// Use the hardware maximum-power capability
    #[default]
    Max,
    /// Leave the power registers untouched
    Default,
    /// Program FREND0 and PATABLE directly
    ///
    /// Field values are kept as given; the power engine range-checks them.
    Manual {
        pa_power: i64,
        lodiv: Option<i64>,
        patable: PatableSpec,
    },
    /// Resolve a dBm target through the band table
    Smart {
        target_dbm: i32,
        band_override: Option<Band>,
        lodiv: Option<i64>,
    },
}

impl PowerSpec {
    /// Returns the `tx_power_mode` spelling for this variant
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Default => "default",
            Self::Manual { .. } => "manual",
            Self::Smart { .. } => "smart",
        }
    }

    /// Returns whether resolving this spec needs a FREND0 read-back
    pub fn needs_registers(&self) -> bool {
        matches!(self, Self::Manual { .. } | Self::Smart { .. })
    }
}

/// Canonical, single-use transmit instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    /// Carrier frequency in Hz
    pub frequency_hz: u64,
    /// Bytes handed to the radio
    pub payload: Vec<u8>,
    /// Number of on-air repetitions
    pub repeat_count: u32,
    /// Modem data rate in baud
    pub data_rate_baud: u32,
    /// Modulation format
    pub modulation: Modulation,
    /// Manchester encoding flag
    pub manchester: bool,
    /// Frequency deviation, only applied for FSK/GFSK
    pub deviation_hz: Option<u32>,
    /// Hardware sync-word mode
    pub sync_mode: u8,
    /// Preamble byte count
    pub preamble_count: u8,
    /// Power intent
    pub power: PowerSpec,
}

impl TxRequest {
    /// Check the field invariants every parser must uphold
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.frequency_hz == 0 {
            return Err(ParseError::invalid("frequency", "must be greater than zero"));
        }
        if self.payload.is_empty() {
            return Err(ParseError::MissingPayload);
        }
        if self.repeat_count == 0 {
            return Err(ParseError::invalid("repeat", "must be at least 1"));
        }
        if self.data_rate_baud == 0 {
            return Err(ParseError::invalid("drate", "must be greater than zero"));
        }
        Ok(())
    }
}

/// Values applied when a source file leaves a setting unspecified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDefaults {
    pub repeat_count: u32,
    pub data_rate_baud: u32,
    /// Which `RAW_Data` line of a capture to replay
    pub raw_index: usize,
    pub invert_level: bool,
    pub msb_first: bool,
    pub max_gap_us: u32,
    /// Power intent for sources without their own `tx_power_mode`
    pub power: PowerSpec,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            repeat_count: DEFAULT_REPEAT,
            data_rate_baud: DEFAULT_DATA_RATE,
            raw_index: 0,
            invert_level: false,
            msb_first: true,
            max_gap_us: DEFAULT_MAX_GAP_US,
            power: PowerSpec::Max,
        }
    }
}
