//! Declarative transmit descriptors (`.rfcat.json`)
//!
//! A descriptor is a JSON object naming the carrier, modem settings and one
//! payload source:
//!
//! ```json
//! {
//!   "frequency": 433920000,
//!   "modulation": "ASK_OOK",
//!   "drate": 4800,
//!   "payload_hex": "0xA5A5F0",
//!   "repeat": 10,
//!   "tx_power_mode": "smart",
//!   "tx_power_target_dbm": 5
//! }
//! ```
//!
//! Payload sources are tried in a fixed order: `payload` (byte list),
//! `payload_hex`, `payload_b64`, then `raw_durations`/`raw_durations_us`.
//! The duration path always transmits as ASK/OOK.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::bits::{pack, BitOrder};
use crate::capture::durations_to_chips;
use crate::error::ParseError;
use crate::request::{Band, Modulation, PatableSpec, PowerSpec, RequestDefaults, TxRequest};

/// Maximum number of PATABLE entries the hardware has
pub const PATABLE_LEN: usize = 8;

/// Power fields shared by descriptors and application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerFields {
    /// `max`, `default`/`auto`, `manual` or `smart`
    pub tx_power_mode: Option<String>,
    /// FREND0.PA_POWER (0..7)
    pub frend0_pa_power: Option<i64>,
    /// FREND0.LODIV_BUF_CURRENT_TX (0..3)
    pub frend0_lodiv_buf_current_tx: Option<i64>,
    /// Single value, CSV string or list of up to 8 values
    pub patable: Option<Value>,
    /// Smart mode target in dBm
    pub tx_power_target_dbm: Option<i32>,
    /// Smart mode band: 315/433/868/915 or "auto"
    pub tx_power_band: Option<Value>,
}

impl PowerFields {
    /// Whether these fields choose a power mode at all
    pub fn has_mode(&self) -> bool {
        self.tx_power_mode.is_some()
    }

    /// Resolve into a power spec, using `fallback` when no mode is set
    ///
    /// Range checks on `pa_power`/`lodiv` happen in the power engine, not here.
    pub fn resolve(&self, fallback: &PowerSpec) -> Result<PowerSpec, ParseError> {
        let Some(mode) = self.tx_power_mode.as_deref() else {
            return Ok(fallback.clone());
        };

        match mode.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(PowerSpec::Max),
            "default" | "auto" => Ok(PowerSpec::Default),
            "manual" => {
                let pa_power = self
                    .frend0_pa_power
                    .ok_or(ParseError::MissingField("frend0_pa_power"))?;
                let patable = self
                    .patable
                    .as_ref()
                    .filter(|v| !v.is_null())
                    .ok_or(ParseError::MissingField("patable"))?;
                Ok(PowerSpec::Manual {
                    pa_power,
                    lodiv: self.frend0_lodiv_buf_current_tx,
                    patable: parse_patable(patable)?,
                })
            }
            "smart" => Ok(PowerSpec::Smart {
                target_dbm: self.tx_power_target_dbm.unwrap_or(0),
                band_override: self.tx_power_band.as_ref().and_then(parse_band),
                lodiv: self.frend0_lodiv_buf_current_tx,
            }),
            _ => Err(ParseError::InvalidPowerMode(mode.to_string())),
        }
    }
}

fn parse_band(value: &Value) -> Option<Band> {
    let band = match value {
        Value::String(s) => Band::parse_override(s),
        Value::Number(n) => n
            .as_u64()
            .and_then(|mhz| u32::try_from(mhz).ok())
            .and_then(Band::from_mhz),
        _ => None,
    };
    if band.is_none() {
        debug!("Band override {} not a known band, inferring from frequency", value);
    }
    band
}

fn parse_patable_byte(s: &str) -> Result<u8, ParseError> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|_| ParseError::invalid("patable", format!("not a byte value: {s:?}")))
}

fn patable_value_byte(value: &Value) -> Result<u8, ParseError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(|| ParseError::invalid("patable", format!("not a byte value: {n}"))),
        Value::String(s) => parse_patable_byte(s),
        other => Err(ParseError::invalid("patable", format!("unexpected value: {other}"))),
    }
}

/// Parse a PATABLE setting
///
/// A bare number or string is a single "on" value; a comma-separated string or
/// an array is a positional list. Lists longer than the hardware table are
/// kept as-is and rejected by the power engine.
pub fn parse_patable(value: &Value) -> Result<PatableSpec, ParseError> {
    match value {
        Value::String(s) if s.contains(',') => {
            let entries = s
                .split(',')
                .map(parse_patable_byte)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PatableSpec::List(entries))
        }
        Value::Array(items) => {
            if items.is_empty() {
                return Err(ParseError::invalid("patable", "empty list"));
            }
            let entries = items
                .iter()
                .map(patable_value_byte)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PatableSpec::List(entries))
        }
        other => patable_value_byte(other).map(PatableSpec::Single),
    }
}

/// Decode a hex string, tolerating a `0x` prefix, separators and odd length
pub fn hex_to_bytes(s: &str) -> Vec<u8> {
    let s = s.trim().to_ascii_lowercase();
    let s = s.strip_prefix("0x").unwrap_or(&s);

    let mut digits: Vec<u8> = s
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();
    if digits.len() % 2 == 1 {
        digits.insert(0, 0);
    }

    digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect()
}

/// Decode standard base64, discarding characters outside the alphabet
pub fn base64_to_bytes(s: &str) -> Result<Vec<u8>, ParseError> {
    let compact: String = s
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| ParseError::InvalidBase64(e.to_string()))
}

/// Read an integer written either as a JSON number or as a numeric string
fn integer_value(field: &'static str, value: &Value) -> Result<i64, ParseError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ParseError::invalid(field, format!("not an integer: {value}")))
}

fn integer_field<T: TryFrom<i64>>(
    field: &'static str,
    value: Option<&Value>,
) -> Result<Option<T>, ParseError> {
    let number = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => integer_value(field, value)?,
    };
    T::try_from(number)
        .map(Some)
        .map_err(|_| ParseError::invalid(field, format!("{number} is out of range")))
}

/// Structured form of a `.rfcat.json` descriptor
///
/// Integer fields accept numbers or numeric strings. Payload sources are kept
/// as raw JSON so a source of the wrong type is skipped rather than fatal.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Descriptor {
    pub frequency: Option<Value>,
    pub freq: Option<Value>,
    pub freq_hz: Option<Value>,

    pub modulation: Option<String>,
    pub manchester: bool,
    pub drate: Option<Value>,
    pub deviation: Option<Value>,
    pub syncmode: Option<Value>,
    pub preamble: Option<Value>,
    pub repeat: Option<Value>,
    /// Legacy switch: `false` leaves power registers alone
    pub max_power: Option<bool>,

    pub payload: Option<Value>,
    pub payload_hex: Option<Value>,
    pub payload_b64: Option<Value>,
    pub raw_durations: Option<Value>,
    pub raw_durations_us: Option<Value>,
    pub invert_level: Option<bool>,
    pub msb_first: Option<bool>,
    pub max_gap_us: Option<Value>,

    #[serde(flatten)]
    pub power: PowerFields,
}

/// Where a descriptor's payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    ByteList,
    Hex,
    Base64,
    RawDurations,
}

impl Descriptor {
    /// Parse descriptor JSON text
    pub fn from_json(text: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(text)?)
    }

    /// First present frequency alias
    pub fn frequency_hz(&self) -> Result<u64, ParseError> {
        let value = [&self.frequency, &self.freq, &self.freq_hz]
            .into_iter()
            .find_map(|alias| alias.as_ref());
        integer_field("frequency", value)?.ok_or(ParseError::MissingFrequency)
    }

    fn resolve_payload(
        &self,
        data_rate: u32,
        defaults: &RequestDefaults,
    ) -> Result<(Vec<u8>, PayloadSource), ParseError> {
        if let Some(list) = self.payload.as_ref().and_then(Value::as_array) {
            let bytes = list
                .iter()
                .map(|v| integer_value("payload", v).map(|b| (b & 0xFF) as u8))
                .collect::<Result<_, _>>()?;
            return Ok((bytes, PayloadSource::ByteList));
        }
        if let Some(hex) = self.payload_hex.as_ref().and_then(Value::as_str) {
            return Ok((hex_to_bytes(hex), PayloadSource::Hex));
        }
        if let Some(b64) = self.payload_b64.as_ref().and_then(Value::as_str) {
            return Ok((base64_to_bytes(b64)?, PayloadSource::Base64));
        }

        let raw = self
            .raw_durations
            .as_ref()
            .or(self.raw_durations_us.as_ref())
            .and_then(Value::as_array)
            .filter(|d| !d.is_empty());
        if let Some(raw) = raw {
            let durations = raw
                .iter()
                .map(|v| integer_value("raw_durations", v))
                .collect::<Result<Vec<_>, _>>()?;
            let max_gap_us = integer_field("max_gap_us", self.max_gap_us.as_ref())?
                .unwrap_or(defaults.max_gap_us);
            let chips = durations_to_chips(
                &durations,
                data_rate,
                self.invert_level.unwrap_or(defaults.invert_level),
                max_gap_us,
            )?;
            let order = BitOrder::from_msb_first(self.msb_first.unwrap_or(defaults.msb_first));
            return Ok((pack(&chips, order), PayloadSource::RawDurations));
        }

        Err(ParseError::MissingPayload)
    }

    fn resolve_power(&self, defaults: &RequestDefaults) -> Result<PowerSpec, ParseError> {
        if !self.power.has_mode() && self.max_power == Some(false) {
            return Ok(PowerSpec::Default);
        }
        self.power.resolve(&defaults.power)
    }

    /// Resolve into a transmit request
    pub fn into_tx_request(self, defaults: &RequestDefaults) -> Result<TxRequest, ParseError> {
        let frequency_hz = self.frequency_hz()?;
        let data_rate_baud =
            integer_field("drate", self.drate.as_ref())?.unwrap_or(defaults.data_rate_baud);
        let (payload, source) = self.resolve_payload(data_rate_baud, defaults)?;

        let modulation = if source == PayloadSource::RawDurations {
            Modulation::AskOok
        } else {
            match self.modulation.as_deref() {
                Some(name) => name.parse()?,
                None => Modulation::AskOok,
            }
        };

        let request = TxRequest {
            frequency_hz,
            payload,
            repeat_count: integer_field("repeat", self.repeat.as_ref())?
                .unwrap_or(defaults.repeat_count),
            data_rate_baud,
            modulation,
            manchester: self.manchester,
            deviation_hz: integer_field("deviation", self.deviation.as_ref())?,
            sync_mode: integer_field("syncmode", self.syncmode.as_ref())?.unwrap_or(0),
            preamble_count: integer_field("preamble", self.preamble.as_ref())?.unwrap_or(0),
            power: self.resolve_power(defaults)?,
        };
        request.validate()?;

        debug!(
            "Descriptor resolved: {} Hz, {} ({:?} payload, {} bytes), power {}",
            request.frequency_hz,
            request.modulation,
            source,
            request.payload.len(),
            request.power.mode_name()
        );
        Ok(request)
    }
}

/// Parse descriptor JSON straight into a transmit request
pub fn parse_descriptor(text: &str, defaults: &RequestDefaults) -> Result<TxRequest, ParseError> {
    Descriptor::from_json(text)?.into_tx_request(defaults)
}
