//! Pulse-duration capture decoding
//!
//! Captures are line-oriented text files in the Flipper Zero `.sub` layout:
//!
//! ```text
//! Frequency: 433920000
//! RAW_Data: 350 -1050 350 -1050 1050 -350
//! RAW_Data: 352 -1048 ...
//! ```
//!
//! Each `RAW_Data` value is a signed duration in microseconds; the sign gives
//! the carrier level (positive = on). Decoding samples every duration into
//! 0/1 chips at the chosen rate and packs those chips into bytes, which
//! approximates the waveform well enough for OOK replay.

use tracing::debug;

use crate::bits::{pack, BitOrder};
use crate::error::ParseError;
use crate::request::{Modulation, RequestDefaults, TxRequest, DEFAULT_DATA_RATE, DEFAULT_MAX_GAP_US};

const FREQUENCY_KEY: &str = "Frequency:";
const RAW_DATA_KEY: &str = "RAW_Data:";

/// Parsed contents of a capture file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFile {
    /// Carrier frequency in Hz
    pub frequency_hz: u64,
    /// Alternative raw traces, one per non-empty `RAW_Data` line
    pub traces: Vec<Vec<i64>>,
}

impl CaptureFile {
    /// Parse capture text
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut frequency_hz = None;
        let mut traces = Vec::new();

        for line in text.lines().map(str::trim) {
            if let Some(value) = line.strip_prefix(FREQUENCY_KEY) {
                let value = value.trim();
                let hz = value
                    .parse::<u64>()
                    .map_err(|_| {
                        ParseError::invalid("frequency", format!("not an integer: {value}"))
                    })?;
                frequency_hz = Some(hz);
            } else if let Some(values) = line.strip_prefix(RAW_DATA_KEY) {
                let durations: Vec<i64> = values
                    .split_whitespace()
                    .filter_map(|tok| tok.parse::<i64>().ok())
                    .collect();
                if !durations.is_empty() {
                    traces.push(durations);
                }
            }
        }

        let frequency_hz = frequency_hz.ok_or(ParseError::MissingFrequency)?;
        if traces.is_empty() {
            return Err(ParseError::MissingCaptureData);
        }

        Ok(Self {
            frequency_hz,
            traces,
        })
    }
}

/// Pick one trace, falling back to the first when `index` is out of range
///
/// Returns `None` only when there are no traces at all.
pub fn select_capture(captures: &[Vec<i64>], index: usize) -> Option<&[i64]> {
    match captures.get(index) {
        Some(trace) => Some(trace),
        None => {
            if !captures.is_empty() {
                debug!(
                    "Capture index {} out of range ({} traces), using 0",
                    index,
                    captures.len()
                );
            }
            captures.first().map(Vec::as_slice)
        }
    }
}

/// Upper bound on chips from one duration list (2 MiB once packed)
pub const MAX_CHIPS: usize = 1 << 24;

/// Expand signed durations into a chip stream sampled at `rate_hz`
///
/// Every duration contributes at least one chip so no transition is lost.
/// Streams longer than [`MAX_CHIPS`] are rejected before anything is
/// allocated for them.
pub fn durations_to_chips(
    durations: &[i64],
    rate_hz: u32,
    invert: bool,
    max_gap_us: u32,
) -> Result<Vec<u8>, ParseError> {
    let mut chips = Vec::new();
    for &duration in durations {
        let mut level = u8::from(duration > 0);
        if invert {
            level ^= 1;
        }

        let magnitude = duration.unsigned_abs().min(u64::from(max_gap_us));
        let count = (magnitude as f64 * f64::from(rate_hz) / 1_000_000.0)
            .round_ties_even()
            .max(1.0);
        if count > (MAX_CHIPS - chips.len()) as f64 {
            return Err(ParseError::invalid(
                "durations",
                format!("expands to more than {MAX_CHIPS} chips"),
            ));
        }
        chips.resize(chips.len() + count as usize, level);
    }
    Ok(chips)
}

/// Options controlling how a capture is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    pub capture_index: usize,
    pub rate_hz: u32,
    pub invert: bool,
    pub bit_order: BitOrder,
    pub max_gap_us: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            capture_index: 0,
            rate_hz: DEFAULT_DATA_RATE,
            invert: false,
            bit_order: BitOrder::MsbFirst,
            max_gap_us: DEFAULT_MAX_GAP_US,
        }
    }
}

impl From<&RequestDefaults> for DecodeOptions {
    fn from(d: &RequestDefaults) -> Self {
        Self {
            capture_index: d.raw_index,
            rate_hz: d.data_rate_baud,
            invert: d.invert_level,
            bit_order: BitOrder::from_msb_first(d.msb_first),
            max_gap_us: d.max_gap_us,
        }
    }
}

/// Modem settings implied by a decoded capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeHints {
    pub modulation: Modulation,
    pub data_rate_baud: u32,
}

/// Result of decoding a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCapture {
    pub frequency_hz: u64,
    pub payload: Vec<u8>,
    pub hints: DecodeHints,
}

impl DecodedCapture {
    /// Build a transmit request, filling the rest from `defaults`
    pub fn into_tx_request(self, defaults: &RequestDefaults) -> Result<TxRequest, ParseError> {
        let request = TxRequest {
            frequency_hz: self.frequency_hz,
            payload: self.payload,
            repeat_count: defaults.repeat_count,
            data_rate_baud: self.hints.data_rate_baud,
            modulation: self.hints.modulation,
            manchester: false,
            deviation_hz: None,
            sync_mode: 0,
            preamble_count: 0,
            power: defaults.power.clone(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Decode capture text into a payload and modem hints
pub fn decode(contents: &str, options: &DecodeOptions) -> Result<DecodedCapture, ParseError> {
    let capture = CaptureFile::parse(contents)?;
    let trace = select_capture(&capture.traces, options.capture_index)
        .ok_or(ParseError::MissingCaptureData)?;

    let chips = durations_to_chips(trace, options.rate_hz, options.invert, options.max_gap_us)?;
    let payload = pack(&chips, options.bit_order);
    debug!(
        "Decoded {} durations into {} chips ({} bytes) at {} baud",
        trace.len(),
        chips.len(),
        payload.len(),
        options.rate_hz
    );

    Ok(DecodedCapture {
        frequency_hz: capture.frequency_hz,
        payload,
        hints: DecodeHints {
            modulation: Modulation::AskOok,
            data_rate_baud: options.rate_hz,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::PowerSpec;
    use proptest::prelude::*;

    const SAMPLE: &str = "Filetype: Flipper SubGhz RAW File\n\
                          Version: 1\n\
                          Frequency: 433920000\n\
                          Preset: FuriHalSubGhzPresetOok650Async\n\
                          Protocol: RAW\n\
                          RAW_Data: 1000 -1000 1000 -1000 1000 -1000 1000 -1000\n\
                          RAW_Data: 2000 -2000\n";

    #[test]
    fn test_parse_capture_file() {
        let capture = CaptureFile::parse(SAMPLE).unwrap();
        assert_eq!(capture.frequency_hz, 433_920_000);
        assert_eq!(capture.traces.len(), 2);
        assert_eq!(capture.traces[1], vec![2000, -2000]);
    }

    #[test]
    fn test_parse_ignores_junk_tokens_and_empty_lines() {
        let text = "Frequency: 315000000\nRAW_Data: abc\nRAW_Data: 10 x -20\n";
        let capture = CaptureFile::parse(text).unwrap();
        assert_eq!(capture.traces, vec![vec![10, -20]]);
    }

    #[test]
    fn test_missing_frequency() {
        assert_eq!(
            CaptureFile::parse("RAW_Data: 100 -100\n"),
            Err(ParseError::MissingFrequency)
        );
    }

    #[test]
    fn test_missing_capture_data() {
        assert_eq!(
            CaptureFile::parse("Frequency: 433920000\n"),
            Err(ParseError::MissingCaptureData)
        );
        assert_eq!(
            CaptureFile::parse("Frequency: 433920000\nRAW_Data:\n"),
            Err(ParseError::MissingCaptureData)
        );
    }

    #[test]
    fn test_bad_frequency_value() {
        assert!(matches!(
            CaptureFile::parse("Frequency: fast\nRAW_Data: 1 -1\n"),
            Err(ParseError::InvalidField { field: "frequency", .. })
        ));
    }

    #[test]
    fn test_select_capture_falls_back_to_first() {
        let traces = vec![vec![1, -1], vec![2, -2]];
        assert_eq!(select_capture(&traces, 1), Some(&[2, -2][..]));
        assert_eq!(select_capture(&traces, 7), Some(&[1, -1][..]));
        assert_eq!(select_capture(&[], 0), None);
    }

    #[test]
    fn test_durations_to_chips_levels() {
        let chips = durations_to_chips(&[2000, -1000], 1000, false, 30_000).unwrap();
        assert_eq!(chips, vec![1, 1, 0]);

        let inverted = durations_to_chips(&[2000, -1000], 1000, true, 30_000).unwrap();
        assert_eq!(inverted, vec![0, 0, 1]);
    }

    #[test]
    fn test_durations_to_chips_minimum_one_chip() {
        // 10us at 1 kHz rounds to 0 chips, floored to 1
        assert_eq!(durations_to_chips(&[10, -10], 1000, false, 30_000).unwrap(), vec![1, 0]);
        assert_eq!(durations_to_chips(&[0], 1000, false, 30_000).unwrap(), vec![0]);
    }

    #[test]
    fn test_durations_to_chips_clamps_gap() {
        let chips = durations_to_chips(&[-1_000_000], 1000, false, 5_000).unwrap();
        assert_eq!(chips.len(), 5);
        assert!(chips.iter().all(|&c| c == 0));
    }

    #[test]
    fn test_durations_to_chips_rejects_huge_expansion() {
        let result = durations_to_chips(&[i64::MAX, -1], u32::MAX, false, u32::MAX);
        assert!(matches!(
            result,
            Err(ParseError::InvalidField { field: "durations", .. })
        ));

        // exactly at the cap is fine: 16 durations of 1 second at 2^20 Hz
        let chips = durations_to_chips(&[1_000_000; 16], 1 << 20, false, u32::MAX).unwrap();
        assert_eq!(chips.len(), MAX_CHIPS);
        assert!(durations_to_chips(&[1_000_000; 17], 1 << 20, false, u32::MAX).is_err());
    }

    #[test]
    fn test_durations_to_chips_rounds_half_to_even() {
        // 2500us at 1 kHz is 2.5 chips -> 2, 3500us -> 4
        assert_eq!(durations_to_chips(&[2500], 1000, false, 30_000).unwrap().len(), 2);
        assert_eq!(durations_to_chips(&[3500], 1000, false, 30_000).unwrap().len(), 4);
    }

    #[test]
    fn test_decode_alternating_pulses() {
        let options = DecodeOptions {
            rate_hz: 1000,
            ..Default::default()
        };
        let decoded = decode(SAMPLE, &options).unwrap();
        assert_eq!(decoded.frequency_hz, 433_920_000);
        assert_eq!(decoded.payload, vec![0xAA]);
        assert_eq!(decoded.hints.modulation, Modulation::AskOok);
        assert_eq!(decoded.hints.data_rate_baud, 1000);
    }

    #[test]
    fn test_decode_selects_trace_and_bit_order() {
        let options = DecodeOptions {
            capture_index: 1,
            rate_hz: 1000,
            bit_order: BitOrder::LsbFirst,
            ..Default::default()
        };
        // 1,1,0,0 + padding -> LSB-first 0b0000_0011
        let decoded = decode(SAMPLE, &options).unwrap();
        assert_eq!(decoded.payload, vec![0x03]);
    }

    #[test]
    fn test_decoded_into_request_uses_defaults() {
        let decoded = decode(SAMPLE, &DecodeOptions::default()).unwrap();
        let defaults = RequestDefaults {
            repeat_count: 5,
            power: PowerSpec::Default,
            ..Default::default()
        };
        let req = decoded.into_tx_request(&defaults).unwrap();
        assert_eq!(req.repeat_count, 5);
        assert_eq!(req.data_rate_baud, DEFAULT_DATA_RATE);
        assert_eq!(req.modulation, Modulation::AskOok);
        assert!(!req.manchester);
        assert_eq!(req.deviation_hz, None);
        assert_eq!(req.power, PowerSpec::Default);
    }

    proptest! {
        #[test]
        fn every_duration_yields_at_least_one_chip(
            durations in prop::collection::vec(-40_000i64..40_000, 0..64),
            rate in 1u32..20_000,
        ) {
            let chips = durations_to_chips(&durations, rate, false, 30_000).unwrap();
            prop_assert!(chips.len() >= durations.len());
        }

        #[test]
        fn chip_count_is_bounded_by_gap(
            durations in prop::collection::vec(-1_000_000i64..1_000_000, 1..32),
            rate in 1u32..10_000,
            max_gap in 1u32..50_000,
        ) {
            let chips = durations_to_chips(&durations, rate, false, max_gap).unwrap();
            let per_duration = ((max_gap as f64 * rate as f64 / 1e6).round() as usize).max(1);
            prop_assert!(chips.len() <= per_duration * durations.len());
        }
    }
}
