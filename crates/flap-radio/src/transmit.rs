//! Transmit sequencing
//!
//! Applies one [`TxRequest`] to a radio: modem settings, power, payload. The
//! radio is always returned to idle afterwards, whether or not the
//! transmission succeeded; a failure to go idle is logged and dropped so it
//! never hides the transmit outcome.

use flap_codec::TxRequest;
use flap_power::{resolve_power, PowerAction, PowerContext, PowerError, PowerWarning, FREND0_ADDR};
use tracing::{debug, error, info, warn};

use crate::error::{RadioError, TxError};
use crate::radio::{apply_program, RadioControl};

/// Outcome of a completed transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReport {
    pub frequency_hz: u64,
    pub payload_len: usize,
    pub repeat_count: u32,
    /// Power action that was applied
    pub power: PowerAction,
    /// Degradations the power policy had to make
    pub warnings: Vec<PowerWarning>,
}

/// Transmit a request and leave the radio idle
pub fn transmit<R: RadioControl + ?Sized>(
    radio: &mut R,
    request: &TxRequest,
) -> Result<TxReport, TxError> {
    let result = configure_and_send(radio, request);

    if let Err(e) = radio.set_idle() {
        warn!("Failed to return radio to idle: {}", e);
    }

    match &result {
        Ok(report) => info!(
            "TX complete: {} bytes x{} @ {} Hz",
            report.payload_len, report.repeat_count, report.frequency_hz
        ),
        Err(e) => error!("Transmission failed: {}", e),
    }
    result
}

fn configure_and_send<R: RadioControl + ?Sized>(
    radio: &mut R,
    request: &TxRequest,
) -> Result<TxReport, TxError> {
    radio.set_frequency(request.frequency_hz)?;
    radio.set_modulation(request.modulation, request.manchester)?;
    radio.set_data_rate(request.data_rate_baud)?;
    if let Some(deviation) = request.deviation_hz {
        if request.modulation.uses_deviation() {
            radio.set_deviation(deviation)?;
        } else {
            debug!("Ignoring deviation for {}", request.modulation);
        }
    }
    radio.set_sync_mode(request.sync_mode)?;
    radio.set_preamble_count(request.preamble_count)?;

    let (power, warnings) = apply_power(radio, request)?;

    radio.set_packet_length(request.payload.len())?;
    info!(
        "TX {} bytes @ {} Hz ({}, {} baud, x{})",
        request.payload.len(),
        request.frequency_hz,
        request.modulation,
        request.data_rate_baud,
        request.repeat_count
    );
    radio.transmit(&request.payload, request.repeat_count)?;

    Ok(TxReport {
        frequency_hz: request.frequency_hz,
        payload_len: request.payload.len(),
        repeat_count: request.repeat_count,
        power,
        warnings,
    })
}

/// Check capabilities, resolve the power spec, and apply the result
fn apply_power<R: RadioControl + ?Sized>(
    radio: &mut R,
    request: &TxRequest,
) -> Result<(PowerAction, Vec<PowerWarning>), TxError> {
    let frend0_readback = match (request.power.needs_registers(), radio.registers()) {
        (true, Some(regs)) => Some(regs.read_register(FREND0_ADDR)?),
        _ => None,
    };
    let ctx = PowerContext {
        frend0_readback,
        power_code_supported: radio.power_code().is_some(),
    };

    let plan = resolve_power(&request.power, request.frequency_hz, request.modulation, &ctx)?;

    match &plan.action {
        PowerAction::Leave => debug!("Leaving power registers untouched"),
        PowerAction::SetMaxPower => radio.set_max_power()?,
        PowerAction::SetPowerCode(code) => {
            let control = radio
                .power_code()
                .ok_or(RadioError::CapabilityMissing("set_power_code"))?;
            control.set_power_code(*code)?;
        }
        PowerAction::Program(program) => {
            let regs = radio
                .registers()
                .ok_or(PowerError::RegisterAccessUnavailable)?;
            apply_program(regs, program)?;
        }
    }

    Ok((plan.action, plan.warnings))
}
