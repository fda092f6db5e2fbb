//! One-shot dry-run replay of a source file

use std::path::Path;

use flap_codec::{load_tx_request, ParseError, RequestDefaults, SourceKind};
use flap_radio::{transmit, TxError, TxReport};
use flap_sim::{RadioOp, VirtualRadio, VirtualRadioConfig};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors replaying one file
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("transmit error: {0}")]
    Transmit(#[from] TxError),
}

/// What a dry run did to the simulated radio
#[derive(Debug)]
pub struct ReplayOutcome {
    pub report: TxReport,
    pub ops: Vec<RadioOp>,
    pub register_writes: Vec<(u16, u8)>,
}

/// Parse `path` and run its transmit sequence against a fresh virtual radio
pub fn replay_file(
    path: &Path,
    defaults: &RequestDefaults,
    radio_config: &VirtualRadioConfig,
) -> Result<ReplayOutcome, ReplayError> {
    let name = SourceKind::stem(path).unwrap_or_else(|| path.display().to_string());
    let request = load_tx_request(path, defaults)?;
    info!(
        "{}: {} Hz, {}, power {}",
        name,
        request.frequency_hz,
        request.modulation,
        request.power.mode_name()
    );

    let mut radio = VirtualRadio::from_config(radio_config.clone());
    let report = transmit(&mut radio, &request)?;

    for warning in &report.warnings {
        warn!("{}: {}", name, warning);
    }
    for op in radio.ops() {
        debug!("{}: {:?}", name, op);
    }
    let register_writes = radio.register_writes();
    for (addr, value) in &register_writes {
        info!("{}: write 0x{:04X} = 0x{:02X}", name, addr, value);
    }

    Ok(ReplayOutcome {
        report,
        ops: radio.take_ops(),
        register_writes,
    })
}
