//! Catflap Replay Planner
//!
//! Parses Flipper `.sub` captures and `.rfcat.json` descriptors, resolves
//! their power intent and runs the transmit sequence against a simulated
//! CC1111, logging every call and register write the radio would receive.
//!
//! ```text
//! catflap [--config <settings.json>] <file>...
//! ```

mod replay;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use settings::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Dry-run replay of sub-GHz captures and descriptors
#[derive(Debug, Parser)]
#[command(name = "catflap", version, about)]
struct Args {
    /// Settings file (defaults to $XDG_CONFIG_HOME/catflap/settings.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// `.sub` captures and `.rfcat.json` descriptors to replay
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "catflap=info,flap_codec=info,flap_power=info,flap_radio=info,flap_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let defaults = match settings.request_defaults() {
        Ok(defaults) => defaults,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0usize;
    for path in &args.files {
        match replay::replay_file(path, &defaults, &settings.radio) {
            Ok(outcome) => tracing::info!(
                "{}: ok, {} radio calls, {} register writes",
                path.display(),
                outcome.ops.len(),
                outcome.register_writes.len()
            ),
            Err(e) => {
                tracing::error!("{}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        tracing::error!("{} of {} files failed", failed, args.files.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
