//! Shared helpers for the simulator-backed tests
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use tracing_subscriber::EnvFilter;
use wui_sim::config::ENV_SIM_FIRMWARE;
use wui_sim::{printer, screen, SimConfig};

/// Small g-code file with a ~25 minute estimate, enough for the job API
/// to report a meaningful printTimeLeft.
pub const BOX_GCODE: &[u8] = include_bytes!("../data/box.gcode");

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Simulator config from the environment, or None (with a skip note on
/// stderr) when the bench is not available on this machine.
pub fn sim_config() -> Option<SimConfig> {
    init_tracing();

    let Some(firmware) = std::env::var_os(ENV_SIM_FIRMWARE) else {
        eprintln!("Skipping: {} not set", ENV_SIM_FIRMWARE);
        return None;
    };

    let mut config = SimConfig {
        firmware_path: PathBuf::from(firmware),
        ..Default::default()
    };
    config.apply_env();

    if !config.firmware_path.exists() {
        eprintln!(
            "Skipping: firmware image not found: {}",
            config.firmware_path.display()
        );
        return None;
    }
    if config.binary_path.is_none() && !printer::binary_in_path(&config.binary()) {
        eprintln!("Skipping: {} not available in PATH", config.binary());
        return None;
    }
    if !screen::ocr_available() {
        eprintln!("Skipping: tesseract not available in PATH");
        return None;
    }

    Some(config)
}
