//! Simulator configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding the simulator binary path
pub const ENV_SIM_BIN: &str = "WUI_SIM_BIN";

/// Environment variable overriding the firmware image path
pub const ENV_SIM_FIRMWARE: &str = "WUI_SIM_FIRMWARE";

/// Configuration for spawning the printer simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Path to the simulator binary (None = look up the default name in PATH)
    pub binary_path: Option<PathBuf>,

    /// QEMU machine type
    pub machine: String,

    /// Firmware ELF image to boot
    pub firmware_path: PathBuf,

    /// Host directory exposed to the guest as the USB flash drive.
    /// None lets the handle create a throwaway directory.
    pub flash_dir: Option<PathBuf>,

    /// Host port forwarded to the guest web interface (0 = pick a free port)
    pub http_port: u16,

    /// Directory for the QMP control socket (None = temp dir)
    pub qmp_socket_dir: Option<PathBuf>,

    /// Seconds to wait for the firmware home screen after power-on
    pub boot_timeout_secs: u64,

    /// QOM path of the heatbed thermistor object
    pub bed_qom_path: String,

    /// QOM path of the hotend thermistor object
    pub nozzle_qom_path: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            machine: "prusa-mini".to_string(),
            firmware_path: PathBuf::from("firmware.elf"),
            flash_dir: None,
            http_port: 0,
            qmp_socket_dir: None,
            boot_timeout_secs: 120,
            bed_qom_path: "/machine/bed-thermistor".to_string(),
            nozzle_qom_path: "/machine/hotend-thermistor".to_string(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Apply environment overrides for the binary and firmware paths
    pub fn apply_env(&mut self) {
        if let Some(bin) = std::env::var_os(ENV_SIM_BIN) {
            self.binary_path = Some(PathBuf::from(bin));
        }
        if let Some(fw) = std::env::var_os(ENV_SIM_FIRMWARE) {
            self.firmware_path = PathBuf::from(fw);
        }
    }

    /// The simulator binary to invoke
    pub fn binary(&self) -> String {
        self.binary_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| "qemu-system-buddy".to_string())
    }
}
