//! Simulator control for the WUI E2E suite
//!
//! Drives a QEMU-based printer simulator the way a human would drive the
//! physical machine: spawning the emulator with a firmware image and a
//! vvfat-backed USB stick, reading the LCD through screendump + OCR, and
//! poking the encoder and thermistors over QMP. The embedded web
//! interface itself is reached over a user-mode netdev port forward.

pub mod actions;
pub mod config;
pub mod error;
pub mod printer;
pub mod qmp;
pub mod screen;

pub use config::SimConfig;
pub use error::{Error, Result};
pub use printer::PrinterHandle;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
