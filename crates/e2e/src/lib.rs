//! WUI E2E Test Suite
//!
//! Exercises the printer's embedded web interface as a black box:
//! the simulator is booted and driven through physical interaction
//! (screen OCR, encoder clicks, thermistor overrides), and assertions
//! run against the HTTP responses of the REST-like API.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     E2E suite (this crate)                 │
//! ├────────────────────────────────────────────────────────────┤
//! │  harness                                                   │
//! │    ├── boot_idle(config) -> (PrinterHandle, WuiClient)     │
//! │    └── start_print(config, gcode) -> PrintSession          │
//! │  wui::WuiClient                                            │
//! │    ├── get / get_html / api_get / api_get_json             │
//! │    └── upload_sdcard (multipart)                           │
//! ├────────────────────────────────────────────────────────────┤
//! │  wui-sim: PrinterHandle, QMP, screen OCR, encoder,         │
//! │           thermistors, network port forward                │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod harness;
pub mod wui;

pub use error::{E2eError, E2eResult};
pub use harness::PrintSession;
pub use wui::WuiClient;
