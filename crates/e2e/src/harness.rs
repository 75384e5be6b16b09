//! Test fixtures: booting the simulator and driving it into a print job

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use wui_sim::actions::{encoder, temperature};
use wui_sim::actions::temperature::Thermistor;
use wui_sim::{screen, PrinterHandle, SimConfig};

use crate::error::{E2eError, E2eResult};
use crate::wui::{WuiClient, DEFAULT_API_KEY};

/// Bed preheat target used by the printing fixture
pub const PRINT_BED_TARGET: f64 = 60.0;

/// Nozzle preheat target used by the printing fixture
pub const PRINT_NOZZLE_TARGET: f64 = 170.0;

/// Attempt budget for the print-started poll
pub const PRINT_START_ATTEMPTS: u32 = 10;

/// Fixed delay between print-started polls
pub const PRINT_START_DELAY: Duration = Duration::from_millis(300);

/// A simulator driven into an active print, plus a client session for it
pub struct PrintSession {
    pub printer: PrinterHandle,
    pub client: WuiClient,
}

/// Boot the simulator to the idle home screen and return a client for it.
///
/// `PrinterHandle::spawn` already waits for the HOME screen, so the
/// returned client is immediately usable.
pub async fn boot_idle(config: SimConfig) -> E2eResult<(PrinterHandle, WuiClient)> {
    let printer = PrinterHandle::spawn(config).await?;
    let client = WuiClient::for_printer(&printer, DEFAULT_API_KEY)?;
    Ok((printer, client))
}

/// Boot the simulator with a g-code file on the flash drive, preheat, and
/// click through the one-click-print flow until the job is running.
///
/// `config.flash_dir` must be set; the g-code is placed there before
/// power-on so the firmware discovers it when the USB stick mounts.
pub async fn start_print(
    config: SimConfig,
    gcode_name: &str,
    gcode: &[u8],
) -> E2eResult<PrintSession> {
    let flash_dir = config.flash_dir.clone().ok_or_else(|| {
        E2eError::Sim(wui_sim::Error::InvalidConfig(
            "start_print requires config.flash_dir".to_string(),
        ))
    })?;
    std::fs::create_dir_all(&flash_dir)?;
    std::fs::write(flash_dir.join(gcode_name), gcode)?;

    let screen_timeout = Duration::from_secs(config.boot_timeout_secs);
    let printer = PrinterHandle::spawn(config).await?;

    // Wait for the USB stick to mount; the home screen gains a Print entry.
    screen::wait_for_text(&printer, "Print", screen_timeout).await?;

    // Preheat so the firmware does not park the job on a cold-bed check.
    temperature::set(&printer, Thermistor::Bed, PRINT_BED_TARGET).await?;
    temperature::set(&printer, Thermistor::Nozzle, PRINT_NOZZLE_TARGET).await?;

    // One-click-print: open the file list, pick the file, confirm.
    // The OCR tends to split the filename, so only the extension is matched.
    encoder::click(&printer).await?;
    screen::wait_for_text(&printer, "gcode", screen_timeout).await?;
    encoder::click(&printer).await?;
    screen::wait_for_text(&printer, "Print", screen_timeout).await?;
    encoder::click(&printer).await?;
    screen::wait_for_text(&printer, "Tune", screen_timeout).await?;

    let client = WuiClient::for_printer(&printer, DEFAULT_API_KEY)?;

    // The state machine takes a moment to pick the job up; poll a bounded
    // number of times before giving up.
    wait_for_print_started(&client).await?;

    info!("Print job is running, WUI at {}", client.base_url());
    Ok(PrintSession { printer, client })
}

/// Poll `/api/printer` until the bed has a target and the printing flag is
/// up, within the fixed attempt budget.
pub async fn wait_for_print_started(client: &WuiClient) -> E2eResult<()> {
    for attempt in 1..=PRINT_START_ATTEMPTS {
        let status = client.printer_status().await?;

        let bed_target = status["temperature"]["bed"]["target"]
            .as_f64()
            .unwrap_or(0.0);
        let printing = status["state"]["flags"]["printing"]
            .as_bool()
            .unwrap_or(false);

        if bed_target > 0.0 && printing {
            return Ok(());
        }

        debug!("Didn't start print yet (attempt {}): {}", attempt, status);
        sleep(PRINT_START_DELAY).await;
    }

    Err(E2eError::Timeout(format!(
        "print to start within {} polls",
        PRINT_START_ATTEMPTS
    )))
}
