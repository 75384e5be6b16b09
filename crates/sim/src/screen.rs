//! LCD screen reading via screendump + OCR
//!
//! The firmware has no machine-readable UI channel, so the suite reads the
//! emulated LCD the way a person would: dump it over QMP, upscale the tiny
//! 240x320 panel so tesseract has something to chew on, and poll until the
//! expected text shows up.

use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::printer::PrinterHandle;

/// Delay between OCR polls
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Upscale factor applied before OCR
const OCR_SCALE: u32 = 3;

/// Check if the tesseract CLI is installed
pub fn ocr_available() -> bool {
    std::process::Command::new("tesseract")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Read the current screen contents as normalized text
pub async fn read_text(printer: &PrinterHandle) -> Result<String> {
    let scratch = tempfile::tempdir()?;
    let dump_path = scratch.path().join("screen.ppm");
    let ocr_path = scratch.path().join("screen.png");

    printer.qmp().screendump(&dump_path).await?;
    preprocess(&dump_path, &ocr_path)?;

    let output = tokio::process::Command::new("tesseract")
        .arg(&ocr_path)
        .arg("stdout")
        .args(["--psm", "6"])
        .output()
        .await
        .map_err(|e| Error::Ocr(format!("Failed to run tesseract: {}", e)))?;

    if !output.status.success() {
        return Err(Error::Ocr(format!(
            "tesseract exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let text = normalize(&String::from_utf8_lossy(&output.stdout));
    trace!("Screen text: {}", text);
    Ok(text)
}

/// Poll the screen until `needle` is visible or the timeout elapses
pub async fn wait_for_text(
    printer: &PrinterHandle,
    needle: &str,
    timeout: Duration,
) -> Result<()> {
    let start = std::time::Instant::now();
    let mut attempts = 0;

    while start.elapsed() < timeout {
        attempts += 1;

        match read_text(printer).await {
            Ok(text) => {
                if contains_fuzzy(&text, needle) {
                    debug!("Found '{}' on screen after {} poll(s)", needle, attempts);
                    return Ok(());
                }
                trace!("'{}' not on screen yet: {}", needle, text);
            }
            // The display device may not be realized early in boot.
            Err(Error::Qmp(e)) => trace!("Screendump not ready: {}", e),
            Err(e) => return Err(e),
        }

        sleep(POLL_INTERVAL).await;
    }

    Err(Error::Timeout {
        what: format!("screen text '{}'", needle),
        seconds: timeout.as_secs(),
    })
}

/// Upscale and binarize a screendump so OCR can read the LCD font
fn preprocess(dump_path: &Path, out_path: &Path) -> Result<()> {
    let img = image::open(dump_path)?;
    let gray = img.to_luma8();
    let (w, h) = gray.dimensions();

    let mut scaled = image::imageops::resize(
        &gray,
        w * OCR_SCALE,
        h * OCR_SCALE,
        image::imageops::FilterType::Nearest,
    );

    for pixel in scaled.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > 96 { 255 } else { 0 };
    }

    scaled.save(out_path)?;
    Ok(())
}

/// Collapse whitespace runs to single spaces and trim
fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-insensitive containment check.
///
/// OCR on the small panel tends to split words ("box .gcode"), so both
/// sides are compared with whitespace stripped.
pub fn contains_fuzzy(haystack: &str, needle: &str) -> bool {
    let strip = |s: &str| s.split_whitespace().collect::<String>();
    strip(haystack).contains(&strip(needle))
}
