//! Smoke runner: boot the simulator, read the screen, probe the API.
//!
//! This is a diagnostic for the bench itself rather than a pass/fail
//! scenario suite. Run with:
//! cargo test --package wui-e2e --test smoke -- --firmware <elf>

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use wui_e2e::wui::DEFAULT_API_KEY;
use wui_e2e::{E2eResult, WuiClient};
use wui_sim::{screen, PrinterHandle, SimConfig};

#[derive(Parser, Debug)]
#[command(name = "wui-smoke")]
#[command(about = "Boot the printer simulator and probe the web interface")]
struct Args {
    /// Firmware ELF image (overrides WUI_SIM_FIRMWARE)
    #[arg(long)]
    firmware: Option<PathBuf>,

    /// Simulator binary (overrides WUI_SIM_BIN / PATH lookup)
    #[arg(long)]
    binary: Option<PathBuf>,

    /// Host port for the WUI proxy (0 = auto)
    #[arg(long, default_value = "0")]
    port: u16,

    /// API key to authenticate with
    #[arg(long, default_value = DEFAULT_API_KEY)]
    api_key: String,

    /// Seconds to wait for the firmware to boot
    #[arg(long, default_value = "120")]
    boot_timeout: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    match rt.block_on(run(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn run(args: Args) -> E2eResult<bool> {
    let mut config = SimConfig {
        http_port: args.port,
        boot_timeout_secs: args.boot_timeout,
        ..Default::default()
    };
    config.apply_env();
    if let Some(firmware) = args.firmware {
        config.firmware_path = firmware;
    }
    if let Some(binary) = args.binary {
        config.binary_path = Some(binary);
    }

    // No bench on this machine, nothing to smoke-test.
    if !config.firmware_path.exists() {
        eprintln!(
            "Skipping: firmware image not found: {}",
            config.firmware_path.display()
        );
        return Ok(true);
    }
    if config.binary_path.is_none() && !wui_sim::printer::binary_in_path(&config.binary()) {
        eprintln!("Skipping: {} not available in PATH", config.binary());
        return Ok(true);
    }
    if !screen::ocr_available() {
        eprintln!("Skipping: tesseract not available in PATH");
        return Ok(true);
    }

    let mut printer = PrinterHandle::spawn(config).await?;
    let screen_text = screen::read_text(&printer).await?;
    let machine = printer.qmp().query_status().await?;

    let client = WuiClient::for_printer(&printer, args.api_key)?;
    let version = client.version().await?;

    let summary = json!({
        "checked_at": chrono::Utc::now().to_rfc3339(),
        "base_url": printer.base_url(),
        "machine": { "running": machine.running, "status": machine.status },
        "screen": screen_text,
        "version": version,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    let healthy = machine.running && screen_text.contains("HOME") && version.get("api").is_some();

    printer.shutdown().await?;

    Ok(healthy)
}
