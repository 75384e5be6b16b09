//! Simulator process management - spawning and booting the virtual printer

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::error::{Error, Result};
use crate::qmp::{wait_for_qmp, QmpClient};
use crate::screen;

/// Handle to a running printer simulator
pub struct PrinterHandle {
    child: Child,
    qmp: QmpClient,
    config: SimConfig,
    base_url: String,
    http_port: u16,
    flash_dir: PathBuf,
    /// Scratch space for the QMP socket and default flash dir; removed on drop
    _scratch: TempDir,
}

impl PrinterHandle {
    /// Spawn the simulator and wait until the firmware home screen shows
    pub async fn spawn(config: SimConfig) -> Result<Self> {
        if !config.firmware_path.exists() {
            return Err(Error::InvalidConfig(format!(
                "firmware image not found: {}",
                config.firmware_path.display()
            )));
        }

        let scratch = tempfile::tempdir()?;

        let http_port = if config.http_port == 0 {
            find_free_port()
        } else {
            config.http_port
        };
        let base_url = format!("http://127.0.0.1:{}", http_port);

        let flash_dir = match &config.flash_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                dir.clone()
            }
            None => {
                let dir = scratch.path().join("usb");
                std::fs::create_dir_all(&dir)?;
                dir
            }
        };

        let qmp_socket = config
            .qmp_socket_dir
            .clone()
            .unwrap_or_else(|| scratch.path().to_path_buf())
            .join("qmp.sock");

        let args = build_args(&config, &flash_dir, &qmp_socket, http_port);

        info!(
            "Spawning simulator {} (machine {}) with WUI proxied on port {}",
            config.binary(),
            config.machine,
            http_port
        );

        let mut cmd = Command::new(config.binary());
        cmd.args(&args).stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            Error::Spawn(format!("Failed to spawn {}: {}", config.binary(), e))
        })?;

        let qmp = match wait_for_qmp(&qmp_socket, config.boot_timeout_secs).await {
            Ok(qmp) => qmp,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        let boot_timeout = Duration::from_secs(config.boot_timeout_secs);
        let handle = PrinterHandle {
            child,
            qmp,
            config,
            base_url,
            http_port,
            flash_dir,
            _scratch: scratch,
        };

        // The firmware paints HOME once the main loop is running.
        screen::wait_for_text(&handle, "HOME", boot_timeout).await?;

        info!("Simulator is up, WUI at {}", handle.base_url);
        Ok(handle)
    }

    /// Base URL of the proxied web interface
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Host port forwarded to the guest WUI
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// QMP control channel
    pub fn qmp(&self) -> &QmpClient {
        &self.qmp
    }

    /// The spawn configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Host directory backing the guest USB flash drive
    pub fn flash_dir(&self) -> &Path {
        &self.flash_dir
    }

    /// Graceful shutdown: ask QEMU to quit over QMP, then fall back to signals
    pub async fn shutdown(&mut self) -> Result<()> {
        let quit = tokio::time::timeout(Duration::from_secs(2), self.qmp.quit()).await;
        if quit.is_err() || quit.unwrap_or(Ok(())).is_err() {
            warn!("QMP quit failed, falling back to signal shutdown");
        }
        self.qmp.close().await;
        self.stop()
    }

    /// Stop the simulator process
    pub fn stop(&mut self) -> Result<()> {
        info!("Stopping simulator (pid: {})", self.child.id());

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                // Give it a moment to shut down gracefully
                std::thread::sleep(Duration::from_millis(500));
            }
        }

        // Force kill if still running
        let _ = self.child.kill();
        let _ = self.child.wait();

        Ok(())
    }
}

impl Drop for PrinterHandle {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Build the simulator command line
pub fn build_args(
    config: &SimConfig,
    flash_dir: &Path,
    qmp_socket: &Path,
    http_port: u16,
) -> Vec<String> {
    vec![
        "-machine".to_string(),
        config.machine.clone(),
        "-kernel".to_string(),
        config.firmware_path.to_string_lossy().to_string(),
        // Host directory mounted as the USB stick via vvfat
        "-drive".to_string(),
        format!("id=usbstick,file=fat:rw:{},format=raw", flash_dir.display()),
        "-device".to_string(),
        "usb-storage,drive=usbstick".to_string(),
        // User-mode networking with the guest WUI port forwarded to the host
        "-netdev".to_string(),
        format!(
            "user,id=mini-eth,hostfwd=tcp:127.0.0.1:{}-:80",
            http_port
        ),
        "-qmp".to_string(),
        format!("unix:{},server,nowait", qmp_socket.display()),
        "-display".to_string(),
        "none".to_string(),
    ]
}

/// Check whether a binary resolves in PATH
pub fn binary_in_path(bin: &str) -> bool {
    Command::new("sh")
        .arg("-lc")
        .arg(format!("command -v {bin} >/dev/null 2>&1"))
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Find a free port to use
fn find_free_port() -> u16 {
    use std::net::TcpListener;

    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to find free port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_free_port() {
        let port1 = find_free_port();
        let port2 = find_free_port();

        // Ports should be in valid range
        assert!(port1 > 1024);
        assert!(port2 > 1024);
    }

    #[test]
    fn test_build_args() {
        let config = SimConfig {
            firmware_path: PathBuf::from("fw.elf"),
            ..Default::default()
        };
        let args = build_args(
            &config,
            Path::new("/tmp/usb"),
            Path::new("/tmp/qmp.sock"),
            18080,
        );

        let argv = args.join(" ");
        assert!(argv.contains("-machine prusa-mini"));
        assert!(argv.contains("-kernel fw.elf"));
        assert!(argv.contains("file=fat:rw:/tmp/usb"));
        assert!(argv.contains("hostfwd=tcp:127.0.0.1:18080-:80"));
        assert!(argv.contains("unix:/tmp/qmp.sock,server,nowait"));
    }
}
