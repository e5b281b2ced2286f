//! # Bluetooth RFCOMM Transport
//!
//! This module talks to Bluetooth receipt printers over the Serial Port
//! Profile (SPP) using the BlueZ command-line tools.
//!
//! ## Lifecycle
//!
//! | Step | Tooling |
//! |------|---------|
//! | Readiness | `/sys/class/bluetooth`, `bluetoothctl show` |
//! | Scan | `bluetoothctl --timeout N scan on`, `bluetoothctl devices` |
//! | Connect | `bluetoothctl connect`, `rfcomm bind`, open `/dev/rfcommN` |
//! | Disconnect | `rfcomm release`, `bluetoothctl disconnect` |
//!
//! Binding RFCOMM devices needs root (or `CAP_NET_ADMIN`).
//!
//! ## TTY Configuration
//!
//! The RFCOMM device is opened in raw mode so binary raster data is
//! transmitted without modification:
//!
//! - **No input processing**: IGNBRK, BRKINT, PARMRK, ISTRIP, ...
//! - **No output processing**: OPOST (no CR/LF translation)
//! - **8-bit characters**: CS8, no parity
//! - **No echo, non-canonical**
//!
//! ## Chunked Writes
//!
//! Jobs are written in chunks (default 512 bytes, 5 ms apart). Cheap
//! printers drop data when their receive buffer overflows.

use std::fs::OpenOptions;
use std::io;
use std::os::unix::io::AsRawFd;
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;

use super::{Device, PrinterTransport};
use crate::error::{ConnectionError, TransportError};

/// Name fragments of common Bluetooth POS printers.
pub const DEFAULT_NAME_FILTER: &[&str] = &[
    "printer", "pos", "pt-", "mpt-", "rpp", "xp-", "mtp-", "bluetooth print",
];

/// RFCOMM transport configuration.
#[derive(Debug, Clone)]
pub struct RfcommConfig {
    /// Case-insensitive name fragments; the first matching device wins.
    pub name_filter: Vec<String>,
    /// rfcomm device index (`/dev/rfcomm{channel}`).
    pub channel: u8,
    /// Bytes written per chunk.
    pub chunk_size: usize,
    /// Pause between chunks.
    pub chunk_delay: Duration,
}

impl Default for RfcommConfig {
    fn default() -> Self {
        Self {
            name_filter: DEFAULT_NAME_FILTER.iter().map(|s| s.to_string()).collect(),
            channel: 0,
            chunk_size: 512,
            chunk_delay: Duration::from_millis(5),
        }
    }
}

struct Link {
    address: String,
    port: File,
}

/// # Bluetooth Printer Transport
///
/// Holds at most one bound RFCOMM port.
pub struct RfcommTransport {
    config: RfcommConfig,
    link: Mutex<Option<Link>>,
}

impl RfcommTransport {
    pub fn new(config: RfcommConfig) -> Self {
        Self {
            config,
            link: Mutex::new(None),
        }
    }

    fn device_path(&self) -> String {
        format!("/dev/rfcomm{}", self.config.channel)
    }

    async fn bind(&self, mac: &str) -> Result<String, TransportError> {
        if let Some(existing) = find_rfcomm_for_mac(mac).await {
            tracing::debug!(device = %existing, "reusing bound rfcomm device");
            return Ok(existing);
        }

        let device_path = self.device_path();
        let output = run(
            "rfcomm",
            &["bind", &self.config.channel.to_string(), mac, "1"],
        )
        .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportError::new(
                classify_failure(&stderr, ConnectionError::ConnectionFailed),
                format!("rfcomm bind failed: {}", stderr.trim()),
            ));
        }

        // udev needs a moment to create the node
        for _ in 0..10 {
            if tokio::fs::try_exists(&device_path).await.unwrap_or(false) {
                return Ok(device_path);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        Err(TransportError::new(
            ConnectionError::ConnectionFailed,
            format!("device {} was not created", device_path),
        ))
    }
}

#[async_trait]
impl PrinterTransport for RfcommTransport {
    fn name(&self) -> &'static str {
        "rfcomm"
    }

    async fn readiness(&self) -> Result<(), TransportError> {
        if !has_adapter().await {
            return Err(TransportError::new(
                ConnectionError::BluetoothNotSupported,
                "no adapter under /sys/class/bluetooth",
            ));
        }

        let output = run("bluetoothctl", &["show"]).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(TransportError::new(
                classify_failure(&stderr, ConnectionError::BluetoothNotSupported),
                format!("bluetoothctl show failed: {}", stderr.trim()),
            ));
        }
        if is_powered(&stdout) {
            Ok(())
        } else {
            Err(TransportError::new(
                ConnectionError::BluetoothDisabled,
                "adapter is powered off",
            ))
        }
    }

    async fn scan(&self, window: Duration) -> Result<Device, TransportError> {
        let secs = window.as_secs().max(1).to_string();
        tracing::info!(window_secs = %secs, "scanning for printers");
        let output = run("bluetoothctl", &["--timeout", &secs, "scan", "on"]).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportError::new(
                classify_failure(&stderr, ConnectionError::PrinterNotFound),
                format!("scan failed: {}", stderr.trim()),
            ));
        }

        let output = run("bluetoothctl", &["devices"]).await?;
        let listing = String::from_utf8_lossy(&output.stdout);
        let devices = parse_devices(&listing);
        tracing::debug!(count = devices.len(), "devices visible");

        devices
            .into_iter()
            .find(|d| matches_filter(&d.name, &self.config.name_filter))
            .ok_or_else(|| {
                TransportError::new(
                    ConnectionError::PrinterNotFound,
                    "no visible device matches the printer name filter",
                )
            })
    }

    async fn connect(&self, device: &Device) -> Result<(), TransportError> {
        if !is_valid_mac(&device.address) {
            return Err(TransportError::new(
                ConnectionError::ConnectionFailed,
                format!("invalid address {:?}", device.address),
            ));
        }
        let mac = device.address.to_uppercase();

        // May report failure when already connected; opening the port decides.
        let output = run("bluetoothctl", &["connect", &mac]).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(%mac, output = %stdout.trim(), "bluetoothctl connect");

        let device_path = self.bind(&mac).await?;
        let file = open_port(device_path.clone()).await?;

        tracing::info!(%mac, device = %device_path, "rfcomm link open");
        *self.link.lock().await = Some(Link {
            address: mac,
            port: File::from_std(file),
        });
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let Some(link) = self.link.lock().await.take() else {
            return Ok(());
        };
        drop(link.port);

        let channel = self.config.channel.to_string();
        let released = run("rfcomm", &["release", &channel]).await?;
        if !released.status.success() {
            tracing::warn!(
                stderr = %String::from_utf8_lossy(&released.stderr).trim(),
                "rfcomm release failed"
            );
        }
        run("bluetoothctl", &["disconnect", &link.address]).await?;
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut guard = self.link.lock().await;
        let link = guard.as_mut().ok_or_else(|| {
            TransportError::new(ConnectionError::PrintError, "no open rfcomm port")
        })?;

        let write_failed =
            |e: io::Error| TransportError::new(ConnectionError::PrintError, format!("write failed: {}", e));
        let chunk_size = self.config.chunk_size.max(1);
        for chunk in data.chunks(chunk_size) {
            link.port.write_all(chunk).await.map_err(write_failed)?;
            if !self.config.chunk_delay.is_zero() {
                tokio::time::sleep(self.config.chunk_delay).await;
            }
        }
        link.port.flush().await.map_err(write_failed)?;
        tracing::debug!(bytes = data.len(), "job written");
        Ok(())
    }
}

/// Open the bound port in raw mode on the blocking pool.
///
/// The open blocks until the RFCOMM channel is up, which keeps it off the
/// runtime workers and lets a caller's timeout fire.
async fn open_port(device_path: String) -> Result<std::fs::File, TransportError> {
    tokio::task::spawn_blocking(move || {
        let file = OpenOptions::new()
            .write(true)
            .open(&device_path)
            .map_err(|e| {
                let kind = if e.kind() == io::ErrorKind::PermissionDenied {
                    ConnectionError::BluetoothPermission
                } else {
                    ConnectionError::ConnectionFailed
                };
                TransportError::new(kind, format!("failed to open {}: {}", device_path, e))
            })?;
        configure_tty_raw(file.as_raw_fd())?;
        Ok(file)
    })
    .await
    .map_err(|e| {
        TransportError::new(
            ConnectionError::ConnectionFailed,
            format!("open task failed: {}", e),
        )
    })?
}

/// Whether the kernel lists at least one Bluetooth adapter.
async fn has_adapter() -> bool {
    match tokio::fs::read_dir("/sys/class/bluetooth").await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(Some(_))),
        Err(_) => false,
    }
}

/// Run a BlueZ helper, mapping a missing binary to `BluetoothNotSupported`.
async fn run(program: &str, args: &[&str]) -> Result<Output, TransportError> {
    Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| {
            let kind = match e.kind() {
                io::ErrorKind::NotFound => ConnectionError::BluetoothNotSupported,
                io::ErrorKind::PermissionDenied => ConnectionError::BluetoothPermission,
                _ => ConnectionError::ConnectionFailed,
            };
            TransportError::new(kind, format!("failed to run {}: {}", program, e))
        })
}

/// Map tool stderr to a status kind; authorization problems are always
/// `BluetoothPermission`.
fn classify_failure(stderr: &str, fallback: ConnectionError) -> ConnectionError {
    let lower = stderr.to_lowercase();
    if lower.contains("not authorized") || lower.contains("permission denied") {
        ConnectionError::BluetoothPermission
    } else if lower.contains("not available") || lower.contains("no default controller") {
        ConnectionError::BluetoothDisabled
    } else {
        fallback
    }
}

fn is_powered(show_output: &str) -> bool {
    show_output
        .lines()
        .any(|line| line.trim().eq_ignore_ascii_case("powered: yes"))
}

/// Parse `bluetoothctl devices` output (`Device XX:XX:XX:XX:XX:XX Name`).
pub fn parse_devices(listing: &str) -> Vec<Device> {
    listing
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("Device ")?;
            let (address, name) = rest.split_once(' ').unwrap_or((rest, ""));
            is_valid_mac(address).then(|| Device {
                name: name.trim().to_string(),
                address: address.to_uppercase(),
            })
        })
        .collect()
}

/// Case-insensitive substring match against any filter entry.
/// An empty filter accepts every device.
pub fn matches_filter(name: &str, filter: &[String]) -> bool {
    if filter.is_empty() {
        return true;
    }
    let name = name.to_lowercase();
    filter.iter().any(|f| name.contains(&f.to_lowercase()))
}

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() != 6 {
        return false;
    }
    parts
        .iter()
        .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Find an existing RFCOMM device bound to the given MAC address.
///
/// Reads `/proc/net/rfcomm` (format: `rfcomm0: XX:XX:XX:XX:XX:XX channel N ...`).
async fn find_rfcomm_for_mac(mac: &str) -> Option<String> {
    let contents = tokio::fs::read_to_string("/proc/net/rfcomm").await.ok()?;
    let path = find_bound_device(&contents, mac)?;
    tokio::fs::try_exists(&path)
        .await
        .unwrap_or(false)
        .then_some(path)
}

fn find_bound_device(proc_listing: &str, mac: &str) -> Option<String> {
    let mac_upper = mac.to_uppercase();
    proc_listing
        .lines()
        .filter(|line| line.to_uppercase().contains(&mac_upper))
        .find_map(|line| line.split(':').next())
        .map(|dev| format!("/dev/{}", dev.trim()))
}

/// Configure a file descriptor for raw TTY mode.
///
/// IXON/IXOFF/IXANY must be off: 0x11 and 0x13 appear in raster data.
fn configure_tty_raw(fd: i32) -> Result<(), TransportError> {
    use std::mem::MaybeUninit;

    let tty_error = |call: &str| {
        TransportError::new(
            ConnectionError::ConnectionFailed,
            format!("{} failed: {}", call, io::Error::last_os_error()),
        )
    };

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(tty_error("tcgetattr"));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(tty_error("tcsetattr"));
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
