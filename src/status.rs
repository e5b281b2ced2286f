//! # Connection Status
//!
//! The status snapshot published by [`ConnectionManager`](crate::manager::ConnectionManager).
//!
//! ## Phases
//!
//! ```text
//! Idle ──► Scanning ──► Discovered ──► Connecting ──► Connected ◄──► Printing
//!   ▲          │             ▲              │             │
//!   └──────────┘             └──────────────┘             ▼
//!  (not found)              (connect failed)         Disconnected ──► Scanning ...
//! ```
//!
//! The boolean flags a UI binds to (`is_scanning`, `is_connected`, ...) are
//! derived from [`Phase`], so contradictory combinations such as "printing
//! while disconnected" cannot be represented.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConnectionError;

/// Where the single printer link currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Scanning,
    Discovered,
    Connecting,
    Connected,
    Printing,
    Disconnected,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Idle,
        Phase::Scanning,
        Phase::Discovered,
        Phase::Connecting,
        Phase::Connected,
        Phase::Printing,
        Phase::Disconnected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Scanning => "scanning",
            Phase::Discovered => "discovered",
            Phase::Connecting => "connecting",
            Phase::Connected => "connected",
            Phase::Printing => "printing",
            Phase::Disconnected => "disconnected",
        }
    }
}

/// Immutable point-in-time view of the printer connection.
///
/// Snapshots are replaced wholesale; observers never see one half-updated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Name of the discovered or connected printer, empty if none.
    pub device_name: String,
    /// Radio enabled and permissions granted.
    pub bluetooth_ready: bool,
    pub phase: Phase,
    pub last_error: Option<ConnectionError>,
}

impl ConnectionStatus {
    pub fn is_scanning(&self) -> bool {
        self.phase == Phase::Scanning
    }

    /// A printer is known (found by a scan and not yet disconnected).
    pub fn discovered_printer(&self) -> bool {
        matches!(
            self.phase,
            Phase::Discovered | Phase::Connecting | Phase::Connected | Phase::Printing
        )
    }

    pub fn is_connecting(&self) -> bool {
        self.phase == Phase::Connecting
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.phase, Phase::Connected | Phase::Printing)
    }

    pub fn is_printing(&self) -> bool {
        self.phase == Phase::Printing
    }

    pub fn can_print(&self) -> bool {
        self.is_connected()
    }

    /// Flattened boolean view, named after the flags a UI binds its buttons to.
    pub fn flags(&self) -> StatusFlags {
        StatusFlags {
            device_name: self.device_name.clone(),
            is_bluetooth_ready: self.bluetooth_ready,
            is_scanning: self.is_scanning(),
            discovered_printer: self.discovered_printer(),
            is_connecting: self.is_connecting(),
            is_connected: self.is_connected(),
            is_printing: self.is_printing(),
            can_print: self.can_print(),
            last_error: self.last_error,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} ready={:<5} device={}",
            self.phase.as_str(),
            self.bluetooth_ready,
            if self.device_name.is_empty() {
                "-"
            } else {
                &self.device_name
            }
        )?;
        if let Some(err) = self.last_error {
            write!(f, " error=\"{}\"", err)?;
        }
        Ok(())
    }
}

/// Serializable boolean projection of a [`ConnectionStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusFlags {
    pub device_name: String,
    pub is_bluetooth_ready: bool,
    pub is_scanning: bool,
    pub discovered_printer: bool,
    pub is_connecting: bool,
    pub is_connected: bool,
    pub is_printing: bool,
    pub can_print: bool,
    pub last_error: Option<ConnectionError>,
}
