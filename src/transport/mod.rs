//! # Printer Transport Layer
//!
//! This module provides the platform side of a printer connection: radio
//! readiness, discovery, link setup and raw byte delivery.
//!
//! ## Available Transports
//!
//! - [`bluetooth`]: BlueZ + RFCOMM for Linux hosts
//! - [`simulated`]: scripted in-memory printer for tests and dry runs

pub mod bluetooth;
pub mod simulated;

pub use bluetooth::{RfcommConfig, RfcommTransport};
pub use simulated::{SimulatedTransport, Stall};

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::TransportError;

/// A printer found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    /// Bluetooth MAC address (XX:XX:XX:XX:XX:XX).
    pub address: String,
}

/// Unsolicited adapter notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterEvent {
    PoweredOn,
    PoweredOff,
    PermissionRevoked,
    /// The remote printer dropped the link.
    LinkLost,
}

/// Capability set of a platform Bluetooth stack.
///
/// Methods take `&self` so readiness checks can run while another operation
/// holds the link; implementations keep their own interior state.
#[async_trait]
pub trait PrinterTransport: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Check that the radio is present, powered and usable.
    async fn readiness(&self) -> Result<(), TransportError>;

    /// Look for a printer for at most `window`.
    async fn scan(&self, window: Duration) -> Result<Device, TransportError>;

    async fn connect(&self, device: &Device) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Deliver an encoded job to the connected printer.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Hand over the adapter event feed. Returns `None` after the first call
    /// or if the transport has no events.
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<AdapterEvent>> {
        None
    }
}
