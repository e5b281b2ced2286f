//! # Simulated Transport
//!
//! An in-memory printer with scripted outcomes. Used by the test suite and by
//! `bluepos --simulate` to exercise the whole pipeline without hardware.
//!
//! ```
//! use bluepos::error::ConnectionError;
//! use bluepos::transport::SimulatedTransport;
//!
//! let transport = SimulatedTransport::new()
//!     .with_device("PT-210")
//!     .failing_send(ConnectionError::PrintError);
//! assert!(transport.sent().is_empty());
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{AdapterEvent, Device, PrinterTransport};
use crate::error::{ConnectionError, TransportError};

/// Default MAC address reported for simulated printers.
pub const SIMULATED_ADDRESS: &str = "66:32:8D:F0:A1:B2";

/// Operation that never completes, to exercise timeouts and cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    Scan,
    Connect,
    Send,
}

#[derive(Debug, Clone)]
struct Script {
    readiness: Option<ConnectionError>,
    device: Option<Device>,
    connect_error: Option<ConnectionError>,
    send_error: Option<ConnectionError>,
    latency: Duration,
    stall: Option<Stall>,
}

#[derive(Debug, Default)]
struct Counters {
    readiness: AtomicUsize,
    scans: AtomicUsize,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

/// Scripted printer transport.
pub struct SimulatedTransport {
    script: Mutex<Script>,
    counters: Counters,
    sent: Mutex<Vec<Vec<u8>>>,
    linked: Mutex<Option<Device>>,
    events_tx: mpsc::UnboundedSender<AdapterEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<AdapterEvent>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTransport {
    /// A ready radio with one printer in range; every operation succeeds instantly.
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            script: Mutex::new(Script {
                readiness: None,
                device: Some(Device {
                    name: "BlueTooth Printer".into(),
                    address: SIMULATED_ADDRESS.into(),
                }),
                connect_error: None,
                send_error: None,
                latency: Duration::ZERO,
                stall: None,
            }),
            counters: Counters::default(),
            sent: Mutex::new(Vec::new()),
            linked: Mutex::new(None),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Printer name reported by scans.
    pub fn with_device(self, name: impl Into<String>) -> Self {
        lock(&self.script).device = Some(Device {
            name: name.into(),
            address: SIMULATED_ADDRESS.into(),
        });
        self
    }

    /// No printer in range: scans fail with `PrinterNotFound`.
    pub fn without_device(self) -> Self {
        lock(&self.script).device = None;
        self
    }

    /// Readiness checks fail with `kind`.
    pub fn not_ready(self, kind: ConnectionError) -> Self {
        self.set_readiness(Some(kind));
        self
    }

    pub fn failing_connect(self, kind: ConnectionError) -> Self {
        lock(&self.script).connect_error = Some(kind);
        self
    }

    pub fn failing_send(self, kind: ConnectionError) -> Self {
        lock(&self.script).send_error = Some(kind);
        self
    }

    /// Delay applied to scan, connect and send.
    pub fn with_latency(self, latency: Duration) -> Self {
        lock(&self.script).latency = latency;
        self
    }

    pub fn stalling(self, stall: Stall) -> Self {
        lock(&self.script).stall = Some(stall);
        self
    }

    /// Change the readiness outcome at runtime (`None` = ready).
    pub fn set_readiness(&self, failure: Option<ConnectionError>) {
        lock(&self.script).readiness = failure;
    }

    /// Push an adapter event to whoever took the event feed.
    pub fn emit(&self, event: AdapterEvent) {
        if event == AdapterEvent::LinkLost {
            lock(&self.linked).take();
        }
        // Nobody listening is fine.
        let _ = self.events_tx.send(event);
    }

    /// Every payload delivered by `send`, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        lock(&self.sent).clone()
    }

    pub fn readiness_checks(&self) -> usize {
        self.counters.readiness.load(Ordering::SeqCst)
    }

    pub fn scans(&self) -> usize {
        self.counters.scans.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.counters.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.counters.disconnects.load(Ordering::SeqCst)
    }

    pub fn is_linked(&self) -> bool {
        lock(&self.linked).is_some()
    }

    async fn delay(&self, op: Stall) {
        let (latency, stall) = {
            let script = lock(&self.script);
            (script.latency, script.stall)
        };
        if stall == Some(op) {
            std::future::pending::<()>().await;
        }
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl PrinterTransport for SimulatedTransport {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn readiness(&self) -> Result<(), TransportError> {
        self.counters.readiness.fetch_add(1, Ordering::SeqCst);
        match lock(&self.script).readiness {
            Some(kind) => Err(TransportError::new(kind, "simulated adapter not ready")),
            None => Ok(()),
        }
    }

    async fn scan(&self, _window: Duration) -> Result<Device, TransportError> {
        self.counters.scans.fetch_add(1, Ordering::SeqCst);
        self.delay(Stall::Scan).await;
        lock(&self.script).device.clone().ok_or_else(|| {
            TransportError::new(ConnectionError::PrinterNotFound, "no simulated printer in range")
        })
    }

    async fn connect(&self, device: &Device) -> Result<(), TransportError> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        self.delay(Stall::Connect).await;
        if let Some(kind) = lock(&self.script).connect_error {
            return Err(TransportError::new(kind, "simulated connect failure"));
        }
        *lock(&self.linked) = Some(device.clone());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.counters.disconnects.fetch_add(1, Ordering::SeqCst);
        lock(&self.linked).take();
        Ok(())
    }

    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        self.delay(Stall::Send).await;
        if !self.is_linked() {
            return Err(TransportError::new(
                ConnectionError::PrintError,
                "simulated printer is not connected",
            ));
        }
        if let Some(kind) = lock(&self.script).send_error {
            return Err(TransportError::new(kind, "simulated write failure"));
        }
        lock(&self.sent).push(data.to_vec());
        Ok(())
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<AdapterEvent>> {
        lock(&self.events_rx).take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_script_succeeds() {
        let transport = SimulatedTransport::new();
        transport.readiness().await.unwrap();
        let device = transport.scan(Duration::from_secs(1)).await.unwrap();
        assert_eq!(device.address, SIMULATED_ADDRESS);

        transport.connect(&device).await.unwrap();
        transport.send(b"hello").await.unwrap();
        assert_eq!(transport.sent(), vec![b"hello".to_vec()]);
        assert_eq!(transport.scans(), 1);
        assert_eq!(transport.connects(), 1);
    }

    #[tokio::test]
    async fn test_send_requires_link() {
        let transport = SimulatedTransport::new();
        let err = transport.send(b"x").await.unwrap_err();
        assert_eq!(err.kind, ConnectionError::PrintError);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let transport = SimulatedTransport::new()
            .without_device()
            .not_ready(ConnectionError::BluetoothDisabled);

        let err = transport.readiness().await.unwrap_err();
        assert_eq!(err.kind, ConnectionError::BluetoothDisabled);

        let err = transport.scan(Duration::from_secs(1)).await.unwrap_err();
        assert_eq!(err.kind, ConnectionError::PrinterNotFound);

        transport.set_readiness(None);
        assert!(transport.readiness().await.is_ok());
        assert_eq!(transport.readiness_checks(), 2);
    }

    #[tokio::test]
    async fn test_event_feed_taken_once() {
        let transport = SimulatedTransport::new();
        let mut rx = transport.take_events().unwrap();
        assert!(transport.take_events().is_none());

        transport.emit(AdapterEvent::PoweredOff);
        assert_eq!(rx.recv().await, Some(AdapterEvent::PoweredOff));
    }

    #[tokio::test]
    async fn test_link_lost_drops_link() {
        let transport = SimulatedTransport::new();
        let device = transport.scan(Duration::ZERO).await.unwrap();
        transport.connect(&device).await.unwrap();
        assert!(transport.is_linked());

        transport.emit(AdapterEvent::LinkLost);
        assert!(!transport.is_linked());
    }
}
