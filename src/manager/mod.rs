//! # Connection Manager
//!
//! Owns the single printer link and the status snapshot observers watch.
//!
//! ## Operations
//!
//! | Operation | Accepted when | Success | Failure |
//! |-----------|---------------|---------|---------|
//! | `init` | radio not ready | ready | not ready + error |
//! | `scan_for_printers` | ready, nothing discovered, idle | Discovered | previous phase + `PrinterNotFound` |
//! | `connect` | Discovered | Connected | Discovered + error |
//! | `disconnect` | connected | Disconnected | - |
//! | `print` | Connected | Connected | Connected + `PrintError` |
//!
//! Scan, connect, disconnect and print share one operation gate. A call made
//! while another holds it is rejected, not queued. The one exception is
//! `disconnect` during a print: the print is aborted (reported as
//! `PrintError`) and the disconnect then applies.
//!
//! Failures never come back as `Err`; they are published in
//! [`ConnectionStatus::last_error`]. If the radio goes away while an
//! operation runs, its readiness error is kept over the operation's own.
//!
//! ```
//! use std::sync::Arc;
//! use bluepos::job::PrintJob;
//! use bluepos::manager::{ConnectionManager, Dispatch, ManagerConfig};
//! use bluepos::transport::SimulatedTransport;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let transport = Arc::new(SimulatedTransport::new());
//! let manager = ConnectionManager::new(transport.clone(), ManagerConfig::default());
//!
//! manager.init().await;
//! manager.scan_for_printers().await;
//! manager.connect().await;
//!
//! let job = PrintJob::builder().text("Hello").new_line(1).build().unwrap();
//! assert_eq!(manager.print(job).await, Dispatch::Accepted);
//! assert!(manager.status().last_error.is_none());
//! assert_eq!(transport.sent().len(), 1);
//! # }
//! ```

mod command;
mod hub;

pub use command::{Command, Dispatch};
pub use hub::StatusStream;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use self::hub::StatusHub;
use crate::error::{BlueposError, ConnectionError};
use crate::job::PrintJob;
use crate::printer::PrinterProfile;
use crate::status::{ConnectionStatus, Phase};
use crate::transport::{AdapterEvent, Device, PrinterTransport};

/// Bounds and printer settings for a [`ConnectionManager`].
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// How long the radio listens for advertisements during a scan.
    pub scan_window: Duration,
    /// Hard limit for a whole scan, including adapter setup.
    pub scan_timeout: Duration,
    pub connect_timeout: Duration,
    /// Limit for encoding plus delivering one job.
    pub print_timeout: Duration,
    pub profile: PrinterProfile,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            scan_window: Duration::from_secs(8),
            scan_timeout: Duration::from_secs(12),
            connect_timeout: Duration::from_secs(10),
            print_timeout: Duration::from_secs(60),
            profile: PrinterProfile::default(),
        }
    }
}

/// Drives one printer link and publishes its [`ConnectionStatus`].
///
/// Cheap to clone; clones share the link and the status.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn PrinterTransport>,
    config: ManagerConfig,
    hub: StatusHub,
    /// Operation gate; holds the device found by the last scan.
    link: tokio::sync::Mutex<Option<Device>>,
    /// Abort signal of the print in flight.
    abort: Mutex<Option<oneshot::Sender<()>>>,
    events_task: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.events_task).take() {
            task.abort();
        }
    }
}

impl ConnectionManager {
    /// Create a manager in the Idle phase with the radio assumed not ready.
    ///
    /// When called inside a tokio runtime, a background task starts
    /// consuming the transport's adapter events.
    pub fn new(transport: Arc<dyn PrinterTransport>, config: ManagerConfig) -> Self {
        let events = transport.take_events();
        let inner = Arc::new(Inner {
            transport,
            config,
            hub: StatusHub::new(ConnectionStatus::default()),
            link: tokio::sync::Mutex::new(None),
            abort: Mutex::new(None),
            events_task: Mutex::new(None),
        });

        if let Some(events) = events {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let task = handle.spawn(watch_adapter(Arc::downgrade(&inner), events));
                    *lock(&inner.events_task) = Some(task);
                }
                Err(_) => {
                    tracing::warn!("no tokio runtime; adapter events will be ignored");
                }
            }
        }

        Self { inner }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    /// Current snapshot.
    pub fn status(&self) -> ConnectionStatus {
        self.inner.hub.snapshot()
    }

    /// Observe the status: the current snapshot, then every change.
    pub fn connection_state(&self) -> StatusStream {
        self.inner.hub.subscribe()
    }

    /// Re-check radio readiness.
    ///
    /// Does not take the operation gate, so it can run while a scan or print
    /// is in flight. Rejected when the radio is already known to be ready.
    pub async fn init(&self) -> Dispatch {
        if self.status().bluetooth_ready {
            tracing::debug!(operation = "init", "rejected: bluetooth already ready");
            return Dispatch::Rejected;
        }

        match self.inner.transport.readiness().await {
            Ok(()) => {
                tracing::info!(transport = self.inner.transport.name(), "bluetooth ready");
                self.inner.hub.update(|s| {
                    s.bluetooth_ready = true;
                    if s.last_error == Some(ConnectionError::BluetoothDisabled) {
                        s.last_error = None;
                    }
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, "bluetooth not ready");
                self.inner.hub.update(|s| {
                    s.bluetooth_ready = false;
                    s.last_error = Some(err.kind);
                });
            }
        }
        Dispatch::Accepted
    }

    /// Look for a printer. On success the phase becomes Discovered and
    /// `device_name` is set.
    pub async fn scan_for_printers(&self) -> Dispatch {
        let inner = &self.inner;
        let Ok(mut link) = inner.link.try_lock() else {
            return reject("scan", "another operation is in flight");
        };
        let Some(prior) = self.begin(
            "scan",
            |s| s.bluetooth_ready && !s.discovered_printer() && !s.is_scanning(),
            Phase::Scanning,
        ) else {
            return Dispatch::Rejected;
        };
        let guard = InFlight::new(inner, Phase::Scanning, prior);

        tracing::info!(window = ?inner.config.scan_window, "scanning for printers");
        let outcome = tokio::time::timeout(
            inner.config.scan_timeout,
            inner.transport.scan(inner.config.scan_window),
        )
        .await;
        guard.disarm();

        match outcome {
            Ok(Ok(device)) => {
                let mut lost = None;
                inner.hub.update(|s| match readiness_lost(s) {
                    Some(kind) => {
                        s.phase = prior;
                        s.last_error = Some(kind);
                        lost = Some(kind);
                    }
                    None => {
                        s.phase = Phase::Discovered;
                        s.device_name = device.name.clone();
                        s.last_error = None;
                    }
                });
                match lost {
                    Some(kind) => tracing::warn!(error = %kind, "scan finished after the radio went away"),
                    None => {
                        tracing::info!(name = %device.name, address = %device.address, "printer discovered");
                        *link = Some(device);
                    }
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "scan failed");
                settle(inner, prior, err.kind);
            }
            Err(_) => {
                tracing::warn!(timeout = ?inner.config.scan_timeout, "scan timed out");
                settle(inner, prior, ConnectionError::PrinterNotFound);
            }
        }
        Dispatch::Accepted
    }

    /// Open the link to the discovered printer.
    pub async fn connect(&self) -> Dispatch {
        let inner = &self.inner;
        let Ok(link) = inner.link.try_lock() else {
            return reject("connect", "another operation is in flight");
        };
        let Some(device) = (*link).clone() else {
            return reject("connect", "no printer discovered");
        };
        if self
            .begin(
                "connect",
                |s| s.discovered_printer() && !s.is_connected() && !s.is_connecting(),
                Phase::Connecting,
            )
            .is_none()
        {
            return Dispatch::Rejected;
        }
        let guard = InFlight::new(inner, Phase::Connecting, Phase::Discovered);

        tracing::info!(name = %device.name, address = %device.address, "connecting");
        let outcome =
            tokio::time::timeout(inner.config.connect_timeout, inner.transport.connect(&device))
                .await;
        guard.disarm();

        match outcome {
            Ok(Ok(())) => {
                let mut lost = None;
                inner.hub.update(|s| match readiness_lost(s) {
                    Some(kind) => {
                        s.phase = Phase::Discovered;
                        s.last_error = Some(kind);
                        lost = Some(kind);
                    }
                    None => {
                        s.phase = Phase::Connected;
                        s.last_error = None;
                    }
                });
                match lost {
                    Some(kind) => {
                        tracing::warn!(error = %kind, "link opened after the radio went away");
                        if let Err(err) = inner.transport.disconnect().await {
                            tracing::debug!(error = %err, "closing stale link failed");
                        }
                    }
                    None => tracing::info!(name = %device.name, "connected"),
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "connect failed");
                settle(inner, Phase::Discovered, err.kind);
            }
            Err(_) => {
                tracing::warn!(timeout = ?inner.config.connect_timeout, "connect timed out");
                // The transport may have half-opened the link.
                if let Err(err) = inner.transport.disconnect().await {
                    tracing::debug!(error = %err, "cleanup after connect timeout failed");
                }
                settle(inner, Phase::Discovered, ConnectionError::ConnectionFailed);
            }
        }
        Dispatch::Accepted
    }

    /// Tear down the link. A print in flight is aborted first.
    ///
    /// The status shows Disconnected before this returns.
    pub async fn disconnect(&self) -> Dispatch {
        if !self.status().is_connected() {
            return reject("disconnect", "not connected");
        }
        self.signal_abort();

        let mut link = self.inner.link.lock().await;
        if !self.status().is_connected() {
            return reject("disconnect", "link already gone");
        }
        drop_link(&self.inner, &mut link).await;
        tracing::info!("disconnected");
        Dispatch::Accepted
    }

    /// Encode `job` and stream it to the connected printer.
    ///
    /// A failed print leaves the link connected.
    pub async fn print(&self, job: PrintJob) -> Dispatch {
        let inner = &self.inner;
        let Ok(_link) = inner.link.try_lock() else {
            return reject("print", "another operation is in flight");
        };
        let (abort_tx, abort_rx) = oneshot::channel();
        *lock(&inner.abort) = Some(abort_tx);
        if self
            .begin(
                "print",
                |s| s.is_connected() && s.can_print() && !s.is_printing(),
                Phase::Printing,
            )
            .is_none()
        {
            lock(&inner.abort).take();
            return Dispatch::Rejected;
        }
        let guard = InFlight::new(inner, Phase::Printing, Phase::Connected);

        let job_id = job.id();
        tracing::info!(job = %job_id, segments = job.segments().len(), "printing");
        let outcome = self.deliver(job, abort_rx).await;
        lock(&inner.abort).take();
        guard.disarm();

        match outcome {
            Ok(bytes) => {
                tracing::info!(job = %job_id, bytes, "print complete");
                inner.hub.update(|s| {
                    s.phase = Phase::Connected;
                    if s.bluetooth_ready {
                        s.last_error = None;
                    }
                });
            }
            Err(err) => {
                tracing::warn!(job = %job_id, error = %err, "print failed");
                settle(inner, Phase::Connected, ConnectionError::PrintError);
            }
        }
        Dispatch::Accepted
    }

    /// Dismiss the current error, returning it.
    ///
    /// Dismissing `BluetoothDisabled` re-runs [`init`](Self::init) once.
    pub async fn acknowledge_error(&self) -> Option<ConnectionError> {
        let mut cleared = None;
        self.inner.hub.update(|s| cleared = s.last_error.take());
        if cleared == Some(ConnectionError::BluetoothDisabled) {
            self.init().await;
        }
        cleared
    }

    /// Encode on the blocking pool, then send. Returns the byte count.
    async fn deliver(
        &self,
        job: PrintJob,
        mut abort: oneshot::Receiver<()>,
    ) -> Result<usize, BlueposError> {
        let inner = &self.inner;
        let profile = inner.config.profile;
        let work = async {
            let bytes = tokio::task::spawn_blocking(move || job.encode(&profile))
                .await
                .map_err(|e| BlueposError::Task(e.to_string()))??;
            tokio::time::timeout(inner.config.print_timeout, inner.transport.send(&bytes))
                .await
                .map_err(|_| BlueposError::Transport("print timed out".into()))??;
            Ok::<usize, BlueposError>(bytes.len())
        };

        tokio::select! {
            result = work => result,
            _ = &mut abort => Err(BlueposError::Transport("print aborted".into())),
        }
    }

    fn signal_abort(&self) {
        if let Some(abort) = lock(&self.inner.abort).take() {
            tracing::info!("aborting print in flight");
            // The print may have just finished.
            let _ = abort.send(());
        }
    }

    /// Move to `busy` if `allowed` holds for the current snapshot. Returns
    /// the phase left behind.
    fn begin<F>(&self, operation: &'static str, allowed: F, busy: Phase) -> Option<Phase>
    where
        F: FnOnce(&ConnectionStatus) -> bool,
    {
        let mut prior = None;
        let status = self.inner.hub.update(|s| {
            if allowed(s) {
                prior = Some(s.phase);
                s.phase = busy;
            }
        });
        if prior.is_none() {
            tracing::debug!(operation, status = %status, "rejected");
        }
        prior
    }
}

fn reject(operation: &'static str, reason: &str) -> Dispatch {
    tracing::debug!(operation, reason, "rejected");
    Dispatch::Rejected
}

/// Publish a failed operation. A readiness error raised while it ran wins
/// over `error`, so dismissing it still re-checks the radio.
fn settle(inner: &Inner, phase: Phase, error: ConnectionError) {
    inner.hub.update(|s| {
        s.phase = phase;
        let keep = !s.bluetooth_ready
            && matches!(
                s.last_error,
                Some(ConnectionError::BluetoothDisabled | ConnectionError::BluetoothPermission)
            );
        if !keep {
            s.last_error = Some(error);
        }
    });
}

/// The readiness error to report when the radio is no longer usable.
fn readiness_lost(status: &ConnectionStatus) -> Option<ConnectionError> {
    if status.bluetooth_ready {
        return None;
    }
    match status.last_error {
        Some(kind @ (ConnectionError::BluetoothDisabled | ConnectionError::BluetoothPermission)) => {
            Some(kind)
        }
        _ => Some(ConnectionError::BluetoothDisabled),
    }
}

/// Close the transport link and publish Disconnected. Caller holds the gate.
async fn drop_link(inner: &Inner, link: &mut Option<Device>) {
    if let Err(err) = inner.transport.disconnect().await {
        tracing::warn!(error = %err, "transport disconnect failed");
    }
    link.take();
    inner.hub.update(|s| {
        s.phase = Phase::Disconnected;
        s.device_name.clear();
    });
}

/// Restores a settled phase if an operation's future is dropped mid-flight.
struct InFlight<'a> {
    inner: &'a Inner,
    busy: Phase,
    settle: Phase,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(inner: &'a Inner, busy: Phase, settle: Phase) -> Self {
        Self {
            inner,
            busy,
            settle,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!(phase = self.busy.as_str(), "operation cancelled");
        lock(&self.inner.abort).take();
        let (busy, settle) = (self.busy, self.settle);
        self.inner.hub.update(|s| {
            if s.phase == busy {
                s.phase = settle;
            }
        });
    }
}

/// Fold adapter events into the status until the manager goes away.
async fn watch_adapter(inner: Weak<Inner>, mut events: mpsc::UnboundedReceiver<AdapterEvent>) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        tracing::debug!(?event, "adapter event");
        match event {
            AdapterEvent::PoweredOn => {
                inner.hub.update(|s| {
                    s.bluetooth_ready = true;
                    if s.last_error == Some(ConnectionError::BluetoothDisabled) {
                        s.last_error = None;
                    }
                });
            }
            AdapterEvent::PoweredOff => {
                inner.hub.update(|s| {
                    s.bluetooth_ready = false;
                    s.last_error = Some(ConnectionError::BluetoothDisabled);
                });
                lose_link(&inner).await;
            }
            AdapterEvent::PermissionRevoked => {
                inner.hub.update(|s| {
                    s.bluetooth_ready = false;
                    s.last_error = Some(ConnectionError::BluetoothPermission);
                });
                lose_link(&inner).await;
            }
            AdapterEvent::LinkLost => lose_link(&inner).await,
        }
    }
    tracing::debug!("adapter event feed closed");
}

async fn lose_link(inner: &Inner) {
    if !inner.hub.snapshot().is_connected() {
        return;
    }
    if let Some(abort) = lock(&inner.abort).take() {
        let _ = abort.send(());
    }
    let mut link = inner.link.lock().await;
    if inner.hub.snapshot().is_connected() {
        tracing::warn!("printer link lost");
        drop_link(inner, &mut link).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{SimulatedTransport, Stall};
    use pretty_assertions::assert_eq;

    fn quick_config() -> ManagerConfig {
        ManagerConfig {
            scan_window: Duration::from_millis(10),
            scan_timeout: Duration::from_millis(200),
            connect_timeout: Duration::from_millis(200),
            print_timeout: Duration::from_millis(200),
            profile: PrinterProfile::MM58,
        }
    }

    async fn connected(transport: SimulatedTransport) -> (Arc<SimulatedTransport>, ConnectionManager) {
        let transport = Arc::new(transport);
        let manager = ConnectionManager::new(transport.clone(), quick_config());
        assert_eq!(manager.init().await, Dispatch::Accepted);
        assert_eq!(manager.scan_for_printers().await, Dispatch::Accepted);
        assert_eq!(manager.connect().await, Dispatch::Accepted);
        assert_eq!(manager.status().phase, Phase::Connected);
        (transport, manager)
    }

    fn job() -> PrintJob {
        PrintJob::builder().text("Hello").new_line(1).build().unwrap()
    }

    #[tokio::test]
    async fn test_init_failure_publishes_kind() {
        let transport = Arc::new(SimulatedTransport::new().not_ready(ConnectionError::BluetoothPermission));
        let manager = ConnectionManager::new(transport.clone(), quick_config());

        assert_eq!(manager.init().await, Dispatch::Accepted);
        let status = manager.status();
        assert!(!status.bluetooth_ready);
        assert_eq!(status.last_error, Some(ConnectionError::BluetoothPermission));
    }

    #[tokio::test]
    async fn test_init_is_noop_when_ready() {
        let transport = Arc::new(SimulatedTransport::new());
        let manager = ConnectionManager::new(transport.clone(), quick_config());
        manager.init().await;
        assert_eq!(manager.init().await, Dispatch::Rejected);
        assert_eq!(transport.readiness_checks(), 1);
    }

    #[tokio::test]
    async fn test_scan_requires_ready_radio() {
        let transport = Arc::new(SimulatedTransport::new());
        let manager = ConnectionManager::new(transport.clone(), quick_config());
        assert_eq!(manager.scan_for_printers().await, Dispatch::Rejected);
        assert_eq!(transport.scans(), 0);
    }

    #[tokio::test]
    async fn test_scan_not_found_restores_phase() {
        let transport = Arc::new(SimulatedTransport::new().without_device());
        let manager = ConnectionManager::new(transport.clone(), quick_config());
        manager.init().await;

        assert_eq!(manager.scan_for_printers().await, Dispatch::Accepted);
        let status = manager.status();
        assert_eq!(status.phase, Phase::Idle);
        assert_eq!(status.last_error, Some(ConnectionError::PrinterNotFound));
    }

    #[tokio::test]
    async fn test_second_scan_rejected_after_discovery() {
        let transport = Arc::new(SimulatedTransport::new());
        let manager = ConnectionManager::new(transport.clone(), quick_config());
        manager.init().await;
        manager.scan_for_printers().await;
        assert_eq!(manager.scan_for_printers().await, Dispatch::Rejected);
        assert_eq!(transport.scans(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_returns_to_discovered() {
        let transport = Arc::new(SimulatedTransport::new().failing_connect(ConnectionError::ConnectionFailed));
        let manager = ConnectionManager::new(transport.clone(), quick_config());
        manager.init().await;
        manager.scan_for_printers().await;

        assert_eq!(manager.connect().await, Dispatch::Accepted);
        let status = manager.status();
        assert_eq!(status.phase, Phase::Discovered);
        assert!(!status.is_connected());
        assert_eq!(status.last_error, Some(ConnectionError::ConnectionFailed));
    }

    #[tokio::test]
    async fn test_connect_without_discovery_rejected() {
        let transport = Arc::new(SimulatedTransport::new());
        let manager = ConnectionManager::new(transport.clone(), quick_config());
        manager.init().await;
        assert_eq!(manager.connect().await, Dispatch::Rejected);
        assert_eq!(transport.connects(), 0);
    }

    #[tokio::test]
    async fn test_print_failure_keeps_connection() {
        let (transport, manager) =
            connected(SimulatedTransport::new().failing_send(ConnectionError::PrintError)).await;

        assert_eq!(manager.print(job()).await, Dispatch::Accepted);
        let status = manager.status();
        assert_eq!(status.phase, Phase::Connected);
        assert_eq!(status.last_error, Some(ConnectionError::PrintError));
        assert!(transport.is_linked());
    }

    #[tokio::test]
    async fn test_undecodable_image_is_print_error() {
        let (transport, manager) = connected(SimulatedTransport::new()).await;
        let job = PrintJob::builder().image(vec![0u8; 32]).build().unwrap();

        assert_eq!(manager.print(job).await, Dispatch::Accepted);
        assert_eq!(manager.status().last_error, Some(ConnectionError::PrintError));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_print_timeout() {
        let (_transport, manager) = connected(SimulatedTransport::new().stalling(Stall::Send)).await;

        assert_eq!(manager.print(job()).await, Dispatch::Accepted);
        let status = manager.status();
        assert_eq!(status.phase, Phase::Connected);
        assert_eq!(status.last_error, Some(ConnectionError::PrintError));
    }

    #[tokio::test]
    async fn test_acknowledge_returns_cleared_error() {
        let (_transport, manager) =
            connected(SimulatedTransport::new().failing_send(ConnectionError::PrintError)).await;
        manager.print(job()).await;

        assert_eq!(manager.acknowledge_error().await, Some(ConnectionError::PrintError));
        assert_eq!(manager.status().last_error, None);
        assert_eq!(manager.acknowledge_error().await, None);
    }

    #[tokio::test]
    async fn test_cancelled_connect_restores_discovered() {
        let transport = Arc::new(SimulatedTransport::new().stalling(Stall::Connect));
        let manager = ConnectionManager::new(
            transport.clone(),
            ManagerConfig {
                connect_timeout: Duration::from_secs(60),
                ..quick_config()
            },
        );
        manager.init().await;
        manager.scan_for_printers().await;

        let handle = manager.spawn(Command::Connect);
        while manager.status().phase != Phase::Connecting {
            tokio::task::yield_now().await;
        }
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        assert_eq!(manager.status().phase, Phase::Discovered);
        // The gate was released with the future.
        assert!(manager.inner.link.try_lock().is_ok());
    }
}
