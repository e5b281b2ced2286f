//! # Bluepos - Bluetooth Receipt Printer Client
//!
//! Bluepos drives a single Bluetooth ESC/POS receipt printer. It provides:
//!
//! - **Connection management**: scan, connect, disconnect and print as one
//!   serialized state machine with an observable status stream
//! - **Print jobs**: images and styled text assembled into validated jobs
//! - **Encoding**: ESC/POS byte streams via an inspectable IR
//! - **Transport**: BlueZ + RFCOMM on Linux, plus a simulated printer
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use bluepos::{
//!     job::{PrintJob, TextSegment},
//!     manager::{ConnectionManager, ManagerConfig},
//!     protocol::text::FontSize,
//!     transport::{RfcommConfig, RfcommTransport},
//! };
//!
//! # async fn run() -> Result<(), bluepos::BlueposError> {
//! let transport = Arc::new(RfcommTransport::new(RfcommConfig::default()));
//! let manager = ConnectionManager::new(transport, ManagerConfig::default());
//!
//! manager.init().await;
//! manager.scan_for_printers().await;
//! manager.connect().await;
//!
//! let job = PrintJob::builder()
//!     .styled_text(TextSegment::new("Send24").center().font(FontSize::Large2).bold())
//!     .new_line(2)
//!     .build()?;
//! manager.print(job).await;
//!
//! if let Some(err) = manager.status().last_error {
//!     eprintln!("{}", err);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`manager`] | Connection state machine and status stream |
//! | [`status`] | Status snapshot and phases |
//! | [`job`] | Print job builder |
//! | [`ir`] | Intermediate representation, optimizer, codegen |
//! | [`protocol`] | ESC/POS command builders |
//! | [`render`] | Image rasterization and dithering |
//! | [`transport`] | Communication backends |
//! | [`printer`] | Printer profiles |
//! | [`error`] | Error types |
//!
//! ## Supported Printers
//!
//! Generic 58 mm and 80 mm ESC/POS printers with a Bluetooth serial port
//! profile (PT-210, MTP-II and similar).

pub mod error;
pub mod ir;
pub mod job;
pub mod manager;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod status;
pub mod transport;

// Re-exports for convenience
pub use error::{BlueposError, ConnectionError, JobError};
pub use job::PrintJob;
pub use manager::{ConnectionManager, Dispatch, ManagerConfig};
pub use printer::PrinterProfile;
pub use status::{ConnectionStatus, Phase};
