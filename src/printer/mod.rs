//! # Printer Module
//!
//! - [`config`]: printer hardware profiles

pub mod config;

pub use config::PrinterProfile;
