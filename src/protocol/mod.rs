//! # ESC/POS Protocol
//!
//! Low-level command builders for ESC/POS Bluetooth receipt printers. The
//! connection manager never looks at these bytes; they are produced by the
//! [`ir`](crate::ir) codegen and handed to the transport as one payload.
//!
//! ## Module Structure
//!
//! - [`commands`]: init, code table, feed, cut
//! - [`text`]: alignment, size, bold, italic, underline
//! - [`graphics`]: raster bit images
//! - [`cp437`]: text encoding
//!
//! ## Usage Example
//!
//! ```
//! use bluepos::protocol::{commands, text};
//!
//! let mut data = Vec::new();
//! data.extend(commands::init());
//! data.extend(text::align(text::Alignment::Center));
//! data.extend(text::bold(true));
//! data.extend(b"RECEIPT\n");
//! data.extend(text::bold(false));
//! data.extend(commands::feed_lines(3));
//! ```

pub mod commands;
pub mod cp437;
pub mod graphics;
pub mod text;
