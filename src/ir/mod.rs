//! # Intermediate Representation (IR)
//!
//! The IR is a "bytecode" representation that sits between a
//! [`PrintJob`](crate::job::PrintJob) and raw ESC/POS bytes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌───────────┐     ┌──────────┐
//! │  PrintJob   │ ──► │     IR      │ ──► │ Optimizer │ ──► │ Codegen  │
//! │ (segments)  │     │  (Vec<Op>)  │     │           │     │ (bytes)  │
//! └─────────────┘     └─────────────┘     └───────────┘     └──────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use bluepos::ir::{Op, Program};
//! use bluepos::protocol::text::Alignment;
//!
//! let mut program = Program::with_init();
//! program.push(Op::SetAlign(Alignment::Center));
//! program.push(Op::SetBold(true));
//! program.push(Op::Text("HELLO".into()));
//! program.push(Op::Newline);
//!
//! let bytes = program.optimize().to_bytes();
//! assert!(bytes.ends_with(b"HELLO\n"));
//! ```

mod codegen;
mod ops;
mod optimize;

pub use ops::*;
