//! # IR Opcodes
//!
//! The intermediate representation for print jobs: a flat sequence of
//! opcodes that can be inspected, optimized and compiled to ESC/POS bytes.
//!
//! ```text
//! PrintJob → IR (inspectable) → Optimizer → Codegen → Bytes
//! ```
//!
//! Each opcode is a single atomic operation. Style changes are individual
//! ops so the optimizer can drop the ones that change nothing.

use crate::protocol::text::{Alignment, FontSize};

/// Style state tracked for optimization.
///
/// Matches what `ESC @` resets the printer to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleState {
    pub alignment: Alignment,
    pub font: FontSize,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

/// IR opcodes - the "bytecode" for receipt printing.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // ========== Printer Control ==========
    /// Initialize printer (ESC @) and select code page 437.
    Init,

    /// Print and feed `lines` lines.
    Feed { lines: u8 },

    /// Feed past the cutter and partial cut.
    Cut,

    // ========== Style Changes ==========
    SetAlign(Alignment),
    SetFont(FontSize),
    SetBold(bool),
    SetItalic(bool),
    SetUnderline(bool),

    // ========== Content ==========
    /// Raw text (no trailing newline).
    Text(String),

    /// Line feed.
    Newline,

    // ========== Graphics ==========
    /// 1-bit raster image, `ceil(width/8) * height` bytes.
    Raster {
        width: u16,
        height: u16,
        data: Vec<u8>,
    },
}

/// A compiled IR program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Create a program with an initial Init op.
    pub fn with_init() -> Self {
        Self {
            ops: vec![Op::Init],
        }
    }

    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    pub fn extend(&mut self, ops: impl IntoIterator<Item = Op>) {
        self.ops.extend(ops);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
