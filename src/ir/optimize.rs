//! # IR Optimizer
//!
//! Every text segment states its full style, so a straight lowering is
//! full of style ops that change nothing. The passes:
//!
//! 1. **Remove redundant init**: only keep the first Init op
//! 2. **Remove redundant styles**: don't emit SetBold(true) if already bold
//! 3. **Merge adjacent text**: combine consecutive Text ops
//!
//! None of the passes reorders content.

use super::ops::{Op, Program, StyleState};

impl Program {
    /// Apply all optimization passes.
    pub fn optimize(self) -> Self {
        let ops = self.ops;
        let ops = remove_redundant_init(ops);
        let ops = remove_redundant_styles(ops);
        let ops = merge_adjacent_text(ops);
        Program { ops }
    }
}

/// Remove duplicate Init ops, keeping only the first one.
fn remove_redundant_init(ops: Vec<Op>) -> Vec<Op> {
    let mut seen_init = false;
    ops.into_iter()
        .filter(|op| {
            if matches!(op, Op::Init) {
                if seen_init {
                    return false;
                }
                seen_init = true;
            }
            true
        })
        .collect()
}

/// Remove style changes that don't change the current state.
fn remove_redundant_styles(ops: Vec<Op>) -> Vec<Op> {
    let mut result = Vec::with_capacity(ops.len());
    let mut state = StyleState::default();

    for op in ops {
        let changed = match &op {
            Op::Init => {
                state = StyleState::default();
                true
            }
            Op::SetAlign(a) => replace(&mut state.alignment, *a),
            Op::SetFont(f) => replace(&mut state.font, *f),
            Op::SetBold(b) => replace(&mut state.bold, *b),
            Op::SetItalic(i) => replace(&mut state.italic, *i),
            Op::SetUnderline(u) => replace(&mut state.underline, *u),
            _ => true,
        };
        if changed {
            result.push(op);
        }
    }

    result
}

/// Store `value` and report whether it differed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

/// Merge consecutive Text ops into a single op.
fn merge_adjacent_text(ops: Vec<Op>) -> Vec<Op> {
    let mut result: Vec<Op> = Vec::with_capacity(ops.len());

    for op in ops {
        if let (Some(Op::Text(pending)), Op::Text(s)) = (result.last_mut(), &op) {
            pending.push_str(s);
            continue;
        }
        result.push(op);
    }

    result
}
