//! # ESC/POS Printer Control Commands
//!
//! Basic commands understood by practically every Bluetooth receipt printer
//! (Epson TM series and the many ESC/POS compatible 58/80 mm units).
//!
//! ## Escape Sequence Structure
//!
//! - Single byte: `LF`
//! - Two bytes: `ESC @`
//! - With parameters: `ESC d n`, `GS V m n`
//!
//! Multi-byte integers are **little-endian**.

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix (size, graphics, cutter)
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - Print the line buffer and advance one line
pub const LF: u8 = 0x0A;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Clears the print buffer and resets text formatting, alignment and
/// character size to power-on defaults. Sent at the start of every job.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
///
/// ```
/// use bluepos::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

/// # Select Character Code Table (ESC t n)
///
/// `n = 0` is PC437 (USA, Standard Europe), the power-on default of most
/// units. Text is encoded with [`cp437`](super::cp437) to match.
#[inline]
pub fn codepage(n: u8) -> Vec<u8> {
    vec![ESC, b't', n]
}

// ============================================================================
// PAPER FEED
// ============================================================================

/// # Print and Feed n Lines (ESC d n)
///
/// Prints the line buffer and feeds `n` lines. Used at the end of a job to
/// move the last line past the tear bar.
///
/// ```
/// use bluepos::protocol::commands;
///
/// assert_eq!(commands::feed_lines(3), vec![0x1B, 0x64, 0x03]);
/// ```
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

// ============================================================================
// CUTTER
// ============================================================================

/// # Feed and Partial Cut (GS V 66 n)
///
/// Feeds `n` motion units past the cutter, then cuts leaving a small hinge.
/// Printers without a cutter ignore it, but [`PrinterProfile`] only emits it
/// when `has_cutter` is set.
///
/// [`PrinterProfile`]: crate::printer::PrinterProfile
#[inline]
pub fn cut_partial_feed(n: u8) -> Vec<u8> {
    vec![GS, b'V', 66, n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert_eq!(init(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_codepage() {
        assert_eq!(codepage(0), vec![0x1B, 0x74, 0x00]);
    }

    #[test]
    fn test_feed_lines() {
        assert_eq!(feed_lines(0), vec![0x1B, 0x64, 0x00]);
        assert_eq!(feed_lines(4), vec![0x1B, 0x64, 0x04]);
    }

    #[test]
    fn test_cut_partial_feed() {
        assert_eq!(cut_partial_feed(0), vec![0x1D, 0x56, 0x42, 0x00]);
    }
}
