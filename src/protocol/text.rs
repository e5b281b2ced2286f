//! # ESC/POS Text Styling Commands
//!
//! | Style | Command | Effect |
//! |-------|---------|--------|
//! | Alignment | ESC a n | Left / center / right |
//! | Size | GS ! n | Width and height multipliers |
//! | Bold | ESC E n | **Emphasized** text |
//! | Italic | ESC 4 n | Slanted text (where the font has it) |
//! | Underline | ESC - n | Underlined text |
//!
//! ## Text Alignment
//!
//! ```text
//! Left aligned (default)    |LEFT TEXT
//! Center aligned            |  CENTER TEXT
//! Right aligned             |      RIGHT TEXT
//! ```
//!
//! Alignment is latched at the start of a line.

use serde::{Deserialize, Serialize};

use super::commands::{ESC, GS};

// ============================================================================
// TEXT ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// # Select Justification (ESC a n)
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC a n |
/// | Hex     | 1B 61 n |
///
/// ```
/// use bluepos::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// CHARACTER SIZE
// ============================================================================

/// Font size classes.
///
/// | Class | Multiplier | Columns (58 mm) |
/// |-------|------------|-----------------|
/// | Normal | 1×1 | 32 |
/// | Large | 2×2 | 16 |
/// | Large2 | 3×3 | 10 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSize {
    #[default]
    Normal,
    Large,
    #[serde(alias = "large_2")]
    Large2,
}

impl FontSize {
    /// Width/height multiplier minus one (the `GS !` nibble value).
    pub fn magnification(self) -> u8 {
        match self {
            FontSize::Normal => 0,
            FontSize::Large => 1,
            FontSize::Large2 => 2,
        }
    }
}

/// # Select Character Size (GS ! n)
///
/// High nibble is the width multiplier, low nibble the height multiplier,
/// both zero-based (0 = 1×, 7 = 8×).
///
/// ```
/// use bluepos::protocol::text::{size, FontSize};
///
/// assert_eq!(size(FontSize::Normal), vec![0x1D, 0x21, 0x00]);
/// assert_eq!(size(FontSize::Large2), vec![0x1D, 0x21, 0x22]);
/// ```
pub fn size(font: FontSize) -> Vec<u8> {
    let m = font.magnification() & 0x07;
    vec![GS, b'!', (m << 4) | m]
}

// ============================================================================
// EMPHASIS
// ============================================================================

/// # Turn Emphasized Mode On/Off (ESC E n)
#[inline]
pub fn bold(on: bool) -> Vec<u8> {
    vec![ESC, b'E', on as u8]
}

/// # Turn Italic On/Off (ESC 4 n)
///
/// Not part of the Epson command set; implemented by most Chinese ESC/POS
/// firmwares. Printers without an italic face ignore it.
#[inline]
pub fn italic(on: bool) -> Vec<u8> {
    vec![ESC, b'4', on as u8]
}

/// # Turn Underline On/Off (ESC - n)
///
/// `n = 1` is a 1-dot underline; `n = 0` turns it off.
#[inline]
pub fn underline(on: bool) -> Vec<u8> {
    vec![ESC, b'-', on as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align() {
        assert_eq!(align(Alignment::Left), vec![0x1B, 0x61, 0x00]);
        assert_eq!(align(Alignment::Right), vec![0x1B, 0x61, 0x02]);
    }

    #[test]
    fn test_size_nibbles() {
        assert_eq!(size(FontSize::Large), vec![0x1D, 0x21, 0x11]);
    }

    #[test]
    fn test_toggles() {
        assert_eq!(bold(true), vec![0x1B, 0x45, 0x01]);
        assert_eq!(bold(false), vec![0x1B, 0x45, 0x00]);
        assert_eq!(italic(true), vec![0x1B, 0x34, 0x01]);
        assert_eq!(underline(true), vec![0x1B, 0x2D, 0x01]);
        assert_eq!(underline(false), vec![0x1B, 0x2D, 0x00]);
    }

    #[test]
    fn test_serde_names() {
        let f: FontSize = serde_json::from_str("\"large_2\"").unwrap();
        assert_eq!(f, FontSize::Large2);
        let f: FontSize = serde_json::from_str("\"large2\"").unwrap();
        assert_eq!(f, FontSize::Large2);
        let a: Alignment = serde_json::from_str("\"center\"").unwrap();
        assert_eq!(a, Alignment::Center);
    }
}
