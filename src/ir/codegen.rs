//! # Code Generation
//!
//! Converts IR programs to ESC/POS bytes.

use super::ops::{Op, Program};
use crate::printer::PrinterProfile;
use crate::protocol::{commands, cp437, graphics, text};

impl Program {
    /// Compile the IR program to ESC/POS bytes for the default 58 mm profile.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_bytes_with_profile(&PrinterProfile::MM58)
    }

    /// Compile the IR program to ESC/POS bytes.
    pub fn to_bytes_with_profile(&self, profile: &PrinterProfile) -> Vec<u8> {
        let mut out = Vec::new();

        for op in &self.ops {
            match op {
                // ===== Printer Control =====
                Op::Init => {
                    out.extend(commands::init());
                    out.extend(commands::codepage(0));
                }
                Op::Feed { lines } => {
                    out.extend(commands::feed_lines(*lines));
                }
                Op::Cut => {
                    out.extend(commands::cut_partial_feed(0));
                }

                // ===== Style Changes =====
                Op::SetAlign(align) => out.extend(text::align(*align)),
                Op::SetFont(font) => out.extend(text::size(*font)),
                Op::SetBold(on) => out.extend(text::bold(*on)),
                Op::SetItalic(on) => out.extend(text::italic(*on)),
                Op::SetUnderline(on) => out.extend(text::underline(*on)),

                // ===== Content =====
                Op::Text(s) => out.extend(cp437::encode(s)),
                Op::Newline => out.push(commands::LF),

                // ===== Graphics =====
                Op::Raster {
                    width,
                    height,
                    data,
                } => {
                    // Bluetooth printers have small receive buffers; send
                    // tall images as a series of bands.
                    let width_bytes = width.div_ceil(8) as usize;
                    let chunk_rows = profile.max_chunk_rows.max(1) as usize;
                    let total_height = *height as usize;

                    let mut row_offset = 0;
                    while row_offset < total_height {
                        let chunk_height = (total_height - row_offset).min(chunk_rows);
                        let byte_start = row_offset * width_bytes;
                        let byte_end = (row_offset + chunk_height) * width_bytes;
                        let chunk_data = &data[byte_start..byte_end];

                        out.extend(graphics::raster(*width, chunk_height as u16, chunk_data));
                        row_offset += chunk_height;
                    }
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::text::{Alignment, FontSize};

    #[test]
    fn test_empty_program() {
        assert!(Program::new().to_bytes().is_empty());
    }

    #[test]
    fn test_init_selects_codepage() {
        let bytes = Program::with_init().to_bytes();
        assert_eq!(bytes, vec![0x1B, 0x40, 0x1B, 0x74, 0x00]);
    }

    #[test]
    fn test_simple_text() {
        let mut program = Program::with_init();
        program.push(Op::Text("Hello".into()));
        program.push(Op::Newline);

        let bytes = program.to_bytes();
        assert!(bytes.starts_with(&[0x1B, 0x40]));
        assert!(bytes.ends_with(b"Hello\n"));
    }

    #[test]
    fn test_styled_text() {
        let mut program = Program::with_init();
        program.push(Op::SetAlign(Alignment::Center));
        program.push(Op::SetFont(FontSize::Large2));
        program.push(Op::SetBold(true));
        program.push(Op::Text("Send24".into()));
        program.push(Op::Newline);

        let bytes = program.to_bytes();
        assert!(bytes.windows(3).any(|w| w == [0x1B, 0x61, 0x01]));
        assert!(bytes.windows(3).any(|w| w == [0x1D, 0x21, 0x22]));
        assert!(bytes.windows(3).any(|w| w == [0x1B, 0x45, 0x01]));
    }

    #[test]
    fn test_feed_and_cut() {
        let program = Program {
            ops: vec![Op::Feed { lines: 3 }, Op::Cut],
        };
        assert_eq!(
            program.to_bytes(),
            vec![0x1B, 0x64, 0x03, 0x1D, 0x56, 0x42, 0x00]
        );
    }

    #[test]
    fn test_tall_raster_is_banded() {
        let mut profile = PrinterProfile::MM58;
        profile.max_chunk_rows = 4;
        let program = Program {
            ops: vec![Op::Raster {
                width: 8,
                height: 10,
                data: vec![0xFF; 10],
            }],
        };

        let bytes = program.to_bytes_with_profile(&profile);
        // Three bands: 4 + 4 + 2 rows, each with an 8-byte header
        assert_eq!(bytes.len(), 3 * 8 + 10);
        let headers: Vec<usize> = bytes
            .windows(3)
            .enumerate()
            .filter(|(_, w)| *w == [0x1D, 0x76, 0x30])
            .map(|(i, _)| i)
            .collect();
        assert_eq!(headers, vec![0, 12, 24]);
        assert_eq!(bytes[24 + 6], 2); // last band height
    }
}
