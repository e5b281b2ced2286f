//! # ESC/POS Raster Graphics
//!
//! Images are sent with the raster bit image command `GS v 0`.
//!
//! ## Data Format
//!
//! - 1 bit per pixel, MSB = leftmost pixel
//! - 1 = black (dot printed), 0 = white
//! - Rows are `ceil(width / 8)` bytes, top to bottom
//!
//! ```text
//! Width: 16 dots = 2 bytes per row
//! Row 0: [0xFF, 0x00]  ████████........
//! Row 1: [0x0F, 0xF0]  ....████████....
//! ```

use super::commands::GS;

/// Split a u16 into little-endian bytes.
#[inline]
fn u16_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// # Print Raster Bit Image (GS v 0 m xL xH yL yH d1...dk)
///
/// ## Parameters
///
/// - `width_dots`: image width in dots (rounded up to whole bytes)
/// - `height`: rows in this command
/// - `data`: exactly `ceil(width_dots / 8) * height` bytes
///
/// `m = 0` selects normal density.
///
/// ```
/// use bluepos::protocol::graphics;
///
/// let cmd = graphics::raster(384, 2, &vec![0u8; 48 * 2]);
/// assert_eq!(&cmd[..8], &[0x1D, 0x76, 0x30, 0x00, 48, 0, 2, 0]);
/// ```
///
/// Large images should be split into bands of at most a few hundred rows;
/// see [`Op::Raster`](crate::ir::Op::Raster) codegen.
pub fn raster(width_dots: u16, height: u16, data: &[u8]) -> Vec<u8> {
    let width_bytes = width_dots.div_ceil(8);
    let expected_len = width_bytes as usize * height as usize;

    debug_assert!(
        data.len() == expected_len,
        "Raster data length mismatch. Expected {} ({} bytes × {} rows), got {}",
        expected_len,
        width_bytes,
        height,
        data.len()
    );

    let [xl, xh] = u16_le(width_bytes);
    let [yl, yh] = u16_le(height);

    let mut cmd = Vec::with_capacity(8 + data.len());
    cmd.push(GS);
    cmd.push(b'v');
    cmd.push(b'0');
    cmd.push(0); // m = 0 (normal)
    cmd.push(xl);
    cmd.push(xh);
    cmd.push(yl);
    cmd.push(yh);
    cmd.extend_from_slice(data);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_header() {
        let data = vec![0xAA; 72 * 3];
        let cmd = raster(576, 3, &data);

        assert_eq!(cmd[0], 0x1D); // GS
        assert_eq!(cmd[1], b'v');
        assert_eq!(cmd[2], b'0');
        assert_eq!(cmd[3], 0);
        assert_eq!(cmd[4], 72); // xL
        assert_eq!(cmd[5], 0); // xH
        assert_eq!(cmd[6], 3); // yL
        assert_eq!(cmd[7], 0); // yH
        assert_eq!(cmd.len(), 8 + data.len());
    }

    #[test]
    fn test_raster_width_rounds_up() {
        let cmd = raster(10, 1, &[0xFF, 0xC0]);
        assert_eq!(cmd[4], 2);
    }

    #[test]
    fn test_raster_tall_height_little_endian() {
        let cmd = raster(8, 300, &vec![0; 300]);
        assert_eq!(cmd[6], (300 & 0xFF) as u8);
        assert_eq!(cmd[7], (300 >> 8) as u8);
    }

    #[test]
    fn test_u16_le() {
        assert_eq!(u16_le(0x1234), [0x34, 0x12]);
    }
}
