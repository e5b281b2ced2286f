//! Image segments.
//!
//! Images are centered by default, unlike text which starts left aligned.

use crate::error::BlueposError;
use crate::ir::Op;
use crate::printer::PrinterProfile;
use crate::protocol::text::Alignment;
use crate::render::rasterize;

/// Encoded image bytes (PNG, JPEG, BMP, ...).
///
/// The bytes stay opaque until the job is encoded for a specific printer;
/// building a job only checks the length.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageSegment {
    data: Vec<u8>,
    alignment: Alignment,
}

impl ImageSegment {
    /// Centered image.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            alignment: Alignment::Center,
        }
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub(crate) fn emit(&self, ops: &mut Vec<Op>, profile: &PrinterProfile) -> Result<(), BlueposError> {
        let raster = rasterize(&self.data, profile.width_dots)?;
        ops.push(Op::SetAlign(self.alignment));
        ops.push(Op::Raster {
            width: raster.width,
            height: raster.height,
            data: raster.data,
        });
        Ok(())
    }
}

// Image payloads can be megabytes; print the size instead.
impl std::fmt::Debug for ImageSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSegment")
            .field("len", &self.data.len())
            .field("alignment", &self.alignment)
            .finish()
    }
}
