//! # Print Jobs
//!
//! A [`PrintJob`] is an ordered list of segments, each an image or a styled
//! text run. Jobs are validated when built and immutable afterwards; the
//! connection manager takes ownership for the duration of a print.
//!
//! ```
//! use bluepos::job::{PrintJob, TextSegment};
//! use bluepos::protocol::text::FontSize;
//!
//! let job = PrintJob::builder()
//!     .styled_text(TextSegment::new("Send24").center().font(FontSize::Large2).bold())
//!     .new_line(2)
//!     .text("Order 000123")
//!     .new_line(1)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(job.segments().len(), 2);
//! ```

mod image;
pub mod sample;
pub mod spec;
mod text;

pub use image::ImageSegment;
pub use spec::{JobSpec, SegmentSpec, StyleFlag};
pub use text::{TextSegment, TextStyle};

pub use crate::protocol::text::{Alignment, FontSize};

use uuid::Uuid;

use crate::error::{BlueposError, JobError};
use crate::ir::{Op, Program};
use crate::printer::PrinterProfile;

/// Largest accepted image payload (encoded bytes).
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// One piece of printable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Image(ImageSegment),
    Text(TextSegment),
}

impl Segment {
    fn emit(&self, ops: &mut Vec<Op>, profile: &PrinterProfile) -> Result<(), BlueposError> {
        match self {
            Segment::Image(image) => image.emit(ops, profile),
            Segment::Text(text) => {
                text.emit(ops);
                Ok(())
            }
        }
    }
}

impl From<ImageSegment> for Segment {
    fn from(image: ImageSegment) -> Self {
        Segment::Image(image)
    }
}

impl From<TextSegment> for Segment {
    fn from(text: TextSegment) -> Self {
        Segment::Text(text)
    }
}

/// A validated, immutable print job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    id: Uuid,
    segments: Vec<Segment>,
}

impl PrintJob {
    pub fn builder() -> PrintJobBuilder {
        PrintJobBuilder::default()
    }

    /// Validate and wrap `segments`, keeping their order.
    ///
    /// Fails with [`JobError::InvalidImageData`] for an empty or oversized
    /// image and with [`JobError::Empty`] when there is nothing to print.
    pub fn from_segments(segments: Vec<Segment>) -> Result<Self, JobError> {
        if segments.is_empty() {
            return Err(JobError::Empty);
        }
        for (index, segment) in segments.iter().enumerate() {
            if let Segment::Image(image) = segment {
                let len = image.len();
                if len == 0 || len > MAX_IMAGE_BYTES {
                    return Err(JobError::InvalidImageData { index, len });
                }
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            segments,
        })
    }

    /// Identifier used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Lower the job to IR for `profile`.
    ///
    /// Images are decoded here, so an undecodable image fails the job.
    pub fn compile(&self, profile: &PrinterProfile) -> Result<Program, BlueposError> {
        let mut ops = Vec::new();
        for segment in &self.segments {
            segment.emit(&mut ops, profile)?;
        }

        let mut program = Program::with_init();
        program.extend(ops);
        program.push(Op::Feed {
            lines: profile.trailing_feed,
        });
        if profile.has_cutter {
            program.push(Op::Cut);
        }
        Ok(program)
    }

    /// Compile, optimize and generate the ESC/POS byte stream.
    pub fn encode(&self, profile: &PrinterProfile) -> Result<Vec<u8>, BlueposError> {
        Ok(self.compile(profile)?.optimize().to_bytes_with_profile(profile))
    }
}

/// Fluent builder for [`PrintJob`].
#[derive(Debug, Clone, Default)]
pub struct PrintJobBuilder {
    segments: Vec<Segment>,
}

impl PrintJobBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image.
    pub fn image(self, data: impl Into<Vec<u8>>) -> Self {
        self.segment(ImageSegment::new(data))
    }

    /// Append unstyled, left aligned text.
    pub fn text(self, content: impl Into<String>) -> Self {
        self.segment(TextSegment::new(content))
    }

    pub fn styled_text(self, text: TextSegment) -> Self {
        self.segment(text)
    }

    pub fn segment(mut self, segment: impl Into<Segment>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Add `count` line breaks after the last text segment, or a blank text
    /// segment carrying them when the job does not end in text.
    pub fn new_line(mut self, count: u8) -> Self {
        match self.segments.last_mut() {
            Some(Segment::Text(text)) => text.add_line_breaks(count),
            _ => self
                .segments
                .push(Segment::Text(TextSegment::new("").line_breaks(count))),
        }
        self
    }

    pub fn build(self) -> Result<PrintJob, JobError> {
        PrintJob::from_segments(self.segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_image_rejected() {
        let err = PrintJob::builder().image(Vec::new()).build().unwrap_err();
        assert_eq!(err, JobError::InvalidImageData { index: 0, len: 0 });
    }

    #[test]
    fn test_oversized_image_rejected() {
        let err = PrintJob::builder()
            .text("header")
            .image(vec![0u8; MAX_IMAGE_BYTES + 1])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            JobError::InvalidImageData {
                index: 1,
                len: MAX_IMAGE_BYTES + 1
            }
        );
    }

    #[test]
    fn test_empty_job_rejected() {
        assert_eq!(PrintJob::builder().build().unwrap_err(), JobError::Empty);
    }

    #[test]
    fn test_new_line_extends_last_text() {
        let job = PrintJob::builder()
            .text("a")
            .new_line(1)
            .new_line(2)
            .build()
            .unwrap();
        assert_eq!(
            job.segments(),
            &[Segment::Text(TextSegment::new("a").line_breaks(3))]
        );
    }

    #[test]
    fn test_new_line_after_image_adds_blank_text() {
        let job = PrintJob::builder().image(vec![1]).new_line(1).build().unwrap();
        assert_eq!(job.segments().len(), 2);
        assert_eq!(
            job.segments()[1],
            Segment::Text(TextSegment::new("").line_breaks(1))
        );
    }

    #[test]
    fn test_adjacent_text_not_merged() {
        let job = PrintJob::builder().text("a").text("b").build().unwrap();
        assert_eq!(job.segments().len(), 2);
    }

    #[test]
    fn test_jobs_get_distinct_ids() {
        let a = PrintJob::builder().text("a").build().unwrap();
        let b = PrintJob::builder().text("a").build().unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_compile_ends_with_feed_and_cut() {
        let job = PrintJob::builder().text("x").build().unwrap();

        let ops = job.compile(&PrinterProfile::MM58).unwrap().ops;
        assert_eq!(ops.first(), Some(&Op::Init));
        assert_eq!(ops.last(), Some(&Op::Feed { lines: 3 }));

        let ops = job.compile(&PrinterProfile::MM80).unwrap().ops;
        assert_eq!(ops[ops.len() - 2..], [Op::Feed { lines: 4 }, Op::Cut]);
    }

    #[test]
    fn test_style_not_inherited() {
        let job = PrintJob::builder()
            .styled_text(TextSegment::new("B").bold())
            .text("plain")
            .build()
            .unwrap();
        let bytes = job.encode(&PrinterProfile::MM58).unwrap();

        let bold_on = bytes.windows(3).position(|w| w == [0x1B, 0x45, 0x01]);
        let bold_off = bytes.windows(3).position(|w| w == [0x1B, 0x45, 0x00]);
        let plain = bytes.windows(5).position(|w| w == b"plain");
        assert!(bold_on.is_some());
        assert!(bold_on < bold_off);
        assert!(bold_off < plain);
    }

    #[test]
    fn test_undecodable_image_fails_encode() {
        let job = PrintJob::builder().image(vec![0u8; 16]).build().unwrap();
        assert!(matches!(
            job.encode(&PrinterProfile::MM58),
            Err(BlueposError::Image(_))
        ));
    }
}
