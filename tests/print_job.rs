//! # Print Job Tests
//!
//! Builder validation and the bytes produced for a job.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use pretty_assertions::assert_eq;

use bluepos::job::{Alignment, FontSize, ImageSegment, JobSpec, Segment, TextSegment, TextStyle};
use bluepos::{JobError, PrintJob, PrinterProfile};

fn logo_png() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(GrayImage::from_fn(64, 16, |x, _| {
        Luma([if x < 32 { 0 } else { 255 }])
    }))
    .write_to(&mut out, ImageFormat::Png)
    .unwrap();
    out.into_inner()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn test_empty_image_is_invalid() {
    let result = PrintJob::from_segments(vec![Segment::Image(ImageSegment::new(b"".to_vec()))]);
    assert_eq!(result.unwrap_err(), JobError::InvalidImageData { index: 0, len: 0 });
}

#[test]
fn test_image_and_styled_text_keep_order_and_attributes() {
    let logo = logo_png();
    let title = TextSegment::new("Hello")
        .align(Alignment::Center)
        .font(FontSize::Large2)
        .style(TextStyle::BOLD);

    let job = PrintJob::from_segments(vec![
        Segment::Image(ImageSegment::new(logo.clone())),
        Segment::Text(title),
    ])
    .unwrap();

    let segments = job.segments();
    assert_eq!(segments.len(), 2);
    let Segment::Image(image) = &segments[0] else {
        panic!("expected image first, got {:?}", segments[0]);
    };
    assert_eq!(image.bytes(), &logo[..]);
    let Segment::Text(text) = &segments[1] else {
        panic!("expected text second, got {:?}", segments[1]);
    };
    assert_eq!(text.content(), "Hello");
    assert_eq!(text.alignment(), Alignment::Center);
    assert_eq!(text.font_size(), FontSize::Large2);
    assert_eq!(text.text_style(), TextStyle::BOLD);
    assert_eq!(text.line_break_count(), 0);
}

#[test]
fn test_encoded_job_layout() {
    let job = PrintJob::builder()
        .image(logo_png())
        .styled_text(
            TextSegment::new("Hello")
                .center()
                .font(FontSize::Large2)
                .bold(),
        )
        .new_line(1)
        .build()
        .unwrap();
    let bytes = job.encode(&PrinterProfile::MM58).unwrap();

    // ESC @, then code page 437
    assert!(bytes.starts_with(&[0x1B, 0x40, 0x1B, 0x74, 0x00]));

    // 64×16 raster: GS v 0, 8 bytes wide, 16 rows
    let raster = [0x1D, 0x76, 0x30, 0x00, 0x08, 0x00, 0x10, 0x00];
    let raster_at = bytes.windows(raster.len()).position(|w| w == raster).unwrap();
    let data = &bytes[raster_at + raster.len()..raster_at + raster.len() + 8];
    assert_eq!(data, &[0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00]);

    // Centered (image and text share it), 3×3, bold, then the text
    assert!(contains(&bytes, &[0x1B, 0x61, 0x01]));
    let size_at = bytes.windows(3).position(|w| w == [0x1D, 0x21, 0x22]).unwrap();
    let bold_at = bytes.windows(3).position(|w| w == [0x1B, 0x45, 0x01]).unwrap();
    let text_at = bytes.windows(6).position(|w| w == b"Hello\n").unwrap();
    assert!(raster_at < size_at);
    assert!(size_at < text_at);
    assert!(bold_at < text_at);

    // Trailing feed, no cutter on 58 mm
    assert!(bytes.ends_with(&[0x1B, 0x64, 0x03]));
}

#[test]
fn test_80mm_profile_cuts() {
    let job = PrintJob::builder().text("x").build().unwrap();
    let bytes = job.encode(&PrinterProfile::MM80).unwrap();
    assert!(bytes.ends_with(&[0x1B, 0x64, 0x04, 0x1D, 0x56, 0x42, 0x00]));
}

#[test]
fn test_wide_image_scaled_to_paper() {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(GrayImage::from_pixel(1000, 10, Luma([0])))
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    let job = PrintJob::builder().image(out.into_inner()).build().unwrap();
    let bytes = job.encode(&PrinterProfile::MM58).unwrap();

    // 384 dots = 48 bytes = 0x30
    assert!(contains(&bytes, &[0x1D, 0x76, 0x30, 0x00, 0x30, 0x00]));
}

#[test]
fn test_job_spec_builds_same_job() {
    let json = r#"{
        "segments": [
            {"type": "text", "text": "Send24", "alignment": "center",
             "font": "large_2", "style": ["bold"], "line_breaks": 1},
            {"type": "text", "text": "Name: Jane Doe", "line_breaks": 2}
        ]
    }"#;
    let from_spec = JobSpec::from_json(json)
        .unwrap()
        .into_job(std::path::Path::new("."))
        .unwrap();
    let built = PrintJob::builder()
        .styled_text(
            TextSegment::new("Send24")
                .center()
                .font(FontSize::Large2)
                .bold(),
        )
        .new_line(1)
        .text("Name: Jane Doe")
        .new_line(2)
        .build()
        .unwrap();

    assert_eq!(from_spec.segments(), built.segments());
}
