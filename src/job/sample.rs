//! Built-in sample job, printed by `bluepos print` without a job file.

use super::{PrintJob, TextSegment};
use crate::error::JobError;
use crate::protocol::text::FontSize;

/// Width of the rule line in normal-size columns on 58 mm paper.
const RULE_COLUMNS: usize = 32;

/// A small shipping label: optional logo, title, rule, recipient details.
pub fn shipping_label(logo: Option<Vec<u8>>) -> Result<PrintJob, JobError> {
    let mut builder = PrintJob::builder();
    if let Some(logo) = logo {
        builder = builder.image(logo);
    }
    builder
        .styled_text(
            TextSegment::new("Send24")
                .center()
                .font(FontSize::Large2)
                .bold(),
        )
        .new_line(1)
        .styled_text(TextSegment::new("=".repeat(RULE_COLUMNS)).center().bold())
        .new_line(1)
        .text("Name: Jane Doe")
        .new_line(2)
        .text("Phone: 0700 000 0000")
        .new_line(2)
        .styled_text(TextSegment::new("Variant: ").bold())
        .text("HUB_TO_HUB")
        .new_line(1)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Segment;
    use crate::printer::PrinterProfile;

    #[test]
    fn test_shipping_label_without_logo() {
        let job = shipping_label(None).unwrap();
        assert!(matches!(job.segments()[0], Segment::Text(_)));

        let bytes = job.encode(&PrinterProfile::MM58).unwrap();
        assert!(bytes.windows(6).any(|w| w == b"Send24"));
        assert!(bytes.windows(10).any(|w| w == b"HUB_TO_HUB"));
    }

    #[test]
    fn test_shipping_label_rejects_empty_logo() {
        assert_eq!(
            shipping_label(Some(Vec::new())).unwrap_err(),
            JobError::InvalidImageData { index: 0, len: 0 }
        );
    }
}
