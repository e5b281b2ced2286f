//! JSON job description files.
//!
//! ```json
//! {
//!   "segments": [
//!     { "type": "image", "path": "logo.png" },
//!     { "type": "text", "text": "Send24", "alignment": "center",
//!       "font": "large_2", "style": ["bold"], "line_breaks": 2 },
//!     { "type": "text", "text": "Order 000123" }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{ImageSegment, PrintJob, Segment, TextSegment, TextStyle};
use crate::error::BlueposError;
use crate::protocol::text::{Alignment, FontSize};

/// Top-level job file.
#[derive(Debug, Deserialize)]
pub struct JobSpec {
    pub segments: Vec<SegmentSpec>,
}

/// A single segment in the job file.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentSpec {
    Image {
        /// Relative paths resolve against the job file's directory.
        path: PathBuf,
        #[serde(default = "default_image_alignment")]
        alignment: Alignment,
    },
    Text {
        text: String,
        #[serde(default)]
        alignment: Alignment,
        #[serde(default)]
        font: FontSize,
        #[serde(default)]
        style: Vec<StyleFlag>,
        #[serde(default)]
        line_breaks: u8,
    },
}

fn default_image_alignment() -> Alignment {
    Alignment::Center
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleFlag {
    Bold,
    Italic,
    Underline,
}

impl From<StyleFlag> for TextStyle {
    fn from(flag: StyleFlag) -> Self {
        match flag {
            StyleFlag::Bold => TextStyle::BOLD,
            StyleFlag::Italic => TextStyle::ITALIC,
            StyleFlag::Underline => TextStyle::UNDERLINE,
        }
    }
}

impl JobSpec {
    pub fn from_json(json: &str) -> Result<Self, BlueposError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read image files and build the job.
    pub fn into_job(self, base_dir: &Path) -> Result<PrintJob, BlueposError> {
        let mut segments = Vec::with_capacity(self.segments.len());
        for spec in self.segments {
            segments.push(match spec {
                SegmentSpec::Image { path, alignment } => {
                    let path = base_dir.join(path);
                    let data = std::fs::read(&path).map_err(|e| {
                        BlueposError::Config(format!("cannot read {}: {}", path.display(), e))
                    })?;
                    Segment::Image(ImageSegment::new(data).align(alignment))
                }
                SegmentSpec::Text {
                    text,
                    alignment,
                    font,
                    style,
                    line_breaks,
                } => {
                    let style = style
                        .into_iter()
                        .fold(TextStyle::NONE, |acc, flag| acc.with(flag.into()));
                    Segment::Text(
                        TextSegment::new(text)
                            .align(alignment)
                            .font(font)
                            .style(style)
                            .line_breaks(line_breaks),
                    )
                }
            });
        }
        Ok(PrintJob::from_segments(segments)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_defaults() {
        let spec = JobSpec::from_json(r#"{"segments": [{"type": "text", "text": "hi"}]}"#).unwrap();
        let job = spec.into_job(Path::new(".")).unwrap();
        assert_eq!(job.segments(), &[Segment::Text(TextSegment::new("hi"))]);
    }

    #[test]
    fn test_styled_text() {
        let json = r#"{"segments": [{
            "type": "text", "text": "Send24", "alignment": "center",
            "font": "large_2", "style": ["bold", "underline"], "line_breaks": 2
        }]}"#;
        let job = JobSpec::from_json(json)
            .unwrap()
            .into_job(Path::new("."))
            .unwrap();
        assert_eq!(
            job.segments(),
            &[Segment::Text(
                TextSegment::new("Send24")
                    .center()
                    .font(FontSize::Large2)
                    .bold()
                    .underline()
                    .line_breaks(2)
            )]
        );
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = JobSpec::from_json(r#"{"segments": [{"type": "qr", "data": "x"}]}"#).unwrap_err();
        assert!(matches!(err, BlueposError::JobSpec(_)));
    }

    #[test]
    fn test_missing_image_file() {
        let spec = JobSpec::from_json(
            r#"{"segments": [{"type": "image", "path": "does-not-exist.png"}]}"#,
        )
        .unwrap();
        let err = spec.into_job(Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, BlueposError::Config(_)));
    }

    #[test]
    fn test_empty_segments() {
        let spec = JobSpec::from_json(r#"{"segments": []}"#).unwrap();
        let err = spec.into_job(Path::new(".")).unwrap_err();
        assert!(matches!(err, BlueposError::Job(JobError::Empty)));
    }
}
