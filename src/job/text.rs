//! Styled text segments.

use serde::{Deserialize, Serialize};

use crate::ir::Op;
use crate::protocol::text::{Alignment, FontSize};

/// Style flags of a text segment. Default is no style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl TextStyle {
    pub const NONE: Self = Self {
        bold: false,
        italic: false,
        underline: false,
    };

    pub const BOLD: Self = Self {
        bold: true,
        ..Self::NONE
    };

    pub const ITALIC: Self = Self {
        italic: true,
        ..Self::NONE
    };

    pub const UNDERLINE: Self = Self {
        underline: true,
        ..Self::NONE
    };

    /// Union of two flag sets.
    pub fn with(self, other: Self) -> Self {
        Self {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// A run of text with its own complete style.
///
/// Nothing is inherited from earlier segments: an unstyled segment after a
/// bold one prints plain.
///
/// ```
/// use bluepos::job::TextSegment;
/// use bluepos::protocol::text::{Alignment, FontSize};
///
/// let title = TextSegment::new("Send24")
///     .center()
///     .font(FontSize::Large2)
///     .bold()
///     .line_breaks(1);
/// assert_eq!(title.alignment(), Alignment::Center);
/// assert!(title.text_style().bold);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    content: String,
    alignment: Alignment,
    font: FontSize,
    style: TextStyle,
    line_breaks: u8,
}

impl TextSegment {
    /// Left aligned, normal size, no style, no trailing line break.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            alignment: Alignment::Left,
            font: FontSize::Normal,
            style: TextStyle::NONE,
            line_breaks: 0,
        }
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn left(self) -> Self {
        self.align(Alignment::Left)
    }

    pub fn center(self) -> Self {
        self.align(Alignment::Center)
    }

    pub fn right(self) -> Self {
        self.align(Alignment::Right)
    }

    pub fn font(mut self, font: FontSize) -> Self {
        self.font = font;
        self
    }

    /// Replace the style flags.
    pub fn style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn bold(mut self) -> Self {
        self.style.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.style.italic = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.style.underline = true;
        self
    }

    /// Line breaks printed after the text.
    pub fn line_breaks(mut self, count: u8) -> Self {
        self.line_breaks = count;
        self
    }

    pub(crate) fn add_line_breaks(&mut self, count: u8) {
        self.line_breaks = self.line_breaks.saturating_add(count);
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn font_size(&self) -> FontSize {
        self.font
    }

    pub fn text_style(&self) -> TextStyle {
        self.style
    }

    pub fn line_break_count(&self) -> u8 {
        self.line_breaks
    }

    pub(crate) fn emit(&self, ops: &mut Vec<Op>) {
        ops.push(Op::SetAlign(self.alignment));
        ops.push(Op::SetFont(self.font));
        ops.push(Op::SetBold(self.style.bold));
        ops.push(Op::SetItalic(self.style.italic));
        ops.push(Op::SetUnderline(self.style.underline));
        if !self.content.is_empty() {
            ops.push(Op::Text(self.content.clone()));
        }
        for _ in 0..self.line_breaks {
            ops.push(Op::Newline);
        }
    }
}
