//! The rich-text editing surface.
//!
//! Rendering and native formatting belong to the host (a browser's
//! content-editable element, a native text view, ...). The editor only needs
//! to read and write the surface's markup, append to it, and ask it to run a
//! formatting command. [`MarkupSurface`] is a string-backed implementation
//! for hosts without one of their own.

use std::ops::Range;

/// A formatting command the surface executes natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCommand {
    /// Toggle bold.
    Bold,
    /// Toggle italic.
    Italic,
    /// Toggle underline.
    Underline,
    /// Turn the block into a heading of the given level (1-6).
    Heading(u8),
    /// Turn the block into a bulleted list.
    BulletList,
    /// Turn the block into a numbered list.
    NumberedList,
}

impl FormatCommand {
    /// Parse a command name such as `bold`, `h2`, or `numbered-list`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bold" | "b" => Some(Self::Bold),
            "italic" | "i" => Some(Self::Italic),
            "underline" | "u" => Some(Self::Underline),
            "bullet-list" | "bullets" | "ul" => Some(Self::BulletList),
            "numbered-list" | "numbers" | "ol" => Some(Self::NumberedList),
            other => other
                .strip_prefix('h')
                .and_then(|level| level.parse::<u8>().ok())
                .filter(|level| (1..=6).contains(level))
                .map(Self::Heading),
        }
    }

    /// Opening and closing markup for the command.
    fn tags(self) -> (String, String) {
        match self {
            Self::Bold => ("<b>".into(), "</b>".into()),
            Self::Italic => ("<i>".into(), "</i>".into()),
            Self::Underline => ("<u>".into(), "</u>".into()),
            Self::Heading(level) => (format!("<h{level}>"), format!("</h{level}>")),
            Self::BulletList => ("<ul><li>".into(), "</li></ul>".into()),
            Self::NumberedList => ("<ol><li>".into(), "</li></ol>".into()),
        }
    }
}

impl std::fmt::Display for FormatCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bold => write!(f, "bold"),
            Self::Italic => write!(f, "italic"),
            Self::Underline => write!(f, "underline"),
            Self::Heading(level) => write!(f, "h{level}"),
            Self::BulletList => write!(f, "bullet-list"),
            Self::NumberedList => write!(f, "numbered-list"),
        }
    }
}

/// The host's content-editable surface.
pub trait EditableSurface: Send + std::fmt::Debug {
    /// The full markup currently shown.
    fn markup(&self) -> String;

    /// Replace the shown markup.
    fn set_markup(&mut self, markup: &str);

    /// Append markup at the end of the content.
    fn append_markup(&mut self, markup: &str);

    /// Select the entire content.
    fn select_all(&mut self);

    /// Run a native formatting command against the current selection.
    fn exec_command(&mut self, command: FormatCommand);
}

/// A surface backed by a markup string and a byte-range selection.
///
/// Formatting wraps the selected markup in the command's tags. With no
/// selection a command has nothing to act on and leaves the markup alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupSurface {
    markup: String,
    selection: Option<Range<usize>>,
}

impl MarkupSurface {
    /// Create a surface showing `markup`.
    #[must_use]
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            selection: None,
        }
    }

    /// Select a byte range of the markup. Ranges that are empty, out of
    /// bounds, or not on character boundaries clear the selection.
    pub fn select(&mut self, range: Range<usize>) {
        let valid = range.start < range.end
            && range.end <= self.markup.len()
            && self.markup.is_char_boundary(range.start)
            && self.markup.is_char_boundary(range.end);
        self.selection = valid.then_some(range);
    }

    /// The current selection.
    #[must_use]
    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }
}

impl EditableSurface for MarkupSurface {
    fn markup(&self) -> String {
        self.markup.clone()
    }

    fn set_markup(&mut self, markup: &str) {
        markup.clone_into(&mut self.markup);
        self.selection = None;
    }

    fn append_markup(&mut self, markup: &str) {
        self.markup.push_str(markup);
    }

    fn select_all(&mut self) {
        self.select(0..self.markup.len());
    }

    fn exec_command(&mut self, command: FormatCommand) {
        let Some(range) = self.selection.take() else {
            return;
        };
        let (open, close) = command.tags();
        self.markup.insert_str(range.end, &close);
        self.markup.insert_str(range.start, &open);
        // Keep the formatted text selected so commands can be stacked.
        self.selection = Some(range.start..range.end + open.len() + close.len());
    }
}
