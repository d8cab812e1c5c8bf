//! Text selection model
//!
//! A selection is an ephemeral, read-only span over one or more pages,
//! produced by the host's text layout on every interaction and never
//! persisted. Each page carries an optional page-level rectangle, the
//! line-level decomposition, and the attributed runs used for font
//! inference.

use crate::annotation::FontSpec;
use crate::geometry::PageRect;

/// A contiguous run of selected text sharing one font attribute
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font: FontSpec,
}

impl TextRun {
    pub fn new(text: impl Into<String>, font: FontSpec) -> Self {
        Self {
            text: text.into(),
            font,
        }
    }
}

/// One line-level sub-selection: its text and bounding rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct LineSelection {
    pub text: String,
    pub bounds: PageRect,
}

impl LineSelection {
    pub fn new(text: impl Into<String>, bounds: PageRect) -> Self {
        Self {
            text: text.into(),
            bounds,
        }
    }
}

/// Per-page slice of a selection
#[derive(Debug, Clone, PartialEq)]
pub struct PageSelection {
    /// Page this slice belongs to
    pub page_index: u16,

    /// Page-level selection rectangle, when the layout can provide one.
    /// Used by the fallback path for content with no line decomposition
    /// (e.g. table cells).
    pub bounds: Option<PageRect>,

    /// Line-level decomposition; may be empty
    pub lines: Vec<LineSelection>,

    /// Attributed runs across the whole page slice, in reading order
    pub runs: Vec<TextRun>,
}

impl PageSelection {
    pub fn new(page_index: u16) -> Self {
        Self {
            page_index,
            bounds: None,
            lines: Vec::new(),
            runs: Vec::new(),
        }
    }

    /// Builder-style: set the page-level bounds
    pub fn with_bounds(mut self, bounds: PageRect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Builder-style: append a line
    pub fn with_line(mut self, text: impl Into<String>, bounds: PageRect) -> Self {
        self.lines.push(LineSelection::new(text, bounds));
        self
    }

    /// Builder-style: append an attributed run
    pub fn with_run(mut self, text: impl Into<String>, font: FontSpec) -> Self {
        self.runs.push(TextRun::new(text, font));
        self
    }
}

/// A selection spanning zero or more pages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub pages: Vec<PageSelection>,
}

impl Selection {
    pub fn new(pages: Vec<PageSelection>) -> Self {
        Self { pages }
    }

    /// Selection over a single page
    pub fn single(page: PageSelection) -> Self {
        Self { pages: vec![page] }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Plain-text export: per-page line texts joined with newlines,
    /// pages separated by newlines. Used by the clipboard copy surface.
    pub fn plain_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for page in &self.pages {
            let page_text = if page.lines.is_empty() {
                page.runs
                    .iter()
                    .map(|r| r.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            } else {
                page.lines
                    .iter()
                    .map(|l| l.text.trim())
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            if !page_text.is_empty() {
                parts.push(page_text);
            }
        }
        parts.join("\n")
    }
}

/// Infer the dominant font of a page slice from its attributed runs.
///
/// The dominant font is the attribute of the longest run by character
/// count. When no run carries a font, the family defaults to Helvetica
/// and the size falls back to `max(10, bounds_height * 0.6)`.
pub fn dominant_font(runs: &[TextRun], bounds_height: f32) -> FontSpec {
    let fallback_size = (bounds_height * 0.6).max(10.0);

    runs.iter()
        .max_by_key(|run| run.text.chars().count())
        .map(|run| run.font.clone())
        .unwrap_or_else(|| FontSpec::new("Helvetica", fallback_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_font_longest_run_wins() {
        let runs = vec![
            TextRun::new("Hi", FontSpec::new("Courier", 10.0)),
            TextRun::new("a much longer run", FontSpec::new("Times-Roman", 11.0)),
            TextRun::new("mid", FontSpec::new("Helvetica", 12.0)),
        ];
        let font = dominant_font(&runs, 20.0);
        assert_eq!(font.family, "Times-Roman");
        assert_eq!(font.size, 11.0);
    }

    #[test]
    fn test_dominant_font_fallback() {
        let font = dominant_font(&[], 20.0);
        assert_eq!(font.family, "Helvetica");
        assert_eq!(font.size, 12.0); // 20 * 0.6

        // Short selections floor at 10pt
        let font = dominant_font(&[], 8.0);
        assert_eq!(font.size, 10.0);
    }

    #[test]
    fn test_plain_text_joins_lines_and_pages() {
        let selection = Selection::new(vec![
            PageSelection::new(0)
                .with_line("first line ", PageRect::new(0.0, 20.0, 100.0, 10.0))
                .with_line(" second line", PageRect::new(0.0, 10.0, 100.0, 10.0)),
            PageSelection::new(1).with_line("next page", PageRect::new(0.0, 0.0, 80.0, 10.0)),
        ]);
        assert_eq!(selection.plain_text(), "first line\nsecond line\nnext page");
    }

    #[test]
    fn test_plain_text_uses_runs_without_lines() {
        let selection = Selection::single(
            PageSelection::new(0).with_run("cell text", FontSpec::default_font()),
        );
        assert_eq!(selection.plain_text(), "cell text");
    }
}
