//! Text measurement and paragraph layout
//!
//! The editor never shapes glyphs itself; it estimates extents through the
//! [`TextMetrics`] contract and re-flows overlay text with a greedy word
//! wrap. Hosts with access to real font metrics can substitute their own
//! implementation; [`EstimatedMetrics`] covers proportional fonts well
//! enough for overlay sizing.

use crate::annotation::FontSpec;

/// Text measurement contract
///
/// `text_width` measures a single line (no newlines); `line_height` is the
/// advance between baselines for the font.
pub trait TextMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32;
    fn line_height(&self, font: &FontSpec) -> f32;
}

/// Ratio-based metrics estimate
///
/// Width is `chars * size * char_width_ratio`; height is
/// `size * line_height_multiplier`.
#[derive(Debug, Clone)]
pub struct EstimatedMetrics {
    /// Average character width relative to font size.
    /// Conservative estimate for proportional fonts.
    pub char_width_ratio: f32,

    /// Line height multiplier (typically 1.2 for normal spacing)
    pub line_height_multiplier: f32,
}

impl Default for EstimatedMetrics {
    fn default() -> Self {
        Self {
            char_width_ratio: 0.6,
            line_height_multiplier: 1.2,
        }
    }
}

impl TextMetrics for EstimatedMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        text.chars().count() as f32 * font.size * self.char_width_ratio
    }

    fn line_height(&self, font: &FontSpec) -> f32 {
        font.size * self.line_height_multiplier
    }
}

/// Width of the widest line in a (possibly multi-line) text
pub fn widest_line(text: &str, font: &FontSpec, metrics: &dyn TextMetrics) -> f32 {
    text.lines()
        .map(|line| metrics.text_width(line, font))
        .fold(0.0, f32::max)
}

/// Result of paragraph layout
#[derive(Debug, Clone)]
pub struct ParagraphLayout {
    /// Text split into display lines
    pub lines: Vec<String>,

    /// Total height of the wrapped block
    pub height: f32,
}

impl ParagraphLayout {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Word-wrap `text` to `max_width`, indenting the very first display line
/// by `first_line_indent`.
///
/// Hard newlines in the input are respected; words wider than the
/// available width are split mid-word. Empty input still occupies one
/// line of height so an empty overlay keeps a caret row.
pub fn layout_paragraph(
    text: &str,
    font: &FontSpec,
    max_width: f32,
    first_line_indent: f32,
    metrics: &dyn TextMetrics,
) -> ParagraphLayout {
    let mut lines = Vec::new();
    let mut first = true;

    for paragraph in text.split('\n') {
        let indent = if first { first_line_indent } else { 0.0 };
        wrap_paragraph(paragraph, font, max_width, indent, metrics, &mut lines);
        first = false;
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    let height = lines.len() as f32 * metrics.line_height(font);
    ParagraphLayout { lines, height }
}

/// Wrap a single hard-line into display lines, appending to `out`.
fn wrap_paragraph(
    paragraph: &str,
    font: &FontSpec,
    max_width: f32,
    first_line_indent: f32,
    metrics: &dyn TextMetrics,
    out: &mut Vec<String>,
) {
    let mut current = String::new();
    let mut current_indent = first_line_indent;
    let available = |indent: f32| (max_width - indent).max(1.0);

    for word in paragraph.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if metrics.text_width(&candidate, font) <= available(current_indent) {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
            current_indent = 0.0;
        }

        // Word alone is still too wide: split it across lines
        if metrics.text_width(word, font) > available(current_indent) {
            let mut chunk = String::new();
            for ch in word.chars() {
                chunk.push(ch);
                if metrics.text_width(&chunk, font) > available(current_indent) {
                    chunk.pop();
                    if !chunk.is_empty() {
                        out.push(std::mem::take(&mut chunk));
                        current_indent = 0.0;
                    }
                    chunk.push(ch);
                }
            }
            current = chunk;
        } else {
            current = word.to_string();
        }
    }

    out.push(current);
}

/// Wrapped height of `text` at `wrap_width` with no first-line indent.
///
/// Convenience for the live re-flow path, which only needs the height.
pub fn wrapped_height(
    text: &str,
    font: &FontSpec,
    wrap_width: f32,
    metrics: &dyn TextMetrics,
) -> f32 {
    layout_paragraph(text, font, wrap_width, 0.0, metrics).height
}
