//! Selection-to-replacement translation
//!
//! Turns a geometric text selection into per-page replacement plans: the
//! rectangles to cover, the union bounds, the first-line indent, the
//! dominant font, and the candidate text for the synthesized overlay.
//!
//! Pages are processed independently; a page that yields no usable
//! geometry or no text simply contributes nothing. Degenerate geometry is
//! a silent skip by policy: line boxes coming out of the underlying text
//! layout can legitimately collapse for some content (certain table
//! cells), and that must not abort the interaction.

use crate::annotation::FontSpec;
use crate::geometry::PageRect;
use crate::selection::{dominant_font, PageSelection, Selection};

/// Replacement plan for one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageReplacement {
    /// Page this plan applies to
    pub page_index: u16,

    /// One cover rectangle per usable source line (line-based path) or a
    /// single rectangle over the union (fallback path)
    pub cover_rects: Vec<PageRect>,

    /// Union of the usable line bounds, or the page selection bounds on
    /// the fallback path
    pub union_bounds: PageRect,

    /// Candidate text for the synthesized overlay; empty only on the
    /// fallback path
    pub text: String,

    /// Indent of the first source line relative to the union's left edge
    pub first_line_indent: f32,

    /// Dominant font of the selected runs
    pub font: FontSpec,
}

/// Translate a selection into per-page replacement plans.
///
/// `replacement` is the externally supplied replacement string. On the
/// line-based path an empty `replacement` means "keep the original text"
/// (the double-click-a-word flow pre-fills the word itself); a page whose
/// original text is empty is skipped. On the fallback path the candidate
/// is the trimmed `replacement` and MAY be empty, so a user can type
/// fresh content where the selection has no extractable string.
pub fn translate_selection(selection: &Selection, replacement: &str) -> Vec<PageReplacement> {
    selection
        .pages
        .iter()
        .filter_map(|page| translate_page(page, replacement))
        .collect()
}

fn translate_page(page: &PageSelection, replacement: &str) -> Option<PageReplacement> {
    let replacement = replacement.trim();

    let usable_lines: Vec<&crate::selection::LineSelection> = page
        .lines
        .iter()
        .filter(|line| !line.bounds.is_degenerate())
        .collect();

    if !usable_lines.is_empty() {
        // Line-based path. Every line's text participates in the joined
        // string; only usable line boxes produce covers and the union.
        let original: String = page
            .lines
            .iter()
            .map(|line| line.text.trim())
            .collect::<Vec<_>>()
            .join("\n");

        if original.trim().is_empty() {
            return None;
        }

        let cover_rects: Vec<PageRect> = usable_lines.iter().map(|line| line.bounds).collect();
        let union_bounds = PageRect::union_all(cover_rects.iter())?;
        let first_line_indent = (usable_lines[0].bounds.x - union_bounds.x).max(0.0);

        let text = if replacement.is_empty() {
            original
        } else {
            replacement.to_string()
        };

        return Some(PageReplacement {
            page_index: page.page_index,
            cover_rects,
            union_bounds,
            text,
            first_line_indent,
            font: dominant_font(&page.runs, union_bounds.height),
        });
    }

    // Fallback path: no usable line decomposition (e.g. table cells).
    let bounds = page.bounds.filter(|b| !b.is_degenerate())?;

    Some(PageReplacement {
        page_index: page.page_index,
        cover_rects: vec![bounds],
        union_bounds: bounds,
        text: replacement.to_string(),
        first_line_indent: 0.0,
        font: dominant_font(&page.runs, bounds.height),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::PageSelection;

    fn two_line_page() -> PageSelection {
        PageSelection::new(0)
            .with_line("  first line ", PageRect::new(60.0, 712.0, 90.0, 12.0))
            .with_line("second", PageRect::new(50.0, 700.0, 100.0, 12.0))
            .with_run("first line second", FontSpec::new("Times-Roman", 11.0))
    }

    #[test]
    fn test_line_based_translation() {
        let selection = Selection::single(two_line_page());
        let plans = translate_selection(&selection, "");
        assert_eq!(plans.len(), 1);

        let plan = &plans[0];
        assert_eq!(plan.cover_rects.len(), 2);
        assert_eq!(plan.text, "first line\nsecond");
        assert_eq!(plan.union_bounds, PageRect::new(50.0, 700.0, 100.0, 24.0));
        // First line starts 10pt right of the union's left edge
        assert_eq!(plan.first_line_indent, 10.0);
        assert_eq!(plan.font.family, "Times-Roman");
    }

    #[test]
    fn test_replacement_overrides_original_text() {
        let selection = Selection::single(two_line_page());
        let plans = translate_selection(&selection, "  Hi  ");
        assert_eq!(plans[0].text, "Hi");
    }

    #[test]
    fn test_degenerate_lines_skipped_for_covers_only() {
        let page = PageSelection::new(0)
            .with_line("kept", PageRect::new(10.0, 100.0, 50.0, 10.0))
            .with_line("ghost", PageRect::new(0.0, 0.0, 0.0, 0.0));
        let plans = translate_selection(&Selection::single(page), "");

        let plan = &plans[0];
        assert_eq!(plan.cover_rects.len(), 1);
        // Degenerate line still contributes its text
        assert_eq!(plan.text, "kept\nghost");
        // ...but not its geometry
        assert_eq!(plan.union_bounds, PageRect::new(10.0, 100.0, 50.0, 10.0));
    }

    #[test]
    fn test_empty_text_page_skipped() {
        let page = PageSelection::new(0)
            .with_line("   ", PageRect::new(10.0, 100.0, 50.0, 10.0))
            .with_line("", PageRect::new(10.0, 90.0, 50.0, 10.0));
        let plans = translate_selection(&Selection::single(page), "");
        assert!(plans.is_empty());
    }

    #[test]
    fn test_fallback_path_allows_empty_text() {
        let page = PageSelection::new(2).with_bounds(PageRect::new(30.0, 40.0, 120.0, 18.0));
        let plans = translate_selection(&Selection::single(page), "");

        let plan = &plans[0];
        assert_eq!(plan.page_index, 2);
        assert_eq!(plan.text, "");
        assert_eq!(plan.first_line_indent, 0.0);
        assert_eq!(plan.cover_rects, vec![PageRect::new(30.0, 40.0, 120.0, 18.0)]);
        // No runs: size falls back to max(10, 18 * 0.6)
        assert_eq!(plan.font.size, 10.8);
    }

    #[test]
    fn test_page_without_usable_geometry_contributes_nothing() {
        let degenerate = PageSelection::new(0).with_bounds(PageRect::new(0.0, 0.0, 0.0, 5.0));
        let nothing = PageSelection::new(1);
        let plans =
            translate_selection(&Selection::new(vec![degenerate, nothing]), "text");
        assert!(plans.is_empty());
    }

    #[test]
    fn test_pages_processed_independently() {
        let good = two_line_page();
        let bad = PageSelection::new(1); // no geometry at all
        let far = PageSelection::new(2).with_bounds(PageRect::new(0.0, 0.0, 40.0, 10.0));

        let plans = translate_selection(&Selection::new(vec![bad, good, far]), "swap");
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].page_index, 0);
        assert_eq!(plans[1].page_index, 2);
    }

    #[test]
    fn test_nan_bounds_are_silently_skipped() {
        let page = PageSelection::new(0)
            .with_bounds(PageRect::new(f32::NAN, 0.0, 100.0, 10.0));
        assert!(translate_selection(&Selection::single(page), "x").is_empty());
    }
}
