//! Per-page glyph index: the geometric ground truth for selection

use super::geometry::{Point, Rect};
use super::{WORD_LINE_THRESHOLD, WORD_SPACE_THRESHOLD};

/// A single character with its bounding box in document units.
#[derive(Clone, Debug)]
pub struct Glyph {
    pub c: char,
    pub bbox: Rect,
}

/// Ordered glyphs of one page, fixed at load time.
///
/// The sequence is reading order as produced by the document backend and
/// is never mutated; indices into it identify selection endpoints.
#[derive(Clone, Debug, Default)]
pub struct GlyphIndex {
    glyphs: Vec<Glyph>,
}

impl GlyphIndex {
    #[must_use]
    pub fn new(glyphs: Vec<Glyph>) -> Self {
        Self { glyphs }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Glyph> {
        self.glyphs.get(index)
    }

    /// Hit-test a document-unit point.
    ///
    /// Direct containment wins; otherwise the glyph whose center is
    /// nearest, accepted only within `radius` document units.
    #[must_use]
    pub fn glyph_at(&self, point: Point, radius: f32) -> Option<usize> {
        let mut closest = None;
        let mut min_dist = f32::INFINITY;

        for (i, glyph) in self.glyphs.iter().enumerate() {
            if glyph.bbox.contains(point) {
                return Some(i);
            }

            let dist = point.distance_to(glyph.bbox.center());
            if dist < min_dist && dist < radius {
                min_dist = dist;
                closest = Some(i);
            }
        }

        closest
    }

    /// Concatenated text of the inclusive range. Endpoints are
    /// normalized and clamped before the read.
    #[must_use]
    pub fn text_range(&self, start: usize, end: usize) -> String {
        let Some((start, end)) = self.clamped_range(start, end) else {
            return String::new();
        };
        self.glyphs[start..=end].iter().map(|g| g.c).collect()
    }

    /// Bounding boxes of the inclusive range, in glyph order.
    #[must_use]
    pub fn boxes_for_range(&self, start: usize, end: usize) -> Vec<Rect> {
        let Some((start, end)) = self.clamped_range(start, end) else {
            return Vec::new();
        };
        self.glyphs[start..=end].iter().map(|g| g.bbox).collect()
    }

    /// Expand a glyph index into the word containing it.
    ///
    /// Word boundaries are improvised from geometry: expansion stops at a
    /// non-word character, a horizontal gap wider than the space
    /// threshold, or a top-edge jump larger than the line threshold.
    /// A non-word glyph expands to itself.
    #[must_use]
    pub fn expand_word(&self, index: usize) -> (usize, usize) {
        let Some(glyph) = self.glyphs.get(index) else {
            return (index, index);
        };
        if !is_word_char(glyph.c) {
            return (index, index);
        }

        let mut start = index;
        while start > 0 {
            let curr = &self.glyphs[start];
            let prev = &self.glyphs[start - 1];
            let gap = curr.bbox.x0 - prev.bbox.x1;
            let v_gap = (curr.bbox.y0 - prev.bbox.y0).abs();
            if !is_word_char(prev.c) || gap > WORD_SPACE_THRESHOLD || v_gap > WORD_LINE_THRESHOLD {
                break;
            }
            start -= 1;
        }

        let mut end = index;
        while end + 1 < self.glyphs.len() {
            let curr = &self.glyphs[end];
            let next = &self.glyphs[end + 1];
            let gap = next.bbox.x0 - curr.bbox.x1;
            let v_gap = (next.bbox.y0 - curr.bbox.y0).abs();
            if !is_word_char(next.c) || gap > WORD_SPACE_THRESHOLD || v_gap > WORD_LINE_THRESHOLD {
                break;
            }
            end += 1;
        }

        (start, end)
    }

    fn clamped_range(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if self.glyphs.is_empty() {
            return None;
        }
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let last = self.glyphs.len() - 1;
        Some((start.min(last), end.min(last)))
    }
}

/// Word characters: alphanumerics plus a small connector set.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '\'')
}
