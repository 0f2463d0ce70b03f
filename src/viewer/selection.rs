//! Pointer-gesture selection engine
//!
//! Translates pointer gestures into a normalized glyph range and into
//! renderable highlight geometry. Everything is computed in document
//! units; the display zoom only enters through coordinate conversion,
//! so selections survive zoom changes untouched.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::events::ViewerEvent;
use super::geometry::{doc_to_screen_rect, screen_to_doc, Point};
use super::glyphs::GlyphIndex;
use super::highlight::merge_rects;
use super::zoom::ZoomLevel;
use super::{DEFAULT_ZOOM, DRAG_THRESHOLD_PX};

/// Soft line-wrap hyphenation: a trailing hyphen, a line break, then a
/// letter continue one word.
static HYPHEN_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\n([a-zA-Z])").expect("hyphen repair regex"));

/// Drag state machine for one selection gesture.
#[derive(Clone, Copy, Debug, Default)]
enum DragState {
    #[default]
    Idle,
    /// Pressed over a glyph; not yet a drag.
    Armed {
        page: usize,
        glyph: usize,
        origin: Point,
    },
    /// Past the drag threshold; updates flow.
    Dragging { page: usize },
}

/// Selection endpoints in raw drag order; normalized on every read.
#[derive(Clone, Copy, Debug)]
struct ActiveRange {
    page: usize,
    start: usize,
    end: usize,
}

/// Hit-tests pointer positions, tracks drag state, and produces
/// normalized ranges, text, and merged highlight geometry.
pub struct SelectionEngine {
    pages: Vec<GlyphIndex>,
    active: Option<ActiveRange>,
    drag: DragState,
    display_zoom: ZoomLevel,
    magnetic_threshold_px: f32,
}

impl SelectionEngine {
    #[must_use]
    pub fn new(pages: Vec<GlyphIndex>, magnetic_threshold_px: f32) -> Self {
        Self {
            pages,
            active: None,
            drag: DragState::Idle,
            display_zoom: DEFAULT_ZOOM,
            magnetic_threshold_px,
        }
    }

    /// Update the zoom used for coordinate conversion. The underlying
    /// glyph geometry is zoom-independent and stays put.
    pub fn set_display_zoom(&mut self, zoom: ZoomLevel) {
        self.display_zoom = zoom;
    }

    #[must_use]
    pub fn page_glyphs(&self, page: usize) -> Option<&GlyphIndex> {
        self.pages.get(page)
    }

    /// Press clears any existing selection and arms a new gesture when
    /// the point resolves to a glyph.
    pub fn pointer_pressed(&mut self, page: usize, at: Point) -> Vec<ViewerEvent> {
        let events = self.clear();
        self.drag = match self.hit(page, at) {
            Some(glyph) => DragState::Armed {
                page,
                glyph,
                origin: at,
            },
            None => DragState::Idle,
        };
        events
    }

    /// Pointer movement: arms become drags past the threshold; drags
    /// extend the range. Moves on another page are ignored - a selection
    /// never spans pages.
    pub fn pointer_moved(&mut self, page: usize, at: Point) -> Vec<ViewerEvent> {
        match self.drag {
            DragState::Armed {
                page: start_page,
                glyph,
                origin,
            } => {
                if page != start_page || origin.manhattan_to(at) <= DRAG_THRESHOLD_PX {
                    return Vec::new();
                }
                debug!("selection drag started on page {start_page} at glyph {glyph}");
                self.drag = DragState::Dragging { page: start_page };
                let end = self.hit(page, at).unwrap_or(glyph);
                self.active = Some(ActiveRange {
                    page: start_page,
                    start: glyph,
                    end,
                });
                self.emit_selection()
            }

            DragState::Dragging { page: active_page } => {
                if page != active_page {
                    return Vec::new();
                }
                let Some(glyph) = self.hit(page, at) else {
                    return Vec::new();
                };
                match self.active.as_mut() {
                    Some(range) if range.end != glyph => {
                        range.end = glyph;
                        self.emit_selection()
                    }
                    _ => Vec::new(),
                }
            }

            DragState::Idle => Vec::new(),
        }
    }

    /// Release ends the gesture unconditionally. A press that never left
    /// `Armed` produces no selection - stray one-pixel clicks stay silent.
    pub fn pointer_released(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Expand the glyph under the point into a word selection
    /// (double-click path).
    pub fn select_word_at(&mut self, page: usize, at: Point) -> Vec<ViewerEvent> {
        let Some(glyph) = self.hit(page, at) else {
            return Vec::new();
        };
        let Some(index) = self.pages.get(page) else {
            return Vec::new();
        };
        let (start, end) = index.expand_word(glyph);
        self.drag = DragState::Idle;
        self.active = Some(ActiveRange { page, start, end });
        self.emit_selection()
    }

    /// Drop the active selection, notifying listeners if there was one.
    pub fn clear(&mut self) -> Vec<ViewerEvent> {
        self.drag = DragState::Idle;
        match self.active.take() {
            Some(range) => vec![
                ViewerEvent::SelectionChanged(String::new()),
                ViewerEvent::SelectionHighlightsChanged {
                    page: range.page,
                    rects: Vec::new(),
                },
            ],
            None => Vec::new(),
        }
    }

    /// Current selection text after hyphenation repair.
    #[must_use]
    pub fn selection_text(&self) -> Option<String> {
        let range = self.active?;
        let index = self.pages.get(range.page)?;
        Some(merge_hyphens(&index.text_range(range.start, range.end)))
    }

    /// Re-emit highlight geometry after a display-zoom change.
    pub fn refresh_highlights(&self) -> Vec<ViewerEvent> {
        self.highlight_event().into_iter().collect()
    }

    fn hit(&self, page: usize, screen: Point) -> Option<usize> {
        let index = self.pages.get(page)?;
        let doc = screen_to_doc(screen, self.display_zoom);
        // Constant snapping radius in screen space regardless of zoom.
        let radius = self.magnetic_threshold_px * 100.0 / f32::from(self.display_zoom);
        index.glyph_at(doc, radius)
    }

    fn emit_selection(&self) -> Vec<ViewerEvent> {
        let Some(text) = self.selection_text() else {
            return Vec::new();
        };
        let mut events = vec![ViewerEvent::SelectionChanged(text)];
        events.extend(self.highlight_event());
        events
    }

    fn highlight_event(&self) -> Option<ViewerEvent> {
        let range = self.active?;
        let index = self.pages.get(range.page)?;
        let screen: Vec<_> = index
            .boxes_for_range(range.start, range.end)
            .into_iter()
            .map(|r| doc_to_screen_rect(r, self.display_zoom))
            .collect();
        Some(ViewerEvent::SelectionHighlightsChanged {
            page: range.page,
            rects: merge_rects(&screen),
        })
    }
}

/// Rejoin words split by a soft line-wrap hyphen. Applied to extracted
/// text only, never to the glyph sequence.
#[must_use]
pub fn merge_hyphens(text: &str) -> String {
    HYPHEN_BREAK.replace_all(text, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::geometry::Rect;
    use crate::viewer::glyphs::Glyph;

    fn row(text: &str, start_x: f32, y: f32) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                let x = start_x + i as f32 * 10.0;
                Glyph {
                    c,
                    bbox: Rect::new(x, y, x + 10.0, y + 12.0),
                }
            })
            .collect()
    }

    fn engine() -> SelectionEngine {
        SelectionEngine::new(vec![GlyphIndex::new(row("hello world", 0.0, 0.0))], 15.0)
    }

    fn glyph_center(i: usize) -> Point {
        Point::new(i as f32 * 10.0 + 5.0, 6.0)
    }

    fn selection_texts(events: &[ViewerEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                ViewerEvent::SelectionChanged(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn drag_produces_a_selection() {
        let mut engine = engine();

        assert!(engine.pointer_pressed(0, glyph_center(0)).is_empty());
        // Crossing the drag threshold starts the selection at the press
        // glyph and extends it to the current position.
        let events = engine.pointer_moved(0, glyph_center(2));
        assert_eq!(selection_texts(&events), vec!["hel".to_string()]);

        let events = engine.pointer_moved(0, glyph_center(4));
        assert_eq!(selection_texts(&events), vec!["hello".to_string()]);

        engine.pointer_released();
        assert_eq!(engine.selection_text().as_deref(), Some("hello"));
    }

    #[test]
    fn sub_threshold_click_selects_nothing() {
        let mut engine = engine();
        engine.pointer_pressed(0, glyph_center(0));
        // One-pixel jitter stays under the drag threshold.
        let events = engine.pointer_moved(0, Point::new(6.0, 6.0));
        assert!(events.is_empty());
        engine.pointer_released();
        assert!(engine.selection_text().is_none());
    }

    #[test]
    fn inverted_drag_is_normalized_on_read() {
        let mut engine = engine();
        engine.pointer_pressed(0, glyph_center(4));
        let events = engine.pointer_moved(0, glyph_center(1));
        assert_eq!(selection_texts(&events), vec!["ello".to_string()]);
        let events = engine.pointer_moved(0, glyph_center(0));
        assert_eq!(selection_texts(&events), vec!["hello".to_string()]);
    }

    #[test]
    fn press_clears_the_previous_selection() {
        let mut engine = engine();
        engine.pointer_pressed(0, glyph_center(0));
        engine.pointer_moved(0, glyph_center(4));
        engine.pointer_released();

        let events = engine.pointer_pressed(0, glyph_center(8));
        assert_eq!(selection_texts(&events), vec![String::new()]);
        assert!(events.iter().any(|e| matches!(
            e,
            ViewerEvent::SelectionHighlightsChanged { page: 0, rects } if rects.is_empty()
        )));
    }

    #[test]
    fn press_outside_any_glyph_does_not_arm() {
        let mut engine = engine();
        engine.pointer_pressed(0, Point::new(500.0, 500.0));
        let events = engine.pointer_moved(0, Point::new(540.0, 500.0));
        assert!(events.is_empty());
    }

    #[test]
    fn moves_on_another_page_are_ignored() {
        let pages = vec![
            GlyphIndex::new(row("page zero", 0.0, 0.0)),
            GlyphIndex::new(row("page one", 0.0, 0.0)),
        ];
        let mut engine = SelectionEngine::new(pages, 15.0);

        engine.pointer_pressed(0, glyph_center(0));
        engine.pointer_moved(0, glyph_center(3));
        let events = engine.pointer_moved(1, glyph_center(7));
        assert!(events.is_empty());
        assert_eq!(engine.selection_text().as_deref(), Some("page"));
    }

    #[test]
    fn word_selection_on_double_click() {
        let mut engine = engine();
        let events = engine.select_word_at(0, glyph_center(8));
        assert_eq!(selection_texts(&events), vec!["world".to_string()]);
    }

    #[test]
    fn magnetic_threshold_scales_with_zoom() {
        let mut engine = engine();
        engine.set_display_zoom(200);
        // Screen point (30, 12) maps to document (15, 6) - inside 'e'.
        let events = engine.select_word_at(0, Point::new(30.0, 12.0));
        assert_eq!(selection_texts(&events), vec!["hello".to_string()]);
    }

    #[test]
    fn highlights_are_merged_per_line_in_screen_space() {
        let mut engine = engine();
        engine.pointer_pressed(0, glyph_center(0));
        engine.pointer_moved(0, glyph_center(4));
        let events = engine.pointer_moved(0, glyph_center(4));
        // No change in end glyph: nothing re-emitted.
        assert!(events.is_empty());

        let highlight = engine
            .refresh_highlights()
            .into_iter()
            .find_map(|e| match e {
                ViewerEvent::SelectionHighlightsChanged { rects, .. } => Some(rects),
                _ => None,
            })
            .unwrap();
        assert_eq!(highlight.len(), 1);
        assert_eq!(highlight[0], Rect::new(0.0, 0.0, 50.0, 12.0));
    }

    #[test]
    fn hyphen_repair_rejoins_wrapped_words() {
        assert_eq!(merge_hyphens("inter-\nnational"), "international");
        assert_eq!(merge_hyphens("well-known"), "well-known");
        assert_eq!(merge_hyphens("dash-\n1"), "dash-\n1");
    }
}
