//! Viewport controller: single owner of all mutable viewer state
//!
//! One control thread owns the arena, cache, scheduler, zoom and
//! selection state and is the only thread that mutates them; no locks
//! are needed on any of it. Rasterization is the sole asynchronous
//! boundary and lives in the worker pool.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::backend::{DocumentBackend, LoadError, PageImage};
use crate::settings::Settings;

use super::arena::{PageArena, PageState};
use super::cache::PageCache;
use super::events::ViewerEvent;
use super::geometry::{Point, Rect};
use super::glyphs::GlyphIndex;
use super::request::RenderResponse;
use super::scheduler::RenderScheduler;
use super::selection::SelectionEngine;
use super::worker::RenderPool;
use super::zoom::{
    anchored_scroll, clamp_zoom, needs_rerender, ZoomChange, ZoomCoordinator, ZoomLevel, ZoomMode,
};
use super::{DEFAULT_ZOOM, PAGE_MARGIN_PX, PAGE_SPACING_PX};

/// Top-level orchestrator wiring scheduler, cache, zoom and selection
/// over one page arena.
pub struct ViewportController {
    arena: PageArena,
    cache: PageCache,
    scheduler: RenderScheduler,
    zoom: ZoomCoordinator,
    selection: SelectionEngine,
    pool: RenderPool,

    scroll_y: f32,
    viewport: (f32, f32),
    /// Cursor-anchored zoom re-asserts scroll one tick after the preview,
    /// once placeholder layout has settled.
    pending_scroll: Option<f32>,
    layout_dirty: bool,

    events: VecDeque<ViewerEvent>,
}

impl ViewportController {
    /// Open a document and build the engine around it. Load errors are
    /// fatal for the document: construction fails and no partial state
    /// is retained.
    pub fn open(
        backend: Arc<dyn DocumentBackend>,
        path: &Path,
        settings: &Settings,
    ) -> Result<Self, LoadError> {
        let load_error = |source| LoadError {
            path: path.to_path_buf(),
            source,
        };

        let handle = backend.open(path).map_err(load_error)?;
        let page_count = handle.page_count();
        info!("processing {page_count} pages for selection layout");

        let mut base_sizes = Vec::with_capacity(page_count);
        let mut glyph_pages = Vec::with_capacity(page_count);
        for page in 0..page_count {
            base_sizes.push(handle.page_size(page, DEFAULT_ZOOM).map_err(load_error)?);
            glyph_pages.push(GlyphIndex::new(
                handle.glyphs_for_page(page).map_err(load_error)?,
            ));
        }
        drop(handle);

        let pool = RenderPool::spawn(backend, path, settings.render_workers);

        let mut events = VecDeque::new();
        events.push_back(ViewerEvent::DocumentLayoutReady(base_sizes.clone()));
        info!("loaded document: {page_count} pages with full selection maps");

        Ok(Self {
            arena: PageArena::new(base_sizes),
            cache: PageCache::new(settings.cache_capacity),
            scheduler: RenderScheduler::new(settings.lookahead),
            zoom: ZoomCoordinator::new(Duration::from_millis(settings.zoom_debounce_ms)),
            selection: SelectionEngine::new(glyph_pages, settings.magnetic_threshold_px),
            pool,
            scroll_y: 0.0,
            viewport: (0.0, 0.0),
            pending_scroll: None,
            layout_dirty: true,
            events,
        })
    }

    /// One control-thread turn: apply deferred scroll, fire the zoom
    /// debounce, drain worker results, recompute the render window if
    /// anything moved.
    pub fn tick(&mut self, now: Instant) {
        if let Some(target) = self.pending_scroll.take() {
            self.scroll_to(target);
        }

        if let Some(change) = self.zoom.poll_commit(now) {
            self.apply_zoom_change(change);
        }

        // Recompute before draining results: a scroll or commit that
        // invalidates in-flight work must land first, so its stale
        // results are discarded rather than applied.
        if self.layout_dirty {
            self.layout_dirty = false;
            self.recompute_window();
        }

        for response in self.pool.poll() {
            self.apply_response(response);
        }
    }

    /// Drain queued events for the shell.
    pub fn drain_events(&mut self) -> Vec<ViewerEvent> {
        self.events.drain(..).collect()
    }

    // ------------------------------------------------------------------
    // Scroll and layout

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if self.viewport != (width, height) {
            self.viewport = (width, height);
            self.layout_dirty = true;
        }
    }

    pub fn scroll_to(&mut self, y: f32) {
        let clamped = y.clamp(0.0, self.max_scroll());
        if (self.scroll_y - clamped).abs() > f32::EPSILON {
            self.scroll_y = clamped;
            self.layout_dirty = true;
        }
    }

    pub fn scroll_by(&mut self, dy: f32) {
        self.scroll_to(self.scroll_y + dy);
    }

    #[must_use]
    pub fn scroll(&self) -> f32 {
        self.scroll_y
    }

    /// Total stacked height of all pages at the current display zoom.
    #[must_use]
    pub fn content_height(&self) -> f32 {
        let count = self.arena.page_count();
        if count == 0 {
            return 2.0 * PAGE_MARGIN_PX;
        }
        let mut height = 2.0 * PAGE_MARGIN_PX + (count - 1) as f32 * PAGE_SPACING_PX;
        for page in 0..count {
            height += self.page_height(page);
        }
        height
    }

    /// Placeholder geometry of a page in display space. Derived purely
    /// from base size and display zoom, independent of load state.
    #[must_use]
    pub fn page_rect(&self, page: usize) -> Option<Rect> {
        let (w, h) = self.arena.base_size(page)?;
        let scale = self.scale();
        let top = self.page_top(page);
        Some(Rect::new(
            PAGE_MARGIN_PX,
            top,
            PAGE_MARGIN_PX + w as f32 * scale,
            top + h as f32 * scale,
        ))
    }

    // ------------------------------------------------------------------
    // Zoom

    pub fn zoom_preview(&mut self, level: ZoomLevel, now: Instant) {
        if let Some(change) = self.zoom.preview(level, now) {
            self.apply_zoom_change(change);
        }
    }

    /// Preview anchored to a cursor `cursor_offset` pixels below the
    /// viewport top: the corrected scroll is re-asserted on the next
    /// tick, after placeholder layout has settled.
    pub fn zoom_preview_at_cursor(&mut self, level: ZoomLevel, cursor_offset: f32, now: Instant) {
        let old_zoom = self.zoom.display();
        let old_scroll = self.scroll_y;
        let Some(change) = self.zoom.preview(level, now) else {
            return;
        };
        self.apply_zoom_change(change);
        self.pending_scroll = Some(anchored_scroll(
            old_scroll,
            cursor_offset,
            old_zoom,
            self.zoom.display(),
        ));
    }

    pub fn zoom_in(&mut self, now: Instant) {
        if let Some(change) = self.zoom.zoom_in(now) {
            self.apply_zoom_change(change);
        }
    }

    pub fn zoom_out(&mut self, now: Instant) {
        if let Some(change) = self.zoom.zoom_out(now) {
            self.apply_zoom_change(change);
        }
    }

    /// Preset levels commit immediately, no debounce.
    pub fn set_zoom_preset(&mut self, level: ZoomLevel) {
        for change in self.zoom.set_immediate(level) {
            self.apply_zoom_change(change);
        }
    }

    pub fn reset_zoom(&mut self) {
        for change in self.zoom.reset() {
            self.apply_zoom_change(change);
        }
    }

    pub fn fit_width(&mut self) {
        let calculated = self.fit_zoom(ZoomMode::FitWidth);
        for change in self.zoom.set_fit_width(calculated) {
            self.apply_zoom_change(change);
        }
    }

    pub fn fit_page(&mut self) {
        let calculated = self.fit_zoom(ZoomMode::FitPage);
        for change in self.zoom.set_fit_page(calculated) {
            self.apply_zoom_change(change);
        }
    }

    #[must_use]
    pub fn display_zoom(&self) -> ZoomLevel {
        self.zoom.display()
    }

    #[must_use]
    pub fn committed_zoom(&self) -> ZoomLevel {
        self.zoom.committed()
    }

    #[must_use]
    pub fn zoom_mode(&self) -> ZoomMode {
        self.zoom.mode()
    }

    // ------------------------------------------------------------------
    // Selection

    pub fn pointer_pressed(&mut self, page: usize, at: Point) {
        let events = self.selection.pointer_pressed(page, at);
        self.events.extend(events);
    }

    pub fn pointer_moved(&mut self, page: usize, at: Point) {
        let events = self.selection.pointer_moved(page, at);
        self.events.extend(events);
    }

    pub fn pointer_released(&mut self) {
        self.selection.pointer_released();
    }

    pub fn select_word_at(&mut self, page: usize, at: Point) {
        let events = self.selection.select_word_at(page, at);
        self.events.extend(events);
    }

    pub fn clear_selection(&mut self) {
        let events = self.selection.clear();
        self.events.extend(events);
    }

    #[must_use]
    pub fn selection_text(&self) -> Option<String> {
        self.selection.selection_text()
    }

    // ------------------------------------------------------------------
    // Introspection

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.arena.page_count()
    }

    #[must_use]
    pub fn page_state(&self, page: usize) -> Option<&PageState> {
        self.arena.state(page)
    }

    /// Borrow a page's image for painting. The arena stays the owner;
    /// the buffer disappears only through eviction or zoom invalidation.
    #[must_use]
    pub fn page_image(&self, page: usize) -> Option<Arc<PageImage>> {
        self.arena.image(page)
    }

    #[must_use]
    pub fn resident_pages(&self) -> usize {
        self.cache.len()
    }

    /// True when every page in the current render window holds an image
    /// within tolerance of the committed zoom.
    #[must_use]
    pub fn window_loaded(&self) -> bool {
        let Some(window) = self.scheduler.window() else {
            return false;
        };
        for page in window.start..=window.end {
            match self.arena.state(page) {
                Some(PageState::Loaded { rendered_zoom, .. })
                    if !needs_rerender(*rendered_zoom, self.zoom.committed()) => {}
                _ => return false,
            }
        }
        true
    }

    /// Best-effort: cancels outstanding work and tells workers to stop,
    /// without waiting for them to drain.
    pub fn shutdown(&self) {
        for page in 0..self.arena.page_count() {
            if let Some(PageState::Pending { id, .. }) = self.arena.state(page) {
                self.pool.cancel(*id);
            }
        }
        self.pool.shutdown();
    }

    // ------------------------------------------------------------------
    // Internals

    fn scale(&self) -> f32 {
        f32::from(self.zoom.display()) / 100.0
    }

    fn page_height(&self, page: usize) -> f32 {
        self.arena
            .base_size(page)
            .map_or(0.0, |(_, h)| h as f32 * self.scale())
    }

    fn page_top(&self, page: usize) -> f32 {
        let mut top = PAGE_MARGIN_PX;
        for p in 0..page {
            top += self.page_height(p) + PAGE_SPACING_PX;
        }
        top
    }

    fn max_scroll(&self) -> f32 {
        (self.content_height() - self.viewport.1).max(0.0)
    }

    /// Pages intersecting the viewport, or None when nothing is visible.
    fn visible_range(&self) -> Option<(usize, usize)> {
        let count = self.arena.page_count();
        if count == 0 || self.viewport.1 <= 0.0 {
            return None;
        }

        let view_top = self.scroll_y;
        let view_bottom = self.scroll_y + self.viewport.1;

        let mut first = None;
        let mut last = None;
        let mut top = PAGE_MARGIN_PX;
        for page in 0..count {
            let bottom = top + self.page_height(page);
            if bottom > view_top && top < view_bottom {
                if first.is_none() {
                    first = Some(page);
                }
                last = Some(page);
            } else if first.is_some() {
                // Pages are stacked top to bottom; once past the viewport
                // nothing further can intersect it.
                break;
            }
            top = bottom + PAGE_SPACING_PX;
        }

        Some((first?, last?))
    }

    fn recompute_window(&mut self) {
        let Some(visible) = self.visible_range() else {
            return;
        };
        let zoom = self.zoom.committed();
        let plan = self.scheduler.recompute_window(visible, zoom, &self.arena);

        for (page, id) in plan.cancel {
            self.pool.cancel(id);
            self.arena.unload(page);
        }
        for page in plan.dispatch {
            self.request_render(page, zoom);
        }
    }

    /// At most one render in flight per page: a new request cancels the
    /// existing one first.
    fn request_render(&mut self, page: usize, zoom: ZoomLevel) {
        if let Some(PageState::Pending { id, .. }) = self.arena.state(page) {
            self.pool.cancel(*id);
        }
        if matches!(self.arena.state(page), Some(PageState::Loaded { .. })) {
            self.cache.remove(page);
        }

        let id = self.pool.submit(page, zoom);
        self.arena.set_state(page, PageState::Pending { id, zoom });
    }

    fn apply_response(&mut self, response: RenderResponse) {
        match response {
            RenderResponse::Page {
                id,
                page,
                zoom,
                image,
            } => {
                let expected = matches!(
                    self.arena.state(page),
                    Some(PageState::Pending { id: pending, .. }) if *pending == id
                );
                if !expected {
                    // Superseded or the page left the window; expected
                    // normal operation, not a failure.
                    debug!("discarding stale render result for page {page} ({id:?})");
                    self.pool.forget_cancel(id);
                    return;
                }

                let image = Arc::new(image);
                self.arena.set_state(
                    page,
                    PageState::Loaded {
                        image: Arc::clone(&image),
                        rendered_zoom: zoom,
                    },
                );
                if let Some(evicted) = self.cache.insert(page) {
                    debug!("evicting page {evicted} to admit page {page}");
                    self.arena.unload(evicted);
                }
                self.events.push_back(ViewerEvent::PageImageReady {
                    page,
                    image,
                    rendered_zoom: zoom,
                });
            }

            RenderResponse::Cancelled(id) => {
                debug!("render request {id:?} cancelled");
            }

            RenderResponse::Error { id, page, error } => {
                warn!("page {page} failed to render: {error}");
                if matches!(
                    self.arena.state(page),
                    Some(PageState::Pending { id: pending, .. }) if *pending == id
                ) {
                    // Unloaded pages inside the window are naturally
                    // retried by the next visibility recompute.
                    self.arena.unload(page);
                } else {
                    self.pool.forget_cancel(id);
                }
            }
        }
    }

    fn apply_zoom_change(&mut self, change: ZoomChange) {
        match change {
            ZoomChange::Preview(level) => {
                self.selection.set_display_zoom(level);
                self.scroll_y = self.scroll_y.min(self.max_scroll());
                self.layout_dirty = true;
                self.events.push_back(ViewerEvent::ZoomPreviewChanged(level));
                // Highlight geometry is screen-space; rescale it with the
                // preview like the cached images.
                let refreshed = self.selection.refresh_highlights();
                self.events.extend(refreshed);
            }

            ZoomChange::Committed(level) => {
                // Eagerly drop anything out of tolerance so the next
                // window pass re-requests it at full quality.
                for page in 0..self.arena.page_count() {
                    if let Some(PageState::Loaded { rendered_zoom, .. }) = self.arena.state(page) {
                        if needs_rerender(*rendered_zoom, level) {
                            self.cache.remove(page);
                            self.arena.unload(page);
                        }
                    }
                }
                self.layout_dirty = true;
                self.events.push_back(ViewerEvent::ZoomCommitted(level));
            }
        }
    }

    /// Zoom fitting page 0 into the viewport minus the outer margins.
    fn fit_zoom(&self, mode: ZoomMode) -> ZoomLevel {
        let Some((base_w, base_h)) = self.arena.base_size(0) else {
            return DEFAULT_ZOOM;
        };
        if base_w == 0 || base_h == 0 {
            return DEFAULT_ZOOM;
        }

        let available_w = self.viewport.0 - 2.0 * PAGE_MARGIN_PX;
        let available_h = self.viewport.1 - 2.0 * PAGE_MARGIN_PX;
        if available_w <= 0.0 || available_h <= 0.0 {
            return DEFAULT_ZOOM;
        }

        let width_ratio = available_w / base_w as f32;
        let height_ratio = available_h / base_h as f32;
        let ratio = match mode {
            ZoomMode::FitPage => width_ratio.min(height_ratio),
            _ => width_ratio,
        };

        clamp_zoom((ratio * 100.0) as ZoomLevel)
    }
}

impl Drop for ViewportController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
