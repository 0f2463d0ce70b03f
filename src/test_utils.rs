//! Deterministic fakes for engine tests

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::backend::{BackendError, DocumentBackend, DocumentHandle, PageImage};
use crate::viewer::geometry::Rect;
use crate::viewer::glyphs::Glyph;
use crate::viewer::zoom::ZoomLevel;

/// In-memory document backend with configurable page count, render
/// latency and per-page failures.
#[derive(Clone, Debug)]
pub struct FakeBackend {
    pub page_count: usize,
    /// Base page size in document units.
    pub base_size: (u32, u32),
    /// Sleep inserted into every render, to exercise cancellation.
    pub render_delay: Duration,
    pub failing_pages: HashSet<usize>,
    /// Per-page glyphs; pages past the end have none.
    pub glyph_pages: Vec<Vec<Glyph>>,
}

impl FakeBackend {
    #[must_use]
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            base_size: (600, 800),
            render_delay: Duration::ZERO,
            failing_pages: HashSet::new(),
            glyph_pages: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    #[must_use]
    pub fn with_failing_page(mut self, page: usize) -> Self {
        self.failing_pages.insert(page);
        self
    }

    #[must_use]
    pub fn with_page_glyphs(mut self, page: usize, glyphs: Vec<Glyph>) -> Self {
        if self.glyph_pages.len() <= page {
            self.glyph_pages.resize(page + 1, Vec::new());
        }
        self.glyph_pages[page] = glyphs;
        self
    }
}

impl DocumentBackend for FakeBackend {
    fn open(&self, _path: &Path) -> Result<Box<dyn DocumentHandle>, BackendError> {
        if self.page_count == 0 {
            return Err(BackendError::EmptyDocument);
        }
        Ok(Box::new(FakeDocument { config: self.clone() }))
    }
}

struct FakeDocument {
    config: FakeBackend,
}

impl FakeDocument {
    fn check_page(&self, page: usize) -> Result<(), BackendError> {
        if page >= self.config.page_count {
            return Err(BackendError::PageOutOfRange(page));
        }
        Ok(())
    }
}

impl DocumentHandle for FakeDocument {
    fn page_count(&self) -> usize {
        self.config.page_count
    }

    fn page_size(&self, page: usize, zoom: ZoomLevel) -> Result<(u32, u32), BackendError> {
        self.check_page(page)?;
        let scale = f32::from(zoom) / 100.0;
        let (w, h) = self.config.base_size;
        Ok(((w as f32 * scale) as u32, (h as f32 * scale) as u32))
    }

    fn render_page(&self, page: usize, zoom: ZoomLevel) -> Result<PageImage, BackendError> {
        self.check_page(page)?;
        if self.config.failing_pages.contains(&page) {
            return Err(BackendError::Engine("synthetic render failure".into()));
        }
        if !self.config.render_delay.is_zero() {
            std::thread::sleep(self.config.render_delay);
        }
        let (width, height) = self.page_size(page, zoom)?;
        Ok(PageImage {
            pixels: vec![0xFF; (width * height * 3) as usize],
            width,
            height,
        })
    }

    fn glyphs_for_page(&self, page: usize) -> Result<Vec<Glyph>, BackendError> {
        self.check_page(page)?;
        Ok(self.config.glyph_pages.get(page).cloned().unwrap_or_default())
    }

    fn page_text(&self, page: usize) -> Result<String, BackendError> {
        Ok(self.glyphs_for_page(page)?.iter().map(|g| g.c).collect())
    }
}

/// Lay out a word as one row of adjacent glyph boxes.
#[must_use]
pub fn word_glyphs(word: &str, start_x: f32, y: f32, char_width: f32, height: f32) -> Vec<Glyph> {
    word.chars()
        .enumerate()
        .map(|(i, c)| {
            let x = start_x + i as f32 * char_width;
            Glyph {
                c,
                bbox: Rect::new(x, y, x + char_width, y + height),
            }
        })
        .collect()
}
