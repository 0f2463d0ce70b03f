//! Document backend interface consumed by the viewer core
//!
//! The engine never touches a document format directly: page geometry,
//! rasterization and glyph extraction go through these traits. Each
//! render worker opens its own handle, so a backend must be shareable
//! across threads while a handle stays on the thread that opened it.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::viewer::glyphs::Glyph;
use crate::viewer::zoom::ZoomLevel;

#[cfg(feature = "pdf")]
pub mod pdf;

/// Faults from a document backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Engine-level failure opening or rasterizing.
    #[error("document engine: {0}")]
    Engine(String),

    #[error("page {0} out of range")]
    PageOutOfRange(usize),

    #[error("document has no pages")]
    EmptyDocument,
}

/// Fatal failure opening a document. No partial state is retained; the
/// session for that document ends here.
#[derive(Debug, thiserror::Error)]
#[error("cannot open {}: {source}", path.display())]
pub struct LoadError {
    pub path: PathBuf,
    #[source]
    pub source: BackendError,
}

/// Raw rendered page image: tightly packed RGB rows.
#[derive(Clone)]
pub struct PageImage {
    /// 3 bytes per pixel: R, G, B.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl fmt::Debug for PageImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Opens documents. Shared by the control thread and every render
/// worker; each opens its own handle.
pub trait DocumentBackend: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>, BackendError>;
}

/// One opened document. Closing is dropping the handle.
pub trait DocumentHandle {
    fn page_count(&self) -> usize;

    /// Page size in device units at `zoom`; the base size is the size at
    /// zoom 100.
    fn page_size(&self, page: usize, zoom: ZoomLevel) -> Result<(u32, u32), BackendError>;

    /// Rasterize one page at one zoom level. May be slow; the viewer
    /// dispatches this to the worker pool.
    fn render_page(&self, page: usize, zoom: ZoomLevel) -> Result<PageImage, BackendError>;

    /// Ordered per-character geometry in document units, reading order.
    fn glyphs_for_page(&self, page: usize) -> Result<Vec<Glyph>, BackendError>;

    /// Plain text of one page.
    fn page_text(&self, page: usize) -> Result<String, BackendError>;
}
