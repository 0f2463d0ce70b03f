//! Typed events the core emits to the embedding shell
//!
//! The core never calls back into UI code: the controller queues these
//! and the shell drains them each turn.

use std::sync::Arc;

use crate::backend::PageImage;

use super::geometry::Rect;
use super::zoom::ZoomLevel;

/// Events crossing the core/shell boundary.
#[derive(Clone, Debug)]
pub enum ViewerEvent {
    /// Page base sizes are known; placeholder layout can be built.
    DocumentLayoutReady(Vec<(u32, u32)>),

    /// A page finished rasterizing.
    PageImageReady {
        page: usize,
        image: Arc<PageImage>,
        rendered_zoom: ZoomLevel,
    },

    /// The document could not be opened; fatal for this document.
    LoadFailed { reason: String },

    /// Display zoom moved; cached images should be rescaled cheaply.
    ZoomPreviewChanged(ZoomLevel),

    /// Zoom settled; stale pages will re-render at full quality.
    ZoomCommitted(ZoomLevel),

    /// Selection text after hyphenation repair; empty when cleared.
    SelectionChanged(String),

    /// Merged highlight blocks in screen pixels for one page.
    SelectionHighlightsChanged { page: usize, rects: Vec<Rect> },
}
