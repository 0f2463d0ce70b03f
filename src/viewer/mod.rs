//! Viewport virtualization and text-selection engine
//!
//! The core of the viewer: only pages near the visible window are
//! rendered, a bounded recency cache caps image memory, zoom previews
//! instantly and re-rasterizes after a debounce, and pointer gestures
//! are mapped onto zoom-independent glyph geometry.

pub mod arena;
pub mod cache;
pub mod controller;
pub mod events;
pub mod geometry;
pub mod glyphs;
pub mod highlight;
pub mod request;
pub mod scheduler;
pub mod selection;
pub mod worker;
pub mod zoom;

use std::time::Duration;

/// Rendered pages kept resident by the cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 12;
/// Pages rendered beyond the visible range in each scroll direction.
pub const DEFAULT_LOOKAHEAD: usize = 3;
/// Render worker threads.
pub const DEFAULT_RENDER_WORKERS: usize = 2;

pub const MIN_ZOOM: u16 = 50;
pub const MAX_ZOOM: u16 = 400;
pub const DEFAULT_ZOOM: u16 = 100;
/// Manual zoom step per in/out action, percentage points.
pub const ZOOM_STEP: u16 = 10;
/// Rendered-vs-display delta beyond which a page is re-rasterized.
pub const ZOOM_RERENDER_TOLERANCE: u16 = 5;
/// Quiet period after the last preview before a commit fires.
pub const ZOOM_DEBOUNCE: Duration = Duration::from_millis(300);

/// Snapping radius for glyph hit-testing, screen pixels at any zoom.
pub const MAGNETIC_THRESHOLD_PX: f32 = 15.0;
/// Manhattan distance a press must travel before a drag starts.
pub const DRAG_THRESHOLD_PX: f32 = 10.0;
/// Horizontal gap treated as a word boundary, document units.
pub const WORD_SPACE_THRESHOLD: f32 = 4.0;
/// Top-edge delta treated as a line break, document units.
pub const WORD_LINE_THRESHOLD: f32 = 5.0;

/// Outer margin around the page stack, screen pixels.
pub const PAGE_MARGIN_PX: f32 = 20.0;
/// Vertical spacing between consecutive pages.
pub const PAGE_SPACING_PX: f32 = 10.0;

pub use arena::{PageArena, PageSlot, PageState};
pub use cache::PageCache;
pub use controller::ViewportController;
pub use events::ViewerEvent;
pub use geometry::{Point, Rect};
pub use glyphs::{Glyph, GlyphIndex};
pub use request::{RenderRequest, RenderResponse, RequestId};
pub use scheduler::{RenderScheduler, RenderWindow, SchedulePlan};
pub use selection::SelectionEngine;
pub use worker::RenderPool;
pub use zoom::{ZoomChange, ZoomCoordinator, ZoomLevel, ZoomMode};
