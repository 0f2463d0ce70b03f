//! Geometry shared by selection and highlighting
//!
//! Glyph boxes and base page sizes live in document units, a
//! zoom-independent space equivalent to the pixel grid at 100% zoom.
//! Pointer positions arrive in screen pixels and are converted before
//! any geometric test.

use super::zoom::ZoomLevel;

/// A point with f32 coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Manhattan distance, used for drag-threshold checks.
    #[must_use]
    pub fn manhattan_to(self, other: Self) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Axis-aligned rectangle: `x0`/`y0` top-left, `x1`/`y1` bottom-right.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Containment test, edges inclusive.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// Convert a screen-space point observed at `zoom` into document units.
#[must_use]
pub fn screen_to_doc(p: Point, zoom: ZoomLevel) -> Point {
    let scale = 100.0 / f32::from(zoom);
    Point::new(p.x * scale, p.y * scale)
}

/// Convert a document-unit rectangle into screen pixels at `zoom`.
#[must_use]
pub fn doc_to_screen_rect(r: Rect, zoom: ZoomLevel) -> Rect {
    let scale = f32::from(zoom) / 100.0;
    Rect::new(r.x0 * scale, r.y0 * scale, r.x1 * scale, r.y1 * scale)
}
