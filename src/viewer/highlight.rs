//! Merging selected glyph boxes into per-line highlight blocks
//!
//! Painting one rectangle per character produces ragged, expensive
//! highlights; instead boxes are grouped into approximate visual lines
//! and unioned left to right into a minimal set of blocks.

use super::geometry::Rect;

/// Vertical bucket size approximating a visual line, screen pixels.
const LINE_BUCKET_PX: f32 = 10.0;
/// Max center-Y distance for two boxes to merge into the same block.
const VERTICAL_ALIGN_PX: f32 = 5.0;
/// Max horizontal gap bridged when unioning adjacent boxes.
const HORIZONTAL_GAP_PX: f32 = 4.0;

/// Collapse per-glyph screen-space boxes into one block per line run.
#[must_use]
pub fn merge_rects(rects: &[Rect]) -> Vec<Rect> {
    if rects.is_empty() {
        return Vec::new();
    }

    let mut sorted = rects.to_vec();
    sorted.sort_by(|a, b| {
        let bucket_a = (a.center().y / LINE_BUCKET_PX) as i64;
        let bucket_b = (b.center().y / LINE_BUCKET_PX) as i64;
        bucket_a
            .cmp(&bucket_b)
            .then(a.x0.partial_cmp(&b.x0).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut merged = Vec::new();
    let mut current = sorted[0];

    for next in sorted.into_iter().skip(1) {
        let aligned = (current.center().y - next.center().y).abs() < VERTICAL_ALIGN_PX;
        let touching = next.x0 < current.x1 + HORIZONTAL_GAP_PX;

        if aligned && touching {
            current = current.union(&next);
        } else {
            merged.push(current);
            current = next;
        }
    }

    merged.push(current);
    merged
}
