//! Visibility-driven render scheduling
//!
//! The scheduler decides which pages must be rendered and which in-flight
//! work to retire. It only plans; the controller executes the plan on the
//! control thread, so a recompute either fully commits its diff or is a
//! no-op.

use log::debug;

use super::arena::{PageArena, PageState};
use super::request::RequestId;
use super::zoom::{needs_rerender, ZoomLevel};

/// Inclusive range of pages eligible for loading: the visible range
/// expanded by the lookahead margin, clipped to the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderWindow {
    pub start: usize,
    pub end: usize,
}

impl RenderWindow {
    /// `[max(0, min_visible - lookahead), min(page_count - 1, max_visible + lookahead)]`
    #[must_use]
    pub fn compute(
        visible: (usize, usize),
        lookahead: usize,
        page_count: usize,
    ) -> Option<Self> {
        if page_count == 0 {
            return None;
        }
        let (min_visible, max_visible) = visible;
        Some(Self {
            start: min_visible.saturating_sub(lookahead),
            end: (max_visible + lookahead).min(page_count - 1),
        })
    }

    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        page >= self.start && page <= self.end
    }
}

/// One recompute's decisions, applied atomically by the controller.
#[derive(Debug, Default)]
pub struct SchedulePlan {
    /// In-flight requests for pages that left the window.
    pub cancel: Vec<(usize, RequestId)>,
    /// Pages to request, nearest-to-center first.
    pub dispatch: Vec<usize>,
}

impl SchedulePlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cancel.is_empty() && self.dispatch.is_empty()
    }
}

/// Computes the render window from scroll state and diffs it against the
/// previous one.
#[derive(Debug)]
pub struct RenderScheduler {
    lookahead: usize,
    window: Option<RenderWindow>,
}

impl RenderScheduler {
    #[must_use]
    pub fn new(lookahead: usize) -> Self {
        Self {
            lookahead,
            window: None,
        }
    }

    #[must_use]
    pub fn window(&self) -> Option<RenderWindow> {
        self.window
    }

    /// Diff the window implied by `visible` against the previous one.
    ///
    /// A page already pending or loaded at the right zoom is never
    /// re-requested; recomputing with unchanged inputs yields an empty
    /// plan.
    pub fn recompute_window(
        &mut self,
        visible: (usize, usize),
        zoom: ZoomLevel,
        arena: &PageArena,
    ) -> SchedulePlan {
        let Some(window) = RenderWindow::compute(visible, self.lookahead, arena.page_count())
        else {
            self.window = None;
            return SchedulePlan::default();
        };
        let previous = self.window.replace(window);

        let mut plan = SchedulePlan::default();

        // Retire in-flight work for pages that fell out of the window.
        if let Some(prev) = previous {
            for page in prev.start..=prev.end {
                if window.contains(page) {
                    continue;
                }
                if let Some(PageState::Pending { id, .. }) = arena.state(page) {
                    plan.cancel.push((page, *id));
                }
            }
        }

        // Candidates: never rendered, superseded in flight, or stale for
        // the current zoom.
        for page in window.start..=window.end {
            let candidate = match arena.state(page) {
                Some(PageState::Unloaded) => true,
                Some(PageState::Pending { zoom: requested, .. }) => *requested != zoom,
                Some(PageState::Loaded { rendered_zoom, .. }) => {
                    needs_rerender(*rendered_zoom, zoom)
                }
                None => false,
            };
            if candidate {
                plan.dispatch.push(page);
            }
        }

        // Nearest-to-center first so visible content lands before the
        // lookahead margin; ties break toward the lower index.
        let center = (visible.0 + visible.1) as f32 / 2.0;
        plan.dispatch.sort_by(|a, b| {
            let da = (*a as f32 - center).abs();
            let db = (*b as f32 - center).abs();
            da.partial_cmp(&db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(b))
        });

        if !plan.is_empty() {
            debug!(
                "render window {}..={}: {} to dispatch, {} to cancel",
                window.start,
                window.end,
                plan.dispatch.len(),
                plan.cancel.len()
            );
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(pages: usize) -> PageArena {
        PageArena::new(vec![(600, 800); pages])
    }

    #[test]
    fn window_is_visible_range_plus_lookahead() {
        let window = RenderWindow::compute((5, 7), 3, 100).unwrap();
        assert_eq!(window, RenderWindow { start: 2, end: 10 });
    }

    #[test]
    fn window_clips_to_document_bounds() {
        let window = RenderWindow::compute((1, 2), 3, 4).unwrap();
        assert_eq!(window, RenderWindow { start: 0, end: 3 });

        assert!(RenderWindow::compute((0, 0), 3, 0).is_none());
    }

    #[test]
    fn unloaded_pages_in_window_are_dispatched_center_first() {
        let arena = arena(20);
        let mut scheduler = RenderScheduler::new(2);

        let plan = scheduler.recompute_window((5, 7), 100, &arena);
        assert!(plan.cancel.is_empty());
        // Center is 6; ties break toward the lower index.
        assert_eq!(plan.dispatch, vec![6, 5, 7, 4, 8, 3, 9]);
    }

    #[test]
    fn recompute_is_idempotent_once_pages_are_in_flight() {
        let mut arena = arena(20);
        let mut scheduler = RenderScheduler::new(2);

        let plan = scheduler.recompute_window((5, 7), 100, &arena);
        for (i, page) in plan.dispatch.iter().enumerate() {
            arena.set_state(
                *page,
                PageState::Pending {
                    id: RequestId::new(i as u64 + 1),
                    zoom: 100,
                },
            );
        }

        let again = scheduler.recompute_window((5, 7), 100, &arena);
        assert!(again.is_empty());
    }

    #[test]
    fn pending_pages_leaving_the_window_are_cancelled() {
        let mut arena = arena(40);
        let mut scheduler = RenderScheduler::new(1);

        let plan = scheduler.recompute_window((5, 6), 100, &arena);
        assert_eq!(plan.dispatch, vec![5, 6, 4, 7]);
        for page in plan.dispatch {
            arena.set_state(
                page,
                PageState::Pending {
                    id: RequestId::new(page as u64),
                    zoom: 100,
                },
            );
        }

        let moved = scheduler.recompute_window((20, 21), 100, &arena);
        let mut cancelled: Vec<usize> = moved.cancel.iter().map(|(page, _)| *page).collect();
        cancelled.sort_unstable();
        assert_eq!(cancelled, vec![4, 5, 6, 7]);
        assert_eq!(moved.dispatch, vec![20, 21, 19, 22]);
    }

    #[test]
    fn loaded_pages_at_stale_zoom_are_recandidated() {
        let mut arena = arena(10);
        let mut scheduler = RenderScheduler::new(0);

        arena.set_state(
            2,
            PageState::Loaded {
                image: std::sync::Arc::new(crate::backend::PageImage {
                    pixels: vec![0; 3],
                    width: 1,
                    height: 1,
                }),
                rendered_zoom: 100,
            },
        );

        // Within tolerance: nothing to do for page 2.
        let plan = scheduler.recompute_window((2, 2), 104, &arena);
        assert!(plan.dispatch.is_empty());

        // Out of tolerance: re-render.
        let plan = scheduler.recompute_window((2, 2), 150, &arena);
        assert_eq!(plan.dispatch, vec![2]);
    }

    #[test]
    fn pending_at_superseded_zoom_is_redispatched() {
        let mut arena = arena(10);
        let mut scheduler = RenderScheduler::new(0);

        arena.set_state(
            3,
            PageState::Pending {
                id: RequestId::new(7),
                zoom: 100,
            },
        );

        let plan = scheduler.recompute_window((3, 3), 200, &arena);
        assert_eq!(plan.dispatch, vec![3]);
    }
}
