//! Two-phase zoom: instant preview, debounced committed re-render
//!
//! Preview changes only rescale already-rendered images; the expensive
//! re-rasterization happens once the level settles. The debounce is an
//! explicit deadline against a monotonic clock, polled by the control
//! thread each tick - no event-loop timer involved.

use std::time::{Duration, Instant};

use log::debug;

use super::{DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM, ZOOM_DEBOUNCE, ZOOM_RERENDER_TOLERANCE, ZOOM_STEP};

/// Zoom percentage; 100 renders at document-unit resolution.
pub type ZoomLevel = u16;

/// How the current level was chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ZoomMode {
    #[default]
    Manual,
    FitWidth,
    FitPage,
}

/// Outcome of a zoom mutation, translated into events and re-render
/// decisions by the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomChange {
    /// Display zoom moved; cached images are rescaled, no new renders.
    Preview(ZoomLevel),
    /// The level settled; re-render eligibility changes.
    Committed(ZoomLevel),
}

/// Arbitrates between instant visual feedback and expensive
/// re-rasterization.
#[derive(Debug)]
pub struct ZoomCoordinator {
    display: ZoomLevel,
    committed: ZoomLevel,
    mode: ZoomMode,
    commit_deadline: Option<Instant>,
    debounce: Duration,
}

impl Default for ZoomCoordinator {
    fn default() -> Self {
        Self::new(ZOOM_DEBOUNCE)
    }
}

impl ZoomCoordinator {
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            display: DEFAULT_ZOOM,
            committed: DEFAULT_ZOOM,
            mode: ZoomMode::Manual,
            commit_deadline: None,
            debounce,
        }
    }

    /// What is currently shown on screen.
    #[must_use]
    pub fn display(&self) -> ZoomLevel {
        self.display
    }

    /// The resolution images were actually rasterized for. Only changes
    /// on commit, never during preview.
    #[must_use]
    pub fn committed(&self) -> ZoomLevel {
        self.committed
    }

    #[must_use]
    pub fn mode(&self) -> ZoomMode {
        self.mode
    }

    /// Instant preview; restarts the commit debounce. No-op at the
    /// current level.
    pub fn preview(&mut self, level: ZoomLevel, now: Instant) -> Option<ZoomChange> {
        let level = clamp_zoom(level);
        if level == self.display {
            return None;
        }
        self.display = level;
        self.mode = ZoomMode::Manual;
        self.commit_deadline = Some(now + self.debounce);
        Some(ZoomChange::Preview(level))
    }

    /// Preview plus immediate commit, bypassing the debounce. Used by
    /// presets and reset, which are discrete deliberate actions.
    pub fn set_immediate(&mut self, level: ZoomLevel) -> Vec<ZoomChange> {
        let level = clamp_zoom(level);
        if level == self.display {
            return Vec::new();
        }
        self.display = level;
        self.mode = ZoomMode::Manual;
        vec![ZoomChange::Preview(level), self.commit()]
    }

    /// Fit-width: the level is computed externally from viewport and base
    /// page dimensions; commits immediately.
    pub fn set_fit_width(&mut self, calculated: ZoomLevel) -> Vec<ZoomChange> {
        self.set_fit(ZoomMode::FitWidth, calculated)
    }

    /// Fit-page counterpart of [`Self::set_fit_width`].
    pub fn set_fit_page(&mut self, calculated: ZoomLevel) -> Vec<ZoomChange> {
        self.set_fit(ZoomMode::FitPage, calculated)
    }

    fn set_fit(&mut self, mode: ZoomMode, calculated: ZoomLevel) -> Vec<ZoomChange> {
        self.mode = mode;
        self.display = clamp_zoom(calculated);
        vec![ZoomChange::Preview(self.display), self.commit()]
    }

    /// Step zoom in by one increment.
    pub fn zoom_in(&mut self, now: Instant) -> Option<ZoomChange> {
        self.preview(self.display.saturating_add(ZOOM_STEP), now)
    }

    /// Step zoom out by one increment.
    pub fn zoom_out(&mut self, now: Instant) -> Option<ZoomChange> {
        self.preview(self.display.saturating_sub(ZOOM_STEP), now)
    }

    /// Back to 100%, committed immediately.
    pub fn reset(&mut self) -> Vec<ZoomChange> {
        self.set_immediate(DEFAULT_ZOOM)
    }

    /// Fires the pending commit once the debounce deadline has passed.
    pub fn poll_commit(&mut self, now: Instant) -> Option<ZoomChange> {
        match self.commit_deadline {
            Some(deadline) if now >= deadline => Some(self.commit()),
            _ => None,
        }
    }

    fn commit(&mut self) -> ZoomChange {
        self.commit_deadline = None;
        self.committed = self.display;
        debug!("zoom committed at {}%", self.committed);
        ZoomChange::Committed(self.committed)
    }
}

/// Clamp to the supported range; one bound for manual and fit zoom alike.
#[must_use]
pub fn clamp_zoom(level: ZoomLevel) -> ZoomLevel {
    level.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Whether an image rasterized at `rendered` is too coarse or too fine
/// for `display`. Within tolerance the cheap affine rescale is accepted.
#[must_use]
pub fn needs_rerender(rendered: ZoomLevel, display: ZoomLevel) -> bool {
    rendered.abs_diff(display) > ZOOM_RERENDER_TOLERANCE
}

/// Scroll offset keeping the same document point under the cursor across
/// a zoom change. `cursor_offset` is the cursor's distance below the
/// viewport top.
#[must_use]
pub fn anchored_scroll(
    old_scroll: f32,
    cursor_offset: f32,
    old_zoom: ZoomLevel,
    new_zoom: ZoomLevel,
) -> f32 {
    let doc_y = old_scroll + cursor_offset;
    doc_y * (f32::from(new_zoom) / f32::from(old_zoom)) - cursor_offset
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> Instant {
        Instant::now()
    }

    #[test]
    fn rerender_tolerance_boundary() {
        assert!(!needs_rerender(100, 105));
        assert!(needs_rerender(100, 106));
        assert!(!needs_rerender(105, 100));
        assert!(needs_rerender(106, 100));
    }

    #[test]
    fn anchored_scroll_keeps_the_cursor_point() {
        let new_scroll = anchored_scroll(100.0, 50.0, 100, 110);
        assert!((new_scroll - 115.0).abs() < 1e-4);
    }

    #[test]
    fn preview_clamps_and_does_not_commit() {
        let now = t0();
        let mut zoom = ZoomCoordinator::default();

        assert_eq!(zoom.preview(1000, now), Some(ZoomChange::Preview(400)));
        assert_eq!(zoom.display(), 400);
        assert_eq!(zoom.committed(), 100);

        assert_eq!(zoom.preview(10, now), Some(ZoomChange::Preview(50)));
    }

    #[test]
    fn preview_at_current_level_is_a_no_op() {
        let now = t0();
        let mut zoom = ZoomCoordinator::default();
        assert!(zoom.preview(100, now).is_none());
    }

    #[test]
    fn debounce_fires_only_after_the_deadline() {
        let now = t0();
        let mut zoom = ZoomCoordinator::new(Duration::from_millis(300));

        zoom.preview(150, now);
        assert!(zoom.poll_commit(now + Duration::from_millis(299)).is_none());
        assert_eq!(
            zoom.poll_commit(now + Duration::from_millis(300)),
            Some(ZoomChange::Committed(150))
        );
        assert_eq!(zoom.committed(), 150);
        // The deadline is consumed.
        assert!(zoom.poll_commit(now + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn a_new_preview_restarts_the_debounce() {
        let now = t0();
        let mut zoom = ZoomCoordinator::new(Duration::from_millis(300));

        zoom.preview(150, now);
        zoom.preview(160, now + Duration::from_millis(200));
        assert!(zoom.poll_commit(now + Duration::from_millis(300)).is_none());
        assert_eq!(
            zoom.poll_commit(now + Duration::from_millis(500)),
            Some(ZoomChange::Committed(160))
        );
    }

    #[test]
    fn fit_modes_commit_immediately() {
        let mut zoom = ZoomCoordinator::default();
        let changes = zoom.set_fit_width(200);
        assert_eq!(
            changes,
            vec![ZoomChange::Preview(200), ZoomChange::Committed(200)]
        );
        assert_eq!(zoom.mode(), ZoomMode::FitWidth);

        let changes = zoom.set_fit_page(30);
        assert_eq!(
            changes,
            vec![ZoomChange::Preview(50), ZoomChange::Committed(50)]
        );
        assert_eq!(zoom.mode(), ZoomMode::FitPage);
    }

    #[test]
    fn manual_preview_clears_fit_mode() {
        let now = t0();
        let mut zoom = ZoomCoordinator::default();
        zoom.set_fit_width(200);
        zoom.preview(150, now);
        assert_eq!(zoom.mode(), ZoomMode::Manual);
    }

    #[test]
    fn steps_move_by_the_zoom_step() {
        let now = t0();
        let mut zoom = ZoomCoordinator::default();
        zoom.zoom_in(now);
        assert_eq!(zoom.display(), 110);
        zoom.zoom_out(now);
        zoom.zoom_out(now);
        assert_eq!(zoom.display(), 90);
    }

    #[test]
    fn reset_commits_without_debounce() {
        let now = t0();
        let mut zoom = ZoomCoordinator::default();
        zoom.preview(200, now);
        let changes = zoom.reset();
        assert_eq!(
            changes,
            vec![ZoomChange::Preview(100), ZoomChange::Committed(100)]
        );
        assert_eq!(zoom.committed(), 100);
        // Pending debounce from the preview was superseded by the commit.
        assert!(zoom.poll_commit(now + Duration::from_secs(1)).is_none());
    }
}
