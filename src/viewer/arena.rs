//! Single arena of per-page render state
//!
//! All mutable page state lives here, indexed by page number. The cache
//! and the scheduler are policies over this arena and hold no page
//! state of their own.

use std::sync::Arc;

use crate::backend::PageImage;

use super::request::RequestId;
use super::zoom::ZoomLevel;

/// Render lifecycle of one page. Exactly one state per page at any time.
#[derive(Clone, Debug, Default)]
pub enum PageState {
    #[default]
    Unloaded,

    /// A render request is in flight.
    Pending { id: RequestId, zoom: ZoomLevel },

    /// Rasterized image resident in memory. The arena is the sole owner
    /// of the buffer; eviction or zoom invalidation drops it.
    Loaded {
        image: Arc<PageImage>,
        rendered_zoom: ZoomLevel,
    },
}

impl PageState {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// One page's slot: immutable base size plus current render state.
#[derive(Clone, Debug)]
pub struct PageSlot {
    /// Size in document units, established once at load time.
    pub base_size: (u32, u32),
    pub state: PageState,
}

/// Per-page render state for the whole document.
#[derive(Debug, Default)]
pub struct PageArena {
    slots: Vec<PageSlot>,
}

impl PageArena {
    #[must_use]
    pub fn new(base_sizes: Vec<(u32, u32)>) -> Self {
        Self {
            slots: base_sizes
                .into_iter()
                .map(|base_size| PageSlot {
                    base_size,
                    state: PageState::Unloaded,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn base_size(&self, page: usize) -> Option<(u32, u32)> {
        self.slots.get(page).map(|slot| slot.base_size)
    }

    #[must_use]
    pub fn state(&self, page: usize) -> Option<&PageState> {
        self.slots.get(page).map(|slot| &slot.state)
    }

    pub fn set_state(&mut self, page: usize, state: PageState) {
        if let Some(slot) = self.slots.get_mut(page) {
            slot.state = state;
        }
    }

    /// Reset a page to `Unloaded`, dropping its image if loaded.
    pub fn unload(&mut self, page: usize) {
        self.set_state(page, PageState::Unloaded);
    }

    #[must_use]
    pub fn image(&self, page: usize) -> Option<Arc<PageImage>> {
        match self.state(page)? {
            PageState::Loaded { image, .. } => Some(Arc::clone(image)),
            _ => None,
        }
    }

    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|s| s.state.is_loaded()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> Arc<PageImage> {
        Arc::new(PageImage {
            pixels: vec![0; 12],
            width: 2,
            height: 2,
        })
    }

    #[test]
    fn new_pages_start_unloaded() {
        let arena = PageArena::new(vec![(600, 800); 3]);
        assert_eq!(arena.page_count(), 3);
        for page in 0..3 {
            assert!(matches!(arena.state(page), Some(PageState::Unloaded)));
        }
    }

    #[test]
    fn unload_drops_the_image() {
        let mut arena = PageArena::new(vec![(600, 800)]);
        arena.set_state(
            0,
            PageState::Loaded {
                image: image(),
                rendered_zoom: 100,
            },
        );
        assert!(arena.image(0).is_some());
        assert_eq!(arena.loaded_count(), 1);

        arena.unload(0);
        assert!(arena.image(0).is_none());
        assert_eq!(arena.loaded_count(), 0);
    }

    #[test]
    fn out_of_range_access_is_none() {
        let mut arena = PageArena::new(vec![(600, 800)]);
        assert!(arena.state(5).is_none());
        assert!(arena.base_size(5).is_none());
        arena.unload(5);
    }
}
