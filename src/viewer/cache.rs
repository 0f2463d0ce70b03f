//! Recency policy bounding the number of resident page images

use std::num::NonZeroUsize;

use lru::LruCache;

/// Tracks which pages hold a resident image, in recency order.
///
/// Owns no image data; the page arena does. Eviction happens only as a
/// side effect of `insert`, which keeps the working set implicitly
/// centered on the pages currently scrolled into view.
pub struct PageCache {
    order: LruCache<usize, ()>,
}

impl PageCache {
    /// Create a cache bounding residency to `capacity` pages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            order: LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).expect("1 is non-zero")),
            ),
        }
    }

    /// Record `page` as most recently used.
    ///
    /// Returns the evicted page when the insert pushed the cache over
    /// capacity; the caller must unload that page's slot.
    pub fn insert(&mut self, page: usize) -> Option<usize> {
        match self.order.push(page, ()) {
            Some((evicted, ())) if evicted != page => Some(evicted),
            _ => None,
        }
    }

    /// Promote a resident page without inserting.
    pub fn touch(&mut self, page: usize) {
        let _ = self.order.get(&page);
    }

    pub fn remove(&mut self, page: usize) {
        let _ = self.order.pop(&page);
    }

    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        self.order.contains(&page)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.order.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eviction_follows_first_load_order() {
        let mut cache = PageCache::new(12);
        let mut evicted = Vec::new();

        for page in 0..=14 {
            if let Some(old) = cache.insert(page) {
                evicted.push(old);
            }
        }

        assert_eq!(evicted, vec![0, 1, 2]);
        assert_eq!(cache.len(), 12);
        for page in 3..=14 {
            assert!(cache.contains(page));
        }
        for page in 0..3 {
            assert!(!cache.contains(page));
        }
    }

    #[test]
    fn reinsert_promotes_instead_of_evicting() {
        let mut cache = PageCache::new(2);
        assert!(cache.insert(0).is_none());
        assert!(cache.insert(1).is_none());
        // Re-inserting a resident page must not evict anything.
        assert!(cache.insert(0).is_none());
        // Page 1 is now least recently used.
        assert_eq!(cache.insert(2), Some(1));
        assert!(cache.contains(0));
        assert!(cache.contains(2));
    }

    #[test]
    fn touch_changes_the_victim() {
        let mut cache = PageCache::new(2);
        cache.insert(0);
        cache.insert(1);
        cache.touch(0);
        assert_eq!(cache.insert(2), Some(1));
    }

    #[test]
    fn remove_frees_a_slot() {
        let mut cache = PageCache::new(2);
        cache.insert(0);
        cache.insert(1);
        cache.remove(0);
        assert_eq!(cache.len(), 1);
        assert!(cache.insert(2).is_none());
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let cache = PageCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }
}
