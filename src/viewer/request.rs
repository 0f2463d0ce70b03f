//! Render request and response types

use crate::backend::{BackendError, PageImage};

use super::zoom::ZoomLevel;

/// Unique identifier for render requests.
///
/// A completed render is applied only if its id still matches the page's
/// in-flight request; anything else is discarded as stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to render workers.
#[derive(Debug)]
pub enum RenderRequest {
    /// Rasterize one page at one zoom level.
    Page {
        id: RequestId,
        page: usize,
        zoom: ZoomLevel,
    },

    /// Shutdown the worker.
    Shutdown,
}

/// Response from render workers.
#[derive(Debug)]
pub enum RenderResponse {
    /// Rendered page image.
    Page {
        id: RequestId,
        page: usize,
        zoom: ZoomLevel,
        image: PageImage,
    },

    /// The request consumed its cancellation token before rendering.
    Cancelled(RequestId),

    /// Error during rendering.
    Error {
        id: RequestId,
        page: usize,
        error: BackendError,
    },
}
