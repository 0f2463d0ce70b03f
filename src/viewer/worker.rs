//! Render worker pool - rasterization off the control thread
//!
//! Page rasterization is the only operation allowed to block; it runs on
//! a small pool of worker threads fed over a shared queue. Cancellation
//! is cooperative: a token set is checked before work starts, and a
//! result that slips through anyway is discarded by the control thread.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use flume::{Receiver, Sender};
use log::{debug, error};

use crate::backend::DocumentBackend;

use super::request::{RenderRequest, RenderResponse, RequestId};
use super::zoom::ZoomLevel;

/// Bounded pool of render workers fed over a shared MPMC queue.
pub struct RenderPool {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    cancels: Arc<Mutex<HashSet<RequestId>>>,
    next_request_id: u64,
    num_workers: usize,
}

impl RenderPool {
    /// Spawn `num_workers` threads, each opening its own document handle.
    #[must_use]
    pub fn spawn(backend: Arc<dyn DocumentBackend>, doc_path: &Path, num_workers: usize) -> Self {
        // Flume gives MPMC channels: multiple workers pull from one
        // shared request queue, which std/tokio mpsc receivers cannot do.
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();
        let cancels = Arc::new(Mutex::new(HashSet::new()));

        for _ in 0..num_workers.max(1) {
            let backend = Arc::clone(&backend);
            let path: PathBuf = doc_path.to_path_buf();
            let rx = request_rx.clone();
            let tx = response_tx.clone();
            let cancels = Arc::clone(&cancels);

            std::thread::spawn(move || {
                render_worker(backend.as_ref(), &path, &rx, &tx, &cancels);
            });
        }

        Self {
            request_tx,
            response_rx,
            cancels,
            next_request_id: 1,
            num_workers: num_workers.max(1),
        }
    }

    /// Queue a render. The returned id must match the page's in-flight
    /// state when the result arrives, or the result is discarded.
    pub fn submit(&mut self, page: usize, zoom: ZoomLevel) -> RequestId {
        let id = self.next_id();
        let _ = self.request_tx.send(RenderRequest::Page { id, page, zoom });
        id
    }

    /// Mark a request cancelled. Work already started may still run to
    /// completion; its result is then ignored by the control thread.
    pub fn cancel(&self, id: RequestId) {
        self.cancels
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(id);
    }

    /// Drop a cancellation token for a request that can no longer run.
    pub fn forget_cancel(&self, id: RequestId) {
        self.cancels
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&id);
    }

    /// Non-blocking drain of completed responses, in completion order.
    #[must_use]
    pub fn poll(&self) -> Vec<RenderResponse> {
        self.response_rx.try_iter().collect()
    }

    /// Best-effort shutdown: workers are told to stop, outstanding work
    /// is not waited for.
    pub fn shutdown(&self) {
        for _ in 0..self.num_workers {
            let _ = self.request_tx.send(RenderRequest::Shutdown);
        }
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for RenderPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker loop - runs on a dedicated thread.
fn render_worker(
    backend: &dyn DocumentBackend,
    doc_path: &Path,
    requests: &Receiver<RenderRequest>,
    responses: &Sender<RenderResponse>,
    cancels: &Mutex<HashSet<RequestId>>,
) {
    let handle = match backend.open(doc_path) {
        Ok(handle) => handle,
        Err(error) => {
            error!(
                "render worker failed to open {}: {error}",
                doc_path.display()
            );
            let _ = responses.send(RenderResponse::Error {
                id: RequestId::new(0),
                page: 0,
                error,
            });
            return;
        }
    };

    for request in requests.iter() {
        match request {
            RenderRequest::Page { id, page, zoom } => {
                let cancelled = cancels
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .remove(&id);
                if cancelled {
                    debug!("render request {id:?} for page {page} cancelled before start");
                    let _ = responses.send(RenderResponse::Cancelled(id));
                    continue;
                }

                match handle.render_page(page, zoom) {
                    Ok(image) => {
                        let _ = responses.send(RenderResponse::Page {
                            id,
                            page,
                            zoom,
                            image,
                        });
                    }
                    Err(error) => {
                        let _ = responses.send(RenderResponse::Error { id, page, error });
                    }
                }
            }

            RenderRequest::Shutdown => break,
        }
    }
}
