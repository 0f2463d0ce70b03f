//! Async lookup coordination: one worker, cancel-and-replace
//!
//! Dictionary lookups may block on slow storage, so they run on a single
//! worker thread. A new request supersedes any in-flight one; superseded
//! results never reach the caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::{Definition, DictionaryBackend};

/// Result of one lookup request.
#[derive(Clone, Debug)]
pub enum LookupOutcome {
    Found(Definition),

    /// The backend answered and has no entry. Not an error.
    NotFound { term: String },

    /// Backend failure; non-fatal, surfaced as a message.
    Failed { term: String, reason: String },
}

struct LookupRequest {
    generation: u64,
    term: String,
}

/// Coordinates dictionary lookups off the control thread.
pub struct LookupService {
    request_tx: Sender<LookupRequest>,
    response_rx: Receiver<(u64, LookupOutcome)>,
    generation: Arc<AtomicU64>,
}

impl LookupService {
    /// Spawn the worker thread. It exits when the service is dropped.
    #[must_use]
    pub fn spawn(backend: impl DictionaryBackend) -> Self {
        let (request_tx, request_rx) = flume::unbounded::<LookupRequest>();
        let (response_tx, response_rx) = flume::unbounded();
        let generation = Arc::new(AtomicU64::new(0));
        let latest = Arc::clone(&generation);

        std::thread::spawn(move || {
            for request in request_rx.iter() {
                if latest.load(Ordering::SeqCst) != request.generation {
                    debug!("lookup superseded before start: {:?}", request.term);
                    continue;
                }

                let outcome = match backend.lookup(&request.term) {
                    Ok(Some(definition)) => LookupOutcome::Found(definition),
                    Ok(None) => LookupOutcome::NotFound {
                        term: request.term.clone(),
                    },
                    Err(error) => {
                        warn!("lookup failed for {:?}: {error}", request.term);
                        LookupOutcome::Failed {
                            term: request.term.clone(),
                            reason: error.to_string(),
                        }
                    }
                };

                if latest.load(Ordering::SeqCst) == request.generation {
                    let _ = response_tx.send((request.generation, outcome));
                }
            }
        });

        Self {
            request_tx,
            response_rx,
            generation,
        }
    }

    /// Start a lookup, superseding any in-flight one. Blank terms are
    /// ignored.
    pub fn lookup(&self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            return;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.request_tx.send(LookupRequest {
            generation,
            term: term.to_string(),
        });
    }

    /// Drain completed outcomes. Results superseded after completion are
    /// dropped here as well, so only the latest request's answer is seen.
    #[must_use]
    pub fn poll(&self) -> Vec<LookupOutcome> {
        let current = self.generation.load(Ordering::SeqCst);
        self.response_rx
            .try_iter()
            .filter(|(generation, _)| *generation == current)
            .map(|(_, outcome)| outcome)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::super::{DictError, MiniDictionary, Sense};
    use super::*;

    struct FailingDictionary;

    impl DictionaryBackend for FailingDictionary {
        fn lookup(&self, _term: &str) -> Result<Option<Definition>, DictError> {
            Err(DictError::Backend("storage unavailable".to_string()))
        }
    }

    fn wait_for_outcome(service: &LookupService) -> LookupOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = service.poll().pop() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "no lookup outcome in time");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn found_and_not_found_are_distinct() {
        let mut dict = MiniDictionary::new();
        dict.insert(Definition {
            word: "viewport".to_string(),
            phonetic: None,
            senses: vec![Sense {
                part_of_speech: "noun".to_string(),
                text: "The visible region of a document.".to_string(),
            }],
        });
        let service = LookupService::spawn(dict);

        service.lookup("viewport");
        assert!(matches!(wait_for_outcome(&service), LookupOutcome::Found(d) if d.word == "viewport"));

        service.lookup("nonexistent");
        assert!(matches!(
            wait_for_outcome(&service),
            LookupOutcome::NotFound { term } if term == "nonexistent"
        ));
    }

    #[test]
    fn backend_failure_is_surfaced_not_fatal() {
        let service = LookupService::spawn(FailingDictionary);
        service.lookup("anything");
        assert!(matches!(
            wait_for_outcome(&service),
            LookupOutcome::Failed { .. }
        ));
    }

    #[test]
    fn blank_terms_are_ignored() {
        let service = LookupService::spawn(MiniDictionary::new());
        service.lookup("   ");
        std::thread::sleep(Duration::from_millis(50));
        assert!(service.poll().is_empty());
    }

    #[test]
    fn a_newer_request_supersedes_an_older_one() {
        let mut dict = MiniDictionary::new();
        for word in ["first", "second"] {
            dict.insert(Definition {
                word: word.to_string(),
                phonetic: None,
                senses: Vec::new(),
            });
        }
        let service = LookupService::spawn(dict);

        service.lookup("first");
        service.lookup("second");

        // Only the latest request's outcome may surface.
        let outcome = wait_for_outcome(&service);
        assert!(matches!(outcome, LookupOutcome::Found(d) if d.word == "second"));
    }
}
