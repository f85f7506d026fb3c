// src/services/debounce.rs
//
// Debounced search text
//
// - `set_raw_text` updates the raw value immediately
// - the debounced value follows once input has been stable for the settle
//   interval; each call cancels the previously scheduled settle
// - only the last value of a burst is ever published
//
// Settling runs on a spawned tokio task, so `set_raw_text` must be called
// from inside a runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub struct DebouncedQuery {
    settle: Duration,
    raw: Mutex<String>,
    debounced: watch::Sender<String>,
    pending: Mutex<Option<CancellationToken>>,
    settled_count: Arc<AtomicU64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DebouncedQuery {
    pub fn new(settle: Duration) -> Self {
        let (debounced, _) = watch::channel(String::new());
        Self {
            settle,
            raw: Mutex::new(String::new()),
            debounced,
            pending: Mutex::new(None),
            settled_count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn settle_interval(&self) -> Duration {
        self.settle
    }

    pub fn raw_text(&self) -> String {
        lock(&self.raw).clone()
    }

    pub fn debounced_text(&self) -> String {
        self.debounced.borrow().clone()
    }

    /// Receiver that observes every published debounced value
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.debounced.subscribe()
    }

    /// Number of debounced updates published so far
    pub fn settled_count(&self) -> u64 {
        self.settled_count.load(Ordering::SeqCst)
    }

    /// Record new input and (re)schedule the settle.
    ///
    /// `on_settle` runs with the settled text after it has been published,
    /// unless a later call or [`cancel`](Self::cancel) supersedes it.
    pub fn set_raw_text<F>(&self, text: impl Into<String>, on_settle: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        let text = text.into();
        *lock(&self.raw) = text.clone();

        let token = CancellationToken::new();
        if let Some(previous) = lock(&self.pending).replace(token.clone()) {
            previous.cancel();
        }

        let settle = self.settle;
        let publisher = self.debounced.clone();
        let settled_count = Arc::clone(&self.settled_count);

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(settle) => {}
            }
            if token.is_cancelled() {
                return;
            }
            publisher.send_replace(text.clone());
            settled_count.fetch_add(1, Ordering::SeqCst);
            // Fired; no longer pending.
            token.cancel();
            log::trace!("Search text settled: {:?}", text);
            on_settle(text);
        });
    }

    /// Publish `text` immediately, cancelling any pending settle
    pub fn settle_now(&self, text: impl Into<String>) {
        let text = text.into();
        self.cancel();
        *lock(&self.raw) = text.clone();
        self.debounced.send_replace(text);
        self.settled_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop any scheduled settle
    pub fn cancel(&self) {
        if let Some(token) = lock(&self.pending).take() {
            token.cancel();
        }
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.pending)
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }
}

impl Drop for DebouncedQuery {
    fn drop(&mut self) {
        self.cancel();
    }
}
