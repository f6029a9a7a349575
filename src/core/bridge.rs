//! # Streaming Fetch Bridge
//!
//! Turns a blocking "fetch pages until the cursor runs out" loop into batches
//! the UI loop can pick up at its own pace.
//!
//! ```text
//!   worker thread                       UI loop
//!   ─────────────                       ───────
//!   fetch(cursor) ──► [ bounded queue ] ──► BridgeCursor::next(50ms)
//!   fetch(cursor) ──►   (100 pages)          ├─ Batch(entries)
//!   ...                                      ├─ Pending   (nothing yet, try again)
//!   close / error ──►                        ├─ Done      (queue closed)
//!                                            └─ Failed    (last message)
//! ```
//!
//! One worker per bridge. The worker owns the only sender, so once it
//! returns the queue is closed and nothing else can be written. Dropping the
//! [`BridgeCursor`] closes the receiving end; the worker notices on its next
//! send and stops fetching.

use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::core::model::{Cursor, Page};
use crate::service::{ServiceError, is_exhausted};

pub const DEFAULT_QUEUE_PAGES: usize = 100;
pub const DEFAULT_MAX_ITEMS: usize = 20_000;
pub const DEFAULT_PULL_WAIT: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Pages buffered between worker and consumer.
    pub queue_pages: usize,
    /// Total items delivered before the worker stops on its own.
    pub max_items: usize,
    /// How long one [`BridgeCursor::next`] call waits before yielding.
    pub pull_wait: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            queue_pages: DEFAULT_QUEUE_PAGES,
            max_items: DEFAULT_MAX_ITEMS,
            pull_wait: DEFAULT_PULL_WAIT,
        }
    }
}

enum Envelope<T> {
    Batch(Vec<T>),
    Failed(ServiceError),
}

/// Result of resuming a [`BridgeCursor`].
#[derive(Debug, PartialEq)]
pub enum Pull<T> {
    /// A non-empty page.
    Batch(Vec<T>),
    /// Nothing arrived within the wait. Call again later.
    Pending,
    /// The worker finished and the queue is drained.
    Done,
    /// The enumeration failed. Nothing follows.
    Failed(ServiceError),
}

/// Consumer half of a bridge.
///
/// This is the continuation: each call to [`next`](Self::next) resumes the
/// enumeration where the previous one left off. Pages are taken off the
/// queue exactly once.
pub struct BridgeCursor<T> {
    label: String,
    rx: Receiver<Envelope<T>>,
    received: usize,
    finished: bool,
}

impl<T> fmt::Debug for BridgeCursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeCursor")
            .field("label", &self.label)
            .field("received", &self.received)
            .field("finished", &self.finished)
            .finish()
    }
}

impl<T> BridgeCursor<T> {
    /// Wait up to `wait` for the next page.
    pub fn next(&mut self, wait: Duration) -> Pull<T> {
        if self.finished {
            return Pull::Done;
        }
        match self.rx.recv_timeout(wait) {
            Ok(envelope) => self.accept(envelope),
            Err(RecvTimeoutError::Timeout) => Pull::Pending,
            Err(RecvTimeoutError::Disconnected) => self.finish(),
        }
    }

    /// Block until the next page, the end, or an error.
    pub fn next_blocking(&mut self) -> Pull<T> {
        if self.finished {
            return Pull::Done;
        }
        match self.rx.recv() {
            Ok(envelope) => self.accept(envelope),
            Err(_) => self.finish(),
        }
    }

    /// Items handed out so far.
    pub fn received(&self) -> usize {
        self.received
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn accept(&mut self, envelope: Envelope<T>) -> Pull<T> {
        match envelope {
            Envelope::Batch(items) => {
                self.received += items.len();
                Pull::Batch(items)
            }
            Envelope::Failed(e) => {
                self.finished = true;
                Pull::Failed(e)
            }
        }
    }

    fn finish(&mut self) -> Pull<T> {
        debug!("Bridge {} drained after {} items", self.label, self.received);
        self.finished = true;
        Pull::Done
    }
}

/// Start a worker thread running `fetch` until the cursor is exhausted, the
/// item cap is reached, the consumer goes away, or a call fails.
pub fn spawn<T, F>(
    label: impl Into<String>,
    settings: &BridgeSettings,
    fetch: F,
) -> Result<BridgeCursor<T>, ServiceError>
where
    T: Send + 'static,
    F: FnMut(Option<&Cursor>) -> Result<Page<T>, ServiceError> + Send + 'static,
{
    let label = label.into();
    let (tx, rx) = mpsc::sync_channel(settings.queue_pages.max(1));
    let max_items = settings.max_items;
    let worker_label = label.clone();
    thread::Builder::new()
        .name("bridge-worker".to_string())
        .spawn(move || run_worker(&worker_label, tx, max_items, fetch))
        .map_err(|e| ServiceError::Internal(format!("failed to start fetch worker: {e}")))?;
    info!("Bridge {} started (cap {})", label, max_items);
    Ok(BridgeCursor {
        label,
        rx,
        received: 0,
        finished: false,
    })
}

fn run_worker<T, F>(label: &str, tx: SyncSender<Envelope<T>>, max_items: usize, mut fetch: F)
where
    F: FnMut(Option<&Cursor>) -> Result<Page<T>, ServiceError>,
{
    let mut cursor: Option<Cursor> = None;
    let mut delivered = 0usize;
    let mut pages = 0usize;
    loop {
        let Page { mut items, next } = match fetch(cursor.as_ref()) {
            Ok(page) => page,
            Err(e) => {
                warn!("Bridge {} failed after {} pages: {}", label, pages, e);
                let _ = tx.send(Envelope::Failed(e));
                return;
            }
        };
        pages += 1;

        let remaining = max_items.saturating_sub(delivered);
        items.truncate(remaining);
        if !items.is_empty() {
            delivered += items.len();
            if tx.send(Envelope::Batch(items)).is_err() {
                debug!("Bridge {} consumer dropped, stopping", label);
                return;
            }
        }

        if delivered >= max_items {
            info!("Bridge {} reached its cap of {} items", label, max_items);
            return;
        }
        if is_exhausted(cursor.as_ref(), next.as_ref()) {
            debug!("Bridge {} exhausted after {} pages", label, pages);
            return;
        }
        cursor = next;
    }
}
