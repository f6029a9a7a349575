//! # `entries`: print or tail streams
//!
//! ```text
//!  refs ──► dispatcher ──spawn──► worker (one per stream) ─┐
//!                                 worker                  ─┼─► mpsc ──► writer ──► stdout
//!                                 worker                  ─┘
//! ```
//!
//! Workers page through their stream on the blocking pool and push rendered
//! lines into one bounded channel. A single writer owns the output, so
//! lines never interleave. Order is kept within a stream, not across them.
//!
//! Without `--follow` a stream is read from its earliest event until the
//! cursor repeats. With `--follow` reading starts at the newest page and
//! never ends; an unchanged cursor means "nothing new yet" and the worker
//! sleeps on the [`PollState`] cadence. A missing cursor switches the worker
//! to polling for events newer than the last one printed. Transient errors
//! are retried on the same cadence; any other error ends the worker.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::style::Color;
use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cli::{CliError, input_lines, render};
use crate::core::backoff::{PollOutcome, PollState};
use crate::core::model::{Cursor, Page};
use crate::core::reference::ItemReference;
use crate::service::{LogService, ServiceError, is_exhausted};

/// Lines buffered between the stream workers and the writer.
const OUTPUT_QUEUE: usize = 10_000;

#[derive(Debug, Clone)]
pub struct EntriesOptions {
    pub follow: bool,
    pub json: bool,
    pub no_color: bool,
    /// Cadence template; each stream gets its own copy.
    pub poll: PollState,
}

/// Print every stream named in `references` (one per line).
///
/// Streams start as their reference is read, so an endless upstream pipe
/// keeps adding workers. Returns the writer once every worker finished, or
/// the first worker error after all of them stopped.
pub async fn entries<R, W>(
    service: Arc<dyn LogService>,
    references: R,
    options: EntriesOptions,
    out: W,
) -> Result<W, CliError>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<String>(OUTPUT_QUEUE);
    let writer = tokio::task::spawn_blocking(move || write_lines(rx, out));

    let runtime = tokio::runtime::Handle::current();
    let dispatch_options = options.clone();
    let dispatcher = tokio::task::spawn_blocking(move || {
        let mut workers: Vec<JoinHandle<Result<(), ServiceError>>> = Vec::new();
        for (index, line) in input_lines(references).enumerate() {
            let target: ItemReference = line?.parse()?;
            let color = render::source_color(index, dispatch_options.no_color);
            let service = Arc::clone(&service);
            let tx = tx.clone();
            let options = dispatch_options.clone();
            info!("Reading {} (follow: {})", target, options.follow);
            workers.push(
                runtime.spawn_blocking(move || stream_entries(&*service, &target, &options, color, &tx)),
            );
        }
        Ok::<_, CliError>(workers)
    });

    let workers = join_task(dispatcher).await??;
    let results = join_all(workers).await;
    let writer = join_task(writer).await;

    let mut first_error = None;
    for result in results {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("Stream worker failed: {}", e);
                first_error.get_or_insert(CliError::Service(e));
            }
            Err(e) => {
                first_error.get_or_insert(CliError::Service(ServiceError::Internal(e.to_string())));
            }
        }
    }
    let out = writer??;
    match first_error {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

async fn join_task<T>(handle: JoinHandle<T>) -> Result<T, CliError> {
    handle
        .await
        .map_err(|e| CliError::Service(ServiceError::Internal(format!("task failed: {e}"))))
}

/// Drains the channel until every sender is gone.
fn write_lines<W: Write>(mut rx: mpsc::Receiver<String>, mut out: W) -> Result<W, CliError> {
    while let Some(line) = rx.blocking_recv() {
        writeln!(out, "{line}")?;
        if rx.is_empty() {
            out.flush()?;
        }
    }
    out.flush()?;
    Ok(out)
}

/// Delay before retrying a failed read, or `None` when the error ends the
/// stream. Only transient errors in follow mode are retried, on the same
/// doubling cadence as empty polls.
fn retry_delay(poll: &mut PollState, follow: bool, error: &ServiceError) -> Option<Duration> {
    (follow && error.is_transient()).then(|| poll.advance(PollOutcome::Entries(0)))
}

/// Page through one stream, sending rendered lines to `tx`.
///
/// In follow mode a service that ends the stream without a next token is
/// tailed by timestamp from then on, so delivered events are not read again.
///
/// Returns early without error when the writer has gone away.
fn stream_entries(
    service: &dyn LogService,
    target: &ItemReference,
    options: &EntriesOptions,
    color: Option<Color>,
    tx: &mpsc::Sender<String>,
) -> Result<(), ServiceError> {
    let mut poll = options.poll.clone();
    poll.advance(PollOutcome::First);
    let mut cursor: Option<Cursor> = None;
    let mut tailing = false;
    let mut delivered = 0usize;

    loop {
        let fetched = if tailing {
            let since = poll.last_seen_timestamp.unwrap_or(0);
            service
                .detail_since(&target.collection_id, &target.item_id, since)
                .map(Page::last)
        } else {
            service.detail_page(
                &target.collection_id,
                &target.item_id,
                cursor.as_ref(),
                !options.follow,
            )
        };
        let page = match fetched {
            Ok(page) => page,
            Err(e) => match retry_delay(&mut poll, options.follow, &e) {
                Some(delay) => {
                    warn!("Reading {} failed, retrying in {:?}: {}", target, delay, e);
                    thread::sleep(delay);
                    continue;
                }
                None => return Err(e),
            },
        };

        let delay = poll.record(&page.items);
        for entry in &page.items {
            let line = render::entry_line(entry, options.json, color)
                .map_err(|e| ServiceError::Internal(format!("failed to render event: {e}")))?;
            if tx.blocking_send(line).is_err() {
                debug!("Output closed, stopping {}", target);
                return Ok(());
            }
        }
        delivered += page.items.len();

        if tailing {
            thread::sleep(delay);
            continue;
        }
        if is_exhausted(cursor.as_ref(), page.next.as_ref()) {
            if !options.follow {
                info!("Finished {} after {} events", target, delivered);
                return Ok(());
            }
            if page.next.is_none() {
                debug!("{} has no next token, tailing by timestamp", target);
                tailing = true;
            }
            debug!("No new events in {}, next poll in {:?}", target, delay);
            thread::sleep(delay);
        }
        if page.next.is_some() {
            cursor = page.next;
        }
    }
}
