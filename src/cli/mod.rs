//! # One-Shot Commands
//!
//! Scriptable subcommands that print one line per record so they compose
//! with pipes:
//!
//! ```text
//! loupe items /app | grep worker | loupe entries -f
//! ```
//!
//! Commands that take identifiers read them one per line from stdin when
//! none is given on the command line. Everything here calls the blocking
//! [`LogService`], so the async entry point runs these on the blocking pool.

pub mod entries;
pub mod render;

use std::fmt;
use std::io::{self, BufRead, Write};
use std::thread;

use log::{debug, info, warn};

use crate::core::backoff::{PollOutcome, PollState};
use crate::core::config::ConfigError;
use crate::core::model::{DetailEntry, ItemSet};
use crate::core::reference::{ItemReference, ReferenceError};
use crate::service::{ErrorKind, LogService, ServiceError, collect_pages};

pub use entries::{EntriesOptions, entries};

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum CliError {
    Service(ServiceError),
    Config(ConfigError),
    Reference(ReferenceError),
    Usage(String),
    Io(io::Error),
}

impl CliError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) | CliError::Reference(_) | CliError::Config(_) => 2,
            CliError::Service(e) => match e.kind() {
                ErrorKind::Authorization => 3,
                ErrorKind::Config => 2,
                ErrorKind::TransientNetwork => 1,
            },
            CliError::Io(_) => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Service(e) => write!(f, "{e}"),
            CliError::Config(e) => write!(f, "{e}"),
            CliError::Reference(e) => write!(f, "invalid reference: {e}"),
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<ReferenceError> for CliError {
    fn from(e: ReferenceError) -> Self {
        CliError::Reference(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Io(io::Error::other(e))
    }
}

/// Non-blank, trimmed lines of `input`.
fn input_lines(input: impl BufRead) -> impl Iterator<Item = io::Result<String>> {
    input
        .lines()
        .map(|line| line.map(|l| l.trim().to_string()))
        .filter(|line| !matches!(line, Ok(l) if l.is_empty()))
}

// ============================================================================
// collections
// ============================================================================

pub fn collections(
    service: &dyn LogService,
    json: bool,
    out: &mut impl Write,
) -> Result<usize, CliError> {
    let collections = collect_pages(None, |cursor| service.list_collections(cursor))?;
    for collection in &collections {
        writeln!(out, "{}", render::collection_line(collection, json)?)?;
    }
    out.flush()?;
    info!("Listed {} log groups", collections.len());
    Ok(collections.len())
}

// ============================================================================
// items
// ============================================================================

pub fn items(
    service: &dyn LogService,
    collection_ids: impl BufRead,
    json: bool,
    out: &mut impl Write,
) -> Result<usize, CliError> {
    let mut printed = 0;
    for collection_id in input_lines(collection_ids) {
        let collection_id = collection_id?;
        let items = collect_pages(None, |cursor| service.list_items(&collection_id, cursor))?;
        for item in &items {
            writeln!(out, "{}", render::item_line(&collection_id, item, json)?)?;
        }
        out.flush()?;
        printed += items.len();
    }
    Ok(printed)
}

/// Re-lists collections and prints only streams not seen before.
pub struct ItemsFollower {
    collection_ids: Vec<String>,
    seen: Vec<ItemSet>,
    poll: PollState,
    json: bool,
}

impl ItemsFollower {
    pub fn new(collection_ids: Vec<String>, poll: PollState, json: bool) -> Self {
        let seen = collection_ids.iter().map(|_| ItemSet::new()).collect();
        Self {
            collection_ids,
            seen,
            poll,
            json,
        }
    }

    /// One listing round. Returns how many new streams were printed.
    pub fn poll_once(
        &mut self,
        service: &dyn LogService,
        out: &mut impl Write,
    ) -> Result<usize, CliError> {
        let mut printed = 0;
        for (collection_id, seen) in self.collection_ids.iter().zip(self.seen.iter_mut()) {
            let items = collect_pages(None, |cursor| service.list_items(collection_id, cursor))?;
            for item in seen.merge(items) {
                writeln!(out, "{}", render::item_line(collection_id, &item, self.json)?)?;
                printed += 1;
            }
        }
        out.flush()?;
        Ok(printed)
    }

    /// Delay before the next round after `poll_once` printed `printed` items.
    pub fn next_delay(&mut self, printed: usize) -> std::time::Duration {
        self.poll.advance(PollOutcome::Entries(printed))
    }

    /// Runs until an error other than a transient one.
    pub fn run(mut self, service: &dyn LogService, out: &mut impl Write) -> Result<(), CliError> {
        self.poll.advance(PollOutcome::First);
        loop {
            let delay = match self.poll_once(service, out) {
                Ok(printed) => self.next_delay(printed),
                Err(CliError::Service(e)) if e.is_transient() => {
                    let delay = self.next_delay(0);
                    warn!("Listing streams failed, retrying in {:?}: {}", delay, e);
                    delay
                }
                Err(e) => return Err(e),
            };
            debug!("Next stream listing in {:?}", delay);
            thread::sleep(delay);
        }
    }
}

pub fn read_collection_ids(input: impl BufRead) -> Result<Vec<String>, CliError> {
    Ok(input_lines(input).collect::<io::Result<Vec<_>>>()?)
}

// ============================================================================
// put
// ============================================================================

/// Write `messages` (one event per line) to the stream named by `reference`.
pub fn put(
    service: &dyn LogService,
    reference: &str,
    messages: impl BufRead,
) -> Result<usize, CliError> {
    let target: ItemReference = reference.parse()?;
    service.ensure_item(&target.collection_id, &target.item_id)?;

    let mut written = 0;
    for line in messages.lines() {
        let line = line?;
        let entry = DetailEntry::new(chrono::Utc::now().timestamp_millis(), line);
        service.put_entries(&target.collection_id, &target.item_id, &[entry])?;
        written += 1;
    }
    info!("Wrote {} events to {}", written, target);
    Ok(written)
}
