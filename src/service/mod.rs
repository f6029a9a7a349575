//! # Log Service
//!
//! The remote side of loupe. Everything the browser and the CLI know about
//! the backend goes through the [`LogService`] trait: four blocking,
//! paginated enumeration calls plus the two write calls used by `put`.
//!
//! Calls block. Callers are expected to run them on a worker thread
//! (see `core::bridge` and `core::actions`), never on the UI loop.

pub mod http;

use std::fmt;

use crate::core::model::{CollectionRef, Cursor, DetailEntry, ItemRef, Page};

pub use http::HttpLogService;

/// Error categories surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Timeouts, throttling, 5xx. Retryable with backoff.
    TransientNetwork,
    /// Bad credentials or a request the service rejected.
    Authorization,
    /// Invalid identifiers or local misconfiguration.
    Config,
}

/// Errors from remote calls.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Connection refused, DNS, reset. Retryable.
    Network(String),
    /// The per-call timeout elapsed. Retryable.
    Timeout,
    /// The service answered with a non-success status.
    Api { status: u16, message: String },
    /// Misconfigured client (bad endpoint URL, unknown identifier).
    Config(String),
    /// The response body did not match the expected shape.
    Parse(String),
    /// A worker could not be started or died unexpectedly.
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Network(_) | ServiceError::Timeout | ServiceError::Internal(_) => {
                ErrorKind::TransientNetwork
            }
            ServiceError::Api { status, .. } => match status {
                401 | 403 => ErrorKind::Authorization,
                408 | 429 => ErrorKind::TransientNetwork,
                s if *s >= 500 => ErrorKind::TransientNetwork,
                _ => ErrorKind::Config,
            },
            ServiceError::Config(_) | ServiceError::Parse(_) => ErrorKind::Config,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::TransientNetwork
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Network(msg) => write!(f, "network error: {msg}"),
            ServiceError::Timeout => write!(f, "request timed out"),
            ServiceError::Api { status, message } => {
                write!(f, "service error (HTTP {status}): {message}")
            }
            ServiceError::Config(msg) => write!(f, "config error: {msg}"),
            ServiceError::Parse(msg) => write!(f, "parse error: {msg}"),
            ServiceError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Blocking client for the remote log service.
///
/// Implementations must be shareable across worker threads; one instance is
/// built at startup and handed around as `Arc<dyn LogService>`.
pub trait LogService: Send + Sync {
    /// One page of log groups.
    fn list_collections(&self, cursor: Option<&Cursor>) -> Result<Page<CollectionRef>, ServiceError>;

    /// One page of streams in a group, most recently active first.
    fn list_items(
        &self,
        collection_id: &str,
        cursor: Option<&Cursor>,
    ) -> Result<Page<ItemRef>, ServiceError>;

    /// One page of events. `start_from_earliest` picks the end of the stream
    /// the enumeration starts from when `cursor` is `None`.
    fn detail_page(
        &self,
        collection_id: &str,
        item_id: &str,
        cursor: Option<&Cursor>,
        start_from_earliest: bool,
    ) -> Result<Page<DetailEntry>, ServiceError>;

    /// Events strictly newer than `since` (milliseconds). Not paginated.
    fn detail_since(
        &self,
        collection_id: &str,
        item_id: &str,
        since: i64,
    ) -> Result<Vec<DetailEntry>, ServiceError>;

    /// Create the stream if it does not exist yet.
    fn ensure_item(&self, collection_id: &str, item_id: &str) -> Result<(), ServiceError>;

    /// Append events to a stream.
    fn put_entries(
        &self,
        collection_id: &str,
        item_id: &str,
        entries: &[DetailEntry],
    ) -> Result<(), ServiceError>;
}

/// Returns true when `next` ends an enumeration that was fetched with `current`.
///
/// A missing token ends it, and so does a token equal to the one just used.
pub fn is_exhausted(current: Option<&Cursor>, next: Option<&Cursor>) -> bool {
    match next {
        None => true,
        Some(next) => current == Some(next),
    }
}

/// Drain a paginated enumeration into one vector.
///
/// Stops at cursor exhaustion or once `limit` items were collected, whichever
/// comes first. Items past `limit` on the final page are kept; callers that
/// need an exact bound truncate.
pub fn collect_pages<T, F>(limit: Option<usize>, mut fetch: F) -> Result<Vec<T>, ServiceError>
where
    F: FnMut(Option<&Cursor>) -> Result<Page<T>, ServiceError>,
{
    let mut collected = Vec::new();
    let mut cursor: Option<Cursor> = None;
    loop {
        let page = fetch(cursor.as_ref())?;
        collected.extend(page.items);
        if limit.is_some_and(|limit| collected.len() >= limit) {
            break;
        }
        if is_exhausted(cursor.as_ref(), page.next.as_ref()) {
            break;
        }
        cursor = page.next;
    }
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: Vec<u32>, next: Option<&str>) -> Page<u32> {
        Page {
            items,
            next: next.map(Cursor::from),
        }
    }

    #[test]
    fn test_is_exhausted_on_missing_token() {
        assert!(is_exhausted(Some(&Cursor::from("a")), None));
        assert!(is_exhausted(None, None));
    }

    #[test]
    fn test_is_exhausted_on_repeated_token() {
        let a = Cursor::from("a");
        assert!(is_exhausted(Some(&a), Some(&a.clone())));
        assert!(!is_exhausted(None, Some(&a)));
        assert!(!is_exhausted(Some(&Cursor::from("b")), Some(&a)));
    }

    #[test]
    fn test_collect_pages_follows_cursors() {
        let mut calls = 0;
        let result = collect_pages(None, |cursor| {
            calls += 1;
            Ok(match cursor.map(Cursor::as_str) {
                None => page(vec![1, 2], Some("p2")),
                Some("p2") => page(vec![3], Some("p3")),
                _ => page(vec![4], None),
            })
        })
        .unwrap();
        assert_eq!(result, vec![1, 2, 3, 4]);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_collect_pages_stops_on_repeated_cursor() {
        let mut calls = 0;
        let result = collect_pages(None, |_| {
            calls += 1;
            Ok(page(vec![calls], Some("same")))
        })
        .unwrap();
        // First call has no cursor, second presents "same" and gets "same" back.
        assert_eq!(calls, 2);
        assert_eq!(result, vec![1, 2]);
    }

    #[test]
    fn test_collect_pages_respects_limit() {
        let result = collect_pages(Some(3), |_| Ok(page(vec![1, 2], Some("more")))).unwrap();
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_collect_pages_propagates_errors() {
        let result: Result<Vec<u32>, _> = collect_pages(None, |_| Err(ServiceError::Timeout));
        assert_eq!(result, Err(ServiceError::Timeout));
    }

    #[test]
    fn test_error_kinds() {
        assert!(ServiceError::Timeout.is_transient());
        assert!(ServiceError::Network("reset".into()).is_transient());
        let throttled = ServiceError::Api { status: 429, message: "slow down".into() };
        assert!(throttled.is_transient());
        let denied = ServiceError::Api { status: 403, message: "no".into() };
        assert_eq!(denied.kind(), ErrorKind::Authorization);
        let missing = ServiceError::Api { status: 404, message: "no such group".into() };
        assert_eq!(missing.kind(), ErrorKind::Config);
    }
}
