//! # Stream References
//!
//! One-shot commands exchange streams as single-line references so they
//! can be piped between invocations:
//!
//! ```text
//! <prefix>:log-group:<collection>:log-stream:<item>
//! ```
//!
//! Full resource names from the provider parse as-is. References this tool
//! prints use the virtual prefix `_`.

use std::fmt;
use std::str::FromStr;

const GROUP_MARKER: &str = ":log-group:";
const STREAM_MARKER: &str = ":log-stream:";
const VIRTUAL_PREFIX: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemReference {
    pub collection_id: String,
    pub item_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    MissingGroup(String),
    MissingStream(String),
    Empty(String),
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceError::MissingGroup(s) => write!(f, "no '{GROUP_MARKER}' in reference {s:?}"),
            ReferenceError::MissingStream(s) => {
                write!(f, "no '{STREAM_MARKER}' in reference {s:?}")
            }
            ReferenceError::Empty(s) => write!(f, "empty group or stream in reference {s:?}"),
        }
    }
}

impl std::error::Error for ReferenceError {}

impl ItemReference {
    pub fn new(collection_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            item_id: item_id.into(),
        }
    }
}

/// Group names never contain `:log-stream:`, stream names may contain
/// anything, so the split happens at the first stream marker after the
/// group marker.
impl FromStr for ItemReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (_, rest) = trimmed
            .split_once(GROUP_MARKER)
            .ok_or_else(|| ReferenceError::MissingGroup(trimmed.to_string()))?;
        let (collection, item) = rest
            .split_once(STREAM_MARKER)
            .ok_or_else(|| ReferenceError::MissingStream(trimmed.to_string()))?;
        if collection.is_empty() || item.is_empty() {
            return Err(ReferenceError::Empty(trimmed.to_string()));
        }
        Ok(Self::new(collection, item))
    }
}

impl fmt::Display for ItemReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{VIRTUAL_PREFIX}{GROUP_MARKER}{}{STREAM_MARKER}{}",
            self.collection_id, self.item_id
        )
    }
}
