//! # Domain Records
//!
//! ```text
//! CollectionRef   a log group            (id, display name)
//! ItemRef         a stream in a group    (id, last activity)
//! DetailEntry     one event in a stream  (timestamp, message)
//! Cursor          opaque pagination token
//! ```
//!
//! Workers build these and hand them to the UI loop by value. Nothing here
//! is shared mutably across threads.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Opaque pagination token handed out by the service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Cursor {
    fn from(token: &str) -> Self {
        Cursor(token.to_string())
    }
}

impl From<String> for Cursor {
    fn from(token: String) -> Self {
        Cursor(token)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One page of an enumeration.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, rename = "next_cursor")]
    pub next: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl CollectionRef {
    /// Display name, falling back to the id when the service sent none.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.id } else { &self.name }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub id: String,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub last_activity: Option<i64>,
}

impl ItemRef {
    pub fn last_activity_label(&self) -> String {
        self.last_activity
            .map(format_timestamp)
            .unwrap_or_else(|| "no activity".to_string())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DetailEntry {
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingestion_time: Option<i64>,
}

impl DetailEntry {
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
            ingestion_time: None,
        }
    }
}

/// Render epoch milliseconds as local wall-clock time.
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| millis.to_string())
}

/// De-duplicated set of streams keyed by id.
///
/// Repeated listings merge into the set instead of replacing it. Iteration
/// order is most recently active first, ties broken by id.
#[derive(Debug, Default, Clone)]
pub struct ItemSet {
    by_id: HashMap<String, ItemRef>,
}

impl ItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `items`, returning the ones whose id was not present before.
    pub fn merge(&mut self, items: Vec<ItemRef>) -> Vec<ItemRef> {
        let mut added = Vec::new();
        for item in items {
            match self.by_id.get_mut(&item.id) {
                Some(existing) => {
                    if item.last_activity > existing.last_activity {
                        existing.last_activity = item.last_activity;
                    }
                }
                None => {
                    added.push(item.clone());
                    self.by_id.insert(item.id.clone(), item);
                }
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn sorted(&self) -> Vec<ItemRef> {
        let mut items: Vec<ItemRef> = self.by_id.values().cloned().collect();
        items.sort_by(|a, b| {
            b.last_activity
                .cmp(&a.last_activity)
                .then_with(|| a.id.cmp(&b.id))
        });
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, last: i64) -> ItemRef {
        ItemRef {
            id: id.to_string(),
            last_activity: Some(last),
        }
    }

    #[test]
    fn test_item_set_merge_deduplicates_by_id() {
        let mut set = ItemSet::new();
        let added = set.merge(vec![item("a", 1), item("b", 2)]);
        assert_eq!(added.len(), 2);

        let added = set.merge(vec![item("b", 5), item("c", 3)]);
        assert_eq!(added, vec![item("c", 3)]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_item_set_keeps_latest_activity() {
        let mut set = ItemSet::new();
        set.merge(vec![item("a", 10)]);
        set.merge(vec![item("a", 4)]);
        set.merge(vec![item("b", 7)]);
        let ids: Vec<_> = set.sorted().into_iter().map(|i| (i.id, i.last_activity)).collect();
        assert_eq!(
            ids,
            vec![("a".to_string(), Some(10)), ("b".to_string(), Some(7))]
        );
    }

    #[test]
    fn test_page_deserializes_without_cursor() {
        let page: Page<CollectionRef> =
            serde_json::from_str(r#"{"items":[{"id":"/app/web","name":"web"}]}"#).unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.next.is_none());
        assert_eq!(page.items[0].display_name(), "web");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let group = CollectionRef {
            id: "/app/api".to_string(),
            name: String::new(),
        };
        assert_eq!(group.display_name(), "/app/api");
    }

    #[test]
    fn test_detail_entry_json_skips_missing_ingestion_time() {
        let json = serde_json::to_string(&DetailEntry::new(5, "hello")).unwrap();
        assert_eq!(json, r#"{"timestamp":5,"message":"hello"}"#);
    }

    #[test]
    fn test_last_activity_label_without_timestamp() {
        let stream = ItemRef {
            id: "s".to_string(),
            last_activity: None,
        };
        assert_eq!(stream.last_activity_label(), "no activity");
    }
}
