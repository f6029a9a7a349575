//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::core::component::{ListRow, SelectorList, TextViewer};
use crate::core::keys::Key;
use crate::core::model::{CollectionRef, Cursor, DetailEntry, ItemRef, Page};
use crate::service::{LogService, ServiceError};

#[derive(Default)]
struct MockData {
    collections: Vec<CollectionRef>,
    items: HashMap<String, Vec<ItemRef>>,
    entries: HashMap<(String, String), Vec<DetailEntry>>,
}

/// In-memory log service. Cursors are offsets into the stored vectors.
///
/// Event pages behave like a forward token: the token after the last page
/// repeats the one that was presented, unless built `without_end_cursor`.
pub struct MockLogService {
    data: Mutex<MockData>,
    page_size: usize,
    fail_with: Option<ServiceError>,
    /// Consumed one per call before `fail_with` applies.
    outcomes: Mutex<VecDeque<Result<(), ServiceError>>>,
    end_cursor: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockLogService {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(MockData::default()),
            page_size: 100,
            fail_with: None,
            outcomes: Mutex::new(VecDeque::new()),
            end_cursor: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_collection(self, id: &str) -> Self {
        self.data.lock().unwrap().collections.push(CollectionRef {
            id: id.to_string(),
            name: id.trim_start_matches('/').to_string(),
        });
        self
    }

    /// `count` streams named `stream-N`, newest first.
    pub fn with_items(self, collection: &str, count: usize) -> Self {
        let items = (0..count)
            .map(|n| ItemRef {
                id: format!("stream-{n}"),
                last_activity: Some(1_700_000_000_000 - n as i64),
            })
            .collect();
        self.data
            .lock()
            .unwrap()
            .items
            .insert(collection.to_string(), items);
        self
    }

    /// `count` events with timestamps starting at 1000.
    pub fn with_entries(self, collection: &str, item: &str, count: usize) -> Self {
        let entries = (0..count)
            .map(|n| DetailEntry::new(1000 + n as i64, format!("event {n}")))
            .collect();
        self.data
            .lock()
            .unwrap()
            .entries
            .insert((collection.to_string(), item.to_string()), entries);
        self
    }

    pub fn failing(mut self, error: ServiceError) -> Self {
        self.fail_with = Some(error);
        self
    }

    /// Script the next calls: each entry is the result of one call, in order.
    pub fn with_outcomes(self, outcomes: Vec<Result<(), ServiceError>>) -> Self {
        self.outcomes.lock().unwrap().extend(outcomes);
        self
    }

    /// The last event page carries no next token at all.
    pub fn without_end_cursor(mut self) -> Self {
        self.end_cursor = false;
        self
    }

    /// Append events as if another producer wrote them.
    pub fn push_entries(&self, collection: &str, item: &str, entries: Vec<DetailEntry>) {
        self.data
            .lock()
            .unwrap()
            .entries
            .entry((collection.to_string(), item.to_string()))
            .or_default()
            .extend(entries);
    }

    pub fn stored_entries(&self, collection: &str, item: &str) -> Vec<DetailEntry> {
        self.data
            .lock()
            .unwrap()
            .entries
            .get(&(collection.to_string(), item.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    fn record(&self, name: &str) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push(name.to_string());
        if let Some(outcome) = self.outcomes.lock().unwrap().pop_front() {
            return outcome;
        }
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn offset(cursor: Option<&Cursor>) -> usize {
        cursor.and_then(|c| c.as_str().parse().ok()).unwrap_or(0)
    }

    fn slice_page<T: Clone>(&self, all: &[T], cursor: Option<&Cursor>) -> Page<T> {
        let start = Self::offset(cursor).min(all.len());
        let end = (start + self.page_size).min(all.len());
        Page {
            items: all[start..end].to_vec(),
            next: (end < all.len()).then(|| Cursor::from(end.to_string())),
        }
    }
}

impl Default for MockLogService {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(what: &str) -> ServiceError {
    ServiceError::Api {
        status: 404,
        message: format!("{what} not found"),
    }
}

impl LogService for MockLogService {
    fn list_collections(&self, cursor: Option<&Cursor>) -> Result<Page<CollectionRef>, ServiceError> {
        self.record("list_collections")?;
        let data = self.data.lock().unwrap();
        Ok(self.slice_page(&data.collections, cursor))
    }

    fn list_items(
        &self,
        collection_id: &str,
        cursor: Option<&Cursor>,
    ) -> Result<Page<ItemRef>, ServiceError> {
        self.record("list_items")?;
        let data = self.data.lock().unwrap();
        let items = data.items.get(collection_id).ok_or_else(|| not_found(collection_id))?;
        Ok(self.slice_page(items, cursor))
    }

    fn detail_page(
        &self,
        collection_id: &str,
        item_id: &str,
        cursor: Option<&Cursor>,
        start_from_earliest: bool,
    ) -> Result<Page<DetailEntry>, ServiceError> {
        self.record("detail_page")?;
        let data = self.data.lock().unwrap();
        let entries = data
            .entries
            .get(&(collection_id.to_string(), item_id.to_string()))
            .ok_or_else(|| not_found(item_id))?;
        let start = match cursor {
            Some(_) => Self::offset(cursor).min(entries.len()),
            None if start_from_earliest => 0,
            None => entries.len().saturating_sub(self.page_size),
        };
        let end = (start + self.page_size).min(entries.len());
        let items = entries[start..end].to_vec();
        if end == entries.len() && !self.end_cursor {
            return Ok(Page::last(items));
        }
        Ok(Page {
            items,
            next: Some(Cursor::from(end.to_string())),
        })
    }

    fn detail_since(
        &self,
        collection_id: &str,
        item_id: &str,
        since: i64,
    ) -> Result<Vec<DetailEntry>, ServiceError> {
        self.record("detail_since")?;
        let data = self.data.lock().unwrap();
        let entries = data
            .entries
            .get(&(collection_id.to_string(), item_id.to_string()))
            .ok_or_else(|| not_found(item_id))?;
        Ok(entries.iter().filter(|e| e.timestamp > since).cloned().collect())
    }

    fn ensure_item(&self, collection_id: &str, item_id: &str) -> Result<(), ServiceError> {
        self.record("ensure_item")?;
        self.data
            .lock()
            .unwrap()
            .entries
            .entry((collection_id.to_string(), item_id.to_string()))
            .or_default();
        Ok(())
    }

    fn put_entries(
        &self,
        collection_id: &str,
        item_id: &str,
        entries: &[DetailEntry],
    ) -> Result<(), ServiceError> {
        self.record("put_entries")?;
        self.push_entries(collection_id, item_id, entries.to_vec());
        Ok(())
    }
}

/// Minimal selector list: `start_filter` opens a filter, Enter applies it, Esc drops it.
#[derive(Debug, Default)]
pub struct FakeList {
    pub title: String,
    pub rows: Vec<ListRow>,
    pub selected: usize,
    pub filter: String,
    pub filtering: bool,
    pub received: Vec<Key>,
}

impl FakeList {
    fn visible(&self) -> Vec<&ListRow> {
        self.rows
            .iter()
            .filter(|r| self.filter.is_empty() || r.title.contains(&self.filter))
            .collect()
    }
}

impl SelectorList for FakeList {
    fn set_title(&mut self, title: String) {
        self.title = title;
    }

    fn set_items(&mut self, rows: Vec<ListRow>) {
        self.rows = rows;
        self.selected = 0;
    }

    fn selected_item(&self) -> Option<&ListRow> {
        self.visible().get(self.selected).copied()
    }

    fn is_filtering_input(&self) -> bool {
        self.filtering
    }

    fn has_filter(&self) -> bool {
        !self.filter.is_empty()
    }

    fn clear_filter(&mut self) {
        self.filter.clear();
        self.filtering = false;
    }

    fn start_filter(&mut self) {
        self.filtering = true;
    }

    fn update(&mut self, key: &Key) {
        self.received.push(*key);
        if self.filtering {
            match key {
                Key::Enter => self.filtering = false,
                Key::Esc => self.clear_filter(),
                Key::Char(c) => self.filter.push(*c),
                _ => {}
            }
            return;
        }
        let visible = self.visible().len();
        match key {
            Key::Down => self.selected = (self.selected + 1).min(visible.saturating_sub(1)),
            Key::Up => self.selected = self.selected.saturating_sub(1),
            _ => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeViewer {
    pub lines: Vec<String>,
    pub at_bottom: bool,
    pub wrap: bool,
    pub received: Vec<Key>,
}

impl TextViewer for FakeViewer {
    fn set_content(&mut self, lines: Vec<String>) {
        self.lines = lines;
    }

    fn append(&mut self, lines: Vec<String>) {
        self.lines.extend(lines);
    }

    fn scroll_to_top(&mut self) {
        self.at_bottom = false;
    }

    fn scroll_to_bottom(&mut self) {
        self.at_bottom = true;
    }

    fn scroll_percent(&self) -> f64 {
        if self.at_bottom { 1.0 } else { 0.0 }
    }

    fn set_wrap(&mut self, wrap: bool) {
        self.wrap = wrap;
    }

    fn update(&mut self, key: &Key) {
        self.received.push(*key);
    }
}
