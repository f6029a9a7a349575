//! # View Component Contracts
//!
//! The navigator drives two kinds of widgets without knowing how they are
//! drawn: a selectable, filterable list and a scrollable text viewer. The
//! ratatui implementations live in `tui::components`; tests use the fakes in
//! `test_support`.

use crate::core::keys::Key;

/// One row of a selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    /// Identifier handed back on selection.
    pub id: String,
    pub title: String,
    pub description: String,
}

impl ListRow {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

pub trait SelectorList {
    fn set_title(&mut self, title: String);

    /// Replace the rows. Keeps the highlighted row if its id survives.
    fn set_items(&mut self, rows: Vec<ListRow>);

    /// The highlighted row among the visible (filtered) rows.
    fn selected_item(&self) -> Option<&ListRow>;

    /// True while the user is typing a filter; the list owns the keyboard.
    fn is_filtering_input(&self) -> bool;

    /// True when a filter narrows the visible rows.
    fn has_filter(&self) -> bool;

    fn clear_filter(&mut self);

    /// Begin capturing filter text. Bound to the configured filter key.
    fn start_filter(&mut self);

    /// Handle a key the navigator did not consume.
    fn update(&mut self, key: &Key);
}

pub trait TextViewer {
    fn set_content(&mut self, lines: Vec<String>);

    fn append(&mut self, lines: Vec<String>);

    fn scroll_to_top(&mut self);

    fn scroll_to_bottom(&mut self);

    /// Position of the viewport in `0.0..=1.0`.
    fn scroll_percent(&self) -> f64;

    fn set_wrap(&mut self, wrap: bool);

    /// Handle a key the navigator did not consume.
    fn update(&mut self, key: &Key);
}
