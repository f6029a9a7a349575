//! # List Pane Component
//!
//! Filterable, selectable list used for both log groups and log streams.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `ListPane` lives in the navigator and implements [`SelectorList`]
//! - `ListPaneView` is created each frame with borrowed state
//!
//! The navigator starts a filter on the configured filter key. While typing, the pane owns the keyboard: Enter
//! keeps the filter, Esc drops it.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::component::{ListRow, SelectorList};
use crate::core::keys::Key;
use crate::tui::component::Component;

/// Rows moved by PageUp/PageDown before the first render.
const DEFAULT_PAGE: usize = 10;

#[derive(Debug)]
pub struct ListPane {
    title: String,
    rows: Vec<ListRow>,
    /// Indices into `rows` that pass the filter.
    visible: Vec<usize>,
    filter: String,
    filtering: bool,
    pub list_state: ListState,
    page: usize,
}

impl Default for ListPane {
    fn default() -> Self {
        Self::new()
    }
}

impl ListPane {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            rows: Vec::new(),
            visible: Vec::new(),
            filter: String::new(),
            filtering: false,
            list_state: ListState::default(),
            page: DEFAULT_PAGE,
        }
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    fn refilter(&mut self, keep_id: Option<String>) {
        let needle = self.filter.to_lowercase();
        self.visible = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                needle.is_empty()
                    || row.title.to_lowercase().contains(&needle)
                    || row.description.to_lowercase().contains(&needle)
            })
            .map(|(i, _)| i)
            .collect();

        let position = keep_id
            .and_then(|id| self.visible.iter().position(|&i| self.rows[i].id == id))
            .unwrap_or(0);
        self.list_state
            .select((!self.visible.is_empty()).then_some(position));
    }

    fn selected_id(&self) -> Option<String> {
        self.selected_item().map(|row| row.id.clone())
    }

    fn move_by(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() - 1;
        let current = self.list_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(last);
        self.list_state.select(Some(next));
    }
}

impl SelectorList for ListPane {
    fn set_title(&mut self, title: String) {
        self.title = title;
    }

    fn set_items(&mut self, rows: Vec<ListRow>) {
        let keep = self.selected_id();
        self.rows = rows;
        self.refilter(keep);
    }

    fn selected_item(&self) -> Option<&ListRow> {
        let index = *self.visible.get(self.list_state.selected()?)?;
        self.rows.get(index)
    }

    fn is_filtering_input(&self) -> bool {
        self.filtering
    }

    fn has_filter(&self) -> bool {
        !self.filter.is_empty()
    }

    fn clear_filter(&mut self) {
        let keep = self.selected_id();
        self.filter.clear();
        self.filtering = false;
        self.refilter(keep);
    }

    fn start_filter(&mut self) {
        self.filtering = true;
    }

    fn update(&mut self, key: &Key) {
        if self.filtering {
            match key {
                Key::Enter => self.filtering = false,
                Key::Esc => self.clear_filter(),
                Key::Backspace => {
                    self.filter.pop();
                    self.refilter(None);
                }
                Key::Char(c) => {
                    self.filter.push(*c);
                    self.refilter(None);
                }
                Key::Up => self.move_by(-1),
                Key::Down => self.move_by(1),
                _ => {}
            }
            return;
        }
        let page = self.page.max(1) as isize;
        match key {
            Key::Up | Key::Char('k') => self.move_by(-1),
            Key::Down | Key::Char('j') => self.move_by(1),
            Key::PageUp => self.move_by(-page),
            Key::PageDown => self.move_by(page),
            Key::Home | Key::Char('g') => self.move_by(isize::MIN),
            Key::End | Key::Char('G') => self.move_by(isize::MAX),
            _ => {}
        }
    }
}

/// Transient render wrapper for a list pane.
pub struct ListPaneView<'a> {
    state: &'a mut ListPane,
    /// Shown instead of the list while it is empty.
    placeholder: &'a str,
}

impl<'a> ListPaneView<'a> {
    pub fn new(state: &'a mut ListPane, placeholder: &'a str) -> Self {
        Self { state, placeholder }
    }
}

impl Component for ListPaneView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let state = &mut *self.state;
        let count = if state.has_filter() {
            format!(" {} ({}/{}) ", state.title, state.visible.len(), state.rows.len())
        } else {
            format!(" {} ({}) ", state.title, state.rows.len())
        };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(count)
            .padding(Padding::horizontal(1));
        if state.filtering || state.has_filter() {
            let cursor = if state.filtering { "_" } else { "" };
            block = block.title_bottom(Line::from(format!(" /{}{} ", state.filter, cursor)));
        }

        if state.visible.is_empty() {
            let text = if state.rows.is_empty() {
                self.placeholder
            } else {
                "No matches"
            };
            let empty = Paragraph::new(text)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let inner_width = area.width.saturating_sub(4) as usize; // borders + padding
        state.page = area.height.saturating_sub(2).max(1) as usize;

        let items: Vec<ListItem> = state
            .visible
            .iter()
            .map(|&i| {
                let row = &state.rows[i];
                let title = truncate_str(&row.title, inner_width);
                let room = inner_width.saturating_sub(title.width() + 2);
                let mut spans = vec![Span::raw(title)];
                if room > 0 && !row.description.is_empty() && row.description != row.title {
                    spans.push(Span::raw("  "));
                    spans.push(Span::styled(
                        truncate_str(&row.description, room),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        );
        frame.render_stateful_widget(list, area, &mut state.list_state);
    }
}

/// Truncate a string to fit within `max_width` columns, adding "..." if needed.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 3 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push_str("...");
    out
}
