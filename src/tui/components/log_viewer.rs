//! # Log Viewer Component
//!
//! Scrollable event text for the open stream. Implements [`TextViewer`].
//!
//! The viewer sticks to the bottom while the user is there, so history
//! pages and polled events stream into view; scrolling up detaches it until
//! the bottom is reached again. Soft wrapping uses `textwrap` at the width of
//! the last render.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::core::component::TextViewer;
use crate::core::keys::Key;
use crate::tui::component::Component;

#[derive(Debug)]
pub struct LogViewer {
    lines: Vec<String>,
    /// First visible display row.
    offset: usize,
    stick_to_bottom: bool,
    wrap: bool,
    /// Viewport of the last render: (width, height).
    viewport: (usize, usize),
    /// Display rows of `lines[..wrapped_lines]` at `wrapped_width`.
    wrapped: Vec<String>,
    wrapped_lines: usize,
    wrapped_width: usize,
}

impl Default for LogViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogViewer {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            offset: 0,
            stick_to_bottom: true,
            wrap: false,
            viewport: (80, 20),
            wrapped: Vec::new(),
            wrapped_lines: 0,
            wrapped_width: 0,
        }
    }

    pub fn is_wrapping(&self) -> bool {
        self.wrap
    }

    fn clear_wrapped(&mut self) {
        self.wrapped.clear();
        self.wrapped_lines = 0;
    }

    /// Bring the wrapped rows up to date. Only lines added since the last
    /// call are wrapped unless the width changed.
    fn sync_wrapped(&mut self) {
        if !self.wrap {
            self.clear_wrapped();
            return;
        }
        let width = self.viewport.0.max(1);
        if width != self.wrapped_width {
            self.clear_wrapped();
            self.wrapped_width = width;
        }
        for line in &self.lines[self.wrapped_lines..] {
            let rows = textwrap::wrap(line, width);
            if rows.is_empty() {
                self.wrapped.push(String::new());
            } else {
                self.wrapped.extend(rows.into_iter().map(|cow| cow.into_owned()));
            }
        }
        self.wrapped_lines = self.lines.len();
    }

    /// Display rows at the current width.
    fn rows(&self) -> &[String] {
        if self.wrap { &self.wrapped } else { &self.lines }
    }

    fn max_offset(&self) -> usize {
        self.rows().len().saturating_sub(self.viewport.1)
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.max_offset();
        let current = if self.stick_to_bottom { max } else { self.offset };
        self.offset = current.saturating_add_signed(delta).min(max);
        self.stick_to_bottom = self.offset >= max;
    }
}

impl TextViewer for LogViewer {
    fn set_content(&mut self, lines: Vec<String>) {
        self.lines = lines;
        self.offset = 0;
        self.stick_to_bottom = true;
        self.clear_wrapped();
        self.sync_wrapped();
    }

    fn append(&mut self, lines: Vec<String>) {
        self.lines.extend(lines);
        self.sync_wrapped();
    }

    fn scroll_to_top(&mut self) {
        self.offset = 0;
        self.stick_to_bottom = self.max_offset() == 0;
    }

    fn scroll_to_bottom(&mut self) {
        self.stick_to_bottom = true;
        self.offset = self.max_offset();
    }

    fn scroll_percent(&self) -> f64 {
        let max = self.max_offset();
        if max == 0 || self.stick_to_bottom {
            return 1.0;
        }
        self.offset.min(max) as f64 / max as f64
    }

    fn set_wrap(&mut self, wrap: bool) {
        self.wrap = wrap;
        self.sync_wrapped();
        self.offset = self.offset.min(self.max_offset());
    }

    fn update(&mut self, key: &Key) {
        let page = self.viewport.1.max(1) as isize;
        match key {
            Key::Up | Key::Char('k') => self.scroll_by(-1),
            Key::Down | Key::Char('j') => self.scroll_by(1),
            Key::PageUp => self.scroll_by(-page),
            Key::PageDown | Key::Char(' ') => self.scroll_by(page),
            _ => {}
        }
    }
}

/// Transient render wrapper for the log viewer.
pub struct LogViewerView<'a> {
    state: &'a mut LogViewer,
    title: &'a str,
    /// Shown instead of the text while there is none.
    placeholder: &'a str,
}

impl<'a> LogViewerView<'a> {
    pub fn new(state: &'a mut LogViewer, title: &'a str, placeholder: &'a str) -> Self {
        Self {
            state,
            title,
            placeholder,
        }
    }
}

impl Component for LogViewerView<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let state = &mut *self.state;
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" {} ", self.title));
        let inner = block.inner(area);
        state.viewport = (inner.width as usize, inner.height as usize);

        if state.lines.is_empty() {
            let empty = Paragraph::new(self.placeholder)
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        state.sync_wrapped();
        let max = state.max_offset();
        if state.stick_to_bottom {
            state.offset = max;
        }
        state.offset = state.offset.min(max);

        let rows = state.rows();
        let end = (state.offset + state.viewport.1).min(rows.len());
        let visible: Vec<Line> = rows[state.offset..end]
            .iter()
            .map(|row| Line::raw(row.as_str()))
            .collect();
        frame.render_widget(Paragraph::new(visible).block(block), area);
    }
}
