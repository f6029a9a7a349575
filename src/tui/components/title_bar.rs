//! # TitleBar Component
//!
//! Top status bar showing where the user is and what is loading.
//!
//! ## Responsibilities
//!
//! - Display the breadcrumb of the active view (`/app › web-1`)
//! - Display a status message (e.g., "loading history", "1,204 events")
//!
//! ## Design Decisions
//!
//! ### Stateless Component
//!
//! TitleBar is purely presentational. It receives all data as props and has no
//! internal state:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar::new("/app › web-1".to_string(), "loading history".to_string());
//! title_bar.render(frame, area);
//! ```
//!
//! ## Conditional Formatting
//!
//! 1. **Status message**: `"Loupe | /app › web-1 | loading history"`
//! 2. **Default**: `"Loupe | /app › web-1"`

use crate::tui::component::Component;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Top status bar component showing the breadcrumb and status.
pub struct TitleBar {
    /// Path of the active view (e.g., "/app › web-1")
    pub breadcrumb: String,
    /// Status message (e.g., "loading history")
    pub status_message: String,
}

impl TitleBar {
    pub fn new(breadcrumb: String, status_message: String) -> Self {
        Self {
            breadcrumb,
            status_message,
        }
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled("Loupe", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" | "),
            Span::styled(self.breadcrumb.clone(), Style::default().fg(Color::Cyan)),
        ];
        if !self.status_message.is_empty() {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                self.status_message.clone(),
                Style::default().fg(Color::DarkGray),
            ));
        }
        frame.render_widget(Line::from(spans), area);
    }
}

/// Bottom line with key hints and, in the viewer, the scroll position.
pub struct StatusBar {
    pub hints: String,
    /// Scroll position in `0.0..=1.0`; hidden when `None`.
    pub scroll_percent: Option<f64>,
}

impl Component for StatusBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            self.hints.clone(),
            Style::default().fg(Color::DarkGray),
        )];
        if let Some(percent) = self.scroll_percent {
            spans.push(Span::raw(format!("  {:>3.0}%", percent * 100.0)));
        }
        frame.render_widget(Line::from(spans), area);
    }
}
