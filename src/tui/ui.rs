use crate::core::component::TextViewer;
use crate::core::navigation::{Navigator, Screen};
use crate::tui::component::Component;
use crate::tui::components::{ListPane, ListPaneView, LogViewer, LogViewerView, StatusBar, TitleBar};

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Paragraph, Wrap};

/// The navigator with the ratatui widgets plugged in.
pub type AppNavigator = Navigator<ListPane, LogViewer>;

pub fn draw_ui(frame: &mut Frame, nav: &mut AppNavigator) {
    use Constraint::{Length, Min};
    let banner_height = if nav.banner().is_some() { 3 } else { 0 };
    let layout = Layout::vertical([Length(1), Min(0), Length(banner_height), Length(1)]);
    let [title_area, main_area, banner_area, status_area] = layout.areas(frame.area());

    TitleBar::new(breadcrumb(nav), status_message(nav)).render(frame, title_area);

    let mut scroll_percent = None;
    match nav.screen() {
        Screen::Collections => {
            let placeholder = if nav.collections_loaded() {
                "No log groups"
            } else {
                "Loading..."
            };
            ListPaneView::new(&mut nav.collections_list, placeholder).render(frame, main_area);
        }
        Screen::Items => {
            let placeholder = if nav.items_loaded() {
                "No log streams"
            } else {
                "Loading..."
            };
            ListPaneView::new(&mut nav.items_list, placeholder).render(frame, main_area);
        }
        Screen::Detail => {
            let (title, placeholder) = match nav.detail() {
                Some(detail) => (
                    detail.item_id().to_string(),
                    if detail.is_loading() {
                        "Loading..."
                    } else if detail.filter().is_empty() {
                        "No events"
                    } else {
                        "No matching events"
                    },
                ),
                None => (String::new(), ""),
            };
            LogViewerView::new(&mut nav.viewer, &title, placeholder).render(frame, main_area);
            scroll_percent = Some(nav.viewer.scroll_percent());
        }
    }

    if let Some(message) = nav.banner() {
        draw_banner(frame, banner_area, message);
    }

    StatusBar {
        hints: key_hints(nav),
        scroll_percent,
    }
    .render(frame, status_area);
}

fn draw_banner(frame: &mut Frame, area: Rect, message: &str) {
    let style = Style::default().fg(Color::Red);
    let banner = Paragraph::new(message)
        .block(
            Block::bordered()
                .title(" Error ")
                .title_bottom(" press any key ")
                .border_style(style),
        )
        .style(style)
        .wrap(Wrap { trim: true });
    frame.render_widget(banner, area);
}

fn breadcrumb(nav: &AppNavigator) -> String {
    match nav.detail() {
        Some(detail) => format!("{} › {}", detail.collection_id(), detail.item_id()),
        None => nav
            .current_collection()
            .map(str::to_string)
            .unwrap_or_else(|| "Log Groups".to_string()),
    }
}

fn status_message(nav: &AppNavigator) -> String {
    match nav.detail() {
        Some(detail) => {
            let mut status = if detail.is_loading() {
                format!("loading history ({} events)", detail.entry_count())
            } else {
                format!("{} events", detail.entry_count())
            };
            if detail.is_filtering() || !detail.filter().is_empty() {
                let cursor = if detail.is_filtering() { "_" } else { "" };
                status.push_str(&format!(" | filter: {}{}", detail.filter(), cursor));
            }
            if detail.wrap() {
                status.push_str(" | wrap");
            }
            status
        }
        None => String::new(),
    }
}

fn key_hints(nav: &AppNavigator) -> String {
    let keys = &nav.config().keys;
    match nav.screen() {
        Screen::Collections => format!(
            "{} open  {} filter  {} quit",
            keys.select, keys.filter, keys.quit
        ),
        Screen::Items => format!(
            "{} open  {} back  {} filter  {} quit",
            keys.select, keys.back, keys.filter, keys.quit
        ),
        Screen::Detail => format!(
            "{} back  {} filter  {} wrap  {}/{} jump  {} quit",
            keys.back, keys.filter, keys.toggle_wrap, keys.scroll_top, keys.scroll_bottom, keys.quit
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::{Message, RequestKind};
    use crate::core::keys::Key;
    use crate::core::model::{CollectionRef, DetailEntry, ItemRef};
    use crate::core::navigation::NavConfig;
    use crate::service::ServiceError;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn navigator() -> AppNavigator {
        Navigator::new(
            NavConfig::default(),
            ListPane::new(),
            ListPane::new(),
            LogViewer::new(),
        )
    }

    fn screen(nav: &mut AppNavigator) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal.draw(|f| draw_ui(f, nav)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn with_groups() -> AppNavigator {
        let mut nav = navigator();
        let tag = nav.tag();
        nav.update(Message::CollectionsLoaded {
            tag,
            collections: vec![CollectionRef {
                id: "/app".to_string(),
                name: String::new(),
            }],
        });
        nav
    }

    #[test]
    fn test_collections_screen() {
        let mut nav = navigator();
        assert!(screen(&mut nav).contains("Loading..."));
        let mut nav = with_groups();
        let text = screen(&mut nav);
        assert!(text.contains("Log Groups (1)"));
        assert!(text.contains("/app"));
        assert!(text.contains("enter open"));
    }

    #[test]
    fn test_detail_screen_shows_events_and_breadcrumb() {
        let mut nav = with_groups();
        nav.update(Message::Input(Key::Enter));
        let tag = nav.tag();
        nav.update(Message::ItemsLoaded {
            tag,
            collection_id: "/app".to_string(),
            items: vec![ItemRef {
                id: "web-1".to_string(),
                last_activity: None,
            }],
        });
        nav.update(Message::Input(Key::Enter));
        let tag = nav.tag();
        nav.update(Message::DetailBatch {
            tag,
            entries: vec![DetailEntry::new(1, "GET /health 200")],
            continuation: None,
        });

        let text = screen(&mut nav);
        assert!(text.contains("/app › web-1"));
        assert!(text.contains("1 events"));
        assert!(text.contains("GET /health 200"));
        assert!(text.contains("100%"));
    }

    #[test]
    fn test_banner_until_key_press() {
        let mut nav = with_groups();
        let tag = nav.tag();
        nav.update(Message::Failed {
            tag,
            request: RequestKind::ListCollections,
            error: ServiceError::Network("connection refused".to_string()),
        });
        let text = screen(&mut nav);
        assert!(text.contains("Error"));
        assert!(text.contains("connection refused"));
        // Existing content stays visible under the banner.
        assert!(text.contains("/app"));

        nav.update(Message::Input(Key::Down));
        assert!(!screen(&mut nav).contains("connection refused"));
    }
}
