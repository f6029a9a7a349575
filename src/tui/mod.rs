//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into `Message::Input` for the navigator.
//!
//! This is the only module that knows about ratatui and crossterm. The
//! navigator in `core` drives everything through the `SelectorList` and
//! `TextViewer` contracts, which `ListPane` and `LogViewer` implement here.
//!
//! ## Event Loop
//!
//! One thread owns the navigator. Each turn it:
//!
//! 1. redraws if anything changed,
//! 2. waits up to `IDLE_POLL` for a key, then drains every pending key,
//! 3. drains every message that workers and timers sent meanwhile.
//!
//! Each message goes through `Navigator::update`; the returned effects are
//! handed to the [`EffectRunner`]. Workers never touch UI state.

mod component;
mod components;
mod effects;
mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use tokio::runtime::Handle;

use crate::core::actions::{Dependencies, Message};
use crate::core::config::ResolvedConfig;
use crate::core::navigation::Navigator;
use crate::service::LogService;
use crate::tui::components::{ListPane, LogViewer};
use crate::tui::effects::EffectRunner;
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Longest wait for input before checking the message channel again.
const IDLE_POLL: Duration = Duration::from_millis(100);

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Report release events so they can be filtered; terminals without the
        // protocol ignore the request.
        execute!(
            stdout(),
            Hide,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (hidden cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags, Show);
    }
}

/// Run the browser until the user quits.
///
/// Must be called from within a tokio runtime: workers run on its blocking
/// pool and timers on its scheduler.
pub fn run(config: ResolvedConfig, service: Arc<dyn LogService>) -> std::io::Result<()> {
    let mut deps = Dependencies::new(service, config.bridge.clone());
    deps.max_items_listed = config.max_items_listed;
    let deps = Arc::new(deps);

    let runtime = Handle::try_current().map_err(std::io::Error::other)?;
    let (tx, rx) = mpsc::channel();
    let mut runner = EffectRunner::new(deps, tx, runtime);

    let mut nav: ui::AppNavigator = Navigator::new(
        config.nav.clone(),
        ListPane::new(),
        ListPane::new(),
        LogViewer::new(),
    );

    let mut terminal = ratatui::init();
    let terminal_mode_guard = TerminalModeGuard::new();
    if let Err(e) = &terminal_mode_guard {
        warn!("Failed to enable terminal modes: {}", e);
    }

    info!("Browsing {}", config.endpoint);
    let mut should_quit = runner.apply(nav.start());
    let mut needs_redraw = true;
    let mut result = Ok(());

    while !should_quit {
        if needs_redraw {
            if let Err(e) = terminal.draw(|f| ui::draw_ui(f, &mut nav)) {
                result = Err(e);
                break;
            }
            needs_redraw = false;
        }

        // Process first event + drain ALL pending events before next draw
        let first_event = poll_event_timeout(IDLE_POLL);
        if first_event.is_some() {
            needs_redraw = true;
        }
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            match event {
                TuiEvent::Resize => {}
                TuiEvent::Key(key) => {
                    if runner.apply(nav.update(Message::Input(key))) {
                        should_quit = true;
                        break;
                    }
                }
            }
        }
        if should_quit {
            break;
        }

        // Results from workers and timers
        while let Ok(message) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {}", message.summary());
            if runner.apply(nav.update(message)) {
                should_quit = true;
                break;
            }
        }
    }

    runner.shutdown();
    drop(terminal_mode_guard);
    ratatui::restore();
    info!("Browser closed");
    result
}
