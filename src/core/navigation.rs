//! # Navigation
//!
//! The browser is a three-level state machine:
//!
//! ```text
//!  Collections ──select──► Items ──select──► Detail
//!       ▲                    │ ▲                │
//!       └───────back─────────┘ └──────back──────┘
//! ```
//!
//! [`Navigator::update`] consumes one [`Message`] and returns the
//! [`Effect`]s the runtime must carry out: run an action, arm or cancel a
//! timer, or quit. No I/O happens here.
//!
//! Transition side effects:
//!
//! | transition          | effects                                                  |
//! |---------------------|----------------------------------------------------------|
//! | Collections → Items | run `ListItems`, arm `ItemsRefresh`                      |
//! | Items → Collections | cancel `ItemsRefresh`                                    |
//! | Items → Detail      | run `LoadDetailHistory`, arm `Liveness`, cancel refresh  |
//! | Detail → Items      | cancel `Liveness`, clear events and filter, re-list      |
//!
//! Every transition bumps the generation. Results and timers carry the
//! [`ViewTag`] they were issued with and are dropped when it no longer
//! matches, so a slow answer for one stream can never land in another.

use std::time::Duration;

use log::{debug, info};

use crate::core::actions::{Action, Message, RequestKind, TimerKind, ViewId, ViewTag};
use crate::core::backoff::{DEFAULT_MAX_INTERVAL, PollOutcome, PollState};
use crate::core::component::{ListRow, SelectorList, TextViewer};
use crate::core::keys::{Command, Key, KeyBindings};
use crate::core::model::{CollectionRef, DetailEntry, ItemSet};

pub const DEFAULT_ITEMS_REFRESH: Duration = Duration::from_secs(30);
pub const DEFAULT_LIVENESS: Duration = Duration::from_secs(5);

/// Immutable settings handed to the navigator at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavConfig {
    pub keys: KeyBindings,
    pub items_refresh: Duration,
    /// First liveness delay and the floor of the poll backoff.
    pub liveness: Duration,
    /// Ceiling of the poll backoff.
    pub liveness_max: Duration,
    pub wrap: bool,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            keys: KeyBindings::default(),
            items_refresh: DEFAULT_ITEMS_REFRESH,
            liveness: DEFAULT_LIVENESS,
            liveness_max: DEFAULT_MAX_INTERVAL,
            wrap: false,
        }
    }
}

/// Work for the runtime.
#[derive(Debug)]
pub enum Effect {
    Run { action: Action, tag: ViewTag },
    ArmTimer { timer: TimerKind, tag: ViewTag, after: Duration },
    CancelTimer(TimerKind),
    Quit,
}

/// Which view is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Collections,
    Items,
    Detail,
}

#[derive(Debug)]
struct ItemsView {
    collection_id: String,
    items: ItemSet,
    loaded: bool,
}

/// State of an open stream.
#[derive(Debug)]
pub struct DetailView {
    parent: ItemsView,
    item_id: String,
    entries: Vec<DetailEntry>,
    history_loading: bool,
    poll_in_flight: bool,
    poll: PollState,
    filtering: bool,
    filter: String,
    wrap: bool,
}

impl DetailView {
    pub fn collection_id(&self) -> &str {
        &self.parent.collection_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_loading(&self) -> bool {
        self.history_loading
    }

    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn wrap(&self) -> bool {
        self.wrap
    }

    pub fn poll_state(&self) -> &PollState {
        &self.poll
    }

    fn matches(&self, entry: &DetailEntry) -> bool {
        self.filter.is_empty()
            || entry
                .message
                .to_lowercase()
                .contains(&self.filter.to_lowercase())
    }

    fn visible_lines<'a>(&self, entries: impl IntoIterator<Item = &'a DetailEntry>) -> Vec<String> {
        entries
            .into_iter()
            .filter(|e| self.matches(e))
            .map(|e| e.message.trim_end_matches('\n').to_string())
            .collect()
    }
}

#[derive(Debug)]
enum View {
    Collections,
    Items(ItemsView),
    Detail(DetailView),
}

pub struct Navigator<L, V> {
    config: NavConfig,
    view: View,
    generation: u64,
    collections: Vec<CollectionRef>,
    collections_loaded: bool,
    banner: Option<String>,
    pub collections_list: L,
    pub items_list: L,
    pub viewer: V,
}

impl<L: SelectorList, V: TextViewer> Navigator<L, V> {
    pub fn new(config: NavConfig, mut collections_list: L, items_list: L, mut viewer: V) -> Self {
        collections_list.set_title("Log Groups".to_string());
        viewer.set_wrap(config.wrap);
        Self {
            config,
            view: View::Collections,
            generation: 0,
            collections: Vec::new(),
            collections_loaded: false,
            banner: None,
            collections_list,
            items_list,
            viewer,
        }
    }

    /// Effects to run before the first message: load the groups.
    pub fn start(&mut self) -> Vec<Effect> {
        vec![self.run(Action::ListCollections)]
    }

    pub fn screen(&self) -> Screen {
        match self.view {
            View::Collections => Screen::Collections,
            View::Items(_) => Screen::Items,
            View::Detail(_) => Screen::Detail,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn collections(&self) -> &[CollectionRef] {
        &self.collections
    }

    pub fn collections_loaded(&self) -> bool {
        self.collections_loaded
    }

    /// True once the open group's streams were listed at least once.
    pub fn items_loaded(&self) -> bool {
        match &self.view {
            View::Items(items) => items.loaded,
            View::Detail(detail) => detail.parent.loaded,
            View::Collections => false,
        }
    }

    /// Group of the open stream list or stream.
    pub fn current_collection(&self) -> Option<&str> {
        match &self.view {
            View::Collections => None,
            View::Items(items) => Some(&items.collection_id),
            View::Detail(detail) => Some(&detail.parent.collection_id),
        }
    }

    pub fn detail(&self) -> Option<&DetailView> {
        match &self.view {
            View::Detail(detail) => Some(detail),
            _ => None,
        }
    }

    /// Tag for work issued right now.
    pub fn tag(&self) -> ViewTag {
        let view = match &self.view {
            View::Collections => ViewId::Collections,
            View::Items(items) => ViewId::Items {
                collection_id: items.collection_id.clone(),
            },
            View::Detail(detail) => ViewId::Detail {
                collection_id: detail.parent.collection_id.clone(),
                item_id: detail.item_id.clone(),
            },
        };
        ViewTag {
            generation: self.generation,
            view,
        }
    }

    fn is_current(&self, tag: &ViewTag) -> bool {
        *tag == self.tag()
    }

    fn run(&self, action: Action) -> Effect {
        Effect::Run {
            action,
            tag: self.tag(),
        }
    }

    fn arm(&self, timer: TimerKind, after: Duration) -> Effect {
        Effect::ArmTimer {
            timer,
            tag: self.tag(),
            after,
        }
    }

    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        if let Some(tag) = message.tag()
            && !self.is_current(tag)
        {
            debug!("Dropping stale {}", message.summary());
            return Vec::new();
        }

        match message {
            Message::Input(key) => self.handle_input(key),
            Message::CollectionsLoaded { collections, .. } => {
                info!("Loaded {} log groups", collections.len());
                let rows = collections
                    .iter()
                    .map(|c| ListRow::new(&c.id, c.display_name(), &c.id))
                    .collect();
                self.collections_list.set_items(rows);
                self.collections = collections;
                self.collections_loaded = true;
                Vec::new()
            }
            Message::ItemsLoaded { items, .. } => {
                if let View::Items(view) = &mut self.view {
                    view.loaded = true;
                    let added = view.items.merge(items);
                    debug!("{} new streams in {}", added.len(), view.collection_id);
                    let rows = view
                        .items
                        .sorted()
                        .into_iter()
                        .map(|item| {
                            let label = item.last_activity_label();
                            ListRow::new(&item.id, &item.id, label)
                        })
                        .collect();
                    self.items_list.set_items(rows);
                }
                Vec::new()
            }
            Message::DetailBatch {
                entries,
                continuation,
                ..
            } => {
                let View::Detail(detail) = &mut self.view else {
                    return Vec::new();
                };
                detail.poll.observe(&entries);
                let lines = detail.visible_lines(&entries);
                detail.entries.extend(entries);
                if !lines.is_empty() {
                    self.viewer.append(lines);
                }
                match continuation {
                    Some(continuation) => {
                        vec![self.run(Action::StreamDetailIncremental { continuation })]
                    }
                    None => {
                        detail.history_loading = false;
                        info!(
                            "History of {} complete: {} events",
                            detail.item_id,
                            detail.entries.len()
                        );
                        Vec::new()
                    }
                }
            }
            Message::NewDetailEntries { entries, .. } => {
                let View::Detail(detail) = &mut self.view else {
                    return Vec::new();
                };
                detail.poll_in_flight = false;
                let delay = detail.poll.record(&entries);
                let lines = detail.visible_lines(&entries);
                detail.entries.extend(entries);
                if !lines.is_empty() {
                    self.viewer.append(lines);
                }
                vec![self.arm(TimerKind::Liveness, delay)]
            }
            Message::Failed { request, error, .. } => {
                self.banner = Some(format!("{error}"));
                self.request_failed(request)
            }
            Message::TimerFired { timer, .. } => self.timer_fired(timer),
        }
    }

    /// Ends the bookkeeping of a failed request. Navigation and timers stay.
    fn request_failed(&mut self, request: RequestKind) -> Vec<Effect> {
        let View::Detail(detail) = &mut self.view else {
            return Vec::new();
        };
        match request {
            RequestKind::LoadDetailHistory | RequestKind::StreamDetail => {
                detail.history_loading = false;
                Vec::new()
            }
            RequestKind::PollNewDetail => {
                // The liveness timer is re-armed by poll results; keep it alive.
                detail.poll_in_flight = false;
                let delay = detail.poll.advance(PollOutcome::Entries(0));
                vec![self.arm(TimerKind::Liveness, delay)]
            }
            RequestKind::ListCollections | RequestKind::ListItems => Vec::new(),
        }
    }

    fn timer_fired(&mut self, timer: TimerKind) -> Vec<Effect> {
        match (timer, &mut self.view) {
            (TimerKind::ItemsRefresh, View::Items(view)) => {
                let collection_id = view.collection_id.clone();
                vec![
                    self.run(Action::ListItems { collection_id }),
                    self.arm(TimerKind::ItemsRefresh, self.config.items_refresh),
                ]
            }
            (TimerKind::Liveness, View::Detail(detail)) => {
                if detail.history_loading || detail.poll_in_flight {
                    let delay = detail.poll.current_interval;
                    return vec![self.arm(TimerKind::Liveness, delay)];
                }
                detail.poll_in_flight = true;
                let action = Action::PollNewDetail {
                    collection_id: detail.parent.collection_id.clone(),
                    item_id: detail.item_id.clone(),
                    since: detail.poll.last_seen_timestamp.unwrap_or(0),
                };
                vec![self.run(action)]
            }
            _ => Vec::new(),
        }
    }

    fn handle_input(&mut self, key: Key) -> Vec<Effect> {
        self.banner = None;
        let command = self.config.keys.command(&key);
        if command == Some(Command::Quit) {
            info!("Quit requested");
            return vec![
                Effect::CancelTimer(TimerKind::ItemsRefresh),
                Effect::CancelTimer(TimerKind::Liveness),
                Effect::Quit,
            ];
        }
        match self.screen() {
            Screen::Collections => self.collections_input(key, command),
            Screen::Items => self.items_input(key, command),
            Screen::Detail => self.detail_input(key, command),
        }
    }

    fn collections_input(&mut self, key: Key, command: Option<Command>) -> Vec<Effect> {
        if self.collections_list.is_filtering_input() {
            self.collections_list.update(&key);
            return Vec::new();
        }
        match command {
            Some(Command::Select) => match self.collections_list.selected_item() {
                Some(row) => {
                    let collection_id = row.id.clone();
                    self.enter_items(collection_id)
                }
                None => Vec::new(),
            },
            Some(Command::Back) => {
                if self.collections_list.has_filter() {
                    self.collections_list.clear_filter();
                }
                Vec::new()
            }
            Some(Command::Filter) => {
                self.collections_list.start_filter();
                Vec::new()
            }
            _ => {
                self.collections_list.update(&key);
                Vec::new()
            }
        }
    }

    fn items_input(&mut self, key: Key, command: Option<Command>) -> Vec<Effect> {
        if self.items_list.is_filtering_input() {
            self.items_list.update(&key);
            return Vec::new();
        }
        match command {
            Some(Command::Select) => match self.items_list.selected_item() {
                Some(row) => {
                    let item_id = row.id.clone();
                    self.enter_detail(item_id)
                }
                None => Vec::new(),
            },
            Some(Command::Back) if self.items_list.has_filter() => {
                self.items_list.clear_filter();
                Vec::new()
            }
            Some(Command::Back) => self.leave_items(),
            Some(Command::Filter) => {
                self.items_list.start_filter();
                Vec::new()
            }
            _ => {
                self.items_list.update(&key);
                Vec::new()
            }
        }
    }

    fn detail_input(&mut self, key: Key, command: Option<Command>) -> Vec<Effect> {
        let View::Detail(detail) = &mut self.view else {
            return Vec::new();
        };

        if detail.filtering {
            match key {
                Key::Esc => {
                    detail.filter.clear();
                    detail.filtering = false;
                }
                Key::Enter => detail.filtering = false,
                Key::Backspace => {
                    detail.filter.pop();
                }
                Key::Char(c) => detail.filter.push(c),
                _ => return Vec::new(),
            }
            let lines = detail.visible_lines(&detail.entries);
            self.viewer.set_content(lines);
            return Vec::new();
        }

        if command == Some(Command::Back) {
            return self.leave_detail();
        }

        if !detail.history_loading {
            match command {
                Some(Command::ScrollTop) => {
                    self.viewer.scroll_to_top();
                    return Vec::new();
                }
                Some(Command::ScrollBottom) => {
                    self.viewer.scroll_to_bottom();
                    return Vec::new();
                }
                Some(Command::ToggleWrap) => {
                    detail.wrap = !detail.wrap;
                    self.viewer.set_wrap(detail.wrap);
                    return Vec::new();
                }
                Some(Command::Filter) => {
                    detail.filtering = true;
                    return Vec::new();
                }
                _ => {}
            }
        }

        self.viewer.update(&key);
        Vec::new()
    }

    fn enter_items(&mut self, collection_id: String) -> Vec<Effect> {
        info!("Opening log group {}", collection_id);
        self.generation += 1;
        self.items_list.clear_filter();
        self.items_list.set_items(Vec::new());
        self.items_list
            .set_title(format!("Log Streams: {collection_id}"));
        self.view = View::Items(ItemsView {
            collection_id: collection_id.clone(),
            items: ItemSet::new(),
            loaded: false,
        });
        vec![
            self.run(Action::ListItems { collection_id }),
            self.arm(TimerKind::ItemsRefresh, self.config.items_refresh),
        ]
    }

    fn leave_items(&mut self) -> Vec<Effect> {
        self.generation += 1;
        self.view = View::Collections;
        self.items_list.set_items(Vec::new());
        vec![Effect::CancelTimer(TimerKind::ItemsRefresh)]
    }

    fn enter_detail(&mut self, item_id: String) -> Vec<Effect> {
        let View::Items(parent) = std::mem::replace(&mut self.view, View::Collections) else {
            return Vec::new();
        };
        info!("Opening stream {} in {}", item_id, parent.collection_id);
        self.generation += 1;
        let collection_id = parent.collection_id.clone();
        self.viewer.set_content(Vec::new());
        self.viewer.set_wrap(self.config.wrap);
        self.view = View::Detail(DetailView {
            parent,
            item_id: item_id.clone(),
            entries: Vec::new(),
            history_loading: true,
            poll_in_flight: false,
            poll: PollState::new(self.config.liveness, self.config.liveness_max),
            filtering: false,
            filter: String::new(),
            wrap: self.config.wrap,
        });
        vec![
            Effect::CancelTimer(TimerKind::ItemsRefresh),
            self.run(Action::LoadDetailHistory {
                collection_id,
                item_id,
            }),
            self.arm(TimerKind::Liveness, self.config.liveness),
        ]
    }

    fn leave_detail(&mut self) -> Vec<Effect> {
        let View::Detail(detail) = std::mem::replace(&mut self.view, View::Collections) else {
            return Vec::new();
        };
        info!(
            "Closing stream {} ({} events)",
            detail.item_id,
            detail.entries.len()
        );
        self.generation += 1;
        self.viewer.set_content(Vec::new());
        let collection_id = detail.parent.collection_id.clone();
        self.view = View::Items(detail.parent);
        vec![
            Effect::CancelTimer(TimerKind::Liveness),
            self.run(Action::ListItems { collection_id }),
            self.arm(TimerKind::ItemsRefresh, self.config.items_refresh),
        ]
    }
}
