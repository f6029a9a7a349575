//! # Actions and Messages
//!
//! Everything that can happen in the browser becomes a [`Message`]. A key
//! press is `Message::Input`. A finished request is `CollectionsLoaded`,
//! `ItemsLoaded`, `DetailBatch`, `NewDetailEntries` or `Failed`. A timer
//! going off is `TimerFired`.
//!
//! Requests are [`Action`] values. An action holds nothing but its call
//! parameters; [`Action::execute`] pairs it with the shared
//! [`Dependencies`] and returns a [`Task`] for the runtime to run on a
//! worker thread. Every task produces exactly one message.
//!
//! ```text
//! Action ──execute(deps, tag)──► Task ──(worker thread)──► Message ──► update()
//! ```
//!
//! Each message carries the [`ViewTag`] of the view that asked for it, so the
//! navigator can drop answers meant for a view that no longer exists.

use std::sync::Arc;

use log::debug;

use crate::core::bridge::{self, BridgeCursor, BridgeSettings, Pull};
use crate::core::keys::Key;
use crate::core::model::{CollectionRef, DetailEntry, ItemRef};
use crate::service::{LogService, ServiceError, collect_pages};

/// Streams listed per group, most recently active first.
pub const DEFAULT_MAX_ITEMS_LISTED: usize = 1000;

/// Which view a request or timer belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewId {
    Collections,
    Items { collection_id: String },
    Detail { collection_id: String, item_id: String },
}

/// Stamp on every in-flight request and timer.
///
/// `generation` is bumped on every view transition; a message is only
/// applied when both fields match the active view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTag {
    pub generation: u64,
    pub view: ViewId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Re-lists streams while the stream list is open.
    ItemsRefresh,
    /// Polls for new events while a stream is open.
    Liveness,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    ListCollections,
    ListItems,
    LoadDetailHistory,
    StreamDetail,
    PollNewDetail,
}

#[derive(Debug)]
pub enum Message {
    CollectionsLoaded {
        tag: ViewTag,
        collections: Vec<CollectionRef>,
    },
    ItemsLoaded {
        tag: ViewTag,
        collection_id: String,
        items: Vec<ItemRef>,
    },
    /// A page of history. `continuation` is `None` once the history is done.
    DetailBatch {
        tag: ViewTag,
        entries: Vec<DetailEntry>,
        continuation: Option<BridgeCursor<DetailEntry>>,
    },
    NewDetailEntries {
        tag: ViewTag,
        entries: Vec<DetailEntry>,
    },
    Failed {
        tag: ViewTag,
        request: RequestKind,
        error: ServiceError,
    },
    TimerFired {
        tag: ViewTag,
        timer: TimerKind,
    },
    Input(Key),
}

impl Message {
    /// The tag of a result or timer message. Input has none.
    pub fn tag(&self) -> Option<&ViewTag> {
        match self {
            Message::CollectionsLoaded { tag, .. }
            | Message::ItemsLoaded { tag, .. }
            | Message::DetailBatch { tag, .. }
            | Message::NewDetailEntries { tag, .. }
            | Message::Failed { tag, .. }
            | Message::TimerFired { tag, .. } => Some(tag),
            Message::Input(_) => None,
        }
    }

    /// Short form for the log; payloads can be tens of thousands of entries.
    pub fn summary(&self) -> String {
        match self {
            Message::CollectionsLoaded { tag, collections } => {
                format!("CollectionsLoaded(gen={}, n={})", tag.generation, collections.len())
            }
            Message::ItemsLoaded { tag, collection_id, items } => format!(
                "ItemsLoaded(gen={}, {}, n={})",
                tag.generation,
                collection_id,
                items.len()
            ),
            Message::DetailBatch { tag, entries, continuation } => format!(
                "DetailBatch(gen={}, n={}, more={})",
                tag.generation,
                entries.len(),
                continuation.is_some()
            ),
            Message::NewDetailEntries { tag, entries } => {
                format!("NewDetailEntries(gen={}, n={})", tag.generation, entries.len())
            }
            Message::Failed { tag, request, error } => {
                format!("Failed(gen={}, {:?}: {})", tag.generation, request, error)
            }
            Message::TimerFired { tag, timer } => {
                format!("TimerFired(gen={}, {:?})", tag.generation, timer)
            }
            Message::Input(key) => format!("Input({key})"),
        }
    }
}

/// Shared handles every action may use. Built once at startup.
pub struct Dependencies {
    pub service: Arc<dyn LogService>,
    pub bridge: BridgeSettings,
    pub max_items_listed: usize,
}

impl Dependencies {
    pub fn new(service: Arc<dyn LogService>, bridge: BridgeSettings) -> Self {
        Self {
            service,
            bridge,
            max_items_listed: DEFAULT_MAX_ITEMS_LISTED,
        }
    }
}

/// Deferred work producing one message. Runs off the UI thread.
pub type Task = Box<dyn FnOnce() -> Message + Send + 'static>;

#[derive(Debug)]
pub enum Action {
    ListCollections,
    ListItems {
        collection_id: String,
    },
    LoadDetailHistory {
        collection_id: String,
        item_id: String,
    },
    /// Resume a history stream started by `LoadDetailHistory`.
    StreamDetailIncremental {
        continuation: BridgeCursor<DetailEntry>,
    },
    PollNewDetail {
        collection_id: String,
        item_id: String,
        since: i64,
    },
}

impl Action {
    pub fn kind(&self) -> RequestKind {
        match self {
            Action::ListCollections => RequestKind::ListCollections,
            Action::ListItems { .. } => RequestKind::ListItems,
            Action::LoadDetailHistory { .. } => RequestKind::LoadDetailHistory,
            Action::StreamDetailIncremental { .. } => RequestKind::StreamDetail,
            Action::PollNewDetail { .. } => RequestKind::PollNewDetail,
        }
    }

    pub fn execute(self, deps: &Arc<Dependencies>, tag: ViewTag) -> Task {
        let deps = Arc::clone(deps);
        let request = self.kind();
        Box::new(move || {
            debug!("Executing {:?} for generation {}", request, tag.generation);
            match self.run(&deps, tag.clone()) {
                Ok(message) => message,
                Err(error) => Message::Failed {
                    tag,
                    request,
                    error,
                },
            }
        })
    }

    fn run(self, deps: &Dependencies, tag: ViewTag) -> Result<Message, ServiceError> {
        match self {
            Action::ListCollections => {
                let collections =
                    collect_pages(None, |cursor| deps.service.list_collections(cursor))?;
                Ok(Message::CollectionsLoaded { tag, collections })
            }
            Action::ListItems { collection_id } => {
                let mut items = collect_pages(Some(deps.max_items_listed), |cursor| {
                    deps.service.list_items(&collection_id, cursor)
                })?;
                items.truncate(deps.max_items_listed);
                Ok(Message::ItemsLoaded {
                    tag,
                    collection_id,
                    items,
                })
            }
            Action::LoadDetailHistory {
                collection_id,
                item_id,
            } => {
                let service = Arc::clone(&deps.service);
                let label = format!("{collection_id}/{item_id}");
                let mut continuation = bridge::spawn(label, &deps.bridge, move |cursor| {
                    service.detail_page(&collection_id, &item_id, cursor, true)
                })?;
                let pull = continuation.next_blocking();
                batch_from_pull(tag, pull, continuation)
            }
            Action::StreamDetailIncremental { mut continuation } => {
                let pull = continuation.next(deps.bridge.pull_wait);
                batch_from_pull(tag, pull, continuation)
            }
            Action::PollNewDetail {
                collection_id,
                item_id,
                since,
            } => {
                let entries = deps.service.detail_since(&collection_id, &item_id, since)?;
                Ok(Message::NewDetailEntries { tag, entries })
            }
        }
    }
}

fn batch_from_pull(
    tag: ViewTag,
    pull: Pull<DetailEntry>,
    continuation: BridgeCursor<DetailEntry>,
) -> Result<Message, ServiceError> {
    match pull {
        Pull::Batch(entries) => Ok(Message::DetailBatch {
            tag,
            entries,
            continuation: Some(continuation),
        }),
        Pull::Pending => Ok(Message::DetailBatch {
            tag,
            entries: Vec::new(),
            continuation: Some(continuation),
        }),
        Pull::Done => Ok(Message::DetailBatch {
            tag,
            entries: Vec::new(),
            continuation: None,
        }),
        Pull::Failed(error) => Err(error),
    }
}
