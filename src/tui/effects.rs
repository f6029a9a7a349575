//! # Effect Runner
//!
//! Carries out the [`Effect`]s returned by the navigator. Requests run as
//! blocking tasks on the tokio pool (the service is a blocking API); timers
//! are plain tokio sleeps. Both report back over the event loop's channel.
//!
//! At most one timer of each kind is armed. Arming a kind again replaces
//! the previous timer, and cancelling aborts it.

use std::collections::HashMap;
use std::sync::{Arc, mpsc};

use log::{debug, info};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use crate::core::actions::{Dependencies, Message, TimerKind};
use crate::core::navigation::Effect;

pub struct EffectRunner {
    deps: Arc<Dependencies>,
    tx: mpsc::Sender<Message>,
    runtime: Handle,
    timers: HashMap<TimerKind, AbortHandle>,
}

impl EffectRunner {
    pub fn new(deps: Arc<Dependencies>, tx: mpsc::Sender<Message>, runtime: Handle) -> Self {
        Self {
            deps,
            tx,
            runtime,
            timers: HashMap::new(),
        }
    }

    /// Apply effects in order. Returns true when the loop should quit.
    pub fn apply(&mut self, effects: Vec<Effect>) -> bool {
        for effect in effects {
            match effect {
                Effect::Run { action, tag } => {
                    debug!("Spawning {:?} (generation {})", action.kind(), tag.generation);
                    let task = action.execute(&self.deps, tag);
                    let tx = self.tx.clone();
                    self.runtime.spawn_blocking(move || {
                        let message = task();
                        if tx.send(message).is_err() {
                            debug!("Dropping task result: event loop is gone");
                        }
                    });
                }
                Effect::ArmTimer { timer, tag, after } => {
                    let tx = self.tx.clone();
                    let handle = self.runtime.spawn(async move {
                        tokio::time::sleep(after).await;
                        if tx.send(Message::TimerFired { tag, timer }).is_err() {
                            debug!("Dropping {:?} timer: event loop is gone", timer);
                        }
                    });
                    if let Some(previous) = self.timers.insert(timer, handle.abort_handle()) {
                        previous.abort();
                    }
                }
                Effect::CancelTimer(timer) => {
                    if let Some(handle) = self.timers.remove(&timer) {
                        handle.abort();
                    }
                }
                Effect::Quit => {
                    info!("Quit requested");
                    self.shutdown();
                    return true;
                }
            }
        }
        false
    }

    /// Abort every armed timer. Running requests finish on their own and
    /// their results are discarded with the channel.
    pub fn shutdown(&mut self) {
        if !self.timers.is_empty() {
            debug!("Aborting {} timers", self.timers.len());
        }
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }

    pub fn armed(&self, timer: TimerKind) -> bool {
        self.timers
            .get(&timer)
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for EffectRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}
