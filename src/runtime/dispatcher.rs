use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::engine::{EngineCommand, SessionEngine, SessionEvent, SessionState, UserId};
use crate::explorer::ExplorerApi;
use crate::notify::Notifier;
use crate::store::{SessionRecord, SessionStore};
use crate::tracker::{spawn_watch, WatchHandle, WatchParams};

/// **Dispatcher**
///
/// The imperative shell around the session engine. It:
/// 1. Consumes one event at a time from a single queue fed by both the
///    transport side and the watch tasks.
/// 2. Drives the engine and executes the commands it emits (notify, spawn
///    or cancel watches, forward threshold edits).
/// 3. Persists the touched session after every event.
///
/// Single consumption gives the per-user single-writer guarantee: a user's
/// "stop" and their watch's own terminal signal can never interleave. The
/// watch-handle map and the engine's `Tracking` states move together within
/// one processed event, so a handle exists iff the session is tracking at
/// every point observable between events.
pub struct Dispatcher<E, N, S> {
    engine: SessionEngine,
    explorer: Arc<E>,
    notifier: N,
    store: S,
    watches: HashMap<UserId, WatchHandle>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    tick: Duration,
}

impl<E, N, S> Dispatcher<E, N, S>
where
    E: ExplorerApi + 'static,
    N: Notifier,
    S: SessionStore,
{
    pub fn new(
        explorer: Arc<E>,
        notifier: N,
        store: S,
        default_threshold: u32,
        tick: Duration,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            engine: SessionEngine::new(default_threshold),
            explorer,
            notifier,
            store,
            watches: HashMap::new(),
            events_tx,
            events_rx,
            tick,
        }
    }

    /// Sender for transport adapters; watch tasks get a clone of it too.
    pub fn sender(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.events_tx.clone()
    }

    /// The main event loop. Runs until every sender is dropped.
    pub async fn run(mut self) {
        log::info!("[DISPATCH] event loop started");
        while self.step().await {}
        log::info!("[DISPATCH] event loop finished");
    }

    /// Receive and process exactly one event. Returns `false` once the
    /// queue is closed.
    pub async fn step(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.process(event).await;
                true
            }
            None => false,
        }
    }

    pub async fn process(&mut self, event: SessionEvent) {
        let user = event.user();
        self.hydrate(user);

        log::trace!("[DISPATCH] event: {:?}", event);
        let commands = self.engine.handle_event(event);
        for command in commands {
            self.execute(command).await;
        }

        self.persist(user);
    }

    pub fn has_active_watch(&self, user: UserId) -> bool {
        self.watches.contains_key(&user)
    }

    pub fn session_state(&self, user: UserId) -> Option<SessionState> {
        self.engine.session(user).map(|s| s.state)
    }

    /// Pull the session record in from the store the first time a user
    /// shows up after startup.
    fn hydrate(&mut self, user: UserId) {
        if self.engine.has_session(user) {
            return;
        }
        if let Some(record) = self.store.get(user) {
            log::debug!("[DISPATCH] restored session for user {}", user);
            self.engine.insert_session(user, record.into_session());
        }
    }

    fn persist(&self, user: UserId) {
        if let Some(session) = self.engine.session(user) {
            if let Err(e) = self.store.set(user, SessionRecord::from_session(session)) {
                log::warn!("[DISPATCH] persisting session for user {} failed: {:#}", user, e);
            }
        }
    }

    async fn execute(&mut self, command: EngineCommand) {
        log::trace!("[DISPATCH] cmd: {:?}", command);
        match command {
            EngineCommand::Notify {
                chat,
                text,
                keyboard,
            } => {
                if let Err(e) = self.notifier.send(chat, &text, keyboard).await {
                    log::warn!("[DISPATCH] notify chat {} failed: {:#}", chat, e);
                }
            }

            EngineCommand::StartWatch {
                user,
                chat,
                wallet,
                threshold,
                seq,
            } => {
                if let Some(stale) = self.watches.remove(&user) {
                    log::error!("[DISPATCH] user {} had a live watch at start, cancelling", user);
                    stale.cancel();
                }
                let params = WatchParams {
                    user,
                    chat,
                    seq,
                    wallet,
                    threshold,
                    tick: self.tick,
                };
                let handle = spawn_watch(self.explorer.clone(), params, self.events_tx.clone());
                self.watches.insert(user, handle);
            }

            EngineCommand::CancelWatch { user } => {
                if let Some(handle) = self.watches.remove(&user) {
                    handle.cancel();
                }
            }

            EngineCommand::ClearWatch { user } => {
                self.watches.remove(&user);
            }

            EngineCommand::UpdateWatchThreshold { user, threshold } => {
                if let Some(handle) = self.watches.get(&user) {
                    handle.set_threshold(threshold);
                }
            }
        }
    }
}
