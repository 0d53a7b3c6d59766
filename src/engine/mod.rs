//! Session state machine.
//!
//! This module is the **Functional Core** of the bot:
//! - **Input**: `SessionEvent` (a parsed user command or a watch signal).
//! - **Output**: `Vec<EngineCommand>` (side effects for the dispatcher).
//!
//! # Architecture guarantees
//! * **No I/O**: the engine never touches the network, the store, or the
//!   chat transport.
//! * **No async**: every transition is a plain synchronous function.
//! * **Deterministic**: the same session and event always produce the same
//!   commands.
//!
//! Illegal transitions are never errors: the offending command is answered
//! with a notice and the session is left untouched.

pub mod state;
mod logic;
pub mod types;

#[cfg(test)]
mod tests;

pub use state::{Session, SessionState, DEFAULT_CONFIRMATIONS, MAX_CONFIRMATIONS, MIN_CONFIRMATIONS};
pub use types::{ChatId, EngineCommand, Keyboard, SessionEvent, UserCommand, UserId, WatchSignal};

use std::collections::HashMap;

use state::clamp_threshold;

/// Holds every known session and applies events to them.
#[derive(Debug)]
pub struct SessionEngine {
    sessions: HashMap<UserId, Session>,
    default_threshold: u32,
}

impl SessionEngine {
    pub fn new(default_threshold: u32) -> Self {
        Self {
            sessions: HashMap::new(),
            default_threshold: clamp_threshold(default_threshold),
        }
    }

    pub fn default_threshold(&self) -> u32 {
        self.default_threshold
    }

    pub fn has_session(&self, user: UserId) -> bool {
        self.sessions.contains_key(&user)
    }

    /// Seed a session restored from the store. Does nothing if the user
    /// already has a live session.
    pub fn insert_session(&mut self, user: UserId, session: Session) {
        self.sessions.entry(user).or_insert(session);
    }

    pub fn session(&self, user: UserId) -> Option<&Session> {
        self.sessions.get(&user)
    }

    /// The main entry point: apply one event, get the side effects back.
    pub fn handle_event(&mut self, event: SessionEvent) -> Vec<EngineCommand> {
        match event {
            SessionEvent::Command {
                user,
                chat,
                command,
            } => {
                let default_threshold = self.default_threshold;
                let session = self
                    .sessions
                    .entry(user)
                    .or_insert_with(|| Session::new(default_threshold));
                logic::on_command(session, user, chat, command, default_threshold)
            }
            SessionEvent::Watch {
                user,
                chat,
                seq,
                signal,
            } => match self.sessions.get_mut(&user) {
                Some(session) => logic::on_watch_signal(session, user, chat, seq, signal),
                None => {
                    log::debug!("[ENGINE] watch signal for unknown user {}", user);
                    vec![]
                }
            },
        }
    }
}
