use serde::{Deserialize, Serialize};

pub const MIN_CONFIRMATIONS: u32 = 1;
pub const MAX_CONFIRMATIONS: u32 = 10;
pub const DEFAULT_CONFIRMATIONS: u32 = 2;

/// Conversational state of one user session. `Menu` is the resting state;
/// there is no separate terminal state, every flow returns to `Menu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Menu,
    AwaitingWallet,
    AwaitingConfirmationCount,
    Tracking,
}

/// Per-user session data.
///
/// `watch_seq` is bumped every time a watch is started and never reset, so
/// a signal from an old watch can always be told apart from the current
/// one, even after the session itself was reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub state: SessionState,
    pub wallet: Option<String>,
    pub threshold: u32,
    pub watch_seq: u64,
}

impl Session {
    pub fn new(default_threshold: u32) -> Self {
        Self {
            state: SessionState::Menu,
            wallet: None,
            threshold: clamp_threshold(default_threshold),
            watch_seq: 0,
        }
    }
}

pub fn clamp_threshold(n: u32) -> u32 {
    n.clamp(MIN_CONFIRMATIONS, MAX_CONFIRMATIONS)
}

/// Parse user input as a confirmation threshold: an integer literal in
/// [1,10], nothing else.
pub fn parse_threshold(text: &str) -> Option<u32> {
    text.trim()
        .parse::<u32>()
        .ok()
        .filter(|n| (MIN_CONFIRMATIONS..=MAX_CONFIRMATIONS).contains(n))
}
