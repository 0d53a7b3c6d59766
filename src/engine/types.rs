use std::fmt;

use bitcoin::Txid;

/// Stable identifier of a chat-transport user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

/// Identifier of the chat a notification should be delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Symbolic keyboard identifiers. Rendering them into transport-specific
/// markup is the transport adapter's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    Menu,
    Tracking,
    WalletQuery,
    SetWallet,
}

/// A user command already parsed out of the transport framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// `/start`: reset the session and show the menu.
    Start,
    /// Back out of an input prompt.
    Cancel,
    /// Show the stored wallet address.
    ShowWallet,
    StartTracking,
    StopTracking,
    /// Ask to enter a new wallet address.
    SetWalletRequest,
    /// Ask to enter a new confirmation threshold.
    SetThresholdRequest,
    /// Free-form text; meaning depends on the session state.
    Text(String),
}

/// Signal emitted by a running watch task. Tagged with the watch sequence
/// number so the engine can drop signals from a watch that was already
/// cancelled or superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchSignal {
    /// An unconfirmed transaction was found and adopted.
    Adopted(Txid),
    /// Confirmation count changed but is still below the threshold.
    Progress(u64),
    /// Threshold reached; the watch is over.
    Confirmed(u64),
    /// The watched transaction was invalidated by a conflicting spend.
    DoubleSpend,
    /// The wallet had no unconfirmed transaction to begin with.
    NothingToTrack,
    /// The explorer could not be reached before anything was adopted.
    ProviderUnreachable,
}

/// Input to the session engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Command {
        user: UserId,
        chat: ChatId,
        command: UserCommand,
    },
    Watch {
        user: UserId,
        chat: ChatId,
        seq: u64,
        signal: WatchSignal,
    },
}

impl SessionEvent {
    pub fn user(&self) -> UserId {
        match self {
            SessionEvent::Command { user, .. } => *user,
            SessionEvent::Watch { user, .. } => *user,
        }
    }
}

/// Side effect requested by the engine; executed by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Notify {
        chat: ChatId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    /// Spawn a watch task for this user. `seq` identifies the watch
    /// generation; signals carrying a different seq are stale.
    StartWatch {
        user: UserId,
        chat: ChatId,
        wallet: String,
        threshold: u32,
        seq: u64,
    },
    /// Cancel the user's active watch and drop its handle.
    CancelWatch { user: UserId },
    /// Drop the handle of a watch that terminated on its own.
    ClearWatch { user: UserId },
    /// Forward a threshold change to the in-flight watch.
    UpdateWatchThreshold { user: UserId, threshold: u32 },
}
