//! Imperative shell: event loop and transport-side command parsing.

pub mod dispatcher;


pub use dispatcher::Dispatcher;

use crate::engine::UserCommand;

/// Map a raw inbound line to a user command. A real chat transport would
/// do this from button payloads; the slash forms double as a console
/// interface.
pub fn parse_command(text: &str) -> UserCommand {
    match text.trim() {
        "/start" => UserCommand::Start,
        "/cancel" => UserCommand::Cancel,
        "/wallet" => UserCommand::ShowWallet,
        "/setwallet" => UserCommand::SetWalletRequest,
        "/confirmations" => UserCommand::SetThresholdRequest,
        "/track" => UserCommand::StartTracking,
        "/stop" => UserCommand::StopTracking,
        other => UserCommand::Text(other.to_string()),
    }
}
