#![cfg(test)]

use std::str::FromStr;

use bitcoin::Txid;

use crate::engine::types::{
    ChatId, EngineCommand, Keyboard, SessionEvent, UserCommand, UserId, WatchSignal,
};
use crate::engine::{SessionEngine, SessionState};

const USER: UserId = UserId(1);
const CHAT: ChatId = ChatId(1);
const WALLET: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

// =========================================================================
// Helpers
// =========================================================================

fn engine() -> SessionEngine {
    SessionEngine::new(2)
}

fn cmd(engine: &mut SessionEngine, command: UserCommand) -> Vec<EngineCommand> {
    engine.handle_event(SessionEvent::Command {
        user: USER,
        chat: CHAT,
        command,
    })
}

fn signal(engine: &mut SessionEngine, seq: u64, signal: WatchSignal) -> Vec<EngineCommand> {
    engine.handle_event(SessionEvent::Watch {
        user: USER,
        chat: CHAT,
        seq,
        signal,
    })
}

fn state(engine: &SessionEngine) -> SessionState {
    engine.session(USER).unwrap().state
}

fn texts(commands: &[EngineCommand]) -> Vec<&str> {
    commands
        .iter()
        .filter_map(|c| match c {
            EngineCommand::Notify { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

/// Bring a fresh engine to `Tracking` with a wallet set; returns the seq of
/// the started watch.
fn tracking_engine() -> (SessionEngine, u64) {
    let mut e = engine();
    cmd(&mut e, UserCommand::Start);
    cmd(&mut e, UserCommand::SetWalletRequest);
    cmd(&mut e, UserCommand::Text(WALLET.to_string()));
    let cmds = cmd(&mut e, UserCommand::StartTracking);
    let seq = cmds
        .iter()
        .find_map(|c| match c {
            EngineCommand::StartWatch { seq, .. } => Some(*seq),
            _ => None,
        })
        .expect("StartTracking must emit StartWatch");
    (e, seq)
}

// =========================================================================
// Command transitions
// =========================================================================

#[test]
fn start_creates_menu_session() {
    let mut e = engine();
    let cmds = cmd(&mut e, UserCommand::Start);
    assert_eq!(state(&e), SessionState::Menu);
    assert_eq!(texts(&cmds), vec!["Waddup"]);
    assert_eq!(e.session(USER).unwrap().threshold, 2);
    assert_eq!(e.session(USER).unwrap().wallet, None);
}

#[test]
fn wallet_flow_round_trip() {
    let mut e = engine();
    cmd(&mut e, UserCommand::Start);

    cmd(&mut e, UserCommand::SetWalletRequest);
    assert_eq!(state(&e), SessionState::AwaitingWallet);

    // Invalid input keeps the prompt open.
    let cmds = cmd(&mut e, UserCommand::Text("not-an-address".to_string()));
    assert_eq!(state(&e), SessionState::AwaitingWallet);
    assert_eq!(texts(&cmds), vec!["Not a valid BTC wallet"]);

    // A bitcoin: URI is normalized before storing.
    let cmds = cmd(&mut e, UserCommand::Text(format!("bitcoin:{WALLET}")));
    assert_eq!(state(&e), SessionState::Menu);
    assert_eq!(texts(&cmds), vec!["BTC wallet address updated"]);
    assert_eq!(e.session(USER).unwrap().wallet.as_deref(), Some(WALLET));
}

#[test]
fn threshold_flow_round_trip() {
    let mut e = engine();
    cmd(&mut e, UserCommand::Start);

    cmd(&mut e, UserCommand::SetThresholdRequest);
    assert_eq!(state(&e), SessionState::AwaitingConfirmationCount);

    for bad in ["0", "11", "two", "3.5", ""] {
        cmd(&mut e, UserCommand::Text(bad.to_string()));
        assert_eq!(
            state(&e),
            SessionState::AwaitingConfirmationCount,
            "{bad:?} must be rejected"
        );
    }

    cmd(&mut e, UserCommand::Text("7".to_string()));
    assert_eq!(state(&e), SessionState::Menu);
    assert_eq!(e.session(USER).unwrap().threshold, 7);
}

#[test]
fn start_tracking_requires_wallet() {
    let mut e = engine();
    cmd(&mut e, UserCommand::Start);
    let cmds = cmd(&mut e, UserCommand::StartTracking);
    assert_eq!(state(&e), SessionState::Menu);
    assert_eq!(texts(&cmds), vec!["No wallet"]);
    assert!(!cmds
        .iter()
        .any(|c| matches!(c, EngineCommand::StartWatch { .. })));
}

#[test]
fn start_tracking_spawns_watch_with_threshold_snapshot() {
    let (e, seq) = tracking_engine();
    assert_eq!(state(&e), SessionState::Tracking);
    assert_eq!(seq, 1);
}

#[test]
fn menu_commands_rejected_outside_menu() {
    for blocked in [
        UserCommand::StartTracking,
        UserCommand::SetWalletRequest,
        UserCommand::SetThresholdRequest,
    ] {
        let (mut e, _) = tracking_engine();
        let cmds = cmd(&mut e, blocked.clone());
        assert_eq!(state(&e), SessionState::Tracking, "{blocked:?}");
        assert_eq!(
            texts(&cmds),
            vec!["Another action is currently being executed"]
        );
    }

    // Same guard while awaiting wallet input.
    let mut e = engine();
    cmd(&mut e, UserCommand::Start);
    cmd(&mut e, UserCommand::SetWalletRequest);
    let cmds = cmd(&mut e, UserCommand::StartTracking);
    assert_eq!(state(&e), SessionState::AwaitingWallet);
    assert_eq!(
        texts(&cmds),
        vec!["Another action is currently being executed"]
    );
}

#[test]
fn stop_cancels_active_watch() {
    let (mut e, _) = tracking_engine();
    let cmds = cmd(&mut e, UserCommand::StopTracking);
    assert_eq!(state(&e), SessionState::Menu);
    assert!(cmds
        .iter()
        .any(|c| matches!(c, EngineCommand::CancelWatch { user } if *user == USER)));
    assert_eq!(texts(&cmds), vec!["TX tracking cancelled"]);
}

#[test]
fn stop_without_watch_is_idempotent() {
    let mut e = engine();
    cmd(&mut e, UserCommand::Start);
    let cmds = cmd(&mut e, UserCommand::StopTracking);
    assert_eq!(state(&e), SessionState::Menu);
    assert_eq!(texts(&cmds), vec!["Tracking is not active"]);
    assert!(!cmds
        .iter()
        .any(|c| matches!(c, EngineCommand::CancelWatch { .. })));
}

#[test]
fn start_while_tracking_cancels_watch_and_resets() {
    let (mut e, _) = tracking_engine();
    let cmds = cmd(&mut e, UserCommand::Start);
    assert_eq!(state(&e), SessionState::Menu);
    assert!(cmds
        .iter()
        .any(|c| matches!(c, EngineCommand::CancelWatch { .. })));
    assert_eq!(e.session(USER).unwrap().wallet, None);
}

#[test]
fn restart_keeps_watch_seq_monotonic() {
    let (mut e, first_seq) = tracking_engine();
    cmd(&mut e, UserCommand::Start);

    // New wallet, new watch: its seq must not collide with the old one.
    cmd(&mut e, UserCommand::SetWalletRequest);
    cmd(&mut e, UserCommand::Text(WALLET.to_string()));
    let cmds = cmd(&mut e, UserCommand::StartTracking);
    let second_seq = cmds
        .iter()
        .find_map(|c| match c {
            EngineCommand::StartWatch { seq, .. } => Some(*seq),
            _ => None,
        })
        .unwrap();
    assert!(second_seq > first_seq);
}

#[test]
fn cancel_backs_out_of_prompts() {
    let mut e = engine();
    cmd(&mut e, UserCommand::Start);
    cmd(&mut e, UserCommand::SetWalletRequest);
    cmd(&mut e, UserCommand::Cancel);
    assert_eq!(state(&e), SessionState::Menu);

    cmd(&mut e, UserCommand::SetThresholdRequest);
    cmd(&mut e, UserCommand::Cancel);
    assert_eq!(state(&e), SessionState::Menu);
}

#[test]
fn show_wallet_reports_stored_address() {
    let mut e = engine();
    cmd(&mut e, UserCommand::Start);
    let cmds = cmd(&mut e, UserCommand::ShowWallet);
    assert_eq!(texts(&cmds), vec!["BTC wallet is not set"]);

    cmd(&mut e, UserCommand::SetWalletRequest);
    cmd(&mut e, UserCommand::Text(WALLET.to_string()));
    let cmds = cmd(&mut e, UserCommand::ShowWallet);
    assert!(texts(&cmds)[0].contains(WALLET));
    assert!(matches!(
        cmds[0],
        EngineCommand::Notify {
            keyboard: Some(Keyboard::SetWallet),
            ..
        }
    ));
}

// =========================================================================
// Watch signals
// =========================================================================

#[test]
fn confirmed_signal_returns_to_menu() {
    let (mut e, seq) = tracking_engine();
    let cmds = signal(&mut e, seq, WatchSignal::Confirmed(2));
    assert_eq!(state(&e), SessionState::Menu);
    assert!(cmds
        .iter()
        .any(|c| matches!(c, EngineCommand::ClearWatch { .. })));
    assert_eq!(texts(&cmds), vec!["Transaction confirmed!"]);
}

#[test]
fn terminal_signals_all_return_to_menu() {
    for terminal in [
        WatchSignal::Confirmed(3),
        WatchSignal::DoubleSpend,
        WatchSignal::NothingToTrack,
        WatchSignal::ProviderUnreachable,
    ] {
        let (mut e, seq) = tracking_engine();
        let cmds = signal(&mut e, seq, terminal);
        assert_eq!(state(&e), SessionState::Menu, "{terminal:?}");
        assert!(
            cmds.iter()
                .any(|c| matches!(c, EngineCommand::ClearWatch { .. })),
            "{terminal:?}"
        );
    }
}

#[test]
fn progress_signal_keeps_tracking() {
    let (mut e, seq) = tracking_engine();
    let txid = Txid::from_str(&format!("{:064x}", 1u8)).unwrap();
    signal(&mut e, seq, WatchSignal::Adopted(txid));
    let cmds = signal(&mut e, seq, WatchSignal::Progress(1));
    assert_eq!(state(&e), SessionState::Tracking);
    assert_eq!(texts(&cmds), vec!["Confirmations: 1"]);
}

#[test]
fn stale_seq_signal_is_dropped() {
    let (mut e, seq) = tracking_engine();
    let cmds = signal(&mut e, seq + 1, WatchSignal::Confirmed(2));
    assert!(cmds.is_empty());
    assert_eq!(state(&e), SessionState::Tracking);
}

#[test]
fn signal_after_stop_is_dropped() {
    let (mut e, seq) = tracking_engine();
    cmd(&mut e, UserCommand::StopTracking);
    let cmds = signal(&mut e, seq, WatchSignal::Confirmed(2));
    assert!(cmds.is_empty());
    assert_eq!(state(&e), SessionState::Menu);
}

#[test]
fn signal_for_unknown_user_is_dropped() {
    let mut e = engine();
    let cmds = signal(&mut e, 1, WatchSignal::DoubleSpend);
    assert!(cmds.is_empty());
}

// =========================================================================
// Mid-watch threshold edits
// =========================================================================

#[test]
fn numeric_text_while_tracking_updates_live_watch() {
    let (mut e, _) = tracking_engine();
    let cmds = cmd(&mut e, UserCommand::Text("5".to_string()));
    assert_eq!(state(&e), SessionState::Tracking);
    assert_eq!(e.session(USER).unwrap().threshold, 5);
    assert!(cmds.iter().any(|c| matches!(
        c,
        EngineCommand::UpdateWatchThreshold { threshold: 5, .. }
    )));
}

#[test]
fn other_text_while_tracking_is_ignored() {
    let (mut e, _) = tracking_engine();
    let cmds = cmd(&mut e, UserCommand::Text("what is happening".to_string()));
    assert!(cmds.is_empty());
    assert_eq!(state(&e), SessionState::Tracking);
}

#[test]
fn unrecognized_text_in_menu_is_ignored() {
    let mut e = engine();
    cmd(&mut e, UserCommand::Start);
    let cmds = cmd(&mut e, UserCommand::Text("hello".to_string()));
    assert!(cmds.is_empty());
    assert_eq!(state(&e), SessionState::Menu);
}
