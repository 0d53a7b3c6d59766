use crate::address::normalize_address;
use crate::engine::state::{parse_threshold, Session, SessionState};
use crate::engine::types::{ChatId, EngineCommand, Keyboard, UserCommand, UserId, WatchSignal};

fn notify(chat: ChatId, text: impl Into<String>, keyboard: Option<Keyboard>) -> EngineCommand {
    EngineCommand::Notify {
        chat,
        text: text.into(),
        keyboard,
    }
}

fn busy(chat: ChatId) -> Vec<EngineCommand> {
    vec![notify(chat, "Another action is currently being executed", None)]
}

pub fn on_command(
    session: &mut Session,
    user: UserId,
    chat: ChatId,
    command: UserCommand,
    default_threshold: u32,
) -> Vec<EngineCommand> {
    match command {
        UserCommand::Start => on_start(session, user, chat, default_threshold),
        UserCommand::Cancel => on_cancel(session, chat),
        UserCommand::ShowWallet => on_show_wallet(session, chat),
        UserCommand::StartTracking => on_start_tracking(session, user, chat),
        UserCommand::StopTracking => on_stop_tracking(session, user, chat),
        UserCommand::SetWalletRequest => on_set_wallet_request(session, chat),
        UserCommand::SetThresholdRequest => on_set_threshold_request(session, chat),
        UserCommand::Text(text) => on_text(session, user, chat, &text),
    }
}

/// `/start` resets the session from any state. An active watch is cancelled
/// first; `watch_seq` survives the reset so late signals from it stay stale.
fn on_start(
    session: &mut Session,
    user: UserId,
    chat: ChatId,
    default_threshold: u32,
) -> Vec<EngineCommand> {
    let mut cmds = Vec::new();
    if session.state == SessionState::Tracking {
        cmds.push(EngineCommand::CancelWatch { user });
    }
    let seq = session.watch_seq;
    *session = Session::new(default_threshold);
    session.watch_seq = seq;
    cmds.push(notify(chat, "Waddup", Some(Keyboard::Menu)));
    cmds
}

fn on_cancel(session: &mut Session, chat: ChatId) -> Vec<EngineCommand> {
    match session.state {
        SessionState::AwaitingWallet | SessionState::AwaitingConfirmationCount => {
            session.state = SessionState::Menu;
            vec![notify(chat, "Cancelled", Some(Keyboard::Menu))]
        }
        SessionState::Menu => vec![notify(chat, "Cancelled", Some(Keyboard::Menu))],
        SessionState::Tracking => busy(chat),
    }
}

/// Read-only, allowed in any state.
fn on_show_wallet(session: &Session, chat: ChatId) -> Vec<EngineCommand> {
    let text = match &session.wallet {
        Some(wallet) => format!("BTC wallet:\n{wallet}"),
        None => "BTC wallet is not set".to_string(),
    };
    vec![notify(chat, text, Some(Keyboard::SetWallet))]
}

fn on_start_tracking(session: &mut Session, user: UserId, chat: ChatId) -> Vec<EngineCommand> {
    if session.state != SessionState::Menu {
        return busy(chat);
    }
    let Some(wallet) = session.wallet.clone() else {
        return vec![notify(chat, "No wallet", None)];
    };

    session.watch_seq += 1;
    session.state = SessionState::Tracking;
    log::info!(
        "[ENGINE] user {} starts watch #{} on {}",
        user,
        session.watch_seq,
        wallet
    );
    vec![
        notify(
            chat,
            "Looking for unconfirmed transactions...",
            Some(Keyboard::Tracking),
        ),
        EngineCommand::StartWatch {
            user,
            chat,
            wallet,
            threshold: session.threshold,
            seq: session.watch_seq,
        },
    ]
}

fn on_stop_tracking(session: &mut Session, user: UserId, chat: ChatId) -> Vec<EngineCommand> {
    match session.state {
        SessionState::Tracking => {
            session.state = SessionState::Menu;
            log::info!("[ENGINE] user {} stopped watch #{}", user, session.watch_seq);
            vec![
                EngineCommand::CancelWatch { user },
                notify(chat, "TX tracking cancelled", Some(Keyboard::Menu)),
            ]
        }
        SessionState::Menu => vec![notify(chat, "Tracking is not active", Some(Keyboard::Menu))],
        _ => busy(chat),
    }
}

fn on_set_wallet_request(session: &mut Session, chat: ChatId) -> Vec<EngineCommand> {
    if session.state != SessionState::Menu {
        return busy(chat);
    }
    session.state = SessionState::AwaitingWallet;
    vec![notify(
        chat,
        "Enter new wallet address",
        Some(Keyboard::WalletQuery),
    )]
}

fn on_set_threshold_request(session: &mut Session, chat: ChatId) -> Vec<EngineCommand> {
    if session.state != SessionState::Menu {
        return busy(chat);
    }
    session.state = SessionState::AwaitingConfirmationCount;
    vec![notify(
        chat,
        format!(
            "Enter the number of confirmations to wait for (1-10, currently {})",
            session.threshold
        ),
        Some(Keyboard::WalletQuery),
    )]
}

fn on_text(session: &mut Session, user: UserId, chat: ChatId, text: &str) -> Vec<EngineCommand> {
    match session.state {
        SessionState::AwaitingWallet => match normalize_address(text) {
            Some(address) => {
                session.wallet = Some(address);
                session.state = SessionState::Menu;
                vec![notify(
                    chat,
                    "BTC wallet address updated",
                    Some(Keyboard::Menu),
                )]
            }
            None => vec![notify(chat, "Not a valid BTC wallet", None)],
        },
        SessionState::AwaitingConfirmationCount => match parse_threshold(text) {
            Some(threshold) => {
                session.threshold = threshold;
                session.state = SessionState::Menu;
                vec![notify(
                    chat,
                    "Confirmation threshold updated",
                    Some(Keyboard::Menu),
                )]
            }
            None => vec![notify(
                chat,
                "Confirmation count must be a whole number between 1 and 10",
                None,
            )],
        },
        // A number sent mid-watch corrects the threshold of the watch
        // already in flight, not just the stored preference.
        SessionState::Tracking => match parse_threshold(text) {
            Some(threshold) => {
                session.threshold = threshold;
                vec![
                    EngineCommand::UpdateWatchThreshold { user, threshold },
                    notify(
                        chat,
                        format!("Confirmation threshold updated to {threshold}"),
                        None,
                    ),
                ]
            }
            None => {
                log::debug!("[ENGINE] ignoring text from user {} while tracking", user);
                vec![]
            }
        },
        SessionState::Menu => {
            log::debug!("[ENGINE] ignoring unrecognized text from user {}", user);
            vec![]
        }
    }
}

pub fn on_watch_signal(
    session: &mut Session,
    user: UserId,
    chat: ChatId,
    seq: u64,
    signal: WatchSignal,
) -> Vec<EngineCommand> {
    if session.state != SessionState::Tracking || seq != session.watch_seq {
        log::debug!(
            "[ENGINE] dropping stale watch signal {:?} (user {}, seq {} vs {})",
            signal,
            user,
            seq,
            session.watch_seq
        );
        return vec![];
    }

    match signal {
        WatchSignal::Adopted(txid) => {
            vec![notify(
                chat,
                format!("Unconfirmed transaction {txid} found"),
                None,
            )]
        }
        WatchSignal::Progress(confirmations) => {
            vec![notify(chat, format!("Confirmations: {confirmations}"), None)]
        }
        WatchSignal::Confirmed(confirmations) => {
            session.state = SessionState::Menu;
            log::info!(
                "[ENGINE] user {} watch #{} confirmed at {} confirmations",
                user,
                seq,
                confirmations
            );
            vec![
                EngineCommand::ClearWatch { user },
                notify(chat, "Transaction confirmed!", Some(Keyboard::Menu)),
            ]
        }
        WatchSignal::DoubleSpend => {
            session.state = SessionState::Menu;
            vec![
                EngineCommand::ClearWatch { user },
                notify(
                    chat,
                    "Transaction invalid: double spend detected",
                    Some(Keyboard::Menu),
                ),
            ]
        }
        WatchSignal::NothingToTrack => {
            session.state = SessionState::Menu;
            vec![
                EngineCommand::ClearWatch { user },
                notify(
                    chat,
                    "No unconfirmed transactions found",
                    Some(Keyboard::Menu),
                ),
            ]
        }
        WatchSignal::ProviderUnreachable => {
            session.state = SessionState::Menu;
            vec![
                EngineCommand::ClearWatch { user },
                notify(
                    chat,
                    "Could not reach the blockchain explorer, tracking stopped",
                    Some(Keyboard::Menu),
                ),
            ]
        }
    }
}
