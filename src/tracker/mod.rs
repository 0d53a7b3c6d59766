//! Confirmation watch task.
//!
//! One watch is one tokio task polling the explorer for a single
//! transaction on behalf of a single user. The task owns nothing shared:
//! it talks to the outside world through a `watch` control channel
//! (cancellation flag plus live threshold) and an outbound event sender
//! feeding the dispatcher queue. Cancellation is cooperative and observed
//! at the next suspension point.
//!
//! A transient fetch failure at any step never terminates the loop; it is
//! always "try again next tick". `last_seen` only moves up, so repeated or
//! regressed observations produce no signal at all.


use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::engine::{ChatId, SessionEvent, UserId, WatchSignal};
use crate::explorer::ExplorerApi;

#[derive(Debug, Clone, Copy)]
struct WatchControl {
    cancelled: bool,
    threshold: u32,
}

/// Handle to a running watch. Dropping it without calling `cancel` still
/// reaps the task at its next tick (the control sender is gone).
pub struct WatchHandle {
    ctl: watch::Sender<WatchControl>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn cancel(&self) {
        self.ctl.send_modify(|c| c.cancelled = true);
    }

    pub fn set_threshold(&self, threshold: u32) {
        self.ctl.send_modify(|c| c.threshold = threshold);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to exit. Test helper.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

#[derive(Debug, Clone)]
pub struct WatchParams {
    pub user: UserId,
    pub chat: ChatId,
    /// Watch generation; stamped on every emitted signal.
    pub seq: u64,
    pub wallet: String,
    pub threshold: u32,
    /// Delay between poll iterations.
    pub tick: Duration,
}

/// Spawn the polling task for one watch.
pub fn spawn_watch<E: ExplorerApi + 'static>(
    explorer: Arc<E>,
    params: WatchParams,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> WatchHandle {
    let (ctl_tx, ctl_rx) = watch::channel(WatchControl {
        cancelled: false,
        threshold: params.threshold,
    });
    let task = tokio::spawn(run_watch(explorer, params, ctl_rx, events));
    WatchHandle { ctl: ctl_tx, task }
}

async fn run_watch<E: ExplorerApi>(
    explorer: Arc<E>,
    params: WatchParams,
    mut ctl: watch::Receiver<WatchControl>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let WatchParams {
        user,
        chat,
        seq,
        wallet,
        tick,
        ..
    } = params;

    let emit = |signal: WatchSignal| {
        let _ = events.send(SessionEvent::Watch {
            user,
            chat,
            seq,
            signal,
        });
    };

    // Adoption step: one shot, fail fast. There is nothing to re-poll yet.
    let snapshot = match explorer.latest_wallet_tx(&wallet).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            log::warn!("[WATCH] user {} watch #{}: wallet fetch failed: {}", user, seq, e);
            emit(WatchSignal::ProviderUnreachable);
            return;
        }
    };

    let txid = match snapshot.latest {
        Some(tx) if tx.block_height.is_none() => tx.txid,
        _ => {
            log::info!("[WATCH] user {} watch #{}: nothing to track", user, seq);
            emit(WatchSignal::NothingToTrack);
            return;
        }
    };

    log::info!("[WATCH] user {} watch #{}: adopted tx {}", user, seq, txid);
    emit(WatchSignal::Adopted(txid));

    let mut last_seen: u64 = 0;

    loop {
        // Tick delay. A control change (cancel or threshold edit) wakes the
        // task early.
        tokio::select! {
            _ = tokio::time::sleep(tick) => {}
            changed = ctl.changed() => {
                if changed.is_err() {
                    // Handle dropped; the watch is orphaned.
                    return;
                }
            }
        }
        if ctl.borrow().cancelled {
            log::info!("[WATCH] user {} watch #{}: cancelled", user, seq);
            return;
        }

        // A threshold lowered mid-watch may already be satisfied by what we
        // have seen; confirm immediately instead of waiting for the count
        // to move again.
        let threshold = u64::from(ctl.borrow().threshold);
        if last_seen >= threshold {
            emit(WatchSignal::Confirmed(last_seen));
            return;
        }

        let tx = match explorer.transaction(&txid).await {
            Ok(tx) => tx,
            Err(e) => {
                log::debug!("[WATCH] user {} watch #{}: tx fetch failed, skipping tick: {}", user, seq, e);
                continue;
            }
        };
        if ctl.borrow().cancelled {
            return;
        }

        if tx.double_spend {
            log::warn!("[WATCH] user {} watch #{}: double spend on {}", user, seq, txid);
            emit(WatchSignal::DoubleSpend);
            return;
        }

        let Some(block_height) = tx.block_height else {
            log::debug!("[WATCH] user {} watch #{}: tx {} still unconfirmed", user, seq, txid);
            continue;
        };

        let height = match explorer.chain_height().await {
            Ok(height) => height,
            Err(e) => {
                log::debug!("[WATCH] user {} watch #{}: height fetch failed, skipping tick: {}", user, seq, e);
                continue;
            }
        };
        if ctl.borrow().cancelled {
            return;
        }

        let confirmations = height.saturating_sub(block_height).saturating_add(1);
        if confirmations <= last_seen {
            // Nothing new worth reporting; also shields against a provider
            // briefly reporting a lower chain height.
            continue;
        }
        last_seen = confirmations;

        let threshold = u64::from(ctl.borrow().threshold);
        if confirmations >= threshold {
            emit(WatchSignal::Confirmed(confirmations));
            return;
        }
        emit(WatchSignal::Progress(confirmations));
    }
}
