//! Core of a BTC transaction-confirmation tracking bot.
//!
//! A user registers a wallet address and asks to watch it; a per-user watch
//! task polls a blockchain-explorer API until the wallet's unconfirmed
//! transaction reaches the configured confirmation threshold (or is
//! double-spent, or the user stops the watch). Chat-transport framing is
//! out of scope; the `Notifier` and `SessionStore` traits are the seams a
//! real transport plugs into.

pub mod address;
pub mod config;
pub mod engine;
pub mod explorer;
pub mod notify;
pub mod runtime;
pub mod store;
pub mod tracker;
