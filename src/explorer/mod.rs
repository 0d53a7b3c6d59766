//! Read-only ledger-data queries.
//!
//! The `ExplorerApi` trait is the seam between the watch task and whatever
//! provider supplies chain data. Implementations carry no state and never
//! retry internally: a failed fetch is reported as-is and the poll cadence
//! of the watch decides what happens next.

pub mod http;
pub mod mock;

pub use http::HttpExplorer;
pub use mock::MockExplorer;

use async_trait::async_trait;
use bitcoin::Txid;
use thiserror::Error;

/// The wallet's most recent transaction, if it has any at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletSnapshot {
    pub latest: Option<WalletTx>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletTx {
    pub txid: Txid,
    /// `None` while the transaction sits in the mempool.
    pub block_height: Option<u64>,
}

/// State of one transaction as the explorer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSnapshot {
    pub block_height: Option<u64>,
    pub double_spend: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("explorer returned HTTP {0}")]
    Status(u16),
    #[error("explorer unreachable: {0}")]
    Network(String),
    #[error("malformed explorer response: {0}")]
    Decode(String),
}

pub type FetchResult<T> = Result<T, FetchError>;

#[async_trait]
pub trait ExplorerApi: Send + Sync {
    /// The wallet's most recent transaction (at most one).
    async fn latest_wallet_tx(&self, address: &str) -> FetchResult<WalletSnapshot>;

    /// Detail for a single transaction by id.
    async fn transaction(&self, txid: &Txid) -> FetchResult<TransactionSnapshot>;

    /// Height of the most recently mined block known to the provider.
    async fn chain_height(&self) -> FetchResult<u64>;
}
