use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bitcoin::Txid;

use crate::explorer::{
    ExplorerApi, FetchError, FetchResult, TransactionSnapshot, WalletSnapshot,
};

/// Scripted in-memory explorer for tests.
///
/// Each endpoint pops from its own response queue; an exhausted queue
/// behaves like an unreachable provider, which the watch treats as a
/// skipped tick. An optional latency is applied before every response to
/// widen race windows in cancellation tests.
pub struct MockExplorer {
    pub wallet_responses: Mutex<VecDeque<FetchResult<WalletSnapshot>>>,
    pub tx_responses: Mutex<VecDeque<FetchResult<TransactionSnapshot>>>,
    pub height_responses: Mutex<VecDeque<FetchResult<u64>>>,
    pub tx_queries: Mutex<Vec<Txid>>,
    pub latency: Mutex<Duration>,
}

impl MockExplorer {
    pub fn new() -> Self {
        Self {
            wallet_responses: Mutex::new(VecDeque::new()),
            tx_responses: Mutex::new(VecDeque::new()),
            height_responses: Mutex::new(VecDeque::new()),
            tx_queries: Mutex::new(Vec::new()),
            latency: Mutex::new(Duration::ZERO),
        }
    }

    pub fn push_wallet(&self, response: FetchResult<WalletSnapshot>) {
        self.wallet_responses.lock().unwrap().push_back(response);
    }

    pub fn push_tx(&self, response: FetchResult<TransactionSnapshot>) {
        self.tx_responses.lock().unwrap().push_back(response);
    }

    pub fn push_height(&self, response: FetchResult<u64>) {
        self.height_responses.lock().unwrap().push_back(response);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn tx_query_count(&self) -> usize {
        self.tx_queries.lock().unwrap().len()
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn exhausted() -> FetchError {
        FetchError::Network("mock: no scripted response".to_string())
    }
}

impl Default for MockExplorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExplorerApi for MockExplorer {
    async fn latest_wallet_tx(&self, _address: &str) -> FetchResult<WalletSnapshot> {
        self.simulate_latency().await;
        self.wallet_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted()))
    }

    async fn transaction(&self, txid: &Txid) -> FetchResult<TransactionSnapshot> {
        self.simulate_latency().await;
        self.tx_queries.lock().unwrap().push(*txid);
        self.tx_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted()))
    }

    async fn chain_height(&self) -> FetchResult<u64> {
        self.simulate_latency().await;
        self.height_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::exhausted()))
    }
}
