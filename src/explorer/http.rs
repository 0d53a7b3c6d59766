use std::str::FromStr;

use async_trait::async_trait;
use bitcoin::Txid;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::explorer::{
    ExplorerApi, FetchError, FetchResult, TransactionSnapshot, WalletSnapshot, WalletTx,
};

/// blockchain.info-shaped HTTP client.
///
/// Endpoints used:
/// * `GET /q/getblockcount` - plain integer body
/// * `GET /rawaddr/{address}?limit=1` - JSON, newest transaction first
/// * `GET /rawtx/{txid}` - JSON
pub struct HttpExplorer {
    base: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RawAddr {
    #[serde(default)]
    txs: Vec<RawTx>,
}

#[derive(Debug, Deserialize)]
struct RawTx {
    hash: String,
    block_height: Option<u64>,
    #[serde(default)]
    double_spend: bool,
}

impl HttpExplorer {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self {
            base,
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, url: &str) -> FetchResult<reqwest::Response> {
        log::debug!("[HTTP] GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            log::debug!("[HTTP] {} -> {}", url, status);
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> FetchResult<T> {
        self.get(url)
            .await?
            .json::<T>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ExplorerApi for HttpExplorer {
    async fn latest_wallet_tx(&self, address: &str) -> FetchResult<WalletSnapshot> {
        let url = format!("{}/rawaddr/{}?limit=1", self.base, address);
        let raw: RawAddr = self.get_json(&url).await?;
        let latest = match raw.txs.into_iter().next() {
            Some(tx) => Some(WalletTx {
                txid: Txid::from_str(&tx.hash).map_err(|e| FetchError::Decode(e.to_string()))?,
                block_height: tx.block_height,
            }),
            None => None,
        };
        Ok(WalletSnapshot { latest })
    }

    async fn transaction(&self, txid: &Txid) -> FetchResult<TransactionSnapshot> {
        let url = format!("{}/rawtx/{}", self.base, txid);
        let raw: RawTx = self.get_json(&url).await?;
        Ok(TransactionSnapshot {
            block_height: raw.block_height,
            double_spend: raw.double_spend,
        })
    }

    async fn chain_height(&self) -> FetchResult<u64> {
        let url = format!("{}/q/getblockcount", self.base);
        let body = self
            .get(&url)
            .await?
            .text()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        body.trim()
            .parse::<u64>()
            .map_err(|e| FetchError::Decode(format!("block count {body:?}: {e}")))
    }
}
