use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider, WsConnect};
use alloy::rpc::types::{Filter, Log};
use alloy::sol_types::SolEvent;
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use futures_lite::{stream, StreamExt};

use crate::error::{Result, WaveError};

use super::bindings::WavePortal::{self, NewWave};
use super::{PendingWave, RawWave, WaveContract, WaveEventStream};

/// Signer-bound `WavePortal` handle over JSON-RPC. Transactions are signed by
/// the node behind `http`, using its first authorized account.
#[derive(Clone)]
pub struct RpcWaveContract {
    http: RootProvider<Http<Client>>,
    ws_url: Option<String>,
    address: Address,
}

impl RpcWaveContract {
    pub fn new(http: RootProvider<Http<Client>>, ws_url: Option<String>, address: Address) -> Self {
        Self {
            http,
            ws_url,
            address,
        }
    }

    async fn signer(&self) -> Result<Address> {
        self.http
            .get_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(WaveError::NoAuthorizedAccount)
    }

    fn new_wave_filter(&self) -> Filter {
        Filter::new()
            .address(self.address)
            .event_signature(NewWave::SIGNATURE_HASH)
    }

    async fn subscribe_ws(&self, ws_url: &str) -> Result<WaveEventStream> {
        tracing::info!("Connecting to WebSocket: {}", ws_url);

        let provider = ProviderBuilder::new().on_ws(WsConnect::new(ws_url)).await?;
        let sub = provider.subscribe_logs(&self.new_wave_filter()).await?;
        let logs = Box::pin(sub.into_stream());

        // The provider is carried in the stream state so the socket lives as
        // long as the stream does.
        let waves = stream::unfold((provider, logs), |(provider, mut logs)| async move {
            let log = logs.next().await?;
            Some((log, (provider, logs)))
        })
        .filter_map(|log| decode_new_wave(&log));

        Ok(Box::pin(waves))
    }

    async fn subscribe_polling(&self) -> Result<WaveEventStream> {
        let poller = self.http.watch_logs(&self.new_wave_filter()).await?;
        let batches = Box::pin(poller.into_stream());

        // Pollers only hold a weak client, keep a strong one alongside.
        let waves = stream::unfold(
            (self.http.clone(), batches),
            |(http, mut batches)| async move {
                let logs = batches.next().await?;
                let waves: Vec<RawWave> = logs.iter().filter_map(decode_new_wave).collect();
                Some((waves, (http, batches)))
            },
        )
        .flat_map(stream::iter);

        Ok(Box::pin(waves))
    }
}

#[async_trait]
impl WaveContract for RpcWaveContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn total_waves(&self) -> Result<U256> {
        let instance = WavePortal::new(self.address, self.http.clone());
        Ok(instance.getTotalWaves().call().await?._0)
    }

    async fn wave(&self, message: &str) -> Result<PendingWave> {
        let from = self.signer().await?;
        let instance = WavePortal::new(self.address, self.http.clone());

        let pending = instance.wave(message.to_owned()).from(from).send().await?;
        let tx_hash = *pending.tx_hash();

        let confirmation = Box::pin(async move {
            let receipt = pending.get_receipt().await?;
            if !receipt.status() {
                return Err(WaveError::Reverted(tx_hash));
            }
            Ok::<_, WaveError>(())
        });

        Ok(PendingWave::new(tx_hash, confirmation))
    }

    async fn all_waves(&self) -> Result<Vec<RawWave>> {
        let instance = WavePortal::new(self.address, self.http.clone());
        let waves = instance.getAllWaves().call().await?._0;

        Ok(waves
            .into_iter()
            .map(|w| RawWave {
                waver: w.waver,
                timestamp: w.timestamp,
                message: w.message,
            })
            .collect())
    }

    async fn new_wave_events(&self) -> Result<WaveEventStream> {
        match &self.ws_url {
            Some(ws_url) => self.subscribe_ws(ws_url).await,
            None => self.subscribe_polling().await,
        }
    }
}

pub fn decode_new_wave(log: &Log) -> Option<RawWave> {
    if log.topics().first() != Some(&NewWave::SIGNATURE_HASH) {
        tracing::debug!("Skipping non-NewWave log at block {:?}", log.block_number);
        return None;
    }

    let decoded = match NewWave::decode_log(log.inner.as_ref(), true) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::debug!("Failed to decode NewWave log: {e}");
            return None;
        }
    };

    let NewWave {
        from,
        timestamp,
        message,
    } = decoded.data;

    Some(RawWave {
        waver: from,
        timestamp,
        message,
    })
}
