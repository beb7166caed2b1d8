//! Handle to the deployed `WavePortal` contract.
//!
//! A handle is always signer-bound: reads go through it as well as the
//! state-changing `wave` call.

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use futures_lite::{future, stream};

use crate::error::Result;

pub mod bindings;
pub mod rpc;

pub use rpc::RpcWaveContract;

/// A wave as the contract reports it, either from `getAllWaves` or from a
/// `NewWave` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWave {
    pub waver: Address,
    /// Seconds since the Unix epoch.
    pub timestamp: U256,
    pub message: String,
}

pub type WaveEventStream = stream::Boxed<RawWave>;

/// A submitted `wave` transaction that has not been mined yet.
pub struct PendingWave {
    tx_hash: TxHash,
    confirmation: future::Boxed<Result<()>>,
}

impl PendingWave {
    pub fn new(tx_hash: TxHash, confirmation: future::Boxed<Result<()>>) -> Self {
        Self {
            tx_hash,
            confirmation,
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Waits until the transaction is mined. There is no timeout.
    pub async fn confirmed(self) -> Result<TxHash> {
        self.confirmation.await?;
        Ok(self.tx_hash)
    }
}

impl std::fmt::Debug for PendingWave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingWave")
            .field("tx_hash", &self.tx_hash)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait WaveContract: Send + Sync {
    fn address(&self) -> Address;

    async fn total_waves(&self) -> Result<U256>;

    async fn wave(&self, message: &str) -> Result<PendingWave>;

    async fn all_waves(&self) -> Result<Vec<RawWave>>;

    /// Live `NewWave` notifications. The stream stops when dropped.
    async fn new_wave_events(&self) -> Result<WaveEventStream>;
}
