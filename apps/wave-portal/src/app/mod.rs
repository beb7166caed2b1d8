//! The wave page: wallet connection, contract calls and the mirrored wave list.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use tokio::sync::{Mutex, RwLock};

use crate::error::Result;
use crate::wallet::{EthereumRequest, WalletProvider};

pub mod page;
pub mod subscription;
pub mod waves;

pub use page::Page;
pub use subscription::WaveSubscription;
pub use waves::{Wave, WaveLog};

pub const NO_WALLET_ALERT: &str = "Get a wallet provider!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// The wallet has not been checked yet.
    Unloaded,
    Disconnected,
    Connected,
}

pub struct WaveApp {
    wallet: Option<Arc<dyn WalletProvider>>,
    contract_address: Address,
    account: RwLock<Option<Address>>,
    waves: WaveLog,
    alert: Mutex<Option<String>>,
    checked: AtomicBool,
}

impl WaveApp {
    pub fn new(wallet: Option<Arc<dyn WalletProvider>>, contract_address: Address) -> Self {
        Self {
            wallet,
            contract_address,
            account: RwLock::new(None),
            waves: WaveLog::new(),
            alert: Mutex::new(None),
            checked: AtomicBool::new(false),
        }
    }

    pub async fn current_account(&self) -> Option<Address> {
        *self.account.read().await
    }

    pub fn waves(&self) -> &WaveLog {
        &self.waves
    }

    pub async fn connection_state(&self) -> ConnectionState {
        if !self.checked.load(Ordering::SeqCst) {
            return ConnectionState::Unloaded;
        }
        match self.current_account().await {
            Some(_) => ConnectionState::Connected,
            None => ConnectionState::Disconnected,
        }
    }

    /// Returns and clears the alert waiting to be shown to the user.
    pub async fn take_alert(&self) -> Option<String> {
        self.alert.lock().await.take()
    }

    async fn set_account(&self, account: Address) {
        *self.account.write().await = Some(account);
    }

    /// Adopts the first already-authorized account, without prompting.
    pub async fn check_existing_connection(&self) {
        if let Some(wallet) = &self.wallet {
            tracing::info!("Wallet provider found");

            match wallet.request_accounts(EthereumRequest::Accounts).await {
                Ok(accounts) => match accounts.first() {
                    Some(account) => {
                        tracing::info!("Found an authorized account: {account}");
                        self.set_account(*account).await;
                    }
                    None => tracing::info!("No authorized account found"),
                },
                Err(e) => tracing::warn!("Failed to read authorized accounts: {e}"),
            }
        } else {
            tracing::info!("No wallet provider, make sure one is configured");
        }

        self.checked.store(true, Ordering::SeqCst);
    }

    /// Prompts the wallet for authorization and adopts the first account.
    pub async fn request_connection(&self) {
        let Some(wallet) = &self.wallet else {
            *self.alert.lock().await = Some(NO_WALLET_ALERT.into());
            return;
        };

        match wallet.request_accounts(EthereumRequest::RequestAccounts).await {
            Ok(accounts) => match accounts.first() {
                Some(account) => {
                    tracing::info!("Connected: {account}");
                    self.set_account(*account).await;
                }
                None => tracing::warn!("Wallet returned no accounts"),
            },
            Err(e) => tracing::warn!("Failed to connect wallet: {e}"),
        }
    }

    /// Sends a wave and waits for it to be mined. Returns the transaction hash
    /// on success; failures are logged.
    pub async fn send_wave(&self, message: &str) -> Option<TxHash> {
        let Some(wallet) = &self.wallet else {
            tracing::info!("Wallet provider doesn't exist!");
            return None;
        };

        match self.try_send_wave(wallet.as_ref(), message).await {
            Ok(tx_hash) => Some(tx_hash),
            Err(e) => {
                tracing::warn!("Wave failed: {e}");
                None
            }
        }
    }

    async fn try_send_wave(&self, wallet: &dyn WalletProvider, message: &str) -> Result<TxHash> {
        let contract = wallet.signer_contract(self.contract_address)?;

        let count = contract.total_waves().await?;
        tracing::info!("Retrieved total wave count... {count}");

        let pending = contract.wave(message).await?;
        tracing::info!("Mining... {}", pending.tx_hash());

        let tx_hash = pending.confirmed().await?;
        tracing::info!("Mined -- {tx_hash}");

        let count = contract.total_waves().await?;
        tracing::info!("Retrieved total wave count... {count}");

        Ok(tx_hash)
    }

    /// Replaces the local wave list with the contract's full history.
    pub async fn fetch_all_waves(&self) {
        let Some(wallet) = &self.wallet else {
            tracing::info!("Wallet provider doesn't exist!");
            return;
        };

        match self.try_fetch_all_waves(wallet.as_ref()).await {
            Ok(count) => tracing::info!("Loaded {count} waves"),
            Err(e) => tracing::warn!("Failed to fetch waves: {e}"),
        }
    }

    async fn try_fetch_all_waves(&self, wallet: &dyn WalletProvider) -> Result<usize> {
        let contract = wallet.signer_contract(self.contract_address)?;

        let waves = contract
            .all_waves()
            .await?
            .into_iter()
            .map(Wave::try_from)
            .collect::<Result<Vec<_>>>()?;

        let count = waves.len();
        self.waves.replace(waves).await;
        Ok(count)
    }

    /// Starts appending `NewWave` events to the wave list. `None` when there is
    /// no wallet or the listener could not be registered.
    pub async fn subscribe_new_waves(&self) -> Option<WaveSubscription> {
        let wallet = self.wallet.as_ref()?;

        let contract = match wallet.signer_contract(self.contract_address) {
            Ok(contract) => contract,
            Err(e) => {
                tracing::warn!("Failed to build contract handle: {e}");
                return None;
            }
        };

        match contract.new_wave_events().await {
            Ok(events) => Some(WaveSubscription::spawn(contract, events, self.waves.clone())),
            Err(e) => {
                tracing::warn!("Failed to subscribe to NewWave: {e}");
                None
            }
        }
    }
}
