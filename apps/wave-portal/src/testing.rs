//! In-memory wallet and contract used by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use futures_lite::stream;
use tokio::sync::broadcast;

use crate::contract::{PendingWave, RawWave, WaveContract, WaveEventStream};
use crate::error::{Result, WaveError};
use crate::wallet::{EthereumRequest, WalletProvider};

pub fn raw_wave(waver: Address, timestamp: u64, message: &str) -> RawWave {
    RawWave {
        waver,
        timestamp: U256::from(timestamp),
        message: message.into(),
    }
}

#[derive(Default)]
pub struct MockWallet {
    /// Answer to `eth_accounts`.
    pub authorized: Mutex<Vec<Address>>,
    /// Answer to `eth_requestAccounts` once approved.
    pub approved: Mutex<Vec<Address>>,
    pub deny_requests: AtomicBool,
    pub fail_handle: AtomicBool,
    pub requests: Mutex<Vec<EthereumRequest>>,
    pub handles_built: AtomicUsize,
    pub contract: Arc<MockContract>,
}

impl MockWallet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_authorized(accounts: &[Address]) -> Arc<Self> {
        let wallet = Self::default();
        *wallet.authorized.lock().unwrap() = accounts.to_vec();
        Arc::new(wallet)
    }

    pub fn requests(&self) -> Vec<EthereumRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self, request: EthereumRequest) -> Result<Vec<Address>> {
        self.requests.lock().unwrap().push(request);

        match request {
            EthereumRequest::Accounts => Ok(self.authorized.lock().unwrap().clone()),
            EthereumRequest::RequestAccounts => {
                if self.deny_requests.load(Ordering::SeqCst) {
                    return Err(WaveError::AuthorizationDenied(
                        "User rejected the request.".into(),
                    ));
                }
                let approved = self.approved.lock().unwrap().clone();
                *self.authorized.lock().unwrap() = approved.clone();
                Ok(approved)
            }
        }
    }

    fn signer_contract(&self, _address: Address) -> Result<Arc<dyn WaveContract>> {
        if self.fail_handle.load(Ordering::SeqCst) {
            return Err(WaveError::Config("no signer available".into()));
        }
        self.handles_built.fetch_add(1, Ordering::SeqCst);
        Ok(self.contract.clone())
    }
}

pub struct MockContract {
    pub history: Mutex<Vec<RawWave>>,
    pub sent: Mutex<Vec<String>>,
    pub total_reads: AtomicUsize,
    pub reject_signing: AtomicBool,
    pub revert: AtomicBool,
    pub fail_reads: AtomicBool,
    events: broadcast::Sender<RawWave>,
    listeners: Arc<AtomicUsize>,
}

impl Default for MockContract {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            history: Mutex::default(),
            sent: Mutex::default(),
            total_reads: AtomicUsize::new(0),
            reject_signing: AtomicBool::new(false),
            revert: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            events,
            listeners: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl MockContract {
    /// Emits a `NewWave` to every live listener.
    pub fn emit(&self, wave: RawWave) {
        let _ = self.events.send(wave);
    }

    pub fn listeners(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }

    fn read_guard(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(WaveError::Decode("call reverted".into()));
        }
        Ok(())
    }
}

struct ListenerGuard(Arc<AtomicUsize>);

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WaveContract for MockContract {
    fn address(&self) -> Address {
        Address::ZERO
    }

    async fn total_waves(&self) -> Result<U256> {
        self.read_guard()?;
        self.total_reads.fetch_add(1, Ordering::SeqCst);
        Ok(U256::from(self.history.lock().unwrap().len()))
    }

    async fn wave(&self, message: &str) -> Result<PendingWave> {
        if self.reject_signing.load(Ordering::SeqCst) {
            return Err(WaveError::AuthorizationDenied("User denied transaction signature.".into()));
        }

        let sent = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(message.to_owned());
            sent.len()
        };
        let tx_hash = TxHash::with_last_byte(sent as u8);

        if self.revert.load(Ordering::SeqCst) {
            return Ok(PendingWave::new(
                tx_hash,
                Box::pin(async move { Err::<(), _>(WaveError::Reverted(tx_hash)) }),
            ));
        }

        let timestamp = 1_700_000_000 + sent as u64;
        self.history
            .lock()
            .unwrap()
            .push(raw_wave(Address::ZERO, timestamp, message));

        Ok(PendingWave::new(tx_hash, Box::pin(async { Ok::<_, WaveError>(()) })))
    }

    async fn all_waves(&self) -> Result<Vec<RawWave>> {
        self.read_guard()?;
        Ok(self.history.lock().unwrap().clone())
    }

    async fn new_wave_events(&self) -> Result<WaveEventStream> {
        let rx = self.events.subscribe();
        self.listeners.fetch_add(1, Ordering::SeqCst);
        let guard = ListenerGuard(self.listeners.clone());

        Ok(Box::pin(stream::unfold(
            (rx, guard),
            |(mut rx, guard)| async move {
                loop {
                    match rx.recv().await {
                        Ok(wave) => return Some((wave, (rx, guard))),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            },
        )))
    }
}
