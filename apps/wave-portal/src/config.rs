use alloy::primitives::Address;
use std::str::FromStr;

use crate::error::{Result, WaveError};

const DEFAULT_CONTRACT_ADDRESS: &str = "0x9583C72D95dbC8D2bf14E2b1C8c0247fEe67ffFE";
const DEFAULT_WAVE_MESSAGE: &str = "👋";

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP endpoint of the wallet provider. `None` means no wallet is available.
    pub wallet_rpc_url: Option<String>,
    pub wallet_ws_url: Option<String>,
    pub contract_address: Address,
    pub wave_message: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let wallet_rpc_url = non_blank("WALLET_RPC_URL");
        let wallet_ws_url = non_blank("WALLET_WS_URL");

        if let Some(url) = &wallet_ws_url {
            if !url.starts_with("ws://") && !url.starts_with("wss://") {
                return Err(WaveError::Config(format!(
                    "Invalid WALLET_WS_URL: expected ws:// or wss://, got {url}"
                )));
            }
        }

        let contract_address =
            non_blank("CONTRACT_ADDRESS").unwrap_or_else(|| DEFAULT_CONTRACT_ADDRESS.into());
        let contract_address = Address::from_str(contract_address.trim())
            .map_err(|e| WaveError::Config(format!("Invalid CONTRACT_ADDRESS: {e}")))?;

        let wave_message = lookup("WAVE_MESSAGE").unwrap_or_else(|| DEFAULT_WAVE_MESSAGE.into());

        Ok(Self {
            wallet_rpc_url,
            wallet_ws_url,
            contract_address,
            wave_message,
        })
    }
}
