//! Wallet provider surface, modelled on EIP-1193.
//!
//! Reference: https://eips.ethereum.org/EIPS/eip-1193

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::contract::WaveContract;
use crate::error::Result;

pub mod rpc;

pub use rpc::RpcWallet;

/// EIP-1193 code for a request the user rejected.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// Account requests understood by an injected provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum EthereumRequest {
    /// Already-authorized accounts, never prompts.
    #[serde(rename = "eth_accounts")]
    Accounts,

    /// Prompts the user to authorize accounts.
    #[serde(rename = "eth_requestAccounts")]
    RequestAccounts,
}

impl EthereumRequest {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Accounts => "eth_accounts",
            Self::RequestAccounts => "eth_requestAccounts",
        }
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request_accounts(&self, request: EthereumRequest) -> Result<Vec<Address>>;

    /// Builds a read/write handle to the contract at `address`, signed by this
    /// wallet.
    fn signer_contract(&self, address: Address) -> Result<Arc<dyn WaveContract>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_as_eip1193_method() -> anyhow::Result<()> {
        let accounts = serde_json::to_value(EthereumRequest::Accounts)?;
        assert_eq!(accounts["method"], "eth_accounts");

        let request = serde_json::to_value(EthereumRequest::RequestAccounts)?;
        assert_eq!(request["method"], "eth_requestAccounts");
        Ok(())
    }

    #[test]
    fn method_matches_serde_name() -> anyhow::Result<()> {
        for request in [EthereumRequest::Accounts, EthereumRequest::RequestAccounts] {
            let value = serde_json::to_value(request)?;
            assert_eq!(value["method"], request.method());
        }
        Ok(())
    }
}
