use std::sync::Arc;

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::transports::http::{Client, Http};
use alloy::transports::TransportError;
use async_trait::async_trait;

use crate::contract::{RpcWaveContract, WaveContract};
use crate::error::{Result, WaveError};

use super::{EthereumRequest, WalletProvider, USER_REJECTED_REQUEST};

/// Wallet reached over JSON-RPC. Key management and signing stay on the
/// other side of the connection, as with a browser extension.
pub struct RpcWallet {
    http: RootProvider<Http<Client>>,
    ws_url: Option<String>,
}

impl RpcWallet {
    pub fn connect(rpc_url: &str, ws_url: Option<String>) -> Result<Self> {
        let http = ProviderBuilder::new().on_http(
            rpc_url
                .parse()
                .map_err(|e| WaveError::Config(format!("Invalid WALLET_RPC_URL: {e}")))?,
        );

        Ok(Self { http, ws_url })
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn request_accounts(&self, request: EthereumRequest) -> Result<Vec<Address>> {
        let params: Vec<serde_json::Value> = Vec::new();

        self.http
            .raw_request::<_, Vec<Address>>(request.method().into(), params)
            .await
            .map_err(classify_rpc_error)
    }

    fn signer_contract(&self, address: Address) -> Result<Arc<dyn WaveContract>> {
        Ok(Arc::new(RpcWaveContract::new(
            self.http.clone(),
            self.ws_url.clone(),
            address,
        )))
    }
}

fn classify_rpc_error(err: TransportError) -> WaveError {
    let rejected = err
        .as_error_resp()
        .filter(|payload| payload.code == USER_REJECTED_REQUEST)
        .map(|payload| payload.message.to_string());

    match rejected {
        Some(message) => WaveError::AuthorizationDenied(message),
        None => WaveError::Rpc(err),
    }
}
