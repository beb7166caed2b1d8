use alloy::primitives::TxHash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaveError {
    #[error("RPC error: {0}")]
    Rpc(#[from] alloy::transports::TransportError),

    #[error("contract error: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("confirmation error: {0}")]
    Confirmation(#[from] alloy::providers::PendingTransactionError),

    #[error("transaction reverted: {0}")]
    Reverted(TxHash),

    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("no authorized account")]
    NoAuthorizedAccount,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, WaveError>;
