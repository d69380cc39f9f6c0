mod ens;
#[cfg(test)]
pub mod mock;
mod rpc;

pub use rpc::RpcClient;

use crate::protocol::{RawElement, Submission};
use alloy::{
    primitives::{Address, Bytes, TxHash},
    signers::local::PrivateKeySigner,
    transports::TransportError,
};
use std::{fmt, time::Duration};
use thiserror::Error;

pub const NAME_SERVICE_SUFFIX: &str = ".eth";

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc error: {0}")]
    Rpc(#[from] TransportError),
    #[error("abi error: {0}")]
    Abi(#[from] alloy::sol_types::Error),
    #[error("no resolver set for {0}")]
    NoResolver(String),
    #[error("{0} does not resolve to an address")]
    Unresolved(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[cfg(test)]
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub chain_id: u64,
    pub chain_name: String,
    pub error_text: Option<String>,
}

impl ConnectionStatus {
    pub fn connected(chain_id: u64) -> Self {
        Self {
            chain_id,
            chain_name: chain_name(chain_id),
            error_text: None,
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            chain_id: 0,
            chain_name: String::new(),
            error_text: Some(error.to_string()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.chain_id != 0 && self.error_text.is_none()
    }
}

pub fn chain_name(chain_id: u64) -> String {
    let known = match chain_id {
        1 => Some("mainnet"),
        5 => Some("goerli"),
        10 => Some("optimism"),
        137 => Some("polygon"),
        8453 => Some("base"),
        17000 => Some("holesky"),
        42161 => Some("arbitrum"),
        11155111 => Some("sepolia"),
        31337 => Some("anvil"),
        _ => None,
    };
    match known {
        Some(name) => name.to_string(),
        None => format!("CHAIN ID {chain_id}"),
    }
}

/// A simulated `act` call that has not been signed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedCall {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

/// A broadcast transaction, identified by its hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxHandle {
    pub hash: TxHash,
}

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Confirmed,
    Reverted,
}

/// The account key loaded at startup.
pub struct SigningKey(PrivateKeySigner);

impl SigningKey {
    pub fn from_hex(hex: &str) -> Result<Self, ChainError> {
        hex.trim()
            .parse::<PrivateKeySigner>()
            .map(Self)
            .map_err(|err| ChainError::InvalidKey(err.to_string()))
    }

    pub fn address(&self) -> Address {
        self.0.address()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey({})", self.address())
    }
}

pub trait ChainClient {
    fn resolve_name(&self, name: &str) -> Result<Address, ChainError>;

    /// Never fails: problems are reported in `error_text`.
    fn connection_status(&self) -> ConnectionStatus;

    fn render_frontend(
        &self,
        caller: Address,
        contract: Address,
        app_state: &Bytes,
    ) -> Result<Vec<RawElement>, ChainError>;

    fn simulate_submit(
        &self,
        caller: Address,
        contract: Address,
        app_state: &Bytes,
        submission: &Submission,
    ) -> Result<UnsignedCall, ChainError>;

    fn execute(&self, call: &UnsignedCall, key: &SigningKey) -> Result<TxHandle, ChainError>;

    /// `Ok(None)` while the transaction is still unmined.
    fn receipt_for(&self, tx: &TxHandle) -> Result<Option<ReceiptStatus>, ChainError>;
}
