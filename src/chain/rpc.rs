use super::{
    ChainClient, ChainError, ConnectionStatus, ReceiptStatus, SigningKey, TxHandle, UnsignedCall,
    ens,
};
use crate::protocol::{RawElement, Submission};
use alloy::{
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    sol,
    sol_types::{SolCall, SolValue},
};
use std::{future::Future, time::Duration};
use tokio::{runtime::Handle, time::timeout};
use tracing::{debug, info, warn};

/// Connectivity and name lookups must not stall the dispatcher for long.
const QUICK_CALL_TIMEOUT: Duration = Duration::from_secs(1);

mod abi {
    use super::sol;

    sol! {
        struct VElem {
            uint64 typeHash;
            bytes data;
        }

        struct Action {
            uint256 buttonKey;
            bytes[] inputs;
        }

        function render(bytes appState) external view returns (VElem[] vdom);
        function act(bytes appState, Action action) external returns (bytes newAppState);
    }
}

/// JSON-RPC backed client. Calls block on the shared tokio runtime.
pub struct RpcClient {
    rpc_url: String,
    provider: DynProvider,
    runtime: Handle,
}

impl RpcClient {
    pub fn connect(rpc_url: &str, runtime: Handle) -> Result<Self, ChainError> {
        let provider = runtime.block_on(async { ProviderBuilder::new().connect(rpc_url).await })?;
        info!(rpc_url, "connected rpc provider");
        Ok(Self {
            rpc_url: rpc_url.to_string(),
            provider: provider.erased(),
            runtime,
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn block_on_quick<T, F>(&self, future: F) -> Result<T, ChainError>
    where
        F: Future<Output = Result<T, ChainError>>,
    {
        self.block_on(async {
            timeout(QUICK_CALL_TIMEOUT, future)
                .await
                .map_err(|_| ChainError::Timeout(QUICK_CALL_TIMEOUT))?
        })
    }

    async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        data: Vec<u8>,
    ) -> Result<Bytes, ChainError> {
        let mut tx = TransactionRequest::default()
            .with_to(to)
            .with_input(Bytes::from(data));
        if let Some(from) = from {
            tx = tx.with_from(from);
        }
        Ok(self.provider.call(tx).await?)
    }

    async fn resolve(&self, name: &str) -> Result<Address, ChainError> {
        let node = ens::namehash(name);
        let out = self
            .call(
                None,
                ens::ENS_REGISTRY,
                ens::resolverCall { node }.abi_encode(),
            )
            .await?;
        let resolver = Address::abi_decode(&out)?;
        if resolver.is_zero() {
            return Err(ChainError::NoResolver(name.to_string()));
        }

        let out = self
            .call(None, resolver, ens::addrCall { node }.abi_encode())
            .await?;
        let resolved = Address::abi_decode(&out)?;
        if resolved.is_zero() {
            return Err(ChainError::Unresolved(name.to_string()));
        }
        Ok(resolved)
    }
}

impl ChainClient for RpcClient {
    fn resolve_name(&self, name: &str) -> Result<Address, ChainError> {
        let result = self.block_on_quick(self.resolve(name));
        debug!(name, ?result, "ens resolve");
        result
    }

    fn connection_status(&self) -> ConnectionStatus {
        let result = self.block_on_quick(async {
            self.provider
                .get_chain_id()
                .await
                .map_err(ChainError::from)
        });
        match result {
            Ok(chain_id) => ConnectionStatus::connected(chain_id),
            Err(err) => {
                warn!(error = %err, "chain status check failed");
                ConnectionStatus::failed(err)
            }
        }
    }

    fn render_frontend(
        &self,
        caller: Address,
        contract: Address,
        app_state: &Bytes,
    ) -> Result<Vec<RawElement>, ChainError> {
        debug!(%contract, "render frontend");
        let data = abi::renderCall {
            appState: app_state.clone(),
        }
        .abi_encode();
        let out = self.block_on(self.call(Some(caller), contract, data))?;
        let vdom = Vec::<abi::VElem>::abi_decode(&out)?;
        Ok(vdom
            .into_iter()
            .map(|elem| RawElement {
                type_hash: elem.typeHash,
                data: elem.data,
            })
            .collect())
    }

    fn simulate_submit(
        &self,
        caller: Address,
        contract: Address,
        app_state: &Bytes,
        submission: &Submission,
    ) -> Result<UnsignedCall, ChainError> {
        debug!(%contract, button = submission.button_key, "simulate act");
        let data = abi::actCall {
            appState: app_state.clone(),
            action: abi::Action {
                buttonKey: U256::from(submission.button_key),
                inputs: submission.inputs.clone(),
            },
        }
        .abi_encode();
        self.block_on(self.call(Some(caller), contract, data.clone()))?;
        Ok(UnsignedCall {
            from: caller,
            to: contract,
            data: Bytes::from(data),
        })
    }

    fn execute(&self, call: &UnsignedCall, key: &SigningKey) -> Result<TxHandle, ChainError> {
        let wallet = EthereumWallet::from(key.signer().clone());
        let tx = TransactionRequest::default()
            .with_from(call.from)
            .with_to(call.to)
            .with_input(call.data.clone());
        info!(from = %call.from, to = %call.to, "signing transaction");

        let hash = self.block_on(async {
            let provider = ProviderBuilder::new()
                .wallet(wallet)
                .connect(&self.rpc_url)
                .await?;
            let pending = provider.send_transaction(tx).await?;
            Ok::<_, ChainError>(*pending.tx_hash())
        })?;
        info!(%hash, "transaction broadcast");
        Ok(TxHandle { hash })
    }

    fn receipt_for(&self, tx: &TxHandle) -> Result<Option<ReceiptStatus>, ChainError> {
        let receipt = self.block_on(self.provider.get_transaction_receipt(tx.hash))?;
        Ok(receipt.map(|receipt| {
            debug!(hash = %tx.hash, status = receipt.status(), "got receipt");
            if receipt.status() {
                ReceiptStatus::Confirmed
            } else {
                ReceiptStatus::Reverted
            }
        }))
    }
}
