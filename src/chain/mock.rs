use super::{
    ChainClient, ChainError, ConnectionStatus, ReceiptStatus, SigningKey, TxHandle, UnsignedCall,
};
use crate::protocol::{RawElement, Submission};
use alloy::primitives::{Address, Bytes, TxHash};
use std::{collections::HashMap, sync::Mutex};

pub struct MockChain {
    names: HashMap<String, Address>,
    status: Mutex<ConnectionStatus>,
    render: Mutex<Result<Vec<RawElement>, String>>,
    submit: Mutex<Result<(), String>>,
    execute: Mutex<Result<TxHash, String>>,
    receipt: Mutex<Result<Option<ReceiptStatus>, String>>,
    calls: Mutex<Vec<String>>,
    submissions: Mutex<Vec<Submission>>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            names: HashMap::new(),
            status: Mutex::new(ConnectionStatus::connected(1)),
            render: Mutex::new(Ok(Vec::new())),
            submit: Mutex::new(Ok(())),
            execute: Mutex::new(Ok(TxHash::repeat_byte(0xab))),
            receipt: Mutex::new(Ok(None)),
            calls: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }
}

impl MockChain {
    pub fn with_name(mut self, name: &str, address: Address) -> Self {
        self.names.insert(name.to_string(), address);
        self
    }

    pub fn set_render(&self, result: Result<Vec<RawElement>, &str>) {
        *self.render.lock().unwrap() = result.map_err(str::to_string);
    }

    pub fn set_submit(&self, result: Result<(), &str>) {
        *self.submit.lock().unwrap() = result.map_err(str::to_string);
    }

    pub fn set_execute(&self, result: Result<TxHash, &str>) {
        *self.execute.lock().unwrap() = result.map_err(str::to_string);
    }

    pub fn set_receipt(&self, result: Result<Option<ReceiptStatus>, &str>) {
        *self.receipt.lock().unwrap() = result.map_err(str::to_string);
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

impl ChainClient for MockChain {
    fn resolve_name(&self, name: &str) -> Result<Address, ChainError> {
        self.record("resolve_name");
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ChainError::Unresolved(name.to_string()))
    }

    fn connection_status(&self) -> ConnectionStatus {
        self.record("connection_status");
        self.status.lock().unwrap().clone()
    }

    fn render_frontend(
        &self,
        _caller: Address,
        _contract: Address,
        _app_state: &Bytes,
    ) -> Result<Vec<RawElement>, ChainError> {
        self.record("render_frontend");
        self.render.lock().unwrap().clone().map_err(ChainError::Other)
    }

    fn simulate_submit(
        &self,
        caller: Address,
        contract: Address,
        _app_state: &Bytes,
        submission: &Submission,
    ) -> Result<UnsignedCall, ChainError> {
        self.record("simulate_submit");
        self.submissions.lock().unwrap().push(submission.clone());
        self.submit.lock().unwrap().clone().map_err(ChainError::Other)?;
        Ok(UnsignedCall {
            from: caller,
            to: contract,
            data: Bytes::from(vec![submission.button_key]),
        })
    }

    fn execute(&self, _call: &UnsignedCall, _key: &SigningKey) -> Result<TxHandle, ChainError> {
        self.record("execute");
        let hash = self.execute.lock().unwrap().clone().map_err(ChainError::Other)?;
        Ok(TxHandle { hash })
    }

    fn receipt_for(&self, _tx: &TxHandle) -> Result<Option<ReceiptStatus>, ChainError> {
        self.record("receipt_for");
        self.receipt.lock().unwrap().clone().map_err(ChainError::Other)
    }
}
