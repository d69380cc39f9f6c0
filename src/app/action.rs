use super::{
    dispatch::RenderSink,
    state::{Inputs, State, TabState},
};
use crate::{
    chain::{ChainClient, ChainError, NAME_SERVICE_SUFFIX, ReceiptStatus},
    protocol::{self, DecodeError, ElementKey, Submission},
};
use alloy::primitives::{Address, Bytes};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A single user or timer request. Applied by the dispatcher only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Navigate to an ENS name or contract address.
    SetUrl(String),
    SetInput(ElementKey, Bytes),
    /// Simulate pressing the button with this key.
    Submit(ElementKey),
    ExecuteTx,
    CancelTx,
    ReloadChain,
    /// Poll the pending transaction.
    ReloadTab,
}

/// Whether the sink should see the result of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Render,
    Unchanged,
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("{0}")]
    Navigation(#[from] ChainError),
    #[error("{0}")]
    Decode(#[from] DecodeError),
    #[error("{0}")]
    App(String),
    #[error("{0}")]
    Transaction(String),
    #[error("{0}")]
    Connectivity(String),
}

impl ActionError {
    /// Writes the error where the UI shows it.
    fn surface(self, state: &mut State) {
        let text = self.to_string();
        match self {
            ActionError::Navigation(_) | ActionError::Decode(_) => {
                state.tab.load_error_text = Some(text);
            }
            ActionError::App(_) => state.tab.app_error_text = Some(text),
            ActionError::Transaction(_) => {
                state.tab.proposed_transaction = None;
                state.tab.pending_transaction = None;
                state.tab.load_error_text = Some(text);
            }
            ActionError::Connectivity(_) => state.chain.connection.error_text = Some(text),
        }
    }
}

/// What a handler may touch while it runs.
pub struct Context<'a, C> {
    pub state: &'a mut State,
    pub client: &'a C,
    pub sink: &'a mut dyn RenderSink,
}

impl<C> Context<'_, C> {
    /// Shows intermediate state before a slow call.
    fn render_now(&mut self) {
        self.sink.on_state_changed(self.state);
    }

    fn caller(&self) -> Address {
        self.state.chain.account.address
    }
}

enum Target {
    Name(String),
    Address(Address),
    Invalid(String),
    Empty,
}

impl Target {
    fn parse(text: &str) -> Self {
        if text.ends_with(NAME_SERVICE_SUFFIX) {
            Target::Name(text.to_string())
        } else if text.starts_with("0x") {
            match text.parse::<Address>() {
                Ok(address) => Target::Address(address),
                Err(err) => Target::Invalid(format!("invalid address {text}: {err}")),
            }
        } else {
            Target::Empty
        }
    }
}

impl Action {
    pub fn apply<C: ChainClient>(self, ctx: &mut Context<'_, C>) -> Effect {
        let result = match self {
            Action::SetUrl(target) => set_url(ctx, &target),
            Action::SetInput(key, value) => set_input(ctx, key, value),
            Action::Submit(button_key) => submit(ctx, button_key),
            Action::ExecuteTx => execute_tx(ctx),
            Action::CancelTx => cancel_tx(ctx),
            Action::ReloadChain => reload_chain(ctx),
            Action::ReloadTab => reload_tab(ctx),
        };
        match result {
            Ok(effect) => effect,
            Err(err) => {
                warn!(error = %err, "action failed");
                err.surface(ctx.state);
                Effect::Render
            }
        }
    }
}

fn set_url<C: ChainClient>(
    ctx: &mut Context<'_, C>,
    target: &str,
) -> Result<Effect, ActionError> {
    let target = target.trim();
    ctx.state.tab = TabState::navigating(target);

    match Target::parse(target) {
        Target::Name(name) => {
            ctx.render_now();
            let contract = ctx.client.resolve_name(&name)?;
            info!(%name, %contract, "resolved name");
            ctx.state.tab.resolved_contract = Some(contract);
        }
        Target::Address(contract) => ctx.state.tab.resolved_contract = Some(contract),
        Target::Invalid(reason) => {
            ctx.state.tab.load_error_text = Some(reason);
            return Ok(Effect::Render);
        }
        Target::Empty => {
            ctx.state.tab.entered_address.clear();
            return Ok(Effect::Render);
        }
    }

    load_frontend(ctx)
}

/// Calls `render` on the resolved contract and swaps in the new elements.
/// On failure the previous elements and inputs stay as they were.
fn load_frontend<C: ChainClient>(ctx: &mut Context<'_, C>) -> Result<Effect, ActionError> {
    let Some(contract) = ctx.state.tab.resolved_contract else {
        return Ok(Effect::Render);
    };
    let raw = ctx
        .client
        .render_frontend(ctx.caller(), contract, &ctx.state.tab.app_state)?;
    let elements = protocol::decode_render(&raw)?;
    debug!(%contract, count = elements.len(), "decoded frontend");

    let tab = &mut ctx.state.tab;
    tab.inputs = Inputs::for_elements(&elements);
    tab.elements = elements;
    tab.load_error_text = None;
    Ok(Effect::Render)
}

fn set_input<C>(
    ctx: &mut Context<'_, C>,
    key: ElementKey,
    value: Bytes,
) -> Result<Effect, ActionError> {
    if ctx.state.tab.inputs.set(key, value) {
        Ok(Effect::Render)
    } else {
        warn!(key, "input for unknown key ignored");
        Ok(Effect::Unchanged)
    }
}

fn submit<C: ChainClient>(
    ctx: &mut Context<'_, C>,
    button_key: ElementKey,
) -> Result<Effect, ActionError> {
    let tab = &ctx.state.tab;
    let contract = tab
        .resolved_contract
        .ok_or_else(|| ActionError::App("no contract loaded".into()))?;
    if tab.pending_transaction.is_some() {
        return Err(ActionError::App(
            "wait for the pending transaction to confirm".into(),
        ));
    }
    if !tab.button_exists(button_key) {
        return Err(ActionError::App(format!("no button with key {button_key}")));
    }

    let submission = Submission {
        button_key,
        inputs: tab.inputs.ordered_bytes(),
    };
    let call = ctx
        .client
        .simulate_submit(ctx.caller(), contract, &tab.app_state, &submission)
        .map_err(|err| ActionError::App(err.to_string()))?;
    info!(button_key, %contract, "proposed transaction");

    let tab = &mut ctx.state.tab;
    tab.app_error_text = None;
    tab.proposed_transaction = Some(call);
    Ok(Effect::Render)
}

fn execute_tx<C: ChainClient>(ctx: &mut Context<'_, C>) -> Result<Effect, ActionError> {
    let Some(call) = ctx.state.tab.proposed_transaction.clone() else {
        debug!("execute without a proposed transaction");
        return Ok(Effect::Unchanged);
    };
    let key = ctx
        .state
        .chain
        .signing_key
        .as_ref()
        .ok_or_else(|| {
            ActionError::Transaction("log in with a private key to send transactions".into())
        })?;

    let handle = ctx
        .client
        .execute(&call, key)
        .map_err(|err| ActionError::Transaction(err.to_string()))?;
    info!(hash = %handle, "transaction pending");

    let tab = &mut ctx.state.tab;
    tab.proposed_transaction = None;
    tab.pending_transaction = Some(handle);
    Ok(Effect::Render)
}

fn cancel_tx<C>(ctx: &mut Context<'_, C>) -> Result<Effect, ActionError> {
    let tab = &mut ctx.state.tab;
    tab.proposed_transaction = None;
    tab.pending_transaction = None;
    Ok(Effect::Render)
}

fn reload_chain<C: ChainClient>(ctx: &mut Context<'_, C>) -> Result<Effect, ActionError> {
    let status = ctx.client.connection_status();
    if status == ctx.state.chain.connection {
        return Ok(Effect::Unchanged);
    }
    let error = status.error_text.clone();
    ctx.state.chain.connection = status;
    match error {
        Some(error) => Err(ActionError::Connectivity(error)),
        None => Ok(Effect::Render),
    }
}

fn reload_tab<C: ChainClient>(ctx: &mut Context<'_, C>) -> Result<Effect, ActionError> {
    let Some(handle) = ctx.state.tab.pending_transaction else {
        return Ok(Effect::Unchanged);
    };
    match ctx.client.receipt_for(&handle) {
        Ok(None) => Ok(Effect::Unchanged),
        Ok(Some(ReceiptStatus::Confirmed)) => {
            info!(hash = %handle, "transaction confirmed");
            ctx.state.tab.pending_transaction = None;
            Ok(Effect::Render)
        }
        Ok(Some(ReceiptStatus::Reverted)) => Err(ActionError::Transaction(format!(
            "transaction reverted: {handle}"
        ))),
        Err(err) => {
            warn!(hash = %handle, error = %err, "receipt lookup failed");
            Ok(Effect::Unchanged)
        }
    }
}
