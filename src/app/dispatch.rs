use super::{
    action::{Action, Context, Effect},
    state::State,
};
use crate::chain::{ChainClient, SigningKey};
use std::{
    sync::mpsc::{self, Receiver, SyncSender, TrySendError},
    thread::{self, JoinHandle},
    time::Duration,
};
use tokio::{
    runtime::Handle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info, warn};

pub const QUEUE_CAPACITY: usize = 1;
pub const CHAIN_REFRESH_INTERVAL: Duration = Duration::from_secs(10);
pub const TX_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Receives the state after every action that changed it.
pub trait RenderSink {
    fn on_state_changed(&mut self, state: &State);
}

impl<F> RenderSink for F
where
    F: FnMut(&State),
{
    fn on_state_changed(&mut self, state: &State) {
        self(state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Queued,
    Dropped,
    Closed,
}

#[derive(Debug, Clone)]
pub struct DispatchHandle {
    sender: SyncSender<Action>,
}

impl DispatchHandle {
    /// Never blocks.
    pub fn submit(&self, action: Action) -> Enqueue {
        match self.sender.try_send(action) {
            Ok(()) => Enqueue::Queued,
            Err(TrySendError::Full(action)) => {
                warn!(?action, "dispatcher busy, dropping action");
                Enqueue::Dropped
            }
            Err(TrySendError::Disconnected(action)) => {
                debug!(?action, "dispatcher stopped");
                Enqueue::Closed
            }
        }
    }
}

pub struct Dispatcher<C, R> {
    state: State,
    client: C,
    sink: R,
    receiver: Receiver<Action>,
}

impl<C, R> Dispatcher<C, R>
where
    C: ChainClient,
    R: RenderSink,
{
    pub fn new(client: C, signing_key: Option<SigningKey>, sink: R) -> (Self, DispatchHandle) {
        let (sender, receiver) = mpsc::sync_channel(QUEUE_CAPACITY);
        let dispatcher = Self {
            state: State::new(signing_key),
            client,
            sink,
            receiver,
        };
        (dispatcher, DispatchHandle { sender })
    }

    pub fn step(&mut self, action: Action) {
        debug!(?action, "applying action");
        let mut ctx = Context {
            state: &mut self.state,
            client: &self.client,
            sink: &mut self.sink,
        };
        if action.apply(&mut ctx) == Effect::Render {
            self.sink.on_state_changed(&self.state);
        }
    }

    /// Runs until every [`DispatchHandle`] is gone.
    pub fn run(mut self) {
        info!("dispatcher started");
        self.step(Action::ReloadChain);
        while let Ok(action) = self.receiver.recv() {
            self.step(action);
        }
        info!("dispatcher stopped");
    }
}

impl<C, R> Dispatcher<C, R>
where
    C: ChainClient + Send + 'static,
    R: RenderSink + Send + 'static,
{
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("dispatcher".into())
            .spawn(move || self.run())
    }
}

/// Periodic chain refresh and transaction polling.
pub fn spawn_tickers(
    runtime: &Handle,
    dispatch: DispatchHandle,
) -> Vec<tokio::task::JoinHandle<()>> {
    [
        (CHAIN_REFRESH_INTERVAL, Action::ReloadChain),
        (TX_POLL_INTERVAL, Action::ReloadTab),
    ]
    .into_iter()
    .map(|(period, action)| {
        let dispatch = dispatch.clone();
        runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if dispatch.submit(action.clone()) == Enqueue::Closed {
                    break;
                }
            }
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::state::TabState, chain::mock::MockChain, protocol::fixtures};
    use alloy::primitives::Address;

    #[test]
    fn queue_holds_one_action() {
        let (dispatcher, handle) = Dispatcher::new(MockChain::default(), None, |_: &State| {});

        assert_eq!(handle.submit(Action::ReloadChain), Enqueue::Queued);
        assert_eq!(handle.submit(Action::ReloadTab), Enqueue::Dropped);
        assert_eq!(handle.clone().submit(Action::CancelTx), Enqueue::Dropped);

        drop(dispatcher);
        assert_eq!(handle.submit(Action::ReloadChain), Enqueue::Closed);
    }

    #[test]
    fn step_renders_only_on_change() {
        let mut renders = 0;
        let (mut dispatcher, _handle) =
            Dispatcher::new(MockChain::default(), None, |_: &State| renders += 1);

        dispatcher.step(Action::ReloadChain);
        dispatcher.step(Action::ReloadChain);
        dispatcher.step(Action::ReloadTab);
        dispatcher.step(Action::SetInput(0, Default::default()));
        drop(dispatcher);

        assert_eq!(renders, 1);
    }

    #[test]
    fn runs_on_its_own_thread_until_handles_drop() {
        let contract = Address::repeat_byte(0x42);
        let client = MockChain::default();
        client.set_render(Ok(vec![fixtures::button(0, "Go")]));
        let (tx, rx) = mpsc::channel::<TabState>();
        let sink = move |state: &State| {
            let _ = tx.send(state.tab.clone());
        };

        let (dispatcher, handle) = Dispatcher::new(client, None, sink);
        let thread = dispatcher.spawn().unwrap();

        let timeout = Duration::from_secs(5);
        let initial = rx.recv_timeout(timeout).unwrap();
        assert_eq!(initial, TabState::default());

        assert_eq!(
            handle.submit(Action::SetUrl(format!("{contract:#x}"))),
            Enqueue::Queued
        );
        let loaded = rx.recv_timeout(timeout).unwrap();
        assert_eq!(loaded.resolved_contract, Some(contract));
        assert_eq!(loaded.elements.len(), 1);

        assert_eq!(handle.submit(Action::Submit(0)), Enqueue::Queued);
        let proposed = rx.recv_timeout(timeout).unwrap();
        assert!(proposed.proposed_transaction.is_some());

        drop(handle);
        thread.join().unwrap();
    }

    fn paused_runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap()
    }

    #[test]
    fn tickers_shed_while_the_queue_is_full() {
        let (dispatcher, handle) = Dispatcher::new(MockChain::default(), None, |_: &State| {});
        let runtime = paused_runtime();

        let queued: Vec<Action> = runtime.block_on(async {
            let tickers = spawn_tickers(&Handle::current(), handle);
            tokio::time::sleep(Duration::from_secs(21)).await;
            for ticker in tickers {
                ticker.abort();
            }
            dispatcher.receiver.try_iter().collect()
        });

        assert_eq!(queued, vec![Action::ReloadTab]);
    }

    #[test]
    fn tickers_fire_on_their_periods() {
        let (dispatcher, handle) = Dispatcher::new(MockChain::default(), None, |_: &State| {});
        let runtime = paused_runtime();

        let seen: Vec<(u64, Vec<Action>)> = runtime.block_on(async {
            let tickers = spawn_tickers(&Handle::current(), handle);
            tokio::time::sleep(Duration::from_millis(500)).await;
            let mut seen = Vec::new();
            for second in 1..=20u64 {
                tokio::time::sleep(Duration::from_secs(1)).await;
                seen.push((second, dispatcher.receiver.try_iter().collect()));
            }
            for ticker in tickers {
                ticker.abort();
            }
            seen
        });

        for (second, actions) in seen {
            match second {
                10 | 20 => assert_eq!(actions.len(), 1, "second {second}"),
                s if s % 2 == 0 => assert_eq!(actions, vec![Action::ReloadTab], "second {s}"),
                s => assert!(actions.is_empty(), "second {s}"),
            }
        }
    }
}
