pub mod action;
pub mod diff;
pub mod dispatch;
pub mod state;

use crate::{
    chain::RpcClient,
    components::Component,
    config::Settings,
    storage::{Storage, VisitRecord},
    ui::{
        bottom_bar::BottomBar,
        main_view::{MainView, MainViewCommand},
        modal::confirm::{ConfirmCommand, ConfirmModal},
        sidebar::{Sidebar, SidebarCommand},
        top::{TopBar, TopCommand},
    },
};
pub use action::Action;
use alloy::primitives::Address;
use color_eyre::eyre::WrapErr;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dispatch::{DispatchHandle, Dispatcher, spawn_tickers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout},
};
use state::{Snapshot, State, TabStatus};
use std::{
    sync::mpsc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::{runtime::Runtime, task::JoinHandle};
use tracing::{info, warn};

pub use navigation::FocusedPane;

pub type AppResult<T> = color_eyre::Result<T>;

const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal front end. Owns the widgets and forwards their actions to the
/// dispatcher; the browser state itself only arrives here as snapshots.
pub struct App {
    running: bool,
    ui: UiState,
    storage: Storage,
    snapshot: Snapshot,
    top_bar: TopBar,
    sidebar: Sidebar,
    main_view: MainView,
    bottom_bar: BottomBar,
    confirm: ConfirmModal,
    queue: DispatchHandle,
    snapshot_rx: mpsc::Receiver<Snapshot>,
    tickers: Vec<JoinHandle<()>>,
    runtime: Runtime,
}

impl App {
    pub fn new(settings: Settings) -> AppResult<Self> {
        let runtime = Runtime::new()?;
        let mut storage = match &settings.data_dir {
            Some(dir) => Storage::open(dir)?,
            None => Storage::open_default()?,
        };
        info!(data_dir = %storage.root().display(), "opened storage");

        let client = RpcClient::connect(&settings.rpc_url, runtime.handle().clone())
            .wrap_err_with(|| format!("failed to connect to {}", settings.rpc_url))?;
        let (snapshot_tx, snapshot_rx) = mpsc::channel();
        let sink = move |state: &State| {
            let _ = snapshot_tx.send(state.snapshot());
        };
        let (dispatcher, queue) = Dispatcher::new(client, settings.signing_key, sink);
        dispatcher.spawn().wrap_err("failed to start dispatcher")?;
        let tickers = spawn_tickers(runtime.handle(), queue.clone());

        let mut ui = UiState::default();
        let snapshot = Snapshot::default();
        let mut top_bar = TopBar::default();
        let mut sidebar = Sidebar::default();
        let mut main_view = MainView::default();
        let mut bottom_bar = BottomBar::default();
        let mut confirm = ConfirmModal::default();
        {
            let mut ctx = AppContext {
                ui: &mut ui,
                storage: &mut storage,
                snapshot: &snapshot,
            };
            top_bar.init(&mut ctx)?;
            sidebar.init(&mut ctx)?;
            main_view.init(&mut ctx)?;
            bottom_bar.init(&mut ctx)?;
            confirm.init(&mut ctx)?;
        }

        if let Some(url) = settings.url.or_else(|| top_bar.restored_url()) {
            info!(%url, "opening startup url");
            queue.submit(Action::SetUrl(url));
            ui.focused_pane = FocusedPane::MainView;
        }

        Ok(Self {
            running: false,
            ui,
            storage,
            snapshot,
            top_bar,
            sidebar,
            main_view,
            bottom_bar,
            confirm,
            queue,
            snapshot_rx,
            tickers,
            runtime,
        })
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> AppResult<()> {
        self.running = true;
        while self.running {
            self.tick()?;
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }
        self.shutdown()
    }

    fn shutdown(self) -> AppResult<()> {
        for ticker in &self.tickers {
            ticker.abort();
        }
        self.storage.persist()?;
        info!("shutting down");
        // The dispatcher may be inside a blocking call; it exits once the
        // runtime and the last handle are gone.
        drop(self.queue);
        self.runtime.shutdown_background();
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(4),
            ])
            .split(frame.area());

        let top_area = layout[0];
        let main_area = layout[1];
        let bottom_area = layout[2];

        let app_panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(32), Constraint::Min(1)])
            .split(main_area);

        let sidebar_area = app_panes[0];
        let content_area = app_panes[1];

        let view = AppView {
            ui: &self.ui,
            snapshot: &self.snapshot,
        };

        self.top_bar.render(frame, top_area, &view);
        self.sidebar.render(frame, sidebar_area, &view);
        self.main_view.render(frame, content_area, &view);
        self.bottom_bar.render(frame, bottom_area, &view);
        if ConfirmModal::is_active(&self.snapshot.tab) {
            self.confirm.render(frame, frame.area(), &view);
        }
    }

    fn handle_events(&mut self) -> AppResult<()> {
        if !event::poll(EVENT_POLL_INTERVAL)? {
            return Ok(());
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key)?,
            Event::Mouse(_) | Event::Resize(_, _) => {}
            _ => {}
        }
        Ok(())
    }

    fn on_key_event(&mut self, key: KeyEvent) -> AppResult<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.running = false;
            return Ok(());
        }

        if ConfirmModal::is_active(&self.snapshot.tab) {
            if let Some(command) = ConfirmModal::command_from_key(&self.snapshot.tab, key) {
                return self.confirm_command(command);
            }
            return Ok(());
        }

        if self.top_bar.is_editing() {
            let command = match key.code {
                KeyCode::Esc => Some(TopCommand::Cancel),
                KeyCode::Enter => Some(TopCommand::Submit),
                KeyCode::Backspace => Some(TopCommand::Backspace),
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(TopCommand::InputChar(c))
                }
                _ => None,
            };
            if let Some(command) = command {
                return self.top_bar_command(command);
            }
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('r') | KeyCode::Char('R')) => self.reload(),
            (KeyModifiers::NONE, KeyCode::Char('/')) => {
                self.ui.focused_pane = FocusedPane::Top;
                self.top_bar_command(TopCommand::Activate)?;
            }
            (KeyModifiers::NONE, KeyCode::Tab) => self.ui.focus_next(),
            (_, KeyCode::BackTab) => self.ui.focus_previous(),
            _ => match self.ui.focused_pane {
                FocusedPane::Sidebar => {
                    let command = match key.code {
                        KeyCode::Up => Some(SidebarCommand::MoveUp),
                        KeyCode::Down => Some(SidebarCommand::MoveDown),
                        KeyCode::Enter => Some(SidebarCommand::Open),
                        _ => None,
                    };
                    if let Some(command) = command {
                        self.sidebar_command(command)?;
                    }
                }
                FocusedPane::MainView => {
                    if let Some(command) = MainView::command_from_key(key) {
                        self.main_view_command(command)?;
                    }
                }
                FocusedPane::Top => {
                    if key.code == KeyCode::Enter {
                        self.top_bar_command(TopCommand::Activate)?;
                    }
                }
            },
        }
        Ok(())
    }

    /// Re-navigates to whatever is in the URL bar.
    fn reload(&mut self) {
        let entered = self.snapshot.tab.entered_address.clone();
        if !entered.is_empty() {
            self.dispatch(Action::SetUrl(entered));
        }
    }

    fn dispatch(&mut self, action: Action) {
        if matches!(action, Action::SetUrl(_)) {
            self.ui.focused_pane = FocusedPane::MainView;
        }
        self.queue.submit(action);
    }

    fn sidebar_command(&mut self, command: SidebarCommand) -> AppResult<()> {
        let mut ctx = AppContext {
            ui: &mut self.ui,
            storage: &mut self.storage,
            snapshot: &self.snapshot,
        };
        if let Some(action) = self.sidebar.update(&command, &mut ctx)? {
            self.dispatch(action);
        }
        Ok(())
    }

    fn main_view_command(&mut self, command: MainViewCommand) -> AppResult<()> {
        let mut ctx = AppContext {
            ui: &mut self.ui,
            storage: &mut self.storage,
            snapshot: &self.snapshot,
        };
        if let Some(action) = self.main_view.update(&command, &mut ctx)? {
            self.dispatch(action);
        }
        Ok(())
    }

    fn top_bar_command(&mut self, command: TopCommand) -> AppResult<()> {
        let mut ctx = AppContext {
            ui: &mut self.ui,
            storage: &mut self.storage,
            snapshot: &self.snapshot,
        };
        if let Some(action) = self.top_bar.update(&command, &mut ctx)? {
            self.dispatch(action);
        }
        Ok(())
    }

    fn confirm_command(&mut self, command: ConfirmCommand) -> AppResult<()> {
        let mut ctx = AppContext {
            ui: &mut self.ui,
            storage: &mut self.storage,
            snapshot: &self.snapshot,
        };
        if let Some(action) = self.confirm.update(&command, &mut ctx)? {
            self.dispatch(action);
        }
        Ok(())
    }

    fn tick(&mut self) -> AppResult<()> {
        self.drain_snapshots()?;
        let mut ctx = AppContext {
            ui: &mut self.ui,
            storage: &mut self.storage,
            snapshot: &self.snapshot,
        };
        let actions = [
            self.top_bar.tick(&mut ctx)?,
            self.sidebar.tick(&mut ctx)?,
            self.main_view.tick(&mut ctx)?,
            self.bottom_bar.tick(&mut ctx)?,
        ];
        for action in actions.into_iter().flatten() {
            self.dispatch(action);
        }
        Ok(())
    }

    fn drain_snapshots(&mut self) -> AppResult<()> {
        while let Ok(snapshot) = self.snapshot_rx.try_recv() {
            self.main_view.apply_snapshot(&self.snapshot, &snapshot);
            if let TabStatus::Resolved(contract) = snapshot.tab.status() {
                let previous = self.snapshot.tab.resolved_contract;
                if previous != Some(contract) && snapshot.tab.load_error_text.is_none() {
                    self.record_visit(&snapshot.tab.entered_address, contract)?;
                }
            }
            self.snapshot = snapshot;
        }
        Ok(())
    }

    fn record_visit(&mut self, entered: &str, contract: Address) -> AppResult<()> {
        let visited_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        let record = VisitRecord {
            entered: entered.to_string(),
            contract: format!("{contract:#x}"),
            visited_at,
        };
        if let Err(err) = self.storage.history().record(&record) {
            warn!(error = %err, "failed to record visit");
            return Ok(());
        }
        self.sidebar.set_history(self.storage.history().list()?);
        Ok(())
    }
}

/// Terminal-side state that never reaches the dispatcher.
#[derive(Debug, Default)]
pub struct UiState {
    pub focused_pane: FocusedPane,
}

impl UiState {
    pub fn focus_next(&mut self) {
        self.focused_pane = match self.focused_pane {
            FocusedPane::Top => FocusedPane::Sidebar,
            FocusedPane::Sidebar => FocusedPane::MainView,
            FocusedPane::MainView => FocusedPane::Top,
        };
    }

    pub fn focus_previous(&mut self) {
        self.focused_pane = match self.focused_pane {
            FocusedPane::Top => FocusedPane::MainView,
            FocusedPane::Sidebar => FocusedPane::Top,
            FocusedPane::MainView => FocusedPane::Sidebar,
        };
    }
}

/// Mutable context passed to components while handling logic.
pub struct AppContext<'a> {
    pub ui: &'a mut UiState,
    pub storage: &'a mut Storage,
    pub snapshot: &'a Snapshot,
}

/// Read-only context used during rendering.
pub struct AppView<'a> {
    pub ui: &'a UiState,
    pub snapshot: &'a Snapshot,
}

mod navigation {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum FocusedPane {
        #[default]
        Top,
        Sidebar,
        MainView,
    }
}
