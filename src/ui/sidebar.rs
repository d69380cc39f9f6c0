use super::util::{address_label, short_hex, title_style};
use crate::{
    app::{Action, AppContext, AppResult, AppView, FocusedPane},
    components::Component,
    storage::VisitRecord,
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

/// Account and chain status above the list of recently visited contracts.
#[derive(Debug, Default)]
pub struct Sidebar {
    history: Vec<VisitRecord>,
    selected_index: usize,
}

#[derive(Debug)]
pub enum SidebarCommand {
    MoveUp,
    MoveDown,
    Open,
}

impl Sidebar {
    pub fn set_history(&mut self, items: Vec<VisitRecord>) {
        self.history = items;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.history.len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    fn display_label(record: &VisitRecord) -> String {
        if record.entered.eq_ignore_ascii_case(&record.contract) {
            short_hex(&record.contract)
        } else {
            format!("{} ({})", record.entered, short_hex(&record.contract))
        }
    }

    fn status_lines(ctx: &AppView<'_>) -> Vec<Line<'static>> {
        let chain = &ctx.snapshot.chain;
        let account = if chain.logged_in {
            Span::raw(address_label(&chain.account))
        } else {
            Span::styled("read-only (no key)", Style::default().fg(Color::DarkGray))
        };
        let connection = match &chain.connection.error_text {
            Some(error) => Span::styled(format!("✖ {error}"), Style::default().fg(Color::Red)),
            None if chain.connection.is_connected() => Span::styled(
                format!("● {}", chain.connection.chain_name),
                Style::default().fg(Color::Green),
            ),
            None => Span::styled("○ connecting…", Style::default().fg(Color::Yellow)),
        };
        vec![Line::from(account), Line::from(connection)]
    }
}

impl Component for Sidebar {
    type Command = SidebarCommand;

    fn init(&mut self, ctx: &mut AppContext<'_>) -> AppResult<()> {
        self.set_history(ctx.storage.history().list()?);
        Ok(())
    }

    fn update(
        &mut self,
        command: &Self::Command,
        _ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        match command {
            SidebarCommand::MoveUp => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            SidebarCommand::MoveDown => {
                let len = self.history.len();
                if len > 0 {
                    self.selected_index = (self.selected_index + 1).min(len - 1);
                }
            }
            SidebarCommand::Open => {
                return Ok(self
                    .history
                    .get(self.selected_index)
                    .map(|record| Action::SetUrl(record.entered.clone())));
            }
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let is_focused = matches!(ctx.ui.focused_pane, FocusedPane::Sidebar);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from("History").style(title_style(is_focused)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(inner);

        frame.render_widget(Paragraph::new(Self::status_lines(ctx)), chunks[0]);

        if self.history.is_empty() {
            let empty = Paragraph::new("No visits yet. Press / to open a dapp.")
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(empty, chunks[1]);
            return;
        }

        let list_items: Vec<ListItem> = self
            .history
            .iter()
            .map(|record| ListItem::new(Self::display_label(record)))
            .collect();
        let highlight = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let mut state = ListState::default();
        state.select(Some(self.selected_index));

        let list = List::new(list_items)
            .highlight_style(highlight)
            .highlight_symbol("▸ ");
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        Ok(None)
    }
}
