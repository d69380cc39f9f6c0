use crate::{
    app::{Action, AppContext, AppResult, AppView, state::TabState},
    chain::{TxHandle, UnsignedCall},
    components::Component,
    ui::util::{centered_rect, short_hex},
};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Shown while the tab holds a proposed or pending transaction.
#[derive(Debug, Default)]
pub struct ConfirmModal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmCommand {
    Confirm,
    Cancel,
}

impl ConfirmModal {
    pub fn is_active(tab: &TabState) -> bool {
        tab.proposed_transaction.is_some() || tab.pending_transaction.is_some()
    }

    /// A pending transaction can only be cancelled.
    pub fn command_from_key(tab: &TabState, event: KeyEvent) -> Option<ConfirmCommand> {
        match event.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter
                if tab.proposed_transaction.is_some() =>
            {
                Some(ConfirmCommand::Confirm)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc if Self::is_active(tab) => {
                Some(ConfirmCommand::Cancel)
            }
            _ => None,
        }
    }

    fn field(name: &str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(
                format!("{name:>6}: "),
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(value),
        ])
    }

    fn lines(call: &UnsignedCall, logged_in: bool) -> Vec<Line<'static>> {
        let mut lines = vec![
            Self::field("from", format!("{:#x}", call.from)),
            Self::field("to", format!("{:#x}", call.to)),
            Self::field(
                "data",
                format!("{} ({} bytes)", short_hex(&call.data.to_string()), call.data.len()),
            ),
            Line::from(""),
        ];
        if logged_in {
            lines.push(Line::from(Span::styled(
                "Sign and send? y/Enter to confirm • n/Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "No private key loaded: sending will fail. n/Esc to cancel",
                Style::default().fg(Color::Yellow),
            )));
        }
        lines
    }

    fn pending_lines(pending: &TxHandle) -> Vec<Line<'static>> {
        vec![
            Self::field("hash", short_hex(&pending.to_string())),
            Line::from(""),
            Line::from(Span::styled(
                "Waiting for the receipt… n/Esc to stop tracking it",
                Style::default().fg(Color::Gray),
            )),
        ]
    }
}

impl Component for ConfirmModal {
    type Command = ConfirmCommand;

    fn init(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<()> {
        Ok(())
    }

    fn update(
        &mut self,
        command: &Self::Command,
        _ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        Ok(Some(match command {
            ConfirmCommand::Confirm => Action::ExecuteTx,
            ConfirmCommand::Cancel => Action::CancelTx,
        }))
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let tab = &ctx.snapshot.tab;
        let (title, lines) = match (&tab.proposed_transaction, &tab.pending_transaction) {
            (Some(call), _) => (
                "Confirm Transaction",
                Self::lines(call, ctx.snapshot.chain.logged_in),
            ),
            (None, Some(pending)) => ("Transaction Pending", Self::pending_lines(pending)),
            (None, None) => return,
        };
        let modal_area = centered_rect(72, 9, area);
        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .title(Span::styled(
                title,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray));
        let widget = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left);
        frame.render_widget(widget, modal_area);
    }

    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        Ok(None)
    }
}
