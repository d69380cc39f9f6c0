use super::util::short_hex;
use crate::{
    app::{
        Action, AppContext, AppResult, AppView,
        state::{Snapshot, TabStatus},
    },
    components::Component,
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

#[derive(Debug, Default)]
pub struct BottomBar;

impl BottomBar {
    const KEYMAP: &'static str =
        "^C Quit • / URL • Tab Pane • ↑↓ Move • ←→ Choose • Enter Press • ^R Reload";

    fn status_spans(snapshot: &Snapshot) -> Vec<Span<'static>> {
        let connection = &snapshot.chain.connection;
        let mut spans = vec![if let Some(error) = &connection.error_text {
            Span::styled(format!("offline: {error}"), Style::default().fg(Color::Red))
        } else if connection.is_connected() {
            Span::styled(
                format!("{} ({})", connection.chain_name, connection.chain_id),
                Style::default().fg(Color::Green),
            )
        } else {
            Span::styled("connecting…", Style::default().fg(Color::Yellow))
        }];

        let tab = &snapshot.tab;
        let status = match tab.status() {
            TabStatus::Empty => None,
            TabStatus::Resolving => Some(("resolving".to_string(), Color::Yellow)),
            TabStatus::Resolved(contract) if tab.load_error_text.is_none() => Some((
                format!("loaded {}", short_hex(&format!("{contract:#x}"))),
                Color::Gray,
            )),
            TabStatus::Resolved(_) | TabStatus::ResolutionFailed => {
                Some(("failed".to_string(), Color::Red))
            }
        };
        if let Some((text, color)) = status {
            spans.push(Span::raw(" • "));
            spans.push(Span::styled(text, Style::default().fg(color)));
        }
        if let Some(pending) = &tab.pending_transaction {
            spans.push(Span::raw(" • "));
            spans.push(Span::styled(
                format!("pending {}", short_hex(&pending.to_string())),
                Style::default().fg(Color::Yellow),
            ));
        }
        spans
    }
}

impl Component for BottomBar {
    type Command = ();

    fn init(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<()> {
        Ok(())
    }

    fn update(
        &mut self,
        _command: &Self::Command,
        _ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let lines = vec![
            Line::from(Self::status_spans(ctx.snapshot)),
            Line::from(Span::styled(Self::KEYMAP, Style::default().fg(Color::Gray))),
        ];
        let widget = Paragraph::new(lines).block(
            Block::bordered()
                .title(Line::from("Status").style(Style::default().add_modifier(Modifier::BOLD))),
        );
        frame.render_widget(widget, area);
    }

    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        Ok(None)
    }
}
