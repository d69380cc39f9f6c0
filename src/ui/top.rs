use super::util::{short_hex, title_style};
use crate::{
    app::{
        Action, AppContext, AppResult, AppView, FocusedPane,
        state::{TabState, TabStatus},
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

/// URL bar: takes an ENS name or contract address.
#[derive(Debug)]
pub struct TopBar {
    title: String,
    editing: bool,
    value: String,
    restored: Option<String>,
    status: Option<String>,
}

impl Default for TopBar {
    fn default() -> Self {
        Self {
            title: "dapp-tui".to_string(),
            editing: false,
            value: String::new(),
            restored: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TopCommand {
    Activate,
    InputChar(char),
    Backspace,
    Submit,
    Cancel,
}

impl TopBar {
    const LAST_URL_KEY: &'static str = "top:last_url";

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// URL entered in the previous session.
    pub fn restored_url(&self) -> Option<String> {
        self.restored.clone()
    }

    fn descriptor(tab: &TabState) -> String {
        match tab.status() {
            TabStatus::Empty => "no contract".to_string(),
            TabStatus::Resolving => format!("resolving {}…", tab.entered_address),
            TabStatus::Resolved(contract) => {
                let address = format!("{contract:#x}");
                if tab.entered_address.eq_ignore_ascii_case(&address) {
                    short_hex(&address)
                } else {
                    format!("{} → {}", tab.entered_address, short_hex(&address))
                }
            }
            TabStatus::ResolutionFailed => format!("{} (unresolved)", tab.entered_address),
        }
    }
}

impl Component for TopBar {
    type Command = TopCommand;

    fn init(&mut self, ctx: &mut AppContext<'_>) -> AppResult<()> {
        if let Some(raw) = ctx.storage.settings().get(Self::LAST_URL_KEY)? {
            if let Ok(value) = String::from_utf8(raw) {
                if !value.is_empty() {
                    self.value = value.clone();
                    self.restored = Some(value);
                }
            }
        }
        Ok(())
    }

    fn update(
        &mut self,
        command: &Self::Command,
        ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        match command {
            TopCommand::Activate => {
                self.editing = true;
                if !ctx.snapshot.tab.entered_address.is_empty() {
                    self.value = ctx.snapshot.tab.entered_address.clone();
                }
                self.status = None;
            }
            TopCommand::InputChar(c) => {
                self.editing = true;
                self.value.push(*c);
            }
            TopCommand::Backspace => {
                self.value.pop();
            }
            TopCommand::Submit => {
                let url = self.value.trim().to_string();
                if url.is_empty() {
                    self.status = Some("Enter an ENS name or contract address".into());
                    return Ok(None);
                }
                self.editing = false;
                self.status = None;
                self.value = url.clone();
                ctx.storage
                    .settings()
                    .put(Self::LAST_URL_KEY, url.as_bytes())?;
                return Ok(Some(Action::SetUrl(url)));
            }
            TopCommand::Cancel => {
                self.editing = false;
                self.status = None;
            }
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let is_focused = matches!(ctx.ui.focused_pane, FocusedPane::Top);
        let title = Line::from(format!(
            "{} • {}",
            self.title,
            Self::descriptor(&ctx.snapshot.tab)
        ));

        let line = if self.editing {
            Line::from(vec![
                Span::styled(
                    format!("› {}_", self.value),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  Enter to open • Esc to cancel"),
            ])
        } else if let Some(status) = &self.status {
            Line::from(Span::styled(status.clone(), Style::default().fg(Color::Yellow)))
        } else if !ctx.snapshot.tab.entered_address.is_empty() {
            Line::from(ctx.snapshot.tab.entered_address.clone())
        } else {
            Line::from("Press / to enter an ENS name or contract address")
        };

        let widget = Paragraph::new(line)
            .style(Style::default().fg(Color::Gray))
            .block(Block::bordered().title(title.style(title_style(is_focused))));
        frame.render_widget(widget, area);
    }

    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        Ok(None)
    }
}
