use super::util::{short_hex, title_style};
use crate::{
    app::{
        Action, AppContext, AppResult, AppView, FocusedPane,
        diff::reconcile,
        state::{Inputs, Snapshot, TabStatus},
    },
    components::Component,
    protocol::{
        DropdownOption, Element, ElementKey, VElem,
        amount::{AmountError, decode_uint, encode_uint, format_fixed, parse_fixed},
    },
};
use alloy::primitives::Bytes;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Renders the contract's elements and turns edits into actions.
///
/// Widgets are patched rather than rebuilt on every snapshot, so the ones
/// the diff keeps hold on to their focus and edit buffers.
#[derive(Debug, Default)]
pub struct MainView {
    widgets: Vec<Widget>,
    focused: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainViewCommand {
    Up,
    Down,
    Left,
    Right,
    Enter,
    InputChar(char),
    Backspace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Widget {
    Text {
        text: String,
    },
    Amount {
        key: ElementKey,
        label: String,
        decimals: usize,
        buffer: String,
        /// Edited since the last commit.
        dirty: bool,
        error: Option<String>,
    },
    Dropdown {
        key: ElementKey,
        label: String,
        options: Vec<DropdownOption>,
        selected: Option<usize>,
    },
    Button {
        key: ElementKey,
        text: String,
    },
}

impl Widget {
    fn new(elem: &VElem, inputs: &Inputs) -> Self {
        let mut widget = match &elem.parsed {
            Element::Text { text, .. } => Widget::Text { text: text.clone() },
            Element::AmountInput {
                key,
                label,
                decimals,
            } => Widget::Amount {
                key: *key,
                label: label.clone(),
                decimals: usize::try_from(*decimals).unwrap_or(usize::MAX),
                buffer: String::new(),
                dirty: false,
                error: None,
            },
            Element::DropdownInput {
                key,
                label,
                options,
            } => Widget::Dropdown {
                key: *key,
                label: label.clone(),
                options: options.clone(),
                selected: None,
            },
            Element::ButtonAction { key, text } => Widget::Button {
                key: *key,
                text: text.clone(),
            },
        };
        let value = widget.input_key().and_then(|key| inputs.get(key)).cloned();
        widget.show_value(value.as_ref());
        widget
    }

    fn input_key(&self) -> Option<ElementKey> {
        match self {
            Widget::Amount { key, .. } | Widget::Dropdown { key, .. } => Some(*key),
            Widget::Text { .. } | Widget::Button { .. } => None,
        }
    }

    fn is_focusable(&self) -> bool {
        !matches!(self, Widget::Text { .. })
    }

    /// Replaces whatever the widget shows with the committed `value`.
    fn show_value(&mut self, value: Option<&Bytes>) {
        let value = value.and_then(|raw| decode_uint(raw));
        match self {
            Widget::Amount {
                decimals,
                buffer,
                dirty,
                error,
                ..
            } => {
                *buffer = value
                    .map(|value| format_fixed(value, *decimals))
                    .unwrap_or_default();
                *dirty = false;
                *error = None;
            }
            Widget::Dropdown {
                options, selected, ..
            } => {
                *selected = value.and_then(|value| options.iter().position(|o| o.value == value));
            }
            Widget::Text { .. } | Widget::Button { .. } => {}
        }
    }

    /// Parses the edit buffer. Invalid text is flagged and not sent.
    fn commit(&mut self) -> Option<Action> {
        let Widget::Amount {
            key,
            decimals,
            buffer,
            dirty,
            error,
            ..
        } = self
        else {
            return None;
        };
        if !*dirty {
            return None;
        }
        match parse_fixed(buffer, *decimals) {
            Ok(value) => {
                *buffer = format_fixed(value, *decimals);
                *dirty = false;
                *error = None;
                Some(Action::SetInput(*key, encode_uint(value)))
            }
            Err(AmountError::Empty) => {
                *error = None;
                None
            }
            Err(err) => {
                *error = Some(err.to_string());
                None
            }
        }
    }

    fn edit(&mut self, command: MainViewCommand) {
        if let Widget::Amount {
            buffer,
            dirty,
            error,
            ..
        } = self
        {
            match command {
                MainViewCommand::InputChar(c) if c.is_ascii_digit() || c == '.' => buffer.push(c),
                MainViewCommand::Backspace => {
                    buffer.pop();
                }
                _ => return,
            }
            *dirty = true;
            *error = None;
        }
    }

    fn cycle(&mut self, forward: bool) -> Option<Action> {
        let Widget::Dropdown {
            key,
            options,
            selected,
            ..
        } = self
        else {
            return None;
        };
        if options.is_empty() {
            return None;
        }
        let len = options.len();
        let next = match (*selected, forward) {
            (None, _) => 0,
            (Some(index), true) => (index + 1) % len,
            (Some(index), false) => (index + len - 1) % len,
        };
        *selected = Some(next);
        Some(Action::SetInput(*key, encode_uint(options[next].value)))
    }

    fn line(&self, focused: bool) -> Line<'static> {
        let (marker, style) = if focused {
            (
                "▸ ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            ("  ", Style::default())
        };
        let mut spans = vec![Span::styled(marker, style)];
        match self {
            Widget::Text { text } => spans.push(Span::raw(text.clone())),
            Widget::Amount {
                label,
                buffer,
                error,
                ..
            } => {
                spans.push(Span::styled(format!("{label}: "), style));
                if buffer.is_empty() && !focused {
                    spans.push(Span::styled("0", Style::default().fg(Color::DarkGray)));
                } else {
                    spans.push(Span::raw(buffer.clone()));
                }
                if focused {
                    spans.push(Span::styled("_", style));
                }
                if let Some(error) = error {
                    spans.push(Span::styled(
                        format!("  ✖ {error}"),
                        Style::default().fg(Color::Red),
                    ));
                }
            }
            Widget::Dropdown {
                label,
                options,
                selected,
                ..
            } => {
                spans.push(Span::styled(format!("{label}: "), style));
                let choice = selected
                    .and_then(|index| options.get(index))
                    .map(|option| option.text.clone())
                    .unwrap_or_else(|| "select".to_string());
                spans.push(Span::raw(format!("◂ {choice} ▸")));
            }
            Widget::Button { text, .. } => spans.push(Span::styled(
                format!("[ {text} ]"),
                style.add_modifier(Modifier::BOLD),
            )),
        }
        Line::from(spans)
    }
}

impl MainView {
    pub fn command_from_key(key: KeyEvent) -> Option<MainViewCommand> {
        match (key.modifiers, key.code) {
            (_, KeyCode::Up) => Some(MainViewCommand::Up),
            (_, KeyCode::Down) => Some(MainViewCommand::Down),
            (_, KeyCode::Left) => Some(MainViewCommand::Left),
            (_, KeyCode::Right) => Some(MainViewCommand::Right),
            (_, KeyCode::Enter) => Some(MainViewCommand::Enter),
            (_, KeyCode::Backspace) => Some(MainViewCommand::Backspace),
            (modifiers, KeyCode::Char(c)) if !modifiers.contains(KeyModifiers::CONTROL) => {
                Some(MainViewCommand::InputChar(c))
            }
            _ => None,
        }
    }

    /// Brings the widgets in line with `next`, keeping the prefix the diff
    /// retains. Focus falls back to the first input if its widget was rebuilt.
    /// Navigating drops uncommitted edits.
    pub fn apply_snapshot(&mut self, previous: &Snapshot, next: &Snapshot) {
        let patch = reconcile(&previous.tab.elements, &next.tab.elements);
        let navigated = previous.tab.entered_address != next.tab.entered_address;
        self.widgets.truncate(patch.retained);
        for widget in &mut self.widgets {
            if let Some(key) = widget.input_key() {
                let before = previous.tab.inputs.get(key);
                let after = next.tab.inputs.get(key);
                if navigated || before != after {
                    widget.show_value(after);
                }
            }
        }
        self.widgets.extend(
            next.tab.elements[patch.created.clone()]
                .iter()
                .map(|elem| Widget::new(elem, &next.tab.inputs)),
        );
        if self.focused.is_none_or(|index| index >= patch.retained) {
            let first = self.focusable().next();
            self.focused = first;
        }
    }

    fn focusable(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.widgets
            .iter()
            .enumerate()
            .filter(|(_, widget)| widget.is_focusable())
            .map(|(index, _)| index)
    }

    fn move_focus(&mut self, forward: bool) {
        let Some(current) = self.focused else {
            let first = self.focusable().next();
            self.focused = first;
            return;
        };
        let next = if forward {
            self.focusable().find(|&index| index > current)
        } else {
            self.focusable().rev().find(|&index| index < current)
        };
        if next.is_some() {
            self.focused = next;
        }
    }

    fn handle(&mut self, command: MainViewCommand) -> Option<Action> {
        let index = self.focused?;
        match command {
            MainViewCommand::Up | MainViewCommand::Down => {
                let action = self.widgets.get_mut(index)?.commit();
                self.move_focus(command == MainViewCommand::Down);
                action
            }
            MainViewCommand::Left | MainViewCommand::Right => self
                .widgets
                .get_mut(index)?
                .cycle(command == MainViewCommand::Right),
            MainViewCommand::Enter => {
                let widget = self.widgets.get_mut(index)?;
                if let Widget::Button { key, .. } = *widget {
                    return Some(Action::Submit(key));
                }
                if matches!(widget, Widget::Dropdown { selected: None, .. }) {
                    widget.cycle(true)
                } else {
                    widget.commit()
                }
            }
            MainViewCommand::InputChar(_) | MainViewCommand::Backspace => {
                self.widgets.get_mut(index)?.edit(command);
                None
            }
        }
    }
}

impl Component for MainView {
    type Command = MainViewCommand;

    fn init(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<()> {
        Ok(())
    }

    fn update(
        &mut self,
        command: &Self::Command,
        _ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        Ok(self.handle(*command))
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let is_focused = matches!(ctx.ui.focused_pane, FocusedPane::MainView);
        let tab = &ctx.snapshot.tab;

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from("Dapp").style(title_style(is_focused)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let placeholder = match tab.status() {
            TabStatus::Empty => Some("Enter a contract address to begin".to_string()),
            TabStatus::Resolving => Some(format!("Resolving {}…", tab.entered_address)),
            TabStatus::Resolved(_) | TabStatus::ResolutionFailed => None,
        };
        if let Some(text) = placeholder {
            let widget = Paragraph::new(text).style(Style::default().fg(Color::Gray));
            frame.render_widget(widget, inner);
            return;
        }

        if let Some(error) = &tab.load_error_text {
            let widget = Paragraph::new(error.as_str())
                .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .wrap(Wrap { trim: true });
            frame.render_widget(widget, inner);
            return;
        }

        let mut lines: Vec<Line> = self
            .widgets
            .iter()
            .enumerate()
            .map(|(index, widget)| widget.line(is_focused && self.focused == Some(index)))
            .collect();
        if let Some(error) = &tab.app_error_text {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        if let Some(pending) = &tab.pending_transaction {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Waiting for {}", short_hex(&pending.to_string())),
                Style::default().fg(Color::Yellow),
            )));
        }

        let visible = usize::from(inner.height.max(1));
        let offset = self
            .focused
            .unwrap_or(0)
            .saturating_sub(visible.saturating_sub(1));
        let widget = Paragraph::new(lines).scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0));
        frame.render_widget(widget, inner);
    }

    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{RawElement, decode_render, fixtures};
    use alloy::primitives::U256;

    fn snapshot(raw: &[RawElement]) -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.tab.elements = decode_render(raw).unwrap();
        snapshot.tab.inputs = Inputs::for_elements(&snapshot.tab.elements);
        snapshot
    }

    fn form() -> Snapshot {
        snapshot(&[
            fixtures::text(0, "Swap"),
            fixtures::amount(1, "Amount", 6),
            fixtures::dropdown(2, "Token", &[(10, "USDC"), (20, "DAI")]),
            fixtures::button(3, "Go"),
        ])
    }

    fn loaded(next: &Snapshot) -> MainView {
        let mut view = MainView::default();
        view.apply_snapshot(&Snapshot::default(), next);
        view
    }

    fn type_text(view: &mut MainView, text: &str) {
        for c in text.chars() {
            assert_eq!(view.handle(MainViewCommand::InputChar(c)), None);
        }
    }

    #[test]
    fn focus_starts_on_first_input() {
        let view = loaded(&form());
        assert_eq!(view.widgets.len(), 4);
        assert_eq!(view.focused, Some(1));
    }

    #[test]
    fn amount_commits_on_enter_and_focus_change() {
        let mut view = loaded(&form());

        type_text(&mut view, "1.5");
        assert_eq!(
            view.handle(MainViewCommand::Enter),
            Some(Action::SetInput(1, encode_uint(U256::from(1_500_000u64))))
        );
        assert!(matches!(&view.widgets[1], Widget::Amount { buffer, .. } if buffer == "1.500000"));
        assert_eq!(view.handle(MainViewCommand::Enter), None);

        view.handle(MainViewCommand::Backspace);
        assert_eq!(
            view.handle(MainViewCommand::Down),
            Some(Action::SetInput(1, encode_uint(U256::from(1_500_000u64))))
        );
        assert_eq!(view.focused, Some(2));
    }

    #[test]
    fn invalid_amount_is_flagged_not_sent() {
        let mut view = loaded(&form());
        type_text(&mut view, "1.2345678");

        assert_eq!(view.handle(MainViewCommand::Down), None);

        assert_eq!(view.focused, Some(2));
        assert!(matches!(&view.widgets[1], Widget::Amount { error: Some(_), .. }));
    }

    #[test]
    fn letters_are_not_typed_into_amounts() {
        let mut view = loaded(&form());
        type_text(&mut view, "1x");
        assert!(matches!(&view.widgets[1], Widget::Amount { buffer, .. } if buffer == "1"));
    }

    #[test]
    fn dropdown_cycles_and_sends_option_value() {
        let mut view = loaded(&form());
        view.handle(MainViewCommand::Down);

        assert_eq!(
            view.handle(MainViewCommand::Right),
            Some(Action::SetInput(2, encode_uint(U256::from(10u64))))
        );
        assert_eq!(
            view.handle(MainViewCommand::Right),
            Some(Action::SetInput(2, encode_uint(U256::from(20u64))))
        );
        assert_eq!(
            view.handle(MainViewCommand::Right),
            Some(Action::SetInput(2, encode_uint(U256::from(10u64))))
        );
        assert_eq!(
            view.handle(MainViewCommand::Left),
            Some(Action::SetInput(2, encode_uint(U256::from(20u64))))
        );
    }

    #[test]
    fn button_submits_its_key() {
        let mut view = loaded(&form());
        view.handle(MainViewCommand::Down);
        view.handle(MainViewCommand::Down);
        assert_eq!(view.handle(MainViewCommand::Down), None);
        assert_eq!(view.focused, Some(3));
        assert_eq!(view.handle(MainViewCommand::Enter), Some(Action::Submit(3)));
    }

    #[test]
    fn retained_widgets_keep_their_edits() {
        let previous = form();
        let mut view = loaded(&previous);
        type_text(&mut view, "42");
        assert!(view.handle(MainViewCommand::Down).is_some());
        view.handle(MainViewCommand::Down);
        assert_eq!(view.focused, Some(3));

        let next = snapshot(&[
            fixtures::text(0, "Swap"),
            fixtures::amount(1, "Amount", 6),
            fixtures::dropdown(2, "Token", &[(10, "USDC"), (20, "DAI")]),
            fixtures::button(3, "Confirm"),
        ]);
        view.apply_snapshot(&previous, &next);

        assert!(
            matches!(&view.widgets[1], Widget::Amount { buffer, .. } if buffer == "42.000000")
        );
        assert_eq!(view.widgets[3], Widget::Button { key: 3, text: "Confirm".into() });
        assert_eq!(view.focused, Some(1));
    }

    #[test]
    fn focus_inside_retained_prefix_survives() {
        let previous = form();
        let mut view = loaded(&previous);
        view.handle(MainViewCommand::Down);

        let mut next = form();
        next.tab.elements.truncate(3);
        view.apply_snapshot(&previous, &next);

        assert_eq!(view.widgets.len(), 3);
        assert_eq!(view.focused, Some(2));
    }

    #[test]
    fn cleared_inputs_reset_retained_widgets() {
        let mut previous = form();
        previous.tab.inputs.set(1, encode_uint(U256::from(2_000_000u64)));
        let mut view = loaded(&previous);
        assert!(matches!(&view.widgets[1], Widget::Amount { buffer, .. } if buffer == "2.000000"));

        view.apply_snapshot(&previous, &form());

        assert!(matches!(&view.widgets[1], Widget::Amount { buffer, .. } if buffer.is_empty()));
    }

    #[test]
    fn navigating_drops_uncommitted_edits() {
        let mut previous = form();
        previous.tab.entered_address = "one.eth".into();
        let mut view = loaded(&previous);
        type_text(&mut view, "7");

        let mut next = form();
        next.tab.entered_address = "two.eth".into();
        view.apply_snapshot(&previous, &next);

        assert!(matches!(
            &view.widgets[1],
            Widget::Amount { buffer, dirty: false, .. } if buffer.is_empty()
        ));
        assert_eq!(view.handle(MainViewCommand::Enter), None);
    }

    #[test]
    fn amount_uses_the_full_declared_scale() {
        let mut view = loaded(&snapshot(&[fixtures::amount(0, "Tiny", 80)]));
        type_text(&mut view, "0.001");
        assert_eq!(
            view.handle(MainViewCommand::Enter),
            Some(Action::SetInput(
                0,
                encode_uint(U256::from(10u64).pow(U256::from(77u64)))
            ))
        );

        type_text(&mut view, "0");
        assert_eq!(view.handle(MainViewCommand::Enter), None);
        assert!(matches!(&view.widgets[0], Widget::Amount { error: Some(_), .. }));
    }

    #[test]
    fn empty_render_has_no_focus() {
        let previous = form();
        let mut view = loaded(&previous);
        view.apply_snapshot(&previous, &Snapshot::default());
        assert!(view.widgets.is_empty());
        assert_eq!(view.focused, None);
        assert_eq!(view.handle(MainViewCommand::Enter), None);
    }
}
