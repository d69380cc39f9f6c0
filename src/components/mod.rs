use crate::app::{Action, AppContext, AppResult, AppView};
use ratatui::Frame;
use ratatui::layout::Rect;

/// Trait implemented by all UI components (panes, modals, etc.).
pub trait Component {
    /// Component-local input. Handling one may produce an [`Action`] for the dispatcher.
    type Command;

    /// Perform setup logic such as loading persisted state.
    fn init(&mut self, ctx: &mut AppContext<'_>) -> AppResult<()>;

    /// Handle a component-local command and optionally hand an action to the dispatcher.
    fn update(
        &mut self,
        command: &Self::Command,
        ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>>;

    /// Render the component into the provided [`Rect`] from the latest snapshot.
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>);

    /// Called once per frame before drawing.
    fn tick(&mut self, ctx: &mut AppContext<'_>) -> AppResult<Option<Action>>;
}
