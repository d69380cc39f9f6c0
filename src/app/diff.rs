use crate::protocol::VElem;
use std::ops::Range;

/// Edit that turns the previously rendered element list into the new one.
///
/// Prefix match, suffix replace: the leading run of unchanged elements is
/// kept and everything after the first difference is rebuilt, even if later
/// elements happen to match again. Widgets in the rebuilt suffix lose focus
/// and cursor state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    /// Leading elements that stay as they are.
    pub retained: usize,
    /// Old widgets to drop from the end, starting at `retained`.
    pub removed: usize,
    /// Indices into the new list to create, in order.
    pub created: Range<usize>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.removed == 0 && self.created.is_empty()
    }
}

pub fn reconcile(previous: &[VElem], next: &[VElem]) -> Patch {
    let retained = previous
        .iter()
        .zip(next)
        .take_while(|(old, new)| old.renders_same(new))
        .count();
    Patch {
        retained,
        removed: previous.len() - retained,
        created: retained..next.len(),
    }
}
