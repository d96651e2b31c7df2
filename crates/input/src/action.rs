use crate::dispatch::InteractionButton;

/// A world-editing action produced by pointer interaction while captured.
///
/// Consumers implement [`WorldEditHandler`]; the dispatcher never mutates the
/// world itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorldEditAction {
    /// Place a block.
    Build,
    /// Remove a block.
    Destroy,
}

impl WorldEditAction {
    pub fn for_button(button: InteractionButton) -> Self {
        match button {
            InteractionButton::Primary => Self::Build,
            InteractionButton::Secondary => Self::Destroy,
        }
    }
}

/// Extension point for whatever building and destroying eventually means.
pub trait WorldEditHandler {
    fn apply(&mut self, action: WorldEditAction);
}

/// Handler that accepts every action and does nothing with it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWorldEdit;

impl WorldEditHandler for NoopWorldEdit {
    fn apply(&mut self, action: WorldEditAction) {
        tracing::trace!(?action, "world edit ignored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_builds_secondary_destroys() {
        assert_eq!(
            WorldEditAction::for_button(InteractionButton::Primary),
            WorldEditAction::Build
        );
        assert_eq!(
            WorldEditAction::for_button(InteractionButton::Secondary),
            WorldEditAction::Destroy
        );
    }

    #[test]
    fn noop_handler_accepts_everything() {
        let mut h = NoopWorldEdit;
        h.apply(WorldEditAction::Build);
        h.apply(WorldEditAction::Destroy);
    }
}
