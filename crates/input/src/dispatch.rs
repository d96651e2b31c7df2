use crate::action::{NoopWorldEdit, WorldEditAction, WorldEditHandler};
use crate::capture::CaptureState;

/// Raw pointer button as the host reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
    Other(u16),
}

impl PointerButton {
    /// Decode the DOM `which` numbering: 1 left, 2 middle, 3 right.
    pub fn from_which(which: u16) -> Self {
        match which {
            1 => Self::Left,
            2 => Self::Middle,
            3 => Self::Right,
            n => Self::Other(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionEvent {
    pub button: InteractionButton,
}

impl InteractionEvent {
    /// Only the left and right buttons are interactions.
    pub fn classify(raw: PointerButton) -> Option<Self> {
        let button = match raw {
            PointerButton::Left => InteractionButton::Primary,
            PointerButton::Right => InteractionButton::Secondary,
            PointerButton::Middle | PointerButton::Other(_) => return None,
        };
        Some(Self { button })
    }
}

/// Routes interaction events to build/destroy while the pointer is captured.
pub struct InteractionDispatcher {
    handler: Box<dyn WorldEditHandler>,
    dispatched: u64,
}

impl Default for InteractionDispatcher {
    fn default() -> Self {
        Self::new(Box::new(NoopWorldEdit))
    }
}

impl std::fmt::Debug for InteractionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionDispatcher")
            .field("dispatched", &self.dispatched)
            .finish_non_exhaustive()
    }
}

impl InteractionDispatcher {
    pub fn new(handler: Box<dyn WorldEditHandler>) -> Self {
        Self {
            handler,
            dispatched: 0,
        }
    }

    /// Number of actions handed to the handler so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Dispatch `event` if and only if `state` is `Captured`.
    pub fn on_interact(
        &mut self,
        event: InteractionEvent,
        state: CaptureState,
    ) -> Option<WorldEditAction> {
        if state != CaptureState::Captured {
            tracing::trace!(?event, ?state, "interaction ignored while not captured");
            return None;
        }
        let action = WorldEditAction::for_button(event.button);
        self.handler.apply(action);
        self.dispatched += 1;
        tracing::debug!(?action, "world edit dispatched");
        Some(action)
    }

    /// Classify a raw button, then dispatch.
    pub fn on_pointer_button(
        &mut self,
        raw: PointerButton,
        state: CaptureState,
    ) -> Option<WorldEditAction> {
        let event = InteractionEvent::classify(raw)?;
        self.on_interact(event, state)
    }
}
