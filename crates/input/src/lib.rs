//! Input Capture: exclusive pointer capture lifecycle and interaction routing.
//!
//! # Invariants
//! - Only one capture request may be outstanding at a time: at most one request
//!   is issued between two consecutive transitions into `Captured`.
//! - Camera control is enabled exactly when the host reports the designated
//!   target as captured.
//! - World-edit actions are only dispatched while captured.

pub mod action;
pub mod capture;
pub mod dispatch;

pub use action::{NoopWorldEdit, WorldEditAction, WorldEditHandler};
pub use capture::{
    CaptureChange, CaptureError, CaptureErrorPolicy, CaptureSignal, CaptureState, CaptureTarget,
    ClickListener, ClickOutcome, ControlGate, InputCaptureController, PointerLockHost,
    WarningSink, NO_POINTER_LOCK_WARNING,
};
pub use dispatch::{InteractionButton, InteractionDispatcher, InteractionEvent, PointerButton};
