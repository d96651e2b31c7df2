//! Viewer Core: the frame cycle and the state it drives.
//!
//! # Invariants
//! - Within a tick: clock read, control update, render, clock write, in that order.
//! - Camera aspect always equals the last resized viewport's `width / height`.
//! - All mutable viewer state lives in an owned [`ViewerContext`]; nothing is global.

pub mod clock;
pub mod config;
pub mod context;
pub mod controls;
pub mod event;
pub mod render_loop;
pub mod viewport;

pub use clock::{FrameClock, ManualTime, MonotonicTime, TimeSource};
pub use config::{CameraConfig, ConfigError, ControlsConfig, ViewerConfig, WindowConfig};
pub use context::ViewerContext;
pub use controls::{CameraRig, MoveKey, PointerLockControls};
pub use event::HostEvent;
pub use render_loop::{
    CancellationToken, FrameReport, FrameScheduler, FrameTick, Frames, LoopError, LoopState,
    RenderLoop,
};
pub use viewport::{ViewportManager, ViewportState};
