//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene graph and camera; they never mutate either.
//! - The drawing surface size is only changed through [`Renderer::set_size`].

mod camera;
mod renderer;

pub use camera::PerspectiveCamera;
pub use renderer::{DebugTextRenderer, RenderError, Renderer};
