//! wgpu render backend for the viewer.
//!
//! Owns the drawing surface. Draws every cuboid and plane mesh in the scene
//! graph as instanced geometry, shaded by the scene's ambient light.
//!
//! # Invariants
//! - Renderer never mutates the scene graph.
//! - The surface is configured only through `Renderer::set_size`.

mod gpu;
mod shaders;

pub use gpu::{GpuFrame, WgpuRenderer};
