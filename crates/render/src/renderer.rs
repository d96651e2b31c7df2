use std::fmt::Write as _;

use blockworld_scene::{Geometry, NodeKind, SceneGraph};

use crate::camera::PerspectiveCamera;

/// Errors a renderer can raise while drawing a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("drawing surface lost; it must be reconfigured")]
    SurfaceLost,
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("render backend failure: {0}")]
    Backend(String),
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer owns its drawing surface. It reads the scene graph and camera,
/// then produces output; it never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Resize the drawing surface, in physical pixels.
    fn set_size(&mut self, width: u32, height: u32);

    /// Current drawing surface size.
    fn size(&self) -> (u32, u32);

    /// Render one frame of `scene` as seen through `camera`.
    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<Self::Output, RenderError>;
}

/// Renders a frame as a human-readable description.
///
/// Used by the headless CLI, in logs, and to test the render interface.
#[derive(Debug)]
pub struct DebugTextRenderer {
    width: u32,
    height: u32,
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: 0,
        }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<String, RenderError> {
        self.frames += 1;
        let mut out = String::new();
        let p = camera.position;
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}) ===",
            self.frames, self.width, self.height
        );
        let _ = writeln!(out, "Nodes: {}", scene.len());
        let _ = writeln!(
            out,
            "Camera: pos=({:.1}, {:.1}, {:.1}) yaw={:.1} pitch={:.1} fov={:.0} aspect={:.3}",
            p.x,
            p.y,
            p.z,
            camera.yaw.to_degrees(),
            camera.pitch.to_degrees(),
            camera.fov_degrees,
            camera.aspect
        );

        for (id, node) in scene.nodes() {
            let t = node.transform.position;
            let what = match &node.kind {
                NodeKind::Mesh {
                    geometry: Geometry::Cuboid { .. },
                    material,
                } => format!("cuboid #{:06X}", material.color().0),
                NodeKind::Mesh {
                    geometry: Geometry::Plane { .. },
                    material,
                } => format!("plane #{:06X}", material.color().0),
                NodeKind::AmbientLight { color } => format!("ambient #{:06X}", color.0),
                NodeKind::RigAnchor => "rig".to_string(),
            };
            let _ = writeln!(
                out,
                "  [{}] {what} pos=({:.2}, {:.2}, {:.2})",
                id.short(),
                t.x,
                t.y,
                t.z
            );
        }

        tracing::trace!(frame = self.frames, nodes = scene.len(), "text frame rendered");
        Ok(out)
    }
}
