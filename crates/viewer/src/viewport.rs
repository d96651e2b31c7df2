use blockworld_render::{PerspectiveCamera, Renderer};

/// Drawing surface dimensions in physical pixels. Both are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
}

impl ViewportState {
    /// Hosts report 0 while minimised; clamp so the aspect stays finite.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Sole writer of the viewport state and the camera's aspect ratio.
#[derive(Debug, Clone)]
pub struct ViewportManager {
    state: ViewportState,
}

impl ViewportManager {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: ViewportState::new(width, height),
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    /// Apply a host resize to the viewport, camera and drawing surface.
    /// Returns whether the dimensions changed.
    pub fn on_resize<R: Renderer>(
        &mut self,
        width: u32,
        height: u32,
        camera: &mut PerspectiveCamera,
        surface: &mut R,
    ) -> bool {
        let next = ViewportState::new(width, height);
        let changed = next != self.state;
        self.state = next;
        camera.aspect = next.aspect();
        if changed || surface.size() != (next.width, next.height) {
            surface.set_size(next.width, next.height);
        }
        if changed {
            tracing::debug!(
                width = next.width,
                height = next.height,
                aspect = camera.aspect,
                "viewport resized"
            );
        }
        changed
    }
}
