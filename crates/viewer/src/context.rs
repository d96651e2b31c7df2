use std::time::Duration;

use blockworld_common::NodeId;
use blockworld_input::{
    CaptureTarget, ClickOutcome, InputCaptureController, InteractionDispatcher, PointerLockHost,
    WarningSink, WorldEditAction, WorldEditHandler,
};
use blockworld_render::{PerspectiveCamera, RenderError, Renderer};
use blockworld_scene::{populate_default_scene, DefaultScene, SceneGraph, SceneNode};

use crate::config::ViewerConfig;
use crate::controls::{CameraRig, PointerLockControls};
use crate::event::HostEvent;
use crate::viewport::{ViewportManager, ViewportState};

/// Everything the viewer mutates, owned in one place and handed to the
/// render loop and event handlers by reference.
pub struct ViewerContext<R: Renderer> {
    config: ViewerConfig,
    renderer: R,
    scene: SceneGraph,
    camera: PerspectiveCamera,
    controls: PointerLockControls,
    viewport: ViewportManager,
    capture: InputCaptureController,
    dispatcher: InteractionDispatcher,
    default_scene: DefaultScene,
    rig_node: NodeId,
}

impl<R: Renderer> ViewerContext<R> {
    /// One-time construction: size the surface, build the starting scene and
    /// camera, attach the rig, then detect pointer capture and arm listeners.
    pub fn bootstrap(
        config: ViewerConfig,
        mut renderer: R,
        target: CaptureTarget,
        host: &dyn PointerLockHost,
        warnings: &mut dyn WarningSink,
        initial_size: (u32, u32),
    ) -> Self {
        let viewport = ViewportManager::new(initial_size.0, initial_size.1);
        let size = viewport.state();
        renderer.set_size(size.width, size.height);

        let mut scene = SceneGraph::new();
        let default_scene = populate_default_scene(&mut scene, &config.scene);

        let mut camera = PerspectiveCamera::new(
            config.camera.fov_degrees,
            size.aspect(),
            config.camera.near,
            config.camera.far,
        );
        let controls = PointerLockControls::new(&config.camera, &config.controls);
        controls.sync_camera(&mut camera);
        let rig_node = scene.add(SceneNode::rig_anchor(controls.anchor_transform()));

        let mut capture = InputCaptureController::new(target, config.capture_errors);
        let capture_available = capture.install(host, warnings);

        tracing::info!(
            width = size.width,
            height = size.height,
            nodes = scene.len(),
            capture_available,
            "viewer bootstrapped"
        );

        Self {
            config,
            renderer,
            scene,
            camera,
            controls,
            viewport,
            capture,
            dispatcher: InteractionDispatcher::default(),
            default_scene,
            rig_node,
        }
    }

    /// Replace the build/destroy handler.
    pub fn set_world_edit_handler(&mut self, handler: Box<dyn WorldEditHandler>) {
        self.dispatcher = InteractionDispatcher::new(handler);
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn default_scene(&self) -> DefaultScene {
        self.default_scene
    }

    pub fn rig_node(&self) -> NodeId {
        self.rig_node
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &PointerLockControls {
        &self.controls
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport.state()
    }

    pub fn capture(&self) -> &InputCaptureController {
        &self.capture
    }

    pub fn dispatcher(&self) -> &InteractionDispatcher {
        &self.dispatcher
    }

    /// Route one host event. Returns the world-edit action it produced, if any.
    pub fn handle_event(
        &mut self,
        event: HostEvent,
        host: &mut dyn PointerLockHost,
        warnings: &mut dyn WarningSink,
    ) -> Option<WorldEditAction> {
        match event {
            HostEvent::Resize { width, height } => {
                self.viewport
                    .on_resize(width, height, &mut self.camera, &mut self.renderer);
                None
            }
            HostEvent::CaptureChange(change) => {
                self.capture.on_capture_change(change, &mut self.controls);
                None
            }
            HostEvent::CaptureError => {
                if self.capture.is_installed() {
                    self.capture.on_capture_error(warnings);
                }
                None
            }
            HostEvent::Click(button) => match self.capture.on_click(button, host) {
                ClickOutcome::Interact(button) => self
                    .dispatcher
                    .on_pointer_button(button, self.capture.state()),
                ClickOutcome::CaptureRequested | ClickOutcome::Ignored => None,
            },
            HostEvent::PointerMotion { dx, dy } => {
                self.controls.on_pointer_motion(dx, dy);
                None
            }
            HostEvent::Key { key, pressed } => {
                self.controls.set_key(key, pressed);
                None
            }
        }
    }

    /// Advance the camera rig and move its scene anchor to match.
    pub fn update_controls(&mut self, delta: Duration) {
        CameraRig::update(&mut self.controls, delta, &mut self.camera);
        self.scene
            .set_transform(self.rig_node, self.controls.anchor_transform());
    }

    /// Draw the scene through the current camera.
    pub fn render(&mut self) -> Result<R::Output, RenderError> {
        self.renderer.render(&self.scene, &self.camera)
    }
}
