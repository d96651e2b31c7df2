use anyhow::{Context as _, Result};
use blockworld_input::{
    CaptureChange, CaptureTarget, PointerButton, PointerLockHost, WarningSink, WorldEditAction,
    WorldEditHandler,
};
use blockworld_render_wgpu::{GpuFrame, WgpuRenderer};
use blockworld_viewer::{
    FrameScheduler, HostEvent, LoopError, LoopState, MonotonicTime, MoveKey, RenderLoop,
    ViewerConfig, ViewerContext,
};
use clap::Parser;
use egui::Context as EguiContext;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "blockworld-desktop", about = "Blockworld first-person viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML viewer config; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Pointer capture through winit cursor grabbing. The outcome of each grab is
/// queued as a capture event, the same shape a document would deliver.
struct WinitHost {
    window: Arc<Window>,
    pending: VecDeque<HostEvent>,
    grabbed: bool,
}

impl WinitHost {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            pending: VecDeque::new(),
            grabbed: false,
        }
    }

    /// Give the cursor back, e.g. on Escape or focus loss.
    fn release(&mut self) {
        if !self.grabbed {
            return;
        }
        if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            tracing::debug!(error = %e, "cursor ungrab failed");
        }
        self.window.set_cursor_visible(true);
        self.grabbed = false;
        self.pending
            .push_back(HostEvent::CaptureChange(CaptureChange { reported: None }));
    }
}

impl PointerLockHost for WinitHost {
    fn has_pointer_lock(&self) -> bool {
        true
    }

    fn request_pointer_lock(&mut self, target: CaptureTarget) {
        // Not every platform can lock; confining is the closest fallback.
        let grab = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        match grab {
            Ok(()) => {
                self.window.set_cursor_visible(false);
                self.grabbed = true;
                self.pending.push_back(HostEvent::CaptureChange(CaptureChange {
                    reported: Some(target),
                }));
            }
            Err(e) => {
                tracing::debug!(error = %e, "cursor grab refused");
                // The refusal answers the request; the cursor was never grabbed.
                self.pending.push_back(HostEvent::CaptureError);
                self.pending
                    .push_back(HostEvent::CaptureChange(CaptureChange { reported: None }));
            }
        }
    }
}

/// Warnings shown in the overlay.
#[derive(Default)]
struct Notices(Vec<String>);

impl WarningSink for Notices {
    fn warn(&mut self, message: &str) {
        tracing::warn!("{message}");
        self.0.push(message.to_string());
    }
}

struct LogWorldEdit;

impl WorldEditHandler for LogWorldEdit {
    fn apply(&mut self, action: WorldEditAction) {
        tracing::info!(?action, "world edit");
    }
}

struct RedrawScheduler<'a>(&'a Window);

impl FrameScheduler for RedrawScheduler<'_> {
    fn schedule_frame(&mut self) {
        self.0.request_redraw();
    }
}

fn move_key(code: KeyCode) -> Option<MoveKey> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(MoveKey::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(MoveKey::Backward),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(MoveKey::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(MoveKey::Right),
        KeyCode::Space => Some(MoveKey::Up),
        KeyCode::ControlLeft => Some(MoveKey::Down),
        _ => None,
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Left,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Right => PointerButton::Right,
        MouseButton::Back => PointerButton::Other(4),
        MouseButton::Forward => PointerButton::Other(5),
        MouseButton::Other(n) => PointerButton::Other(n),
    }
}

/// Everything that only exists once the window does.
struct Session {
    window: Arc<Window>,
    host: WinitHost,
    viewer: ViewerContext<WgpuRenderer>,
    render_loop: RenderLoop<MonotonicTime>,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct DesktopApp {
    config: ViewerConfig,
    session: Option<Session>,
    notices: Notices,
    egui_ctx: EguiContext,
    failure: Option<anyhow::Error>,
}

impl DesktopApp {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            session: None,
            notices: Notices::default(),
            egui_ctx: EguiContext::default(),
            failure: None,
        }
    }

    fn open_session(&mut self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);
        let size = window.inner_size();

        let renderer = WgpuRenderer::new(window.clone(), size.width, size.height)
            .context("initialize renderer")?;
        let egui_renderer = egui_wgpu::Renderer::new(
            renderer.device(),
            renderer.surface_format(),
            None,
            1,
            false,
        );
        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let host = WinitHost::new(window.clone());
        let mut viewer = ViewerContext::bootstrap(
            self.config.clone(),
            renderer,
            CaptureTarget(u64::from(window.id())),
            &host,
            &mut self.notices,
            (size.width, size.height),
        );
        viewer.set_world_edit_handler(Box::new(LogWorldEdit));

        Ok(Session {
            window,
            host,
            viewer,
            render_loop: RenderLoop::new(MonotonicTime::new()),
            egui_winit,
            egui_renderer,
        })
    }

    fn feed(&mut self, event: HostEvent) {
        let Some(session) = &mut self.session else {
            return;
        };
        session
            .viewer
            .handle_event(event, &mut session.host, &mut self.notices);
        // Grab outcomes queued by the host during the event above.
        self.feed_pending();
    }

    fn feed_pending(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        while let Some(queued) = session.host.pending.pop_front() {
            session
                .viewer
                .handle_event(queued, &mut session.host, &mut self.notices);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = &mut self.session else {
            return;
        };
        let mut scheduler = RedrawScheduler(&session.window);
        let result = if session.render_loop.state() == LoopState::Idle {
            session.render_loop.start(&mut session.viewer, &mut scheduler)
        } else {
            session.render_loop.tick(&mut session.viewer, &mut scheduler)
        };

        match result {
            Ok(report) => {
                draw_overlay(session, &self.egui_ctx, &self.notices, &report.output);
                report.output.present();
            }
            Err(LoopError::Frame { frame, source }) => {
                self.failure = Some(anyhow::anyhow!("frame {frame} failed: {source}"));
                event_loop.exit();
            }
            Err(LoopError::Cancelled) => event_loop.exit(),
            Err(e) => tracing::debug!(error = %e, "redraw skipped"),
        }
    }
}

fn draw_overlay(
    session: &mut Session,
    egui_ctx: &EguiContext,
    notices: &Notices,
    frame: &GpuFrame,
) {
    let captured = session.viewer.capture().is_captured();
    let raw_input = session.egui_winit.take_egui_input(&session.window);
    let full_output = egui_ctx.run(raw_input, |ctx| {
        egui::Area::new(egui::Id::new("hud"))
            .anchor(egui::Align2::LEFT_TOP, [12.0, 12.0])
            .interactable(false)
            .show(ctx, |ui| {
                if captured {
                    let p = session.viewer.controls().position();
                    ui.small(format!("({:.1}, {:.1}, {:.1})", p.x, p.y, p.z));
                } else {
                    ui.label("Click to look around");
                    ui.small("WASD: Move | Space/Ctrl: Up/Down | Esc: Release");
                }
                for notice in &notices.0 {
                    ui.colored_label(egui::Color32::YELLOW, notice);
                }
            });
    });

    session
        .egui_winit
        .handle_platform_output(&session.window, full_output.platform_output);

    let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
    let (width, height) = blockworld_render::Renderer::size(session.viewer.renderer());
    let screen_descriptor = egui_wgpu::ScreenDescriptor {
        size_in_pixels: [width, height],
        pixels_per_point: full_output.pixels_per_point,
    };

    let device = session.viewer.renderer().device();
    let queue = session.viewer.renderer().queue();
    let egui_renderer = &mut session.egui_renderer;
    for (id, image_delta) in &full_output.textures_delta.set {
        egui_renderer.update_texture(device, queue, *id, image_delta);
    }
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("egui_encoder"),
    });
    egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
    {
        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: frame.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            })
            .forget_lifetime();
        egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
    }
    queue.submit(std::iter::once(encoder.finish()));
    for id in &full_output.textures_delta.free {
        egui_renderer.free_texture(id);
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }
        match self.open_session(event_loop) {
            Ok(session) => {
                session.window.request_redraw();
                self.session = Some(session);
            }
            Err(e) => {
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(session) = &mut self.session else {
            return;
        };
        if !session.viewer.capture().is_captured() {
            let response = session.egui_winit.on_window_event(&session.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                session.render_loop.cancellation_token().cancel();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => self.feed(HostEvent::Resize {
                width: new_size.width,
                height: new_size.height,
            }),
            WindowEvent::Focused(false) => {
                session.host.release();
                self.feed_pending();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if code == KeyCode::Escape && pressed {
                    session.host.release();
                    self.feed_pending();
                } else if let Some(key) = move_key(code) {
                    self.feed(HostEvent::Key { key, pressed });
                }
            }
            WindowEvent::MouseInput {
                button,
                state: ElementState::Pressed,
                ..
            } => self.feed(HostEvent::Click(pointer_button(button))),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.feed(HostEvent::PointerMotion {
                dx: delta.0 as f32,
                dy: delta.1 as f32,
            });
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };

    tracing::info!("blockworld-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = DesktopApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
