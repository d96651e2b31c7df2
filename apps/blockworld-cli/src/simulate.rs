//! Headless viewer sessions driven by a YAML event script.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use blockworld_input::{
    CaptureState, CaptureTarget, PointerButton, PointerLockHost, WorldEditAction,
};
use blockworld_render::DebugTextRenderer;
use blockworld_viewer::{
    Frames, HostEvent, ManualTime, MoveKey, RenderLoop, ViewerConfig, ViewerContext,
};
use glam::Vec3;
use serde::Deserialize;

/// The target the scripted host pretends to own.
const SCRIPT_TARGET: CaptureTarget = CaptureTarget(1);

/// One scripted host event, or a run of frames.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Resize { width: u32, height: u32 },
    /// DOM-style button number: 1 left, 2 middle, 3 right.
    Click { which: u16 },
    /// A named capture event. `captured` is whether the host reports the
    /// viewer's element as the capture owner when it fires.
    Capture {
        event: String,
        #[serde(default)]
        captured: bool,
    },
    Motion { dx: f32, dy: f32 },
    Key { key: MoveKey, pressed: bool },
    Frames(u64),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Script {
    /// Whether the simulated host offers pointer capture at all.
    pub pointer_lock: bool,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            pointer_lock: true,
            steps: Vec::new(),
        }
    }
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("failed to parse script")
    }
}

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub trailing_frames: u64,
    pub frame_interval: Duration,
    pub print_frames: bool,
}

/// Host that records capture requests and leaves the answer to the script.
#[derive(Debug)]
struct ScriptedHost {
    pointer_lock: bool,
    requests: u64,
}

impl PointerLockHost for ScriptedHost {
    fn has_pointer_lock(&self) -> bool {
        self.pointer_lock
    }

    fn request_pointer_lock(&mut self, target: CaptureTarget) {
        self.requests += 1;
        tracing::debug!(target = target.0, "capture requested");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub frames: u64,
    pub capture_state: CaptureState,
    pub capture_requests: u64,
    pub position: Vec3,
    pub actions: Vec<WorldEditAction>,
    pub warnings: Vec<String>,
    pub last_frame: Option<String>,
}

/// Advance the clock and pull `count` frames, keeping the last output.
fn pull(
    frames: &mut Frames<'_, ManualTime, DebugTextRenderer>,
    time: &ManualTime,
    count: u64,
    options: &SimulateOptions,
    last_frame: &mut Option<String>,
) -> Result<()> {
    for _ in 0..count {
        time.advance(options.frame_interval);
        let report = frames
            .next()
            .context("render loop stopped")?
            .context("frame failed")?;
        if options.print_frames {
            println!("{}", report.output);
        }
        *last_frame = Some(report.output);
    }
    Ok(())
}

/// Run `script` against a fresh viewer rendering to text.
pub fn run(config: ViewerConfig, script: &Script, options: &SimulateOptions) -> Result<Summary> {
    let mut host = ScriptedHost {
        pointer_lock: script.pointer_lock,
        requests: 0,
    };
    let mut warnings: Vec<String> = Vec::new();
    let size = (config.window.width, config.window.height);
    let mut ctx = ViewerContext::bootstrap(
        config,
        DebugTextRenderer::default(),
        SCRIPT_TARGET,
        &host,
        &mut warnings,
        size,
    );

    let time = ManualTime::new();
    let mut render_loop = RenderLoop::new(time.clone());
    let mut frames = render_loop.frames(&mut ctx);
    let mut actions = Vec::new();
    let mut last_frame = None;

    for step in &script.steps {
        let event = match step {
            Step::Frames(count) => {
                pull(&mut frames, &time, *count, options, &mut last_frame)?;
                continue;
            }
            Step::Resize { width, height } => HostEvent::Resize {
                width: *width,
                height: *height,
            },
            Step::Click { which } => HostEvent::Click(PointerButton::from_which(*which)),
            Step::Capture { event, captured } => {
                let reported = captured.then_some(SCRIPT_TARGET);
                HostEvent::from_capture_event(event, reported)
                    .with_context(|| format!("unknown capture event `{event}`"))?
            }
            Step::Motion { dx, dy } => HostEvent::PointerMotion { dx: *dx, dy: *dy },
            Step::Key { key, pressed } => HostEvent::Key {
                key: *key,
                pressed: *pressed,
            },
        };
        tracing::debug!(?event, "script event");
        if let Some(action) = frames
            .context_mut()
            .handle_event(event, &mut host, &mut warnings)
        {
            actions.push(action);
        }
    }
    pull(&mut frames, &time, options.trailing_frames, options, &mut last_frame)?;
    drop(frames);

    Ok(Summary {
        frames: render_loop.frames_completed(),
        capture_state: ctx.capture().state(),
        capture_requests: host.requests,
        position: ctx.controls().position(),
        actions,
        warnings,
        last_frame,
    })
}
