use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use blockworld_render::{RenderError, Renderer};

use crate::clock::{FrameClock, TimeSource};
use crate::context::ViewerContext;

/// The host's "call me again next frame" primitive.
pub trait FrameScheduler {
    fn schedule_frame(&mut self);
}

/// Shared stop flag. Any clone can cancel; the loop notices on its next tick.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Cancelled,
    /// A frame failed. Terminal: later ticks neither render nor reschedule.
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    #[error("render loop already started")]
    AlreadyStarted,
    #[error("render loop has not been started")]
    NotStarted,
    #[error("render loop was cancelled")]
    Cancelled,
    #[error("render loop halted after a failed frame")]
    Halted,
    #[error("frame {frame} failed: {source}")]
    Frame {
        frame: u64,
        #[source]
        source: RenderError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    pub index: u64,
    /// Clock value stored at the end of the frame.
    pub timestamp: Duration,
    /// Time since the previous frame, as fed to the camera rig.
    pub delta: Duration,
}

#[derive(Debug, Clone)]
pub struct FrameReport<O> {
    pub tick: FrameTick,
    pub output: O,
}

/// Drives the frame cycle and owns the frame clock.
#[derive(Debug)]
pub struct RenderLoop<T: TimeSource> {
    time: T,
    clock: FrameClock,
    state: LoopState,
    frames: u64,
    cancel: CancellationToken,
}

impl<T: TimeSource> RenderLoop<T> {
    pub fn new(time: T) -> Self {
        Self::with_cancellation(time, CancellationToken::new())
    }

    pub fn with_cancellation(time: T, cancel: CancellationToken) -> Self {
        Self {
            time,
            clock: FrameClock::default(),
            state: LoopState::Idle,
            frames: 0,
            cancel,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn clock(&self) -> FrameClock {
        self.clock
    }

    /// Frames completed so far.
    pub fn frames_completed(&self) -> u64 {
        self.frames
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Enter the cycle and run the first frame. `Idle` only.
    pub fn start<R: Renderer>(
        &mut self,
        ctx: &mut ViewerContext<R>,
        scheduler: &mut dyn FrameScheduler,
    ) -> Result<FrameReport<R::Output>, LoopError> {
        if self.state != LoopState::Idle {
            return Err(LoopError::AlreadyStarted);
        }
        self.clock = FrameClock::new(self.time.now());
        self.state = LoopState::Running;
        tracing::info!("render loop started");
        self.tick(ctx, scheduler)
    }

    /// One frame: schedule the next, measure, update controls, render, stamp.
    pub fn tick<R: Renderer>(
        &mut self,
        ctx: &mut ViewerContext<R>,
        scheduler: &mut dyn FrameScheduler,
    ) -> Result<FrameReport<R::Output>, LoopError> {
        match self.state {
            LoopState::Running => {}
            LoopState::Idle => return Err(LoopError::NotStarted),
            LoopState::Cancelled => return Err(LoopError::Cancelled),
            LoopState::Failed => return Err(LoopError::Halted),
        }
        if self.cancel.is_cancelled() {
            self.state = LoopState::Cancelled;
            tracing::info!(frames = self.frames, "render loop cancelled");
            return Err(LoopError::Cancelled);
        }

        scheduler.schedule_frame();

        let delta = self.clock.delta(self.time.now());
        ctx.update_controls(delta);

        let output = match ctx.render() {
            Ok(output) => output,
            Err(source) => {
                self.state = LoopState::Failed;
                tracing::error!(
                    frame = self.frames,
                    error = %source,
                    "frame failed; render loop halted"
                );
                return Err(LoopError::Frame {
                    frame: self.frames,
                    source,
                });
            }
        };

        self.clock.record(self.time.now());
        let tick = FrameTick {
            index: self.frames,
            timestamp: self.clock.last(),
            delta,
        };
        self.frames += 1;
        tracing::trace!(frame = tick.index, delta_ms = delta.as_secs_f64() * 1000.0, "frame");
        Ok(FrameReport { tick, output })
    }

    /// Lazy, unbounded sequence of frames. Pulling the next item is the
    /// schedule request. Ends after cancellation or after yielding a failure.
    pub fn frames<'a, R: Renderer>(
        &'a mut self,
        ctx: &'a mut ViewerContext<R>,
    ) -> Frames<'a, T, R> {
        Frames {
            render_loop: self,
            ctx,
            done: false,
        }
    }
}

/// Iterator returned by [`RenderLoop::frames`].
pub struct Frames<'a, T: TimeSource, R: Renderer> {
    render_loop: &'a mut RenderLoop<T>,
    ctx: &'a mut ViewerContext<R>,
    done: bool,
}

struct PulledByIterator;

impl FrameScheduler for PulledByIterator {
    fn schedule_frame(&mut self) {}
}

impl<T: TimeSource, R: Renderer> Frames<'_, T, R> {
    /// The viewer context, for feeding host events between frames.
    pub fn context_mut(&mut self) -> &mut ViewerContext<R> {
        &mut *self.ctx
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.render_loop.cancellation_token()
    }
}

impl<T: TimeSource, R: Renderer> Iterator for Frames<'_, T, R> {
    type Item = Result<FrameReport<R::Output>, LoopError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = if self.render_loop.state() == LoopState::Idle {
            self.render_loop.start(self.ctx, &mut PulledByIterator)
        } else {
            self.render_loop.tick(self.ctx, &mut PulledByIterator)
        };
        match result {
            Ok(report) => Some(Ok(report)),
            Err(LoopError::Cancelled) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualTime;
    use crate::config::ViewerConfig;
    use blockworld_input::{CaptureTarget, PointerLockHost};
    use blockworld_render::{DebugTextRenderer, PerspectiveCamera};
    use blockworld_scene::SceneGraph;

    struct Host(bool);

    impl PointerLockHost for Host {
        fn has_pointer_lock(&self) -> bool {
            self.0
        }

        fn request_pointer_lock(&mut self, _target: CaptureTarget) {}
    }

    #[derive(Default)]
    struct CountingScheduler(u64);

    impl FrameScheduler for CountingScheduler {
        fn schedule_frame(&mut self) {
            self.0 += 1;
        }
    }

    /// Renders `ok_frames` frames, then fails.
    struct FlakyRenderer {
        ok_frames: u64,
        rendered: u64,
    }

    impl Renderer for FlakyRenderer {
        type Output = ();

        fn set_size(&mut self, _width: u32, _height: u32) {}

        fn size(&self) -> (u32, u32) {
            (1, 1)
        }

        fn render(&mut self, _: &SceneGraph, _: &PerspectiveCamera) -> Result<(), RenderError> {
            if self.rendered == self.ok_frames {
                return Err(RenderError::Backend("device lost".into()));
            }
            self.rendered += 1;
            Ok(())
        }
    }

    fn context<R: Renderer>(renderer: R, supported: bool) -> (ViewerContext<R>, Vec<String>) {
        let mut warnings: Vec<String> = Vec::new();
        let ctx = ViewerContext::bootstrap(
            ViewerConfig::default(),
            renderer,
            CaptureTarget(1),
            &Host(supported),
            &mut warnings,
            (640, 480),
        );
        (ctx, warnings)
    }

    #[test]
    fn tick_before_start_is_rejected() {
        let (mut ctx, _) = context(DebugTextRenderer::default(), true);
        let mut rl = RenderLoop::new(ManualTime::new());
        let mut sched = CountingScheduler::default();
        assert!(matches!(rl.tick(&mut ctx, &mut sched), Err(LoopError::NotStarted)));
        assert_eq!(sched.0, 0);
    }

    #[test]
    fn start_twice_is_rejected() {
        let (mut ctx, _) = context(DebugTextRenderer::default(), true);
        let mut rl = RenderLoop::new(ManualTime::new());
        let mut sched = CountingScheduler::default();
        rl.start(&mut ctx, &mut sched).unwrap();
        assert!(matches!(rl.start(&mut ctx, &mut sched), Err(LoopError::AlreadyStarted)));
    }

    #[test]
    fn every_tick_schedules_the_next() {
        let (mut ctx, _) = context(DebugTextRenderer::default(), true);
        let time = ManualTime::new();
        let mut rl = RenderLoop::new(time.clone());
        let mut sched = CountingScheduler::default();

        rl.start(&mut ctx, &mut sched).unwrap();
        for _ in 0..4 {
            time.advance(Duration::from_millis(16));
            rl.tick(&mut ctx, &mut sched).unwrap();
        }
        assert_eq!(sched.0, 5);
        assert_eq!(rl.frames_completed(), 5);
        assert_eq!(ctx.renderer().frames_rendered(), 5);
    }

    #[test]
    fn deltas_are_non_negative_and_timestamps_monotonic() {
        let (mut ctx, _) = context(DebugTextRenderer::default(), true);
        let time = ManualTime::new();
        time.set(Duration::from_millis(1_000));
        let mut rl = RenderLoop::new(time.clone());
        let mut sched = CountingScheduler::default();

        let first = rl.start(&mut ctx, &mut sched).unwrap().tick;
        assert_eq!(first.delta, Duration::ZERO);

        let mut last = first.timestamp;
        // Includes a tie and a host clock that steps backwards.
        for step_ms in [16_i64, 0, 33, -50, 8, 100] {
            let now = time.now();
            if step_ms >= 0 {
                time.set(now + Duration::from_millis(step_ms as u64));
            } else {
                time.set(now - Duration::from_millis((-step_ms) as u64));
            }
            let expected = time.now().saturating_sub(last);
            let tick = rl.tick(&mut ctx, &mut sched).unwrap().tick;
            assert!(tick.timestamp >= last);
            assert_eq!(tick.delta, expected);
            last = tick.timestamp;
        }
    }

    #[test]
    fn failed_frame_halts_the_loop() {
        let (mut ctx, _) = context(
            FlakyRenderer {
                ok_frames: 2,
                rendered: 0,
            },
            true,
        );
        let mut rl = RenderLoop::new(ManualTime::new());
        let mut sched = CountingScheduler::default();

        rl.start(&mut ctx, &mut sched).unwrap();
        rl.tick(&mut ctx, &mut sched).unwrap();
        assert!(matches!(
            rl.tick(&mut ctx, &mut sched),
            Err(LoopError::Frame { frame: 2, .. })
        ));
        assert_eq!(rl.state(), LoopState::Failed);

        let scheduled = sched.0;
        assert!(matches!(rl.tick(&mut ctx, &mut sched), Err(LoopError::Halted)));
        assert_eq!(sched.0, scheduled);
    }

    #[test]
    fn cancellation_stops_scheduling() {
        let (mut ctx, _) = context(DebugTextRenderer::default(), true);
        let mut rl = RenderLoop::new(ManualTime::new());
        let token = rl.cancellation_token();
        let mut sched = CountingScheduler::default();

        rl.start(&mut ctx, &mut sched).unwrap();
        token.cancel();
        assert!(matches!(rl.tick(&mut ctx, &mut sched), Err(LoopError::Cancelled)));
        assert_eq!(rl.state(), LoopState::Cancelled);
        assert_eq!(sched.0, 1);
    }

    #[test]
    fn frames_iterator_is_lazy_and_cancellable() {
        let (mut ctx, _) = context(DebugTextRenderer::default(), true);
        let time = ManualTime::new();
        let mut rl = RenderLoop::new(time.clone());

        let mut frames = rl.frames(&mut ctx);
        let token = frames.cancellation_token();
        let mut seen = 0;
        while let Some(frame) = frames.next() {
            let frame = frame.unwrap();
            assert_eq!(frame.tick.index, seen);
            seen += 1;
            time.advance(Duration::from_millis(16));
            if seen == 10 {
                token.cancel();
            }
        }
        assert_eq!(seen, 10);
        assert!(frames.next().is_none());
        assert_eq!(rl.state(), LoopState::Cancelled);
    }

    #[test]
    fn frames_iterator_yields_failure_then_ends() {
        let (mut ctx, _) = context(
            FlakyRenderer {
                ok_frames: 3,
                rendered: 0,
            },
            true,
        );
        let mut rl = RenderLoop::new(ManualTime::new());
        let results: Vec<_> = rl.frames(&mut ctx).take(100).collect();
        assert_eq!(results.len(), 4);
        assert!(results[..3].iter().all(Result::is_ok));
        assert!(matches!(results[3], Err(LoopError::Frame { frame: 3, .. })));
    }

    #[test]
    fn renders_without_pointer_capture() {
        let (mut ctx, warnings) = context(DebugTextRenderer::default(), false);
        assert_eq!(warnings.len(), 1);
        let mut rl = RenderLoop::new(ManualTime::new());
        let produced = rl.frames(&mut ctx).take(3).filter(Result::is_ok).count();
        assert_eq!(produced, 3);
    }
}
