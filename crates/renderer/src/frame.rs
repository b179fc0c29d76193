//! Render loop state machine: one call per displayed frame.

use std::time::Instant;

use corelib::{ViewerConfig, ViewerError, ViewerResult, camera::Camera, transform::FrameTransforms};

use crate::{backend::GpuBackend, resources::ResourceManager};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Running,
    Stopped,
}

/// Exit requests gathered from window events since the last check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExitSignals {
    pub escape_pressed: bool,
    pub close_requested: bool,
}

impl ExitSignals {
    #[inline]
    pub fn should_exit(&self) -> bool {
        self.escape_pressed || self.close_requested
    }
}

/// Drives frames at whatever cadence presentation allows (vsync); there is
/// no separate frame cap.
pub struct FrameScheduler {
    state: LoopState,
    camera: Camera,
    first_frame: Option<Instant>,
    frames: u64,
}

impl FrameScheduler {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            state: LoopState::Uninitialized,
            camera: Camera::viewer(config.aspect()),
            first_frame: None,
            frames: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Frames actually drawn and presented.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Enter `Running`. Only allowed once every resource is in place.
    pub fn start<B: GpuBackend>(&mut self, resources: &ResourceManager<B>) -> ViewerResult<()> {
        if self.state != LoopState::Uninitialized {
            return Err(ViewerError::Context(format!(
                "render loop cannot start from {:?}",
                self.state
            )));
        }
        if !resources.is_ready() {
            return Err(ViewerError::Context(
                "render loop started before GPU resources were ready".into(),
            ));
        }
        self.state = LoopState::Running;
        log::info!("Render loop running ({} slot(s))", resources.slot_count());
        Ok(())
    }

    /// Seconds since the first frame; the first call defines t = 0.
    pub fn elapsed_at(&mut self, now: Instant) -> f32 {
        let start = *self.first_frame.get_or_insert(now);
        now.saturating_duration_since(start).as_secs_f32()
    }

    /// Draw one frame at wall-clock `now`.
    pub fn render<B: GpuBackend>(
        &mut self,
        resources: &mut ResourceManager<B>,
        now: Instant,
    ) -> ViewerResult<()> {
        let elapsed = self.elapsed_at(now);
        self.render_at(resources, elapsed)
    }

    /// Draw one frame with transforms for `elapsed` seconds. No-op unless
    /// the loop is running.
    pub fn render_at<B: GpuBackend>(
        &mut self,
        resources: &mut ResourceManager<B>,
        elapsed: f32,
    ) -> ViewerResult<()> {
        if self.state != LoopState::Running {
            return Ok(());
        }
        let mvp = FrameTransforms::at(elapsed, &self.camera).mvp();
        if resources.draw_frame(mvp)? {
            self.frames += 1;
            log::trace!("frame {} at t={:.3}s", self.frames, elapsed);
        } else {
            log::debug!("frame skipped at t={:.3}s", elapsed);
        }
        Ok(())
    }

    /// Exit check, run once per iteration after draw, present and event
    /// polling.
    pub fn end_iteration(&mut self, signals: ExitSignals) -> LoopState {
        if self.state == LoopState::Running && signals.should_exit() {
            log::info!(
                "Stopping render loop after {} frame(s) (escape={}, close={})",
                self.frames,
                signals.escape_pressed,
                signals.close_requested
            );
            self.state = LoopState::Stopped;
        }
        self.state
    }

    /// One full iteration: draw and present, then check `signals`. The
    /// windowed loop runs the same two halves from separate callbacks,
    /// `render` on redraw and `end_iteration` once events are drained.
    #[cfg(test)]
    pub fn frame_at<B: GpuBackend>(
        &mut self,
        resources: &mut ResourceManager<B>,
        elapsed: f32,
        signals: ExitSignals,
    ) -> ViewerResult<LoopState> {
        self.render_at(resources, elapsed)?;
        Ok(self.end_iteration(signals))
    }
}
