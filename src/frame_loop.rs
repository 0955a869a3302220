//! Per-frame orchestration: input, camera, simulate, render, teardown.

use crate::camera::CameraState;
use crate::error::Result;
use crate::input::InputState;
use crate::params::OrbitControls;
use crate::wave::FieldStats;

/// Lifecycle of the frame loop. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminating,
    Stopped,
}

/// Result of drawing one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    /// Frame skipped; the surface was reconfigured or timed out
    Dropped,
    /// Unrecoverable; the loop should shut down
    Fatal,
}

/// The GPU side of a frame, in the order the loop drives it
pub trait FramePipeline {
    fn update_camera(&mut self, camera: &CameraState);

    /// Encode one simulation step and flip parity
    fn simulate(&mut self);

    /// Draw the current field and present
    fn render(&mut self) -> FrameStatus;

    /// Re-seed the field with its initial condition
    fn reset(&mut self);

    fn field_stats(&mut self) -> Result<FieldStats>;

    /// Free every GPU resource; consumes the pipeline
    fn release(self);
}

/// Mutable per-run state threaded through the loop
#[derive(Debug, Clone, Copy)]
pub struct SimulationState {
    pub camera: CameraState,
    pub frame: u64,
    pub paused: bool,
}

impl SimulationState {
    pub fn new(controls: &OrbitControls) -> Self {
        Self {
            camera: CameraState::new(controls),
            frame: 0,
            paused: false,
        }
    }
}

const CAMERA_LOG_INTERVAL: u64 = 60;

pub struct FrameLoop<P: FramePipeline> {
    pipeline: Option<P>,
    state: LoopState,
    sim: SimulationState,
    controls: OrbitControls,
    stats_every: Option<u64>,
    fatal: bool,
}

impl<P: FramePipeline> FrameLoop<P> {
    pub fn new(pipeline: P, controls: OrbitControls, stats_every: Option<u64>) -> Self {
        Self {
            pipeline: Some(pipeline),
            state: LoopState::Running,
            sim: SimulationState::new(&controls),
            controls,
            stats_every,
            fatal: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// True once the loop has shut down because a frame could not be presented
    pub fn stopped_on_error(&self) -> bool {
        self.fatal
    }

    pub fn simulation(&self) -> &SimulationState {
        &self.sim
    }

    /// Advance the loop by one frame and return the resulting state
    pub fn tick(&mut self, input: &mut InputState) -> LoopState {
        if self.state == LoopState::Running {
            self.run_frame(input);
        }
        if self.state == LoopState::Terminating {
            self.terminate();
        }
        self.state
    }

    fn run_frame(&mut self, input: &mut InputState) {
        let Some(pipeline) = self.pipeline.as_mut() else {
            self.state = LoopState::Terminating;
            return;
        };

        let keys = input.poll();
        if keys.exit {
            log::info!("Exit requested after {} frames", self.sim.frame);
            self.state = LoopState::Terminating;
            return;
        }

        self.sim.camera = self.sim.camera.update(&keys, &self.controls);
        pipeline.update_camera(&self.sim.camera);

        if input.take_pause_toggle() {
            self.sim.paused = !self.sim.paused;
            log::info!("{}", if self.sim.paused { "Paused" } else { "Resumed" });
        }
        if input.take_reset() {
            log::info!("Resetting field to its initial condition");
            pipeline.reset();
        }

        if !self.sim.paused {
            pipeline.simulate();
        }

        if pipeline.render() == FrameStatus::Fatal {
            log::error!("Unrecoverable surface error, shutting down");
            self.fatal = true;
            self.state = LoopState::Terminating;
            return;
        }

        self.sim.frame += 1;

        if self.sim.frame % CAMERA_LOG_INTERVAL == 0 {
            log::debug!("Camera position: {:?}", self.sim.camera.position());
        }

        if let Some(every) = self.stats_every {
            if every > 0 && self.sim.frame % every == 0 {
                match pipeline.field_stats() {
                    Ok(stats) => log::info!(
                        "frame {}: max |h| = {:.5}, energy = {:.6}, sum h^2 = {:.6}",
                        self.sim.frame,
                        stats.max_abs,
                        stats.energy,
                        stats.sum_of_squares
                    ),
                    Err(e) => log::warn!("Field readback failed: {}", e),
                }
            }
        }
    }

    /// Release GPU resources (at most once) and stop
    pub fn terminate(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.release();
        }
        self.state = LoopState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use winit::event::ElementState;
    use winit::keyboard::KeyCode;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Call {
        Camera,
        Simulate,
        Render,
        Reset,
        Stats,
        Release,
    }

    struct MockPipeline {
        calls: Rc<RefCell<Vec<Call>>>,
        status: FrameStatus,
    }

    impl FramePipeline for MockPipeline {
        fn update_camera(&mut self, _camera: &CameraState) {
            self.calls.borrow_mut().push(Call::Camera);
        }
        fn simulate(&mut self) {
            self.calls.borrow_mut().push(Call::Simulate);
        }
        fn render(&mut self) -> FrameStatus {
            self.calls.borrow_mut().push(Call::Render);
            self.status
        }
        fn reset(&mut self) {
            self.calls.borrow_mut().push(Call::Reset);
        }
        fn field_stats(&mut self) -> Result<FieldStats> {
            self.calls.borrow_mut().push(Call::Stats);
            Ok(FieldStats {
                max_abs: 0.0,
                sum_of_squares: 0.0,
                energy: 0.0,
            })
        }
        fn release(self) {
            self.calls.borrow_mut().push(Call::Release);
        }
    }

    fn frame_loop(
        status: FrameStatus,
        stats_every: Option<u64>,
    ) -> (FrameLoop<MockPipeline>, Rc<RefCell<Vec<Call>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let pipeline = MockPipeline {
            calls: Rc::clone(&calls),
            status,
        };
        (
            FrameLoop::new(pipeline, OrbitControls::default(), stats_every),
            calls,
        )
    }

    fn count(calls: &Rc<RefCell<Vec<Call>>>, call: Call) -> usize {
        calls.borrow().iter().filter(|&&c| c == call).count()
    }

    #[test]
    fn test_frame_order() {
        let (mut frames, calls) = frame_loop(FrameStatus::Presented, None);
        let mut input = InputState::new();

        assert_eq!(frames.tick(&mut input), LoopState::Running);
        assert_eq!(
            *calls.borrow(),
            vec![Call::Camera, Call::Simulate, Call::Render]
        );
        assert_eq!(frames.simulation().frame, 1);
    }

    #[test]
    fn test_exit_releases_once_and_stops_simulating() {
        let (mut frames, calls) = frame_loop(FrameStatus::Presented, None);
        let mut input = InputState::new();

        for _ in 0..3 {
            frames.tick(&mut input);
        }
        input.handle_key(KeyCode::Escape, ElementState::Pressed, false);
        assert_eq!(frames.tick(&mut input), LoopState::Stopped);

        let simulated = count(&calls, Call::Simulate);
        for _ in 0..5 {
            assert_eq!(frames.tick(&mut input), LoopState::Stopped);
        }
        frames.terminate();

        assert_eq!(simulated, 3);
        assert_eq!(count(&calls, Call::Simulate), 3);
        assert_eq!(count(&calls, Call::Release), 1);
        assert_eq!(calls.borrow().last(), Some(&Call::Release));
    }

    #[test]
    fn test_close_before_first_frame() {
        let (mut frames, calls) = frame_loop(FrameStatus::Presented, None);
        let mut input = InputState::new();
        input.request_close();

        assert_eq!(frames.tick(&mut input), LoopState::Stopped);
        assert_eq!(*calls.borrow(), vec![Call::Release]);
    }

    #[test]
    fn test_pause_keeps_rendering() {
        let (mut frames, calls) = frame_loop(FrameStatus::Presented, None);
        let mut input = InputState::new();

        input.handle_key(KeyCode::Space, ElementState::Pressed, false);
        frames.tick(&mut input);
        frames.tick(&mut input);
        assert!(frames.simulation().paused);
        assert_eq!(count(&calls, Call::Simulate), 0);
        assert_eq!(count(&calls, Call::Render), 2);

        input.handle_key(KeyCode::Space, ElementState::Released, false);
        input.handle_key(KeyCode::Space, ElementState::Pressed, false);
        frames.tick(&mut input);
        assert!(!frames.simulation().paused);
        assert_eq!(count(&calls, Call::Simulate), 1);
    }

    #[test]
    fn test_reset_runs_before_simulate() {
        let (mut frames, calls) = frame_loop(FrameStatus::Presented, None);
        let mut input = InputState::new();

        input.handle_key(KeyCode::KeyR, ElementState::Pressed, false);
        frames.tick(&mut input);
        frames.tick(&mut input);

        assert_eq!(count(&calls, Call::Reset), 1);
        let order = calls.borrow();
        let reset = order.iter().position(|&c| c == Call::Reset);
        let simulate = order.iter().position(|&c| c == Call::Simulate);
        assert!(reset < simulate);
    }

    #[test]
    fn test_fatal_render_terminates() {
        let (mut frames, calls) = frame_loop(FrameStatus::Fatal, None);
        let mut input = InputState::new();

        assert_eq!(frames.tick(&mut input), LoopState::Stopped);
        assert_eq!(frames.tick(&mut input), LoopState::Stopped);
        assert_eq!(count(&calls, Call::Render), 1);
        assert_eq!(count(&calls, Call::Release), 1);
        assert!(frames.stopped_on_error());
    }

    #[test]
    fn test_requested_exit_is_not_an_error() {
        let (mut frames, _calls) = frame_loop(FrameStatus::Presented, None);
        let mut input = InputState::new();

        frames.tick(&mut input);
        input.request_close();
        assert_eq!(frames.tick(&mut input), LoopState::Stopped);
        assert!(!frames.stopped_on_error());

        let (mut frames, _calls) = frame_loop(FrameStatus::Dropped, None);
        frames.tick(&mut input);
        frames.terminate();
        assert!(!frames.stopped_on_error());
    }

    #[test]
    fn test_stats_every_n_frames() {
        let (mut frames, calls) = frame_loop(FrameStatus::Presented, Some(4));
        let mut input = InputState::new();

        for _ in 0..10 {
            frames.tick(&mut input);
        }
        assert_eq!(count(&calls, Call::Stats), 2);
    }

    #[test]
    fn test_held_keys_move_camera() {
        let (mut frames, _calls) = frame_loop(FrameStatus::Presented, None);
        let mut input = InputState::new();
        let start = frames.simulation().camera;

        input.handle_key(KeyCode::KeyW, ElementState::Pressed, false);
        frames.tick(&mut input);
        frames.tick(&mut input);

        let controls = OrbitControls::default();
        let expected = start.distance - 2.0 * controls.zoom_step;
        assert!((frames.simulation().camera.distance - expected).abs() < 1e-5);
    }
}
