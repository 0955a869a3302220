//! Wavetank - a damped 2D wave equation stepped and drawn on the GPU
//!
//! A Gaussian bump is released at the centre of the tank; ripples spread,
//! reflect off the walls and slowly die away while you orbit around them.

use std::sync::Arc;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use wavetank::cli::Args;
use wavetank::error::{Result, WaveError};
use wavetank::frame_loop::{FrameLoop, LoopState};
use wavetank::input::InputState;
use wavetank::params::{InitialBump, OrbitControls, RenderConfig, SimulationParameters};
use wavetank::rendering::RenderSystem;

/// Main application state
struct App {
    // Configuration
    simulation: SimulationParameters,
    bump: InitialBump,
    render_config: RenderConfig,
    controls: OrbitControls,
    stats_every: Option<u64>,

    // Window and per-frame state
    window: Option<Arc<Window>>,
    frame_loop: Option<FrameLoop<RenderSystem>>,
    input: InputState,

    // Set when startup or a frame fails after the event loop is running
    startup_error: Option<WaveError>,
    run_error: Option<WaveError>,
}

impl App {
    fn new(args: &Args) -> Self {
        Self {
            simulation: args.simulation_parameters(),
            bump: args.initial_bump(),
            render_config: args.render_config(),
            controls: OrbitControls::default(),
            stats_every: args.stats_every,
            window: None,
            frame_loop: None,
            input: InputState::new(),
            startup_error: None,
            run_error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title("Wavetank")
            .with_resizable(false)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.simulation,
            &self.bump,
            &self.render_config,
        ))?;

        log::info!("Wavetank is running");
        log::info!("Arrows rotate, W/S zoom, R resets, Space pauses, Esc quits");

        self.frame_loop = Some(FrameLoop::new(
            render_system,
            self.controls,
            self.stats_every,
        ));
        self.window = Some(window);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.startup_error.is_some() {
            return; // Already initialized
        }

        if let Err(e) = self.start(event_loop) {
            self.startup_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.input.request_close(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => self.input.handle_key(code, state, repeat),
            WindowEvent::RedrawRequested => {
                let Some(frame_loop) = &mut self.frame_loop else {
                    return;
                };
                if frame_loop.tick(&mut self.input) == LoopState::Stopped {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Release is idempotent; covers exits that bypass the frame loop
        if let Some(frame_loop) = &mut self.frame_loop {
            frame_loop.terminate();
            if frame_loop.stopped_on_error() {
                self.run_error = Some(WaveError::SurfaceLost {
                    frames: frame_loop.simulation().frame,
                });
            }
        }
        self.frame_loop = None;
        self.window = None;
    }
}

fn run(args: &Args) -> Result<()> {
    args.validate()?;
    let simulation = args.simulation_parameters();

    log::info!(
        "Grid {}x{}, dt {}, dx {}, c {}, damping {} (Courant {:.4})",
        simulation.grid_size,
        simulation.grid_size,
        simulation.dt,
        simulation.dx,
        simulation.wave_speed,
        simulation.damping,
        simulation.courant_number()
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(args);
    event_loop.run_app(&mut app)?;

    match app.startup_error.take().or(app.run_error.take()) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
