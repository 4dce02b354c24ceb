//! Resonance Viz - audio-reactive sacred geometry.
//!
//! Windowed mode renders through wgpu and is driven by winit redraws;
//! `--record` renders headless through the software canvas into PNG frames.

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use resonance_viz::audio::SpectrumSource;
use resonance_viz::cli::Args;
use resonance_viz::error::{AudioError, RenderError, VizError};
use resonance_viz::logging::init_logger;
use resonance_viz::mode::VisualizationMode;
use resonance_viz::params::{EngineConfig, RecordingConfig};
use resonance_viz::render::{
    CallbackScheduler, CanvasSurface, ContainerBounds, GpuSurface, ManualScheduler, RenderLoop,
    SurfaceSize, TickOutcome,
};
use resonance_viz::theme::PaletteSelection;

type RedrawScheduler = CallbackScheduler<Box<dyn FnMut()>>;

/// Main application state
struct App {
    args: Args,
    config: EngineConfig,
    source: Option<Box<dyn SpectrumSource>>,

    // Created once the event loop resumes
    window: Option<Arc<Window>>,
    render_loop: Option<RenderLoop<GpuSurface>>,
    scheduler: Option<RedrawScheduler>,

    start_time: Instant,
    failure: Option<VizError>,
}

impl App {
    fn new(args: Args, config: EngineConfig, source: Option<Box<dyn SpectrumSource>>) -> Self {
        Self {
            args,
            config,
            source,
            window: None,
            render_loop: None,
            scheduler: None,
            start_time: Instant::now(),
            failure: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), VizError> {
        let window_attributes = Window::default_attributes()
            .with_title("Resonance Viz")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.render.window_width,
                self.config.render.window_height,
            ));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let surface = pollster::block_on(GpuSurface::new(
            Arc::clone(&window),
            window.scale_factor() as f32,
            None,
        ))?;

        let mut render_loop = RenderLoop::new(surface, &self.config, self.args.mode());
        render_loop.set_chakra(self.args.chakra());
        render_loop.set_palette(self.args.palette_selection());

        let redraw_window = Arc::clone(&window);
        let mut scheduler: RedrawScheduler =
            CallbackScheduler::new(Box::new(move || redraw_window.request_redraw()));
        render_loop.set_playing(true, &mut scheduler);

        log::info!("1-9, 0, - select modes · space pauses · C chakra · P palette · Esc quits");

        self.window = Some(window);
        self.render_loop = Some(render_loop);
        self.scheduler = Some(scheduler);
        Ok(())
    }

    /// Deliver the pending tick, if any
    fn render_frame(&mut self) {
        let (Some(render_loop), Some(scheduler)) = (&mut self.render_loop, &mut self.scheduler)
        else {
            return;
        };
        let Some(handle) = scheduler.take_pending() else {
            return;
        };

        let time_s = self.start_time.elapsed().as_secs_f64();
        let spectrum = self.source.as_mut().and_then(|s| s.spectrum_at(time_s));
        render_loop.on_tick(handle, time_s, spectrum.as_ref(), scheduler);
    }

    fn handle_key(&mut self, code: KeyCode, event_loop: &ActiveEventLoop) {
        let (Some(render_loop), Some(scheduler)) = (&mut self.render_loop, &mut self.scheduler)
        else {
            return;
        };

        if let Some(mode) = mode_for_key(code) {
            render_loop.set_mode(mode);
            return;
        }
        match code {
            KeyCode::Space => {
                let playing = !render_loop.is_playing();
                render_loop.set_playing(playing, scheduler);
            }
            KeyCode::KeyC => {
                let chakra = render_loop.chakra().next();
                log::info!("chakra: {}", chakra.name());
                render_loop.set_chakra(chakra);
            }
            KeyCode::KeyP => {
                let palette = render_loop.palette().palette().next();
                log::info!("palette: {:?}", palette);
                render_loop.set_palette(PaletteSelection::Named(palette));
            }
            KeyCode::Escape => self.shutdown(event_loop),
            _ => {}
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let (Some(render_loop), Some(scheduler)) = (&mut self.render_loop, &mut self.scheduler) {
            render_loop.teardown(scheduler);
        }
        event_loop.exit();
    }
}

/// Keyboard order: 1-9, 0, -
fn mode_for_key(code: KeyCode) -> Option<VisualizationMode> {
    let index = match code {
        KeyCode::Digit1 => 0,
        KeyCode::Digit2 => 1,
        KeyCode::Digit3 => 2,
        KeyCode::Digit4 => 3,
        KeyCode::Digit5 => 4,
        KeyCode::Digit6 => 5,
        KeyCode::Digit7 => 6,
        KeyCode::Digit8 => 7,
        KeyCode::Digit9 => 8,
        KeyCode::Digit0 => 9,
        KeyCode::Minus => 10,
        _ => return None,
    };
    VisualizationMode::ALL.get(index).copied()
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }
        if let Err(e) = self.init(event_loop) {
            self.failure = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                let (Some(window), Some(render_loop)) = (&self.window, &mut self.render_loop) else {
                    return;
                };
                let scale = window.scale_factor() as f32;
                render_loop.request_resize(ContainerBounds::new(
                    size.width as f32 / scale,
                    size.height as f32 / scale,
                    scale,
                ));
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(code, event_loop),
            WindowEvent::RedrawRequested => self.render_frame(),
            _ => {}
        }
    }
}

/// Render headless into `recording/frames`
fn record(
    args: &Args,
    config: &EngineConfig,
    mut source: Option<Box<dyn SpectrumSource>>,
    recording: RecordingConfig,
) -> Result<(), VizError> {
    std::fs::create_dir_all(recording.frames_dir()).map_err(RenderError::from)?;

    let size = SurfaceSize::new(config.render.window_width, config.render.window_height, 1.0);
    let mut render_loop = RenderLoop::new(CanvasSurface::new(size), config, args.mode());
    render_loop.set_chakra(args.chakra());
    render_loop.set_palette(args.palette_selection());

    let mut scheduler = ManualScheduler::new();
    render_loop.set_playing(true, &mut scheduler);

    let total = recording.total_frames();
    let step = 1.0 / recording.fps as f64;
    log::info!("recording {} frames to {}", total, recording.frames_dir());

    for frame in 0..total {
        let Some(handle) = scheduler.take_pending() else {
            break;
        };
        let time_s = frame as f64 * step;
        let spectrum = source.as_mut().and_then(|s| s.spectrum_at(time_s));
        if render_loop.on_tick(handle, time_s, spectrum.as_ref(), &mut scheduler)
            == TickOutcome::Rendered
        {
            render_loop.surface().save_png(recording.frame_path(frame))?;
        }
        if (frame + 1) % recording.fps as usize == 0 {
            log::info!("{}/{} frames", frame + 1, total);
        }
    }

    let stats = render_loop.stats();
    render_loop.teardown(&mut scheduler);
    log::info!(
        "recording done: {} frames written, {} skipped",
        stats.rendered,
        stats.skipped
    );
    Ok(())
}

/// Spectrum for the window: a file source if given, otherwise live synthesis
fn window_source(
    args: &Args,
    config: &EngineConfig,
) -> Result<Option<Box<dyn SpectrumSource>>, AudioError> {
    if let Some(source) = args.file_source(config)? {
        return Ok(Some(source));
    }
    #[cfg(feature = "live-audio")]
    {
        let live = resonance_viz::audio::AudioSystem::new(config.fft.clone())?;
        return Ok(Some(Box::new(live)));
    }
    #[allow(unreachable_code)]
    Ok(None)
}

fn run(args: Args) -> Result<(), VizError> {
    let config = args.engine_config()?;

    if let Some(recording) = args.recording_config() {
        let source = args.file_source(&config)?;
        return record(&args, &config, source, recording);
    }

    let source = window_source(&args, &config)?;
    match &source {
        Some(source) => log::info!("spectrum source: {}", source.describe()),
        None => log::info!("no spectrum source, visuals stay idle"),
    }

    let mut app = App::new(args, config, source);
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;
    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() {
    init_logger();
    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
