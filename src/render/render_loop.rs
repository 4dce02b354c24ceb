//! Tick-driven render loop.
//!
//! Owns the surface, the mode registry and every per-session component.
//! Each delivered tick runs analyze → detect → update → tessellate → draw;
//! failures are logged and the frame skipped, never fatal.

use crate::analysis::{BandAnalysis, FrequencyAnalyzer};
use crate::audio::FrequencySpectrum;
use crate::error::{FrameError, GeometryError};
use crate::geometry::{FrameInput, GeneratorConfig, ResourceStore};
use crate::mode::{ModeRegistry, VisualizationMode};
use crate::params::EngineConfig;
use crate::prime::{PrimeActivation, PrimeEventDetector};
use crate::theme::{Chakra, PaletteSelection, ThemeResolver};

use super::scheduler::{TickHandle, TickScheduler};
use super::tessellate::tessellate;
use super::{ContainerBounds, RenderSurface, SurfaceSize};

/// Longest frame step fed to generators (seconds)
const MAX_DELTA_S: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Never played
    Idle,
    /// A tick is requested
    Scheduled,
    /// Inside `on_tick`
    Rendering,
    /// Paused or torn down
    Stopped,
}

/// What a delivered tick did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Rendered,
    /// Generator or surface failed; nothing drawn
    Skipped,
    /// Stale or cancelled handle
    Ignored,
}

/// Frame counters since the loop was built
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub rendered: u64,
    pub skipped: u64,
    pub ignored: u64,
}

pub struct RenderLoop<S: RenderSurface> {
    surface: S,
    registry: ModeRegistry,
    resources: ResourceStore,
    analyzer: FrequencyAnalyzer,
    detector: PrimeEventDetector,
    state: LoopState,
    playing: bool,
    pending: Option<TickHandle>,
    pending_resize: Option<SurfaceSize>,
    chakra: Chakra,
    palette: PaletteSelection,
    nominal_frame_s: f32,
    started_at: Option<f64>,
    last_tick: Option<f64>,
    analysis: BandAnalysis,
    stats: FrameStats,
}

impl<S: RenderSurface> RenderLoop<S> {
    /// Build the loop and activate `mode`
    pub fn new(surface: S, config: &EngineConfig, mode: VisualizationMode) -> Self {
        let generators = GeneratorConfig::new(
            config.render.seed,
            config.growth.clone(),
            config.render.clone(),
        );
        let mut resources = ResourceStore::new();
        let mut registry = ModeRegistry::new(generators);
        registry.activate(mode, &mut resources);

        log::info!(
            "render loop ready: {:?} surface {}x{}, mode {}",
            surface.backend(),
            surface.size().width,
            surface.size().height,
            registry.mode()
        );

        Self {
            surface,
            registry,
            resources,
            analyzer: FrequencyAnalyzer::new(config.analysis.clone()),
            detector: PrimeEventDetector::new(config.prime.clone()),
            state: LoopState::Idle,
            playing: false,
            pending: None,
            pending_resize: None,
            chakra: Chakra::default(),
            palette: PaletteSelection::default(),
            nominal_frame_s: config.render.nominal_frame_s,
            started_at: None,
            last_tick: None,
            analysis: BandAnalysis::silent(config.analysis.band_count),
            stats: FrameStats::default(),
        }
    }

    /// Start or pause ticking
    pub fn set_playing(&mut self, playing: bool, scheduler: &mut dyn TickScheduler) {
        if playing {
            if self.surface.is_released() {
                log::warn!("cannot play: surface released");
                return;
            }
            self.playing = true;
            if matches!(self.state, LoopState::Idle | LoopState::Stopped) {
                self.pending = Some(scheduler.request_tick());
                self.state = LoopState::Scheduled;
                log::debug!("playing");
            }
        } else {
            self.playing = false;
            if let Some(handle) = self.pending.take() {
                scheduler.cancel_tick(handle);
            }
            if self.state == LoopState::Scheduled {
                self.state = LoopState::Stopped;
                log::debug!("paused");
            }
            // A resumed loop starts from a nominal step, not the pause length
            self.last_tick = None;
        }
    }

    /// Handle a tick delivered by the scheduler.
    ///
    /// `timestamp` is host time in seconds; `spectrum` is `None` without an
    /// active audio session.
    pub fn on_tick(
        &mut self,
        handle: TickHandle,
        timestamp: f64,
        spectrum: Option<&FrequencySpectrum>,
        scheduler: &mut dyn TickScheduler,
    ) -> TickOutcome {
        if self.state != LoopState::Scheduled || self.pending != Some(handle) {
            log::trace!("ignoring stale tick {}", handle.id());
            self.stats.ignored += 1;
            return TickOutcome::Ignored;
        }
        self.pending = None;
        self.state = LoopState::Rendering;
        self.apply_pending_resize();

        let outcome = match self.render_frame(timestamp, spectrum) {
            Ok(()) => {
                self.stats.rendered += 1;
                TickOutcome::Rendered
            }
            Err(e) => {
                log::warn!("skipping frame: {}", e);
                self.stats.skipped += 1;
                TickOutcome::Skipped
            }
        };

        if self.playing {
            self.pending = Some(scheduler.request_tick());
            self.state = LoopState::Scheduled;
        } else {
            self.state = LoopState::Stopped;
        }
        outcome
    }

    fn apply_pending_resize(&mut self) {
        let Some(size) = self.pending_resize.take() else {
            return;
        };
        if size != self.surface.size() {
            log::debug!("resize to {}x{} @{}", size.width, size.height, size.pixel_ratio);
            self.surface.resize(size);
        }
    }

    fn render_frame(
        &mut self,
        timestamp: f64,
        spectrum: Option<&FrequencySpectrum>,
    ) -> Result<(), FrameError> {
        let started_at = *self.started_at.get_or_insert(timestamp);
        let delta_time = match self.last_tick {
            Some(last) => ((timestamp - last) as f32).clamp(0.0, MAX_DELTA_S),
            None => self.nominal_frame_s,
        };
        self.last_tick = Some(timestamp);
        let time = (timestamp - started_at).max(0.0);

        let data = spectrum.map(FrequencySpectrum::as_slice);
        let audio_active = data.is_some_and(|d| !d.is_empty());
        self.analysis = self.analyzer.analyze(data);
        let fresh = self.detector.evaluate(&self.analysis.bands, time);

        let mode = self.registry.mode();
        let viewport = self.surface.size().logical();
        let input = FrameInput {
            delta_time,
            time: time as f32,
            bands: &self.analysis.bands,
            intensity: self.analysis.intensity,
            bass: self.analysis.bass,
            audio_active,
            theme: ThemeResolver::theme(self.chakra, self.palette),
            selected_chakra: self.chakra,
            activations: self.detector.history(),
            new_activations: usize::from(fresh.is_some()),
            viewport,
        };

        let generator = self
            .registry
            .active_mut()
            .ok_or(GeometryError::NotInitialized(mode))?;
        let scene = generator.update(&input, &self.resources)?;
        scene.validate(mode)?;
        let frame = tessellate(&scene, &self.resources, viewport)?;
        self.surface.draw(&frame)?;
        Ok(())
    }

    /// Queue a resize for the next tick; degenerate bounds are dropped
    pub fn request_resize(&mut self, bounds: ContainerBounds) {
        match bounds.to_surface_size() {
            Some(size) => self.pending_resize = Some(size),
            None => log::debug!(
                "ignoring resize to {}x{} @{}",
                bounds.width,
                bounds.height,
                bounds.pixel_ratio
            ),
        }
    }

    pub fn set_mode(&mut self, mode: VisualizationMode) {
        self.registry.activate(mode, &mut self.resources);
    }

    /// Switch by name; unknown names select the default mode
    pub fn set_mode_str(&mut self, name: &str) {
        self.registry.activate_str(name, &mut self.resources);
    }

    pub fn set_chakra(&mut self, chakra: Chakra) {
        self.chakra = chakra;
    }

    /// Select by label; unknown labels select the crown chakra
    pub fn set_chakra_label(&mut self, label: &str) {
        self.chakra = Chakra::parse_or_default(label);
    }

    pub fn set_palette(&mut self, palette: PaletteSelection) {
        self.palette = palette;
    }

    /// Stop ticking and free everything the loop holds
    pub fn teardown(&mut self, scheduler: &mut dyn TickScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_tick(handle);
        }
        self.playing = false;
        self.pending_resize = None;
        self.registry.teardown(&mut self.resources);
        self.detector.clear();
        self.surface.release();
        self.state = LoopState::Stopped;
        log::info!(
            "render loop stopped: {} rendered, {} skipped",
            self.stats.rendered,
            self.stats.skipped
        );
    }

    /// Recent activations, oldest first
    pub fn prime_activations(&self) -> &[PrimeActivation] {
        self.detector.history()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn mode(&self) -> VisualizationMode {
        self.registry.mode()
    }

    pub fn chakra(&self) -> Chakra {
        self.chakra
    }

    pub fn palette(&self) -> PaletteSelection {
        self.palette
    }

    /// Bands of the last rendered tick
    pub fn analysis(&self) -> &BandAnalysis {
        &self.analysis
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CanvasSurface, ManualScheduler};

    const STEP: f64 = 1.0 / 60.0;

    fn canvas_loop(mode: VisualizationMode) -> RenderLoop<CanvasSurface> {
        let surface = CanvasSurface::new(SurfaceSize::new(64, 48, 1.0));
        RenderLoop::new(surface, &EngineConfig::default(), mode)
    }

    /// Deliver `ticks` pending ticks, returning the outcomes
    fn run(
        render_loop: &mut RenderLoop<CanvasSurface>,
        scheduler: &mut ManualScheduler,
        spectrum: Option<&FrequencySpectrum>,
        ticks: usize,
    ) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();
        for i in 0..ticks {
            let Some(handle) = scheduler.take_pending() else {
                break;
            };
            outcomes.push(render_loop.on_tick(handle, i as f64 * STEP, spectrum, scheduler));
        }
        outcomes
    }

    #[test]
    fn test_play_schedules_and_renders() {
        let mut render_loop = canvas_loop(VisualizationMode::Bars);
        let mut scheduler = ManualScheduler::new();
        assert_eq!(render_loop.state(), LoopState::Idle);

        render_loop.set_playing(true, &mut scheduler);
        assert_eq!(render_loop.state(), LoopState::Scheduled);
        assert_eq!(scheduler.pending_count(), 1);

        let outcomes = run(&mut render_loop, &mut scheduler, None, 5);
        assert_eq!(outcomes, vec![TickOutcome::Rendered; 5]);
        assert_eq!(render_loop.stats().rendered, 5);
        assert_eq!(render_loop.surface().frames_drawn(), 5);
        // next tick is always requested while playing
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_pause_cancels_pending_tick() {
        let mut render_loop = canvas_loop(VisualizationMode::Wave);
        let mut scheduler = ManualScheduler::new();
        render_loop.set_playing(true, &mut scheduler);
        let handle = scheduler.take_pending().unwrap();

        render_loop.set_playing(false, &mut scheduler);
        assert_eq!(render_loop.state(), LoopState::Stopped);
        assert_eq!(scheduler.cancelled(), &[handle]);

        // a late delivery of the cancelled handle draws nothing
        let outcome = render_loop.on_tick(handle, 0.0, None, &mut scheduler);
        assert_eq!(outcome, TickOutcome::Ignored);
        assert_eq!(render_loop.surface().frames_drawn(), 0);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_resume_after_pause() {
        let mut render_loop = canvas_loop(VisualizationMode::Circle);
        let mut scheduler = ManualScheduler::new();
        render_loop.set_playing(true, &mut scheduler);
        run(&mut render_loop, &mut scheduler, None, 2);
        render_loop.set_playing(false, &mut scheduler);
        render_loop.set_playing(true, &mut scheduler);
        assert_eq!(render_loop.state(), LoopState::Scheduled);
        assert_eq!(run(&mut render_loop, &mut scheduler, None, 1), vec![TickOutcome::Rendered]);
    }

    #[test]
    fn test_resize_applies_on_next_tick() {
        let mut render_loop = canvas_loop(VisualizationMode::Bars);
        let mut scheduler = ManualScheduler::new();
        render_loop.request_resize(ContainerBounds::new(40.0, 30.0, 2.0));
        assert_eq!(render_loop.surface().size().width, 64);

        render_loop.set_playing(true, &mut scheduler);
        run(&mut render_loop, &mut scheduler, None, 1);
        assert_eq!(render_loop.surface().image().dimensions(), (80, 60));
    }

    #[test]
    fn test_zero_area_resize_keeps_previous_size() {
        let mut render_loop = canvas_loop(VisualizationMode::Bars);
        let mut scheduler = ManualScheduler::new();
        render_loop.request_resize(ContainerBounds::new(0.0, 0.0, 1.0));
        render_loop.set_playing(true, &mut scheduler);
        assert_eq!(run(&mut render_loop, &mut scheduler, None, 1), vec![TickOutcome::Rendered]);
        assert_eq!(render_loop.surface().image().dimensions(), (64, 48));
    }

    #[test]
    fn test_failing_generator_skips_frame_and_keeps_ticking() {
        let mut render_loop = canvas_loop(VisualizationMode::FlowerOfLife);
        let mut scheduler = ManualScheduler::new();
        render_loop.set_playing(true, &mut scheduler);
        run(&mut render_loop, &mut scheduler, None, 1);

        // pull the meshes out from under the active generator
        let RenderLoop {
            registry,
            resources,
            ..
        } = &mut render_loop;
        registry.active_mut().unwrap().dispose(resources);

        let outcomes = run(&mut render_loop, &mut scheduler, None, 3);
        assert_eq!(outcomes, vec![TickOutcome::Skipped; 3]);
        assert_eq!(render_loop.stats().skipped, 3);
        assert_eq!(render_loop.state(), LoopState::Scheduled);

        // switching modes recovers
        render_loop.set_mode(VisualizationMode::Merkaba);
        assert_eq!(run(&mut render_loop, &mut scheduler, None, 1), vec![TickOutcome::Rendered]);
    }

    #[test]
    fn test_strong_prime_band_activates_once() {
        let mut render_loop = canvas_loop(VisualizationMode::PrimeFlow);
        let mut scheduler = ManualScheduler::new();

        // band 22 of 64 covers bins 352..368 of a 1024-bin spectrum
        let mut bins = vec![0u8; 1024];
        bins[352..368].fill(255);
        let spectrum = FrequencySpectrum::new(bins);

        render_loop.set_playing(true, &mut scheduler);
        run(&mut render_loop, &mut scheduler, Some(&spectrum), 120);
        let activations = render_loop.prime_activations();
        assert_eq!(activations.len(), 1);
        assert_eq!(activations[0].bin_index, 22);
        assert_eq!(activations[0].mapped_frequency, 230);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut render_loop = canvas_loop(VisualizationMode::Merkaba);
        let mut scheduler = ManualScheduler::new();
        render_loop.set_playing(true, &mut scheduler);
        run(&mut render_loop, &mut scheduler, None, 3);
        assert!(render_loop.resources().live_count() > 0);

        render_loop.teardown(&mut scheduler);
        assert_eq!(render_loop.state(), LoopState::Stopped);
        assert_eq!(render_loop.resources().live_count(), 0);
        assert!(render_loop.surface().is_released());
        assert_eq!(scheduler.pending_count(), 0);

        // playing a torn-down loop is refused
        render_loop.set_playing(true, &mut scheduler);
        assert_eq!(render_loop.state(), LoopState::Stopped);
    }

    #[test]
    fn test_chakra_and_palette_updates() {
        let mut render_loop = canvas_loop(VisualizationMode::ChakraBeam);
        render_loop.set_chakra_label("third eye");
        assert_eq!(render_loop.chakra(), Chakra::ThirdEye);
        render_loop.set_chakra_label("nonsense");
        assert_eq!(render_loop.chakra(), Chakra::Crown);
        render_loop.set_palette(PaletteSelection::Alternate(true));
        assert_eq!(render_loop.palette(), PaletteSelection::Alternate(true));
    }
}
