//! Particles: seeded motes spawned each tick, sized by bass, drifting on a
//! Perlin field until they fade out.

use glam::{Vec2, Vec3};
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::Rng;

use super::resources::ResourceStore;
use super::scene::{Primitive, Scene};
use super::transient::{Transient, TransientPool};
use super::{FrameInput, GeneratorConfig, GeometryGenerator, Growth};
use crate::error::{GeometryError, GeometryResult};
use crate::mode::VisualizationMode;
use crate::theme::Color;

/// Most motes alive at once; the oldest is dropped beyond this
pub const MAX_PARTICLES: usize = 120;

/// Motes spawned per tick at full intensity, on top of one at silence
const SPAWN_PER_TICK: f32 = 3.0;

const SALT: u64 = 0x5041_5254;

/// Drift speed at full field strength (logical pixels per second)
const DRIFT_PX_PER_S: f32 = 60.0;

/// Spatial frequency of the drift field (per logical pixel)
const FIELD_FREQUENCY: f64 = 0.006;

pub struct ParticlesGenerator {
    config: GeneratorConfig,
    growth: Growth,
    perlin: Perlin,
    rng: Option<StdRng>,
    motes: TransientPool,
}

impl ParticlesGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            config: config.clone(),
            growth: Growth::new(config.growth.clone()),
            perlin: Perlin::new((config.seed ^ SALT) as u32),
            rng: None,
            motes: TransientPool::new(MAX_PARTICLES),
        }
    }

    pub fn particle_count(&self) -> usize {
        self.motes.len()
    }

    pub fn motes(&self) -> impl Iterator<Item = &Transient> {
        self.motes.iter()
    }

    fn drift(&self, position: Vec3, time: f32) -> Vec3 {
        let x = position.x as f64 * FIELD_FREQUENCY;
        let y = position.y as f64 * FIELD_FREQUENCY;
        let t = time as f64 * 0.15;
        Vec3::new(
            self.perlin.get([x, y, t]) as f32,
            self.perlin.get([x + 17.0, y, t]) as f32,
            0.0,
        )
    }
}

/// One mote at a random spot, tagged with the band it listens to
fn spawn_mote(rng: &mut StdRng, viewport: Vec2, bass: f32, band_count: usize) -> Transient {
    let position = Vec3::new(
        rng.random::<f32>() * viewport.x,
        rng.random::<f32>() * viewport.y,
        0.0,
    );
    let scale = (2.0 + bass * 18.0) * rng.random_range(0.6..1.2);
    let decay = rng.random_range(0.4..0.9);
    let band = rng.random_range(0..band_count.max(1));
    Transient::new(position, scale, decay).tagged(band)
}

impl GeometryGenerator for ParticlesGenerator {
    fn mode(&self) -> VisualizationMode {
        VisualizationMode::Particles
    }

    fn init(&mut self, _resources: &mut ResourceStore) -> GeometryResult<()> {
        self.rng = Some(self.config.rng(SALT));
        self.motes.clear();
        self.growth.reset();
        Ok(())
    }

    fn update(&mut self, input: &FrameInput<'_>, _resources: &ResourceStore) -> GeometryResult<Scene> {
        let mode = self.mode();
        let rng = self.rng.as_mut().ok_or(GeometryError::NotInitialized(mode))?;
        self.growth.step(input.audio_active, input.new_activations);

        let spawns = 1 + (input.intensity * SPAWN_PER_TICK).round() as usize;
        for _ in 0..spawns {
            self.motes
                .spawn(spawn_mote(rng, input.viewport, input.bass, input.bands.len()));
        }

        let speed = DRIFT_PX_PER_S * (1.0 + input.intensity);
        let steering: Vec<Vec3> = self
            .motes
            .iter()
            .map(|mote| self.drift(mote.position, input.time) * speed)
            .collect();
        for (mote, velocity) in self.motes.iter_mut().zip(steering) {
            mote.velocity = velocity;
        }
        self.motes.step(input.delta_time);

        let scale = self.growth.scale();
        let opacity = self.growth.opacity();
        let mut scene = Scene::screen(Color::BACKGROUND);
        for mote in self.motes.iter() {
            let level = input.band(mote.tag);
            let color = if input.is_prime_band(mote.tag) {
                Color::HIGHLIGHT
            } else {
                input.theme.cycle(mote.tag)
            };
            scene.push(Primitive::Circle {
                center: mote.position,
                radius: mote.scale * (0.5 + level) * scale,
                stroke: None,
                fill: Some(color.fade(mote.opacity * opacity * (0.4 + 0.6 * level))),
            });
        }
        Ok(scene)
    }

    fn dispose(&mut self, _resources: &mut ResourceStore) {
        self.motes.clear();
        self.rng = None;
    }
}
