//! Procedural geometry generators, one per visualization mode.
//!
//! A generator allocates its static meshes in `init`, turns each tick's
//! [`FrameInput`] into a [`Scene`] in `update`, and releases everything in
//! `dispose`. Generators never touch the render surface.

pub mod growth;
pub mod resources;
pub mod scene;
pub mod shapes;
pub mod transient;

mod bars;
mod chakra_beam;
mod fibonacci;
mod flower_of_life;
mod merkaba;
mod metatron;
mod particles;
mod prime_flow;
mod radial;
mod sri_yantra;
mod wave;

pub use bars::BarsGenerator;
pub use chakra_beam::ChakraBeamGenerator;
pub use fibonacci::FibonacciGenerator;
pub use flower_of_life::FlowerOfLifeGenerator;
pub use growth::Growth;
pub use merkaba::MerkabaGenerator;
pub use metatron::MetatronGenerator;
pub use particles::ParticlesGenerator;
pub use prime_flow::PrimeFlowGenerator;
pub use radial::RadialGenerator;
pub use resources::{MeshData, MeshHandle, OwnedMeshes, ResourceStore};
pub use scene::{MeshStyle, Primitive, PrimitiveKind, Scene, Space, Stroke};
pub use sri_yantra::SriYantraGenerator;
pub use transient::{Transient, TransientPool};
pub use wave::WaveGenerator;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::analysis::MAX_AMPLITUDE;
use crate::error::GeometryResult;
use crate::mode::VisualizationMode;
use crate::params::{GrowthConfig, RenderConfig};
use crate::prime::PrimeActivation;
use crate::theme::{Chakra, ThemeColors};

/// Everything a generator sees for one tick
#[derive(Clone, Copy, Debug)]
pub struct FrameInput<'a> {
    /// Seconds since the previous tick
    pub delta_time: f32,

    /// Seconds since the loop started
    pub time: f32,

    /// Band amplitudes (0-255)
    pub bands: &'a [f32],

    /// Overall loudness (0-1)
    pub intensity: f32,

    /// Low-end energy (0-1)
    pub bass: f32,

    /// Whether a spectrum was supplied this tick
    pub audio_active: bool,

    pub theme: ThemeColors,
    pub selected_chakra: Chakra,

    /// Recent prime activations, oldest first
    pub activations: &'a [PrimeActivation],

    /// Activations detected this tick
    pub new_activations: usize,

    /// Logical surface size (pixels)
    pub viewport: Vec2,
}

impl FrameInput<'_> {
    /// Band `index` normalized to 0-1; out of range reads as silence
    pub fn band(&self, index: usize) -> f32 {
        self.bands.get(index).copied().unwrap_or(0.0) / MAX_AMPLITUDE
    }

    /// Normalized band for slot `k` of `n` evenly spread across all bands
    pub fn band_for(&self, k: usize, n: usize) -> f32 {
        if n == 0 || self.bands.is_empty() {
            return 0.0;
        }
        self.band(k * self.bands.len() / n)
    }

    /// Whether a recorded activation came from band `index`
    pub fn is_prime_band(&self, index: usize) -> bool {
        self.activations.iter().any(|a| a.bin_index == index)
    }

    /// Activations detected this tick, newest last
    pub fn fresh_activations(&self) -> &[PrimeActivation] {
        let start = self.activations.len().saturating_sub(self.new_activations);
        &self.activations[start..]
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.x / self.viewport.y.max(1.0)
    }
}

/// Settings every generator is built with
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    /// Session seed, mixed with a per-mode salt
    pub seed: u64,
    pub growth: GrowthConfig,
    pub render: RenderConfig,
}

impl GeneratorConfig {
    pub fn new(seed: u64, growth: GrowthConfig, render: RenderConfig) -> Self {
        Self {
            seed,
            growth,
            render,
        }
    }

    /// Reproducible random source for one mode
    pub fn rng(&self, salt: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ salt)
    }
}

/// A stateful per-mode pattern generator
pub trait GeometryGenerator {
    fn mode(&self) -> VisualizationMode;

    /// Allocate persistent structures
    fn init(&mut self, resources: &mut ResourceStore) -> GeometryResult<()>;

    /// Advance animation state and describe what to draw
    fn update(&mut self, input: &FrameInput<'_>, resources: &ResourceStore)
        -> GeometryResult<Scene>;

    /// Release everything `init` allocated
    fn dispose(&mut self, resources: &mut ResourceStore);
}
