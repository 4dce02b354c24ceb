//! Visualization modes and the registry that owns the active generator.

use std::fmt;

use crate::geometry::{
    BarsGenerator, ChakraBeamGenerator, FibonacciGenerator, FlowerOfLifeGenerator,
    GeneratorConfig, GeometryGenerator, MerkabaGenerator, MetatronGenerator, ParticlesGenerator,
    PrimeFlowGenerator, RadialGenerator, ResourceStore, SriYantraGenerator, WaveGenerator,
};

/// Closed set of visualization modes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VisualizationMode {
    #[default]
    FlowerOfLife,
    Merkaba,
    MetatronCube,
    SriYantra,
    FibonacciSpiral,
    ChakraBeam,
    Bars,
    Wave,
    Circle,
    Particles,
    PrimeFlow,
}

/// Rendering family of a mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeFamily {
    /// World-space sacred geometry seen through a camera
    Sacred,
    /// Screen-space 2D drawing
    Canvas,
}

impl VisualizationMode {
    /// Keyboard order: 1-9, 0, -
    pub const ALL: [VisualizationMode; 11] = [
        VisualizationMode::FlowerOfLife,
        VisualizationMode::Merkaba,
        VisualizationMode::MetatronCube,
        VisualizationMode::SriYantra,
        VisualizationMode::FibonacciSpiral,
        VisualizationMode::ChakraBeam,
        VisualizationMode::Bars,
        VisualizationMode::Wave,
        VisualizationMode::Circle,
        VisualizationMode::Particles,
        VisualizationMode::PrimeFlow,
    ];

    /// Parse camelCase, kebab-case or snake_case names, case-insensitively
    pub fn parse(name: &str) -> Option<VisualizationMode> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        VisualizationMode::ALL
            .into_iter()
            .find(|mode| mode.key() == key)
    }

    /// Parse, falling back to the default mode
    pub fn parse_or_default(name: &str) -> VisualizationMode {
        VisualizationMode::parse(name).unwrap_or_else(|| {
            log::warn!(
                "unknown mode {:?}, using {}",
                name,
                VisualizationMode::default()
            );
            VisualizationMode::default()
        })
    }

    fn key(self) -> &'static str {
        match self {
            VisualizationMode::FlowerOfLife => "floweroflife",
            VisualizationMode::Merkaba => "merkaba",
            VisualizationMode::MetatronCube => "metatroncube",
            VisualizationMode::SriYantra => "sriyantra",
            VisualizationMode::FibonacciSpiral => "fibonaccispiral",
            VisualizationMode::ChakraBeam => "chakrabeam",
            VisualizationMode::Bars => "bars",
            VisualizationMode::Wave => "wave",
            VisualizationMode::Circle => "circle",
            VisualizationMode::Particles => "particles",
            VisualizationMode::PrimeFlow => "primeflow",
        }
    }

    /// Canonical camelCase name
    pub fn name(self) -> &'static str {
        match self {
            VisualizationMode::FlowerOfLife => "flowerOfLife",
            VisualizationMode::Merkaba => "merkaba",
            VisualizationMode::MetatronCube => "metatronCube",
            VisualizationMode::SriYantra => "sriYantra",
            VisualizationMode::FibonacciSpiral => "fibonacciSpiral",
            VisualizationMode::ChakraBeam => "chakraBeam",
            VisualizationMode::Bars => "bars",
            VisualizationMode::Wave => "wave",
            VisualizationMode::Circle => "circle",
            VisualizationMode::Particles => "particles",
            VisualizationMode::PrimeFlow => "primeFlow",
        }
    }

    pub fn family(self) -> ModeFamily {
        match self {
            VisualizationMode::FlowerOfLife
            | VisualizationMode::Merkaba
            | VisualizationMode::MetatronCube
            | VisualizationMode::SriYantra
            | VisualizationMode::FibonacciSpiral
            | VisualizationMode::ChakraBeam => ModeFamily::Sacred,
            VisualizationMode::Bars
            | VisualizationMode::Wave
            | VisualizationMode::Circle
            | VisualizationMode::Particles
            | VisualizationMode::PrimeFlow => ModeFamily::Canvas,
        }
    }

    /// Build the generator for this mode
    pub fn generator(self, config: &GeneratorConfig) -> Box<dyn GeometryGenerator> {
        match self {
            VisualizationMode::FlowerOfLife => Box::new(FlowerOfLifeGenerator::new(config)),
            VisualizationMode::Merkaba => Box::new(MerkabaGenerator::new(config)),
            VisualizationMode::MetatronCube => Box::new(MetatronGenerator::new(config)),
            VisualizationMode::SriYantra => Box::new(SriYantraGenerator::new(config)),
            VisualizationMode::FibonacciSpiral => Box::new(FibonacciGenerator::new(config)),
            VisualizationMode::ChakraBeam => Box::new(ChakraBeamGenerator::new(config)),
            VisualizationMode::Bars => Box::new(BarsGenerator::new(config)),
            VisualizationMode::Wave => Box::new(WaveGenerator::new(config)),
            VisualizationMode::Circle => Box::new(RadialGenerator::new(config)),
            VisualizationMode::Particles => Box::new(ParticlesGenerator::new(config)),
            VisualizationMode::PrimeFlow => Box::new(PrimeFlowGenerator::new(config)),
        }
    }
}

impl fmt::Display for VisualizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Holds the active mode and its generator
pub struct ModeRegistry {
    config: GeneratorConfig,
    mode: VisualizationMode,
    active: Option<Box<dyn GeometryGenerator>>,
    switches: u64,
}

impl ModeRegistry {
    /// Registry with nothing active yet
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            mode: VisualizationMode::default(),
            active: None,
            switches: 0,
        }
    }

    /// Make `mode` active, disposing the previous generator first.
    ///
    /// Re-activating the current mode is a no-op. If the new generator
    /// fails to initialise, the default mode is used instead.
    pub fn activate(&mut self, mode: VisualizationMode, resources: &mut ResourceStore) {
        if self.active.is_some() && self.mode == mode {
            return;
        }
        if let Some(mut previous) = self.active.take() {
            previous.dispose(resources);
            log::info!("mode {} → {}", self.mode, mode);
        }

        let mut generator = mode.generator(&self.config);
        let generator = match generator.init(resources) {
            Ok(()) => generator,
            Err(e) => {
                log::warn!("init of {} failed: {}", mode, e);
                generator.dispose(resources);
                let mut fallback = VisualizationMode::default().generator(&self.config);
                if let Err(e) = fallback.init(resources) {
                    log::warn!("init of fallback mode failed: {}", e);
                }
                fallback
            }
        };

        self.mode = generator.mode();
        self.active = Some(generator);
        self.switches += 1;
    }

    /// Parse a mode name, falling back to the default mode
    pub fn activate_str(&mut self, name: &str, resources: &mut ResourceStore) {
        self.activate(VisualizationMode::parse_or_default(name), resources);
    }

    /// Dispose the active generator, leaving nothing active
    pub fn teardown(&mut self, resources: &mut ResourceStore) {
        if let Some(mut generator) = self.active.take() {
            generator.dispose(resources);
            log::debug!("disposed {}", self.mode);
        }
    }

    pub fn mode(&self) -> VisualizationMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_mut(&mut self) -> Option<&mut (dyn GeometryGenerator + 'static)> {
        self.active.as_deref_mut()
    }

    /// Number of generators built so far
    pub fn switches(&self) -> u64 {
        self.switches
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}
