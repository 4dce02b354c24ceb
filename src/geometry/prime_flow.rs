//! Prime flow: orbits sized by the first ten primes, pulsing on activations.

use std::f32::consts::TAU;

use glam::Vec3;

use super::resources::ResourceStore;
use super::scene::{Primitive, Scene, Stroke};
use super::transient::{Transient, TransientPool};
use super::{FrameInput, GeneratorConfig, GeometryGenerator, Growth};
use crate::error::{GeometryError, GeometryResult};
use crate::mode::VisualizationMode;
use crate::prime::prime_sequence;
use crate::theme::Color;

pub const ORBIT_COUNT: usize = 10;

/// Base angular speed of the innermost orbit (radians per second)
const BASE_SPEED: f32 = 0.25;

/// Outermost orbit radius as a share of the shorter viewport side
const OUTER_EXTENT: f32 = 0.45;

const MAX_PULSES: usize = 16;

pub struct PrimeFlowGenerator {
    growth: Growth,
    primes: Vec<u32>,
    angles: Vec<f32>,
    pulses: TransientPool,
}

impl PrimeFlowGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            growth: Growth::new(config.growth.clone()),
            primes: Vec::new(),
            angles: Vec::new(),
            pulses: TransientPool::new(MAX_PULSES),
        }
    }

    /// Orbit radius per prime for a viewport's shorter side
    pub fn orbit_radii(&self, side: f32) -> Vec<f32> {
        let largest = self.primes.last().copied().unwrap_or(1) as f32;
        let unit = side * OUTER_EXTENT / largest;
        self.primes.iter().map(|&p| p as f32 * unit).collect()
    }

    pub fn pulse_count(&self) -> usize {
        self.pulses.len()
    }
}

impl GeometryGenerator for PrimeFlowGenerator {
    fn mode(&self) -> VisualizationMode {
        VisualizationMode::PrimeFlow
    }

    fn init(&mut self, _resources: &mut ResourceStore) -> GeometryResult<()> {
        self.primes = prime_sequence(ORBIT_COUNT);
        // Stagger starting angles so particles don't line up
        self.angles = (0..ORBIT_COUNT)
            .map(|k| k as f32 * TAU / ORBIT_COUNT as f32)
            .collect();
        self.pulses.clear();
        self.growth.reset();
        Ok(())
    }

    fn update(&mut self, input: &FrameInput<'_>, _resources: &ResourceStore) -> GeometryResult<Scene> {
        if self.primes.len() != ORBIT_COUNT {
            return Err(GeometryError::NotInitialized(self.mode()));
        }
        let dt = input.delta_time;
        self.growth.step(input.audio_active, input.new_activations);

        let drive = 1.0 + input.intensity;
        for (k, angle) in self.angles.iter_mut().enumerate() {
            *angle = (*angle + dt * (k + 1) as f32 * BASE_SPEED * drive) % TAU;
        }

        let center = Vec3::new(input.viewport.x * 0.5, input.viewport.y * 0.5, 0.0);
        let side = input.viewport.x.min(input.viewport.y);
        let radii = self.orbit_radii(side);
        let scale = self.growth.scale();
        let opacity = self.growth.opacity();

        self.pulses.step(dt);
        for activation in input.fresh_activations() {
            self.pulses.spawn(
                Transient::new(center, radii[0], 0.7)
                    .expanding(side * 0.35)
                    .tagged(activation.bin_index),
            );
        }

        let mut scene = Scene::screen(Color::BACKGROUND);
        for (k, (&radius, &prime)) in radii.iter().zip(&self.primes).enumerate() {
            let lit = input.activations.iter().any(|a| a.candidate == prime);
            let color = if lit {
                Color::HIGHLIGHT
            } else {
                input.theme.cycle(k)
            };

            scene.push(Primitive::Circle {
                center,
                radius: radius * scale,
                stroke: Some(Stroke::new(color.fade(opacity * 0.5), if lit { 2.5 } else { 1.0 })),
                fill: None,
            });

            let angle = self.angles[k];
            let level = input.band_for(k, ORBIT_COUNT);
            scene.push(Primitive::Point {
                position: center + Vec3::new(angle.cos(), angle.sin(), 0.0) * radius * scale,
                size: 4.0 + level * 8.0,
                color: color.lighten(0.3).fade(opacity),
            });
        }

        scene.extend(self.pulses.iter().map(|pulse| Primitive::Circle {
            center: pulse.position,
            radius: pulse.scale,
            stroke: Some(Stroke::new(Color::HIGHLIGHT.fade(pulse.opacity * 0.8), 2.0)),
            fill: Some(Color::HIGHLIGHT.fade(pulse.opacity * 0.08)),
        }));
        Ok(scene)
    }

    fn dispose(&mut self, _resources: &mut ResourceStore) {
        self.primes.clear();
        self.angles.clear();
        self.pulses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{testing, PrimitiveKind};
    use crate::prime::PrimeActivation;

    fn ready() -> (PrimeFlowGenerator, ResourceStore) {
        let mut generator = PrimeFlowGenerator::new(&GeneratorConfig::default());
        let mut resources = ResourceStore::new();
        generator.init(&mut resources).unwrap();
        (generator, resources)
    }

    #[test]
    fn test_orbits_follow_primes() {
        let (generator, _) = ready();
        let radii = generator.orbit_radii(600.0);
        assert_eq!(radii.len(), ORBIT_COUNT);
        assert!((radii[9] - 600.0 * OUTER_EXTENT).abs() < 1e-3);
        // 2 : 29
        assert!((radii[0] / radii[9] - 2.0 / 29.0).abs() < 1e-5);
    }

    #[test]
    fn test_angular_velocity_proportional_to_index() {
        let (mut generator, mut resources) = ready();
        let start = generator.angles.clone();
        testing::drive(&mut generator, &mut resources, 0.0, 1);
        let d0 = generator.angles[0] - start[0];
        let d3 = generator.angles[3] - start[3];
        assert!((d3 / d0 - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_pulse_per_new_activation() {
        let (mut generator, resources) = ready();
        let bands = vec![200.0; testing::BANDS];
        let activations = [
            PrimeActivation {
                bin_index: 10,
                candidate: 11,
                mapped_frequency: 110,
                timestamp: 0.0,
            },
            PrimeActivation {
                bin_index: 22,
                candidate: 23,
                mapped_frequency: 230,
                timestamp: 0.5,
            },
        ];
        let mut input = testing::frame(&bands, &activations, 0.5);
        input.new_activations = 1;
        let scene = generator.update(&input, &resources).unwrap();
        assert_eq!(generator.pulse_count(), 1);
        assert_eq!(scene.count(PrimitiveKind::Circle), ORBIT_COUNT + 1);

        // pulses fade out after ~1.4 s
        input.new_activations = 0;
        for _ in 0..90 {
            generator.update(&input, &resources).unwrap();
        }
        assert_eq!(generator.pulse_count(), 0);
    }

    #[test]
    fn test_orbit_lit_by_candidate_with_custom_offset() {
        use crate::params::PrimeConfig;
        use crate::prime::PrimeEventDetector;

        let mut detector = PrimeEventDetector::new(PrimeConfig {
            candidate_offset: 3,
            ..PrimeConfig::default()
        });
        let mut bands = vec![0.0; testing::BANDS];
        bands[20] = 250.0;
        let activation = (0..30)
            .find_map(|tick| detector.evaluate(&bands, tick as f64))
            .unwrap();

        let (mut generator, resources) = ready();
        let scene = generator
            .update(&testing::frame(&bands, &[activation], 0.5), &resources)
            .unwrap();

        let widths: Vec<f32> = scene
            .primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Circle { stroke: Some(s), .. } => Some(s.width),
                _ => None,
            })
            .take(ORBIT_COUNT)
            .collect();
        // 23 is the ninth prime
        assert_eq!(widths[8], 2.5);
        assert_eq!(widths.iter().filter(|&&w| w == 2.5).count(), 1);
    }

    #[test]
    fn test_exercise_contract() {
        let mut generator = PrimeFlowGenerator::new(&GeneratorConfig::default());
        let (quiet, _) = testing::exercise(&mut generator);
        assert_eq!(quiet.count(PrimitiveKind::Point), ORBIT_COUNT);
    }
}
