//! Wave: bands drawn as a smoothed, mirrored polyline across the screen.

use glam::Vec3;

use super::resources::ResourceStore;
use super::scene::{Primitive, Scene, Stroke};
use super::{FrameInput, GeneratorConfig, GeometryGenerator, Growth};
use crate::error::{GeometryError, GeometryResult};
use crate::mode::VisualizationMode;
use crate::theme::Color;

/// Share of the previous frame kept when smoothing
const SMOOTHING: f32 = 0.5;

/// Peak displacement as a share of the viewport height
const AMPLITUDE: f32 = 0.4;

pub struct WaveGenerator {
    growth: Growth,
    smoothed: Vec<f32>,
    initialized: bool,
}

impl WaveGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            growth: Growth::new(config.growth.clone()),
            smoothed: Vec::new(),
            initialized: false,
        }
    }
}

impl GeometryGenerator for WaveGenerator {
    fn mode(&self) -> VisualizationMode {
        VisualizationMode::Wave
    }

    fn init(&mut self, _resources: &mut ResourceStore) -> GeometryResult<()> {
        self.smoothed.clear();
        self.growth.reset();
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self, input: &FrameInput<'_>, _resources: &ResourceStore) -> GeometryResult<Scene> {
        if !self.initialized {
            return Err(GeometryError::NotInitialized(self.mode()));
        }
        self.growth.step(input.audio_active, input.new_activations);

        let count = input.bands.len();
        self.smoothed.resize(count, 0.0);
        for (i, value) in self.smoothed.iter_mut().enumerate() {
            *value = *value * SMOOTHING + input.band(i) * (1.0 - SMOOTHING);
        }

        let (width, height) = (input.viewport.x, input.viewport.y);
        let middle = height * 0.5;
        let amplitude = height * AMPLITUDE * self.growth.scale();
        let opacity = self.growth.opacity();
        let step = width / (count.max(2) - 1) as f32;

        let upper: Vec<Vec3> = self
            .smoothed
            .iter()
            .enumerate()
            .map(|(i, v)| Vec3::new(i as f32 * step, middle - v * amplitude, 0.0))
            .collect();
        let lower: Vec<Vec3> = upper
            .iter()
            .map(|p| Vec3::new(p.x, 2.0 * middle - p.y, 0.0))
            .collect();

        let reflection = input.theme.cycle(input.selected_chakra.index() + 4);

        let mut scene = Scene::screen(Color::BACKGROUND);
        scene.push(Primitive::Polyline {
            points: lower,
            closed: false,
            stroke: Stroke::new(reflection.fade(opacity * 0.4), 1.5),
        });

        let highlights: Vec<Primitive> = upper
            .iter()
            .enumerate()
            .filter(|(i, _)| input.is_prime_band(*i))
            .map(|(_, &position)| Primitive::Point {
                position,
                size: 8.0,
                color: Color::HIGHLIGHT.fade(opacity),
            })
            .collect();

        scene.push(Primitive::Polyline {
            points: upper,
            closed: false,
            stroke: Stroke::new(input.theme.accent.fade(opacity), 2.0 + input.bass * 2.0),
        });
        scene.extend(highlights);
        Ok(scene)
    }

    fn dispose(&mut self, _resources: &mut ResourceStore) {
        self.smoothed.clear();
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{testing, PrimitiveKind};
    use crate::prime::PrimeActivation;

    #[test]
    fn test_polyline_spans_viewport() {
        let mut generator = WaveGenerator::new(&GeneratorConfig::default());
        let (quiet, _) = testing::exercise(&mut generator);
        assert_eq!(quiet.count(PrimitiveKind::Polyline), 2);

        let Primitive::Polyline { points, .. } = &quiet.primitives[1] else {
            panic!("expected the main polyline");
        };
        assert_eq!(points.len(), testing::BANDS);
        assert_eq!(points[0].x, 0.0);
        assert!((points[testing::BANDS - 1].x - 800.0).abs() < 1e-3);
        // silence sits on the centre line
        assert!(points.iter().all(|p| p.y == 300.0));
    }

    #[test]
    fn test_smoothing_converges() {
        let mut generator = WaveGenerator::new(&GeneratorConfig::default());
        let mut resources = ResourceStore::new();
        generator.init(&mut resources).unwrap();
        testing::drive(&mut generator, &mut resources, 255.0, 1);
        assert!((generator.smoothed[0] - 0.5).abs() < 1e-6);
        testing::drive(&mut generator, &mut resources, 255.0, 40);
        assert!((generator.smoothed[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_prime_bins_marked() {
        let mut generator = WaveGenerator::new(&GeneratorConfig::default());
        let mut resources = ResourceStore::new();
        generator.init(&mut resources).unwrap();
        let bands = vec![0.0; testing::BANDS];
        let activations = [
            PrimeActivation {
                bin_index: 6,
                candidate: 7,
                mapped_frequency: 70,
                timestamp: 0.0,
            },
            PrimeActivation {
                bin_index: 10,
                candidate: 11,
                mapped_frequency: 110,
                timestamp: 0.5,
            },
        ];
        let scene = generator
            .update(&testing::frame(&bands, &activations, 1.0), &resources)
            .unwrap();
        assert_eq!(scene.count(PrimitiveKind::Point), 2);
    }
}
