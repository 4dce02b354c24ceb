//! Circle: bands as radial segments around a bass-driven ring.

use std::f32::consts::TAU;

use glam::Vec3;

use super::resources::ResourceStore;
use super::scene::{Primitive, Scene, Stroke};
use super::{FrameInput, GeneratorConfig, GeometryGenerator, Growth};
use crate::error::{GeometryError, GeometryResult};
use crate::mode::VisualizationMode;
use crate::theme::Color;

/// Inner ring radius as a share of the shorter viewport side
const INNER: f32 = 0.18;

/// Full-scale segment length as a share of the shorter viewport side
const REACH: f32 = 0.3;

pub struct RadialGenerator {
    growth: Growth,
    rotation: f32,
    initialized: bool,
}

impl RadialGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            growth: Growth::new(config.growth.clone()),
            rotation: 0.0,
            initialized: false,
        }
    }
}

impl GeometryGenerator for RadialGenerator {
    fn mode(&self) -> VisualizationMode {
        VisualizationMode::Circle
    }

    fn init(&mut self, _resources: &mut ResourceStore) -> GeometryResult<()> {
        self.rotation = 0.0;
        self.growth.reset();
        self.initialized = true;
        Ok(())
    }

    fn update(&mut self, input: &FrameInput<'_>, _resources: &ResourceStore) -> GeometryResult<Scene> {
        if !self.initialized {
            return Err(GeometryError::NotInitialized(self.mode()));
        }
        self.growth.step(input.audio_active, input.new_activations);
        self.rotation = (self.rotation + input.delta_time * (0.1 + input.intensity * 0.6)) % TAU;

        let center = Vec3::new(input.viewport.x * 0.5, input.viewport.y * 0.5, 0.0);
        let side = input.viewport.x.min(input.viewport.y);
        let inner = side * INNER * (1.0 + input.bass * 0.3);
        let reach = side * REACH * self.growth.scale();
        let opacity = self.growth.opacity();
        let count = input.bands.len().max(1);
        let segment_width = (TAU * inner / count as f32 * 0.6).max(1.0);

        let mut scene = Scene::screen(Color::BACKGROUND);
        scene.push(Primitive::Circle {
            center,
            radius: inner,
            stroke: Some(Stroke::new(input.theme.accent.fade(opacity), 2.0)),
            fill: Some(input.theme.accent.fade(opacity * input.bass * 0.2)),
        });

        for i in 0..input.bands.len() {
            let angle = i as f32 / count as f32 * TAU + self.rotation;
            let direction = Vec3::new(angle.cos(), angle.sin(), 0.0);
            let length = input.band(i) * reach + 1.0;
            let color = if input.is_prime_band(i) {
                Color::HIGHLIGHT
            } else {
                input.theme.cycle(i * 7 / count)
            };
            scene.push(Primitive::Line {
                from: center + direction * inner,
                to: center + direction * (inner + length),
                stroke: Stroke::new(color.fade(opacity), segment_width),
            });
        }
        Ok(scene)
    }

    fn dispose(&mut self, _resources: &mut ResourceStore) {
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{testing, PrimitiveKind};

    #[test]
    fn test_one_segment_per_band() {
        let mut generator = RadialGenerator::new(&GeneratorConfig::default());
        let (quiet, loud) = testing::exercise(&mut generator);
        assert_eq!(quiet.count(PrimitiveKind::Line), testing::BANDS);
        assert_eq!(loud.count(PrimitiveKind::Line), testing::BANDS);
        assert_eq!(loud.count(PrimitiveKind::Circle), 1);
    }

    #[test]
    fn test_segments_start_on_inner_ring() {
        let mut generator = RadialGenerator::new(&GeneratorConfig::default());
        let mut resources = ResourceStore::new();
        generator.init(&mut resources).unwrap();
        let scene = testing::drive(&mut generator, &mut resources, 0.0, 1);

        let center = Vec3::new(400.0, 300.0, 0.0);
        let inner = 600.0 * INNER;
        scene.visit(|primitive, _| {
            if let Primitive::Line { from, to, .. } = primitive {
                assert!(((*from - center).length() - inner).abs() < 1e-2);
                // silence leaves a 1px stub
                assert!(((*to - *from).length() - 1.0).abs() < 1e-2);
            }
        });
    }
}
