//! Bars: one vertical bar per band with falling peak markers.

use glam::{Vec2, Vec3};

use super::resources::ResourceStore;
use super::scene::{Primitive, Scene, Stroke};
use super::{FrameInput, GeneratorConfig, GeometryGenerator, Growth};
use crate::error::{GeometryError, GeometryResult};
use crate::mode::VisualizationMode;
use crate::theme::Color;

/// Peak markers fall this fraction of full height per second
const PEAK_FALL: f32 = 0.5;

/// Share of the viewport height a full-scale bar covers
const MAX_HEIGHT: f32 = 0.8;

pub struct BarsGenerator {
    growth: Growth,
    peaks: Vec<f32>,
    initialized: bool,
}

impl BarsGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            growth: Growth::new(config.growth.clone()),
            peaks: Vec::new(),
            initialized: false,
        }
    }

    /// Current peak-hold levels (0-1)
    pub fn peaks(&self) -> &[f32] {
        &self.peaks
    }
}

impl GeometryGenerator for BarsGenerator {
    fn mode(&self) -> VisualizationMode {
        VisualizationMode::Bars
    }

    fn init(&mut self, _resources: &mut ResourceStore) -> GeometryResult<()> {
        self.peaks.clear();
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
        self.peaks.resize(count, 0.0);

        let (width, height) = (input.viewport.x, input.viewport.y);
        let bar_width = width / count.max(1) as f32;
        let gap = (bar_width * 0.15).min(2.0);
        let scale = self.growth.scale();
        let opacity = self.growth.opacity();
        let low = input.theme.accent;
        let high = input.theme.cycle(input.selected_chakra.index() + 3);

        let mut scene = Scene::screen(Color::BACKGROUND);
        for (i, peak) in self.peaks.iter_mut().enumerate() {
            let level = input.band(i);
            *peak = (*peak - PEAK_FALL * input.delta_time).max(level);

            let x = i as f32 * bar_width;
            let bar_height = level * height * MAX_HEIGHT * scale;
            let color = if input.is_prime_band(i) {
                Color::HIGHLIGHT
            } else {
                low.lerp(high, i as f32 / count as f32)
            };

            scene.push(Primitive::Rect {
                min: Vec2::new(x + gap, height - bar_height),
                max: Vec2::new(x + bar_width - gap, height),
                fill: color.fade(opacity),
            });

            let peak_y = height - *peak * height * MAX_HEIGHT * scale;
            scene.push(Primitive::Rect {
                min: Vec2::new(x + gap, peak_y - 2.0),
                max: Vec2::new(x + bar_width - gap, peak_y),
                fill: color.lighten(0.4).fade(opacity * 0.8),
            });
        }

        scene.push(Primitive::Line {
            from: Vec3::new(0.0, height - 1.0, 0.0),
            to: Vec3::new(width, height - 1.0, 0.0),
            stroke: Stroke::new(low.fade(opacity * 0.5), 1.0),
        });
        Ok(scene)
    }

    fn dispose(&mut self, _resources: &mut ResourceStore) {
        self.peaks.clear();
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{testing, PrimitiveKind};
    use crate::prime::PrimeActivation;

    #[test]
    fn test_one_bar_and_peak_per_band() {
        let mut generator = BarsGenerator::new(&GeneratorConfig::default());
        let (quiet, loud) = testing::exercise(&mut generator);
        assert_eq!(quiet.count(PrimitiveKind::Rect), testing::BANDS * 2);
        assert_eq!(loud.count(PrimitiveKind::Rect), testing::BANDS * 2);
    }

    #[test]
    fn test_full_band_reaches_max_height_when_grown() {
        let mut generator = BarsGenerator::new(&GeneratorConfig::default());
        let mut resources = ResourceStore::new();
        generator.init(&mut resources).unwrap();
        let scene = testing::drive(&mut generator, &mut resources, 255.0, 120);

        let Primitive::Rect { min, max, .. } = &scene.primitives[0] else {
            panic!("first primitive should be a bar");
        };
        assert!((max.y - min.y - 600.0 * MAX_HEIGHT).abs() < 1e-3);
    }

    #[test]
    fn test_peak_holds_then_falls() {
        let mut generator = BarsGenerator::new(&GeneratorConfig::default());
        let mut resources = ResourceStore::new();
        generator.init(&mut resources).unwrap();
        testing::drive(&mut generator, &mut resources, 255.0, 1);
        assert_eq!(generator.peaks()[0], 1.0);

        testing::drive(&mut generator, &mut resources, 0.0, 30);
        let expected = 1.0 - PEAK_FALL * 30.0 / 60.0;
        assert!((generator.peaks()[0] - expected).abs() < 1e-4);
    }

    #[test]
    fn test_prime_band_highlighted() {
        let mut generator = BarsGenerator::new(&GeneratorConfig::default());
        let mut resources = ResourceStore::new();
        generator.init(&mut resources).unwrap();

        let bands = vec![100.0; testing::BANDS];
        let activations = [PrimeActivation {
            bin_index: 22,
            candidate: 23,
            mapped_frequency: 230,
            timestamp: 1.0,
        }];
        let scene = generator
            .update(&testing::frame(&bands, &activations, 1.0), &resources)
            .unwrap();

        let Primitive::Rect { fill, .. } = &scene.primitives[22 * 2] else {
            panic!("expected bar rect");
        };
        assert_eq!(fill.r, Color::HIGHLIGHT.r);
        assert_eq!(fill.g, Color::HIGHLIGHT.g);
    }
}
