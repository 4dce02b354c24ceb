//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::audio::{SpectrumSource, ToneSource, WavSource};
use crate::error::{AudioError, ConfigError};
use crate::mode::VisualizationMode;
use crate::params::{EngineConfig, RecordingConfig};
use crate::theme::{Chakra, Palette, PaletteSelection};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "resonance-viz")]
#[command(about = "Audio-reactive sacred geometry visualizer", long_about = None)]
pub struct Args {
    /// Visualization mode, e.g. flowerOfLife, merkaba, primeFlow
    #[arg(long, value_name = "MODE", default_value = "flowerOfLife")]
    pub mode: String,

    /// Selected chakra (root … crown)
    #[arg(long, value_name = "LABEL", default_value = "crown")]
    pub chakra: String,

    /// Palette: classic, pastel, neon, cosmic
    #[arg(long, value_name = "NAME")]
    pub palette: Option<String>,

    /// Use the alternate (pastel) palette when no palette is named
    #[arg(long)]
    pub alternate: bool,

    /// Drive the visuals from a WAV file
    #[arg(long, value_name = "PATH", conflicts_with = "tone")]
    pub wav: Option<PathBuf>,

    /// Drive the visuals from a test tone (comma-separated Hz)
    #[arg(long, value_name = "HZ,...", value_delimiter = ',')]
    pub tone: Vec<f32>,

    /// Session seed for reproducible particles
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Number of analysis bands
    #[arg(long, value_name = "N")]
    pub bands: Option<usize>,

    /// YAML file overriding engine parameters
    #[arg(long, value_name = "YAML")]
    pub config: Option<PathBuf>,

    /// Render headless to PNG frames (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,
}

impl Args {
    /// Defaults, then the YAML file, then flags
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.render.seed = seed;
        }
        if let Some(bands) = self.bands {
            config.analysis.band_count = bands;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn mode(&self) -> VisualizationMode {
        VisualizationMode::parse_or_default(&self.mode)
    }

    pub fn chakra(&self) -> Chakra {
        Chakra::parse_or_default(&self.chakra)
    }

    /// A named palette wins over `--alternate`
    pub fn palette_selection(&self) -> PaletteSelection {
        match &self.palette {
            Some(name) => match Palette::parse(name) {
                Some(palette) => PaletteSelection::Named(palette),
                None => {
                    log::warn!("unknown palette {:?}, using classic", name);
                    PaletteSelection::Named(Palette::Classic)
                }
            },
            None => PaletteSelection::Alternate(self.alternate),
        }
    }

    /// Recording configuration if recording mode is enabled
    pub fn recording_config(&self) -> Option<RecordingConfig> {
        self.record.map(RecordingConfig::new)
    }

    /// Spectrum source from `--wav` or `--tone`; `None` when neither is given
    pub fn file_source(
        &self,
        config: &EngineConfig,
    ) -> Result<Option<Box<dyn SpectrumSource>>, AudioError> {
        if let Some(path) = &self.wav {
            return Ok(Some(Box::new(WavSource::open(path, config.fft.clone())?)));
        }
        if !self.tone.is_empty() {
            return Ok(Some(Box::new(ToneSource::new(
                self.tone.clone(),
                config.fft.clone(),
            )?)));
        }
        Ok(None)
    }
}
