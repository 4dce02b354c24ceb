//! Live source: Glicol synthesis played through cpal, analyzed on a thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use glicol::Engine;

use super::synthesis::GLICOL_COMPOSITION;
use super::{FrequencySpectrum, SpectrumAnalyzer, SpectrumSource};
use crate::error::AudioError;
use crate::params::{audio_constants::BLOCK_SIZE, FftConfig};

/// Safety limiter: hard clip to ±0.5 to prevent ear damage
const CLIP: f32 = 0.5;

/// Audio system managing synthesis and FFT analysis
pub struct AudioSystem {
    /// Latest spectrum published by the FFT thread
    latest: Arc<Mutex<Option<FrequencySpectrum>>>,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,

    stop: Arc<AtomicBool>,
    fft_thread: Option<thread::JoinHandle<()>>,
}

impl AudioSystem {
    /// Create and start the audio system
    pub fn new(fft_config: FftConfig) -> Result<Self, AudioError> {
        let mut analyzer = SpectrumAnalyzer::new(fft_config.clone())?;

        let mut engine = Engine::<BLOCK_SIZE>::new();
        engine.set_sr(fft_config.sample_rate_hz);
        engine.update_with_code(GLICOL_COMPOSITION);
        engine
            .update()
            .map_err(|e| AudioError::Synthesis(format!("{:?}", e)))?;

        // Shared between the audio callback and the FFT thread
        let engine = Arc::new(Mutex::new(engine));
        let engine_clone = Arc::clone(&engine);
        let pcm = Arc::new(Mutex::new(Vec::<f32>::new()));
        let pcm_clone = Arc::clone(&pcm);

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Device("no audio output device found".to_string()))?;
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::Device(format!("failed to get audio config: {}", e)))?;

        log::info!(
            "audio: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.sample_rate().0
        );

        let channels = config.channels().max(1) as usize;
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut engine = engine_clone.lock().unwrap_or_else(PoisonError::into_inner);
                    let mut pcm = pcm_clone.lock().unwrap_or_else(PoisonError::into_inner);

                    let frames_needed = data.len() / channels;
                    let mut frame_idx = 0;

                    // Generate blocks until the device buffer is full
                    while frame_idx < frames_needed {
                        let (buffers, _) = engine.next_block(vec![]);
                        let samples_to_copy = (frames_needed - frame_idx).min(BLOCK_SIZE);

                        for i in 0..samples_to_copy {
                            let left = buffers[0][i].clamp(-CLIP, CLIP);
                            let right = buffers[1][i].clamp(-CLIP, CLIP);
                            let out = (frame_idx + i) * channels;
                            for (c, slot) in data[out..out + channels].iter_mut().enumerate() {
                                *slot = if c % 2 == 0 { left } else { right };
                            }
                            pcm.push(left);
                        }
                        frame_idx += samples_to_copy;
                    }
                },
                |err| log::error!("audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::Device(format!("failed to build audio stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::Device(format!("failed to start audio stream: {}", e)))?;

        let latest = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));
        let fft_thread = {
            let latest = Arc::clone(&latest);
            let stop = Arc::clone(&stop);
            let interval = Duration::from_millis(fft_config.update_interval_ms);
            let size = fft_config.fft_size;
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    thread::sleep(interval);
                    let mut pcm = pcm.lock().unwrap_or_else(PoisonError::into_inner);
                    if pcm.len() < size {
                        continue;
                    }
                    let spectrum = analyzer.process(&pcm);

                    // 50% overlap (drain half the buffer), dropping any backlog
                    let keep = size / 2;
                    let excess = pcm.len() - keep;
                    pcm.drain(..excess);
                    drop(pcm);

                    *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(spectrum);
                }
            })
        };

        Ok(Self {
            latest,
            _stream: stream,
            stop,
            fft_thread: Some(fft_thread),
        })
    }

    /// Latest spectrum, `None` until the first analysis window fills
    pub fn snapshot(&self) -> Option<FrequencySpectrum> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SpectrumSource for AudioSystem {
    fn spectrum_at(&mut self, _time_s: f64) -> Option<FrequencySpectrum> {
        self.snapshot()
    }

    fn describe(&self) -> String {
        "live synthesis".to_string()
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.fft_thread.take() {
            if handle.join().is_err() {
                log::warn!("FFT thread panicked");
            }
        }
    }
}
