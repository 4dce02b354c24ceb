//! Error types for the visualization engine and its host.
//!
//! Nothing in the per-frame path is fatal: the render loop logs these and
//! skips the frame. They only terminate the program during startup.

use thiserror::Error;

use crate::mode::VisualizationMode;

/// Failures raised by a geometry generator while building a frame
#[derive(Error, Debug)]
pub enum GeometryError {
    /// A mesh handle did not resolve in the resource store
    #[error("mesh {0} is not allocated")]
    MissingMesh(u32),

    /// The generator was asked to update before `init`
    #[error("{0} generator used before init")]
    NotInitialized(VisualizationMode),

    /// Computation produced a non-finite coordinate
    #[error("non-finite geometry in {mode}: {detail}")]
    NonFinite {
        mode: VisualizationMode,
        detail: String,
    },
}

/// Failures raised by a render surface
#[derive(Error, Debug)]
pub enum RenderError {
    /// GPU adapter/device/surface setup failed
    #[error("GPU setup failed: {0}")]
    Setup(String),

    /// The swapchain could not provide a frame
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    /// Surface has been released and can no longer draw
    #[error("surface already released")]
    Released,

    /// Writing a captured frame failed
    #[error("frame capture failed: {0}")]
    Capture(#[from] image::ImageError),

    /// I/O error while preparing output directories
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single frame was skipped
#[derive(Error, Debug)]
pub enum FrameError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Failures raised by spectrum sources
#[derive(Error, Debug)]
pub enum AudioError {
    /// FFT configuration is unusable
    #[error("invalid FFT config: {0}")]
    InvalidConfig(String),

    /// WAV decoding failed
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio device setup failed
    #[error("audio device error: {0}")]
    Device(String),

    /// Synthesis engine failed to start
    #[error("synthesis error: {0}")]
    Synthesis(String),
}

/// Failures loading configuration files
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML did not match the config schema
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// A value is out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Top-level error for the binary
#[derive(Error, Debug)]
pub enum VizError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
}

/// Result alias for geometry generation
pub type GeometryResult<T> = std::result::Result<T, GeometryError>;

/// Result alias for rendering
pub type RenderResult<T> = std::result::Result<T, RenderError>;
