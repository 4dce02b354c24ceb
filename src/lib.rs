//! Resonance Viz library - audio-reactive sacred geometry engine

pub mod analysis;
pub mod audio;
pub mod camera;
pub mod cli;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod mode;
pub mod params;
pub mod prime;
pub mod render;
pub mod theme;
