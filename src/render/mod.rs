//! Render surfaces, tessellation and the tick-driven render loop.
//!
//! Both backends consume the same tessellated [`Frame`]: the software
//! canvas rasterizes it into an RGBA image, the GPU surface uploads it to a
//! wgpu vertex buffer. They share one resize and release contract.

pub mod canvas;
pub mod gpu;
pub mod render_loop;
pub mod scheduler;
pub mod tessellate;

pub use canvas::CanvasSurface;
pub use gpu::GpuSurface;
pub use render_loop::{FrameStats, LoopState, RenderLoop, TickOutcome};
pub use scheduler::{CallbackScheduler, ManualScheduler, TickHandle, TickScheduler};
pub use tessellate::{tessellate, ColorVertex, Frame};

use glam::Vec2;

use crate::error::RenderResult;

/// Physical surface size plus the device pixel ratio it was derived from
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSize {
    /// Physical pixels
    pub width: u32,

    /// Physical pixels
    pub height: u32,

    /// Physical pixels per logical pixel
    pub pixel_ratio: f32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Size in logical pixels, the space generators draw in
    pub fn logical(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) / self.pixel_ratio
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Container dimensions reported by the host, in logical pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainerBounds {
    pub width: f32,
    pub height: f32,

    /// Device pixel density
    pub pixel_ratio: f32,
}

impl ContainerBounds {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio,
        }
    }

    /// Physical size, or `None` for zero-area or non-finite bounds
    pub fn to_surface_size(&self) -> Option<SurfaceSize> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(self.width) || !valid(self.height) || !valid(self.pixel_ratio) {
            return None;
        }
        let width = (self.width * self.pixel_ratio).round() as u32;
        let height = (self.height * self.pixel_ratio).round() as u32;
        let size = SurfaceSize::new(width, height, self.pixel_ratio);
        (!size.is_empty()).then_some(size)
    }
}

/// Which backend a surface uses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceBackend {
    /// Immediate-mode software rasterizer
    Canvas,
    /// wgpu swapchain
    Gpu,
}

/// A drawing target exclusively owned by the render loop
pub trait RenderSurface {
    fn backend(&self) -> SurfaceBackend;

    fn size(&self) -> SurfaceSize;

    /// Reallocate backing storage for a new size
    fn resize(&mut self, size: SurfaceSize);

    /// Clear and draw one frame
    fn draw(&mut self, frame: &Frame) -> RenderResult<()>;

    /// Free backing storage; later draws fail with `RenderError::Released`
    fn release(&mut self);

    fn is_released(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_scale_by_pixel_ratio() {
        let size = ContainerBounds::new(800.0, 600.0, 2.0)
            .to_surface_size()
            .unwrap();
        assert_eq!((size.width, size.height), (1600, 1200));
        assert_eq!(size.logical(), Vec2::new(800.0, 600.0));
    }

    #[test]
    fn test_degenerate_bounds_rejected() {
        for bounds in [
            ContainerBounds::new(0.0, 600.0, 1.0),
            ContainerBounds::new(800.0, 0.0, 1.0),
            ContainerBounds::new(800.0, 600.0, 0.0),
            ContainerBounds::new(f32::NAN, 600.0, 1.0),
            ContainerBounds::new(800.0, f32::INFINITY, 1.0),
            ContainerBounds::new(0.2, 0.2, 1.0),
        ] {
            assert!(bounds.to_surface_size().is_none(), "{:?}", bounds);
        }
    }
}
