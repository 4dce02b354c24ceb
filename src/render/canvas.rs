//! Software surface: fills tessellated frames into a tiny-skia pixmap.
//!
//! Used for headless recording and tests. Triangles are filled one at a
//! time, flat-shaded and without anti-aliasing, source-over like the GPU
//! pipeline's `ALPHA_BLENDING` state.

use std::path::Path;

use image::RgbaImage;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use super::tessellate::{ColorVertex, Frame};
use super::{RenderSurface, SurfaceBackend, SurfaceSize};
use crate::error::{RenderError, RenderResult};

pub struct CanvasSurface {
    /// `None` once released
    pixmap: Option<Pixmap>,
    size: SurfaceSize,
    frames_drawn: u64,
}

fn blank(size: SurfaceSize) -> Option<Pixmap> {
    Pixmap::new(size.width.max(1), size.height.max(1))
}

impl CanvasSurface {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            pixmap: blank(size),
            size,
            frames_drawn: 0,
        }
    }

    /// Straight-alpha copy of the last drawn frame; empty once released
    pub fn image(&self) -> RgbaImage {
        let Some(pixmap) = &self.pixmap else {
            return RgbaImage::new(0, 0);
        };
        RgbaImage::from_fn(pixmap.width(), pixmap.height(), |x, y| {
            image::Rgba(self.pixel(x, y).unwrap_or_default())
        })
    }

    /// RGBA at a physical pixel, `None` outside the pixmap
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let color = self.pixmap.as_ref()?.pixel(x, y)?.demultiply();
        Some([color.red(), color.green(), color.blue(), color.alpha()])
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Write the last drawn frame as PNG
    pub fn save_png(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        if self.pixmap.is_none() {
            return Err(RenderError::Released);
        }
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.image().save(path)?;
        Ok(())
    }
}

/// Fill one triangle with the mean of its vertex colors
fn fill_triangle(pixmap: &mut Pixmap, triangle: &[ColorVertex]) {
    let mut rgba = [0.0f32; 4];
    for vertex in triangle {
        for (channel, value) in rgba.iter_mut().zip(vertex.color) {
            *channel += value.clamp(0.0, 1.0) / 3.0;
        }
    }
    if rgba[3] <= 0.0 {
        return;
    }
    let Some(color) = tiny_skia::Color::from_rgba(rgba[0], rgba[1], rgba[2], rgba[3]) else {
        return;
    };

    let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
    let to_px = |v: &ColorVertex| {
        (
            (v.position[0] + 1.0) * 0.5 * w,
            (1.0 - v.position[1]) * 0.5 * h,
        )
    };
    let mut builder = PathBuilder::new();
    let (x, y) = to_px(&triangle[0]);
    builder.move_to(x, y);
    for vertex in &triangle[1..] {
        let (x, y) = to_px(vertex);
        builder.line_to(x, y);
    }
    builder.close();
    let Some(path) = builder.finish() else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color(color);
    // Shared edges between adjacent triangles must not blend twice
    paint.anti_alias = false;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
}

impl RenderSurface for CanvasSurface {
    fn backend(&self) -> SurfaceBackend {
        SurfaceBackend::Canvas
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        if self.pixmap.is_none() || size == self.size {
            return;
        }
        log::debug!(
            "canvas resize {}x{} → {}x{}",
            self.size.width,
            self.size.height,
            size.width,
            size.height
        );
        self.pixmap = blank(size);
        self.size = size;
    }

    fn draw(&mut self, frame: &Frame) -> RenderResult<()> {
        let pixmap = self.pixmap.as_mut().ok_or(RenderError::Released)?;

        let [r, g, b, a] = frame.clear.to_rgba8();
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
        for triangle in frame.vertices.chunks_exact(3) {
            fill_triangle(pixmap, triangle);
        }
        self.frames_drawn += 1;
        Ok(())
    }

    fn release(&mut self) {
        if self.pixmap.take().is_some() {
            log::debug!("canvas released after {} frames", self.frames_drawn);
        }
    }

    fn is_released(&self) -> bool {
        self.pixmap.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Color;

    fn vertex(x: f32, y: f32, color: Color) -> ColorVertex {
        ColorVertex {
            position: [x, y],
            color: color.to_array(),
        }
    }

    /// Two triangles covering the whole viewport
    fn fullscreen(color: Color) -> Vec<ColorVertex> {
        vec![
            vertex(-1.0, -1.0, color),
            vertex(1.0, -1.0, color),
            vertex(1.0, 1.0, color),
            vertex(-1.0, -1.0, color),
            vertex(1.0, 1.0, color),
            vertex(-1.0, 1.0, color),
        ]
    }

    fn canvas() -> CanvasSurface {
        CanvasSurface::new(SurfaceSize::new(16, 8, 1.0))
    }

    #[test]
    fn test_clear_fills_every_pixel() {
        let mut surface = canvas();
        let clear = Color::from_hex(0x102030);
        surface.draw(&Frame::empty(clear)).unwrap();
        assert!(surface.image().pixels().all(|p| p.0 == clear.to_rgba8()));
        assert_eq!(surface.frames_drawn(), 1);
    }

    #[test]
    fn test_opaque_triangles_cover_viewport() {
        let mut surface = canvas();
        let frame = Frame {
            clear: Color::BLACK,
            vertices: fullscreen(Color::WHITE),
        };
        surface.draw(&frame).unwrap();
        assert!(surface.image().pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_half_alpha_blends_over_clear() {
        let mut surface = canvas();
        let frame = Frame {
            clear: Color::BLACK,
            vertices: fullscreen(Color::WHITE.with_alpha(0.5)),
        };
        surface.draw(&frame).unwrap();
        let [r, g, b, a] = surface.pixel(3, 3).unwrap();
        for channel in [r, g, b] {
            assert!((127..=128).contains(&channel), "{}", channel);
        }
        assert_eq!(a, 255);
    }

    #[test]
    fn test_triangle_covers_only_its_half() {
        let mut surface = canvas();
        // upper-left half of the viewport
        let frame = Frame {
            clear: Color::BLACK,
            vertices: vec![
                vertex(-1.0, 1.0, Color::WHITE),
                vertex(1.0, 1.0, Color::WHITE),
                vertex(-1.0, -1.0, Color::WHITE),
            ],
        };
        surface.draw(&frame).unwrap();
        assert_eq!(surface.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(15, 7), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_resize_reallocates() {
        let mut surface = canvas();
        surface.resize(SurfaceSize::new(32, 24, 2.0));
        assert_eq!(surface.image().dimensions(), (32, 24));
        assert_eq!(surface.size().logical(), glam::Vec2::new(16.0, 12.0));
        assert!(surface.pixel(31, 23).is_some());
        assert!(surface.pixel(32, 0).is_none());
    }

    #[test]
    fn test_draw_after_release_fails() {
        let mut surface = canvas();
        surface.release();
        assert!(surface.is_released());
        assert!(matches!(
            surface.draw(&Frame::empty(Color::BLACK)),
            Err(RenderError::Released)
        ));
    }

    #[test]
    fn test_triangle_is_flat_shaded() {
        let mut surface = canvas();
        let frame = Frame {
            clear: Color::BLACK,
            vertices: vec![
                vertex(-1.0, 1.0, Color::WHITE),
                vertex(1.0, 1.0, Color::BLACK),
                vertex(-1.0, -1.0, Color::BLACK),
            ],
        };
        surface.draw(&frame).unwrap();
        let [r, _, _, _] = surface.pixel(0, 0).unwrap();
        assert!((84..=86).contains(&r), "{}", r);
    }

    #[test]
    fn test_save_after_release_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut surface = canvas();
        surface.release();
        assert_eq!(surface.image().dimensions(), (0, 0));
        assert!(matches!(
            surface.save_png(dir.path().join("late.png")),
            Err(RenderError::Released)
        ));
    }

    #[test]
    fn test_save_png_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames").join("frame_0000.png");
        let mut surface = canvas();
        surface.draw(&Frame::empty(Color::WHITE)).unwrap();
        surface.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (16, 8));
    }
}
