//! Software rasterizer implementing [`Surface`].
//!
//! Pixels are stored as straight (non-premultiplied) RGB in `0..=1` over an
//! opaque black backdrop, and every primitive is composited source-over with
//! a one-pixel anti-aliased edge. Good enough for snapshots and tests; not
//! meant to be fast.

use crate::surface::{Extent, Glow, RadialGradient, Rgba, Surface};
use glam::Vec2;

pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<[f32; 3]>,
    glow: Option<Glow>,
}

impl PixelSurface {
    /// A `width` x `height` surface cleared to opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        PixelSurface {
            width,
            height,
            pixels: vec![[0.0; 3]; width as usize * height as usize],
            glow: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Drop all content and resize. Mirrors a canvas being resized by its host.
    pub fn resize(&mut self, width: u32, height: u32) {
        *self = PixelSurface::new(width, height);
    }

    /// RGB of the pixel at (`x`, `y`) in `0..=255`, or `None` when out of range.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let px = self.pixels[(y * self.width + x) as usize];
        Some([to_byte(px[0]), to_byte(px[1]), to_byte(px[2])])
    }

    /// Row-major RGBA8 buffer, alpha always 255.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for px in &self.pixels {
            out.extend_from_slice(&[to_byte(px[0]), to_byte(px[1]), to_byte(px[2]), 255]);
        }
        out
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgba, coverage: f32) {
        let alpha = (color.a * coverage).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let px = &mut self.pixels[(y * self.width + x) as usize];
        let src = [color.r / 255.0, color.g / 255.0, color.b / 255.0];
        for (dst, src) in px.iter_mut().zip(src) {
            *dst = src.clamp(0.0, 1.0) * alpha + *dst * (1.0 - alpha);
        }
    }

    // Visit every pixel whose center lies within `reach` of `center`, passing
    // the pixel coordinates and the distance from `center`.
    fn scan_disc(&mut self, center: Vec2, reach: f32, mut visit: impl FnMut(&mut Self, u32, u32, f32)) {
        if reach <= 0.0 || self.width == 0 || self.height == 0 {
            return;
        }
        let x0 = (center.x - reach).floor().max(0.0) as u32;
        let y0 = (center.y - reach).floor().max(0.0) as u32;
        let x1 = ((center.x + reach).ceil().max(0.0) as u32).min(self.width - 1);
        let y1 = ((center.y + reach).ceil().max(0.0) as u32).min(self.height - 1);
        if x0 > x1 || y0 > y1 {
            return;
        }
        for y in y0..=y1 {
            for x in x0..=x1 {
                let sample = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let distance = sample.distance(center);
                if distance <= reach {
                    visit(self, x, y, distance);
                }
            }
        }
    }

    fn draw_halo(&mut self, center: Vec2, radius: f32, glow: Glow) {
        if glow.blur <= 0.0 {
            return;
        }
        self.scan_disc(center, radius + glow.blur, |surface, x, y, distance| {
            let falloff = 1.0 - ((distance - radius).max(0.0) / glow.blur);
            surface.blend(x, y, glow.color, falloff * falloff);
        });
    }
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn edge_coverage(inside_by: f32) -> f32 {
    (inside_by + 0.5).clamp(0.0, 1.0)
}

impl Surface for PixelSurface {
    fn size(&self) -> Extent {
        Extent::new(self.width as f32, self.height as f32)
    }

    fn fill_rect(&mut self, origin: Vec2, extent: Extent, color: Rgba) {
        let x0 = origin.x.max(0.0).round() as u32;
        let y0 = origin.y.max(0.0).round() as u32;
        let x1 = ((origin.x + extent.width).max(0.0).round() as u32).min(self.width);
        let y1 = ((origin.y + extent.height).max(0.0).round() as u32).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color, 1.0);
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if let Some(glow) = self.glow {
            self.draw_halo(center, radius, glow);
        }
        self.scan_disc(center, radius + 0.5, |surface, x, y, distance| {
            surface.blend(x, y, color, edge_coverage(radius - distance));
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba, line_width: f32) {
        let half = line_width.max(0.0) * 0.5;
        self.scan_disc(center, radius + half + 0.5, |surface, x, y, distance| {
            let coverage = edge_coverage(half - (distance - radius).abs());
            surface.blend(x, y, color, coverage);
        });
    }

    fn fill_radial_gradient(&mut self, center: Vec2, radius: f32, gradient: &RadialGradient) {
        if radius <= 0.0 {
            return;
        }
        self.scan_disc(center, radius + 0.5, |surface, x, y, distance| {
            let color = gradient.color_at(distance / radius);
            surface.blend(x, y, color, edge_coverage(radius - distance));
        });
    }

    fn set_glow(&mut self, glow: Option<Glow>) {
        self.glow = glow;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_black_and_fills() {
        let mut surface = PixelSurface::new(4, 3);
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(surface.pixel(4, 0), None);

        surface.fill_surface(Rgba::opaque(255.0, 0.0, 0.0));
        assert_eq!(surface.pixel(3, 2), Some([255, 0, 0]));
        assert_eq!(surface.to_rgba8().len(), 4 * 3 * 4);
    }

    #[test]
    fn translucent_fill_fades_towards_color() {
        let mut surface = PixelSurface::new(1, 1);
        surface.fill_surface(Rgba::opaque(200.0, 200.0, 200.0));
        surface.fill_surface(Rgba::new(0.0, 0.0, 0.0, 0.5));
        assert_eq!(surface.pixel(0, 0), Some([100, 100, 100]));
    }

    #[test]
    fn circle_covers_center_not_corners() {
        let mut surface = PixelSurface::new(20, 20);
        surface.fill_circle(Vec2::new(10.0, 10.0), 4.0, Rgba::opaque(0.0, 255.0, 0.0));
        assert_eq!(surface.pixel(10, 10), Some([0, 255, 0]));
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(surface.pixel(19, 19), Some([0, 0, 0]));
    }

    #[test]
    fn glow_spreads_beyond_the_circle() {
        let mut plain = PixelSurface::new(30, 30);
        plain.fill_circle(Vec2::new(15.0, 15.0), 2.0, Rgba::opaque(255.0, 255.0, 255.0));
        assert_eq!(plain.pixel(15, 20), Some([0, 0, 0]));

        let mut glowing = PixelSurface::new(30, 30);
        glowing.set_glow(Some(Glow { blur: 10.0, color: Rgba::new(255.0, 255.0, 255.0, 0.5) }));
        glowing.fill_circle(Vec2::new(15.0, 15.0), 2.0, Rgba::opaque(255.0, 255.0, 255.0));
        assert!(glowing.pixel(15, 20).unwrap()[0] > 0);
    }

    #[test]
    fn ring_leaves_center_untouched() {
        let mut surface = PixelSurface::new(40, 40);
        surface.stroke_circle(Vec2::new(20.0, 20.0), 10.0, Rgba::opaque(255.0, 255.0, 255.0), 2.0);
        assert_eq!(surface.pixel(20, 20), Some([0, 0, 0]));
        assert!(surface.pixel(30, 20).unwrap()[0] > 200);
    }

    #[test]
    fn gradient_is_dark_in_the_middle() {
        let gradient = RadialGradient::new()
            .with_stop(0.0, Rgba::BLACK)
            .with_stop(1.0, Rgba::opaque(255.0, 255.0, 255.0));
        let mut surface = PixelSurface::new(40, 40);
        surface.fill_surface(Rgba::opaque(255.0, 255.0, 255.0));
        surface.fill_radial_gradient(Vec2::new(20.0, 20.0), 15.0, &gradient);
        let center = surface.pixel(20, 20).unwrap()[0];
        let rim = surface.pixel(33, 20).unwrap()[0];
        assert!(center < 20);
        assert!(rim > 200);
    }

    #[test]
    fn shapes_off_surface_are_ignored() {
        let mut surface = PixelSurface::new(10, 10);
        surface.fill_circle(Vec2::new(-50.0, -50.0), 3.0, Rgba::opaque(255.0, 0.0, 0.0));
        surface.fill_circle(Vec2::new(500.0, 5.0), 3.0, Rgba::opaque(255.0, 0.0, 0.0));
        assert!(surface.to_rgba8().chunks(4).all(|px| px[0] == 0));
    }
}
