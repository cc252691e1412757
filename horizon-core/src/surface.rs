//! Drawable surface abstraction.
//!
//! The animation never touches a concrete canvas. Everything it paints goes
//! through the [`Surface`] trait, which mirrors the handful of 2D canvas
//! primitives the scene needs:
//!
//! - [`Surface::fill_rect`]            – translucent full-surface fade
//! - [`Surface::fill_circle`]          – particles and trailing dots
//! - [`Surface::stroke_circle`]        – accretion rings
//! - [`Surface::fill_radial_gradient`] – attractor disc
//! - [`Surface::set_glow`]             – soft blur applied to following fills
//!
//! Colors use CSS `rgba()` conventions: channels in `0..=255`, alpha in `0..=1`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An RGBA color with CSS-style channel ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Rgba { r, g, b, a }
    }

    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Rgba::new(r, g, b, 1.0)
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Rgba { a, ..self }
    }

    /// Linear interpolation between two colors, `t` in `0..=1`.
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        Rgba {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

/// Width and height of a drawable area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

impl Extent {
    pub const fn new(width: f32, height: f32) -> Self {
        Extent { width, height }
    }

    /// Largest width or height accepted for a surface.
    pub const MAX_DIMENSION: f32 = 16_384.0;

    /// Finite, positive and at most [`Extent::MAX_DIMENSION`] on both axes.
    pub fn is_usable(&self) -> bool {
        let usable = |d: f32| d.is_finite() && d > 0.0 && d <= Self::MAX_DIMENSION;
        usable(self.width) && usable(self.height)
    }

    /// True if `point` lies in `[0, width) x [0, height)`.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.x < self.width && point.y >= 0.0 && point.y < self.height
    }
}

/// One stop of a gradient, `offset` in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

/// A radial gradient from the center (offset 0) to the rim (offset 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadialGradient {
    stops: Vec<ColorStop>,
}

impl RadialGradient {
    pub fn new() -> Self {
        RadialGradient { stops: Vec::new() }
    }

    /// Add a stop. Stops are kept sorted by offset.
    pub fn with_stop(mut self, offset: f32, color: Rgba) -> Self {
        let offset = offset.clamp(0.0, 1.0);
        let idx = self.stops.partition_point(|s| s.offset <= offset);
        self.stops.insert(idx, ColorStop { offset, color });
        self
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Sample the gradient at `t`. Outside the first/last stop the nearest
    /// stop color is used; an empty gradient is fully transparent.
    pub fn color_at(&self, t: f32) -> Rgba {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Rgba::BLACK.with_alpha(0.0),
        };
        if t <= first.offset {
            return first.color;
        }
        if t >= last.offset {
            return last.color;
        }
        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t <= hi.offset {
                let span = hi.offset - lo.offset;
                if span <= f32::EPSILON {
                    return hi.color;
                }
                return lo.color.lerp(hi.color, (t - lo.offset) / span);
            }
        }
        last.color
    }
}

impl Default for RadialGradient {
    fn default() -> Self {
        Self::new()
    }
}

/// Blur halo drawn around subsequent fills (canvas `shadowBlur`/`shadowColor`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glow {
    pub blur: f32,
    pub color: Rgba,
}

/// A 2D drawing target.
///
/// Implementations decide what "drawing" means: rasterizing pixels, recording
/// commands for a remote front end, or counting calls in a test.
pub trait Surface {
    /// Current drawable size.
    fn size(&self) -> Extent;

    fn fill_rect(&mut self, origin: Vec2, extent: Extent, color: Rgba);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba, line_width: f32);

    /// Fill a disc of `radius` with `gradient` spread from `center` outwards.
    fn fill_radial_gradient(&mut self, center: Vec2, radius: f32, gradient: &RadialGradient);

    /// Set (or clear with `None`) the glow applied to following fills.
    fn set_glow(&mut self, glow: Option<Glow>);

    /// Fill the whole surface with `color`.
    fn fill_surface(&mut self, color: Rgba) {
        let extent = self.size();
        self.fill_rect(Vec2::ZERO, extent, color);
    }
}
