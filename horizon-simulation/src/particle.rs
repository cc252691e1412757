use crate::attractor::Attractor;
use crate::params::PhysicsParams;
use glam::Vec2;
use horizon_core::{Extent, Glow, Rgba, Surface};
use rand::Rng;

const GLOW_BLUR: f32 = 10.0;
const GLOW_ALPHA: f32 = 0.5;

/// What happened to a particle during one physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Alive,
    /// Came within the absorption radius of an attractor
    Absorbed,
    /// Life ran out
    Expired,
}

impl Fate {
    pub fn needs_respawn(self) -> bool {
        self != Fate::Alive
    }
}

/// A short-lived point of light drifting around the attractors.
///
/// Position, velocity, life and alpha are reset on every respawn. Size, color
/// and decay are the particle's identity and never change after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub life: f32,
    pub alpha: f32,
    size: f32,
    color: Rgba,
    decay: f32,
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2, size: f32, alpha: f32, color: Rgba, decay: f32) -> Self {
        Particle {
            position,
            velocity,
            life: 1.0,
            alpha,
            size,
            color: color.with_alpha(1.0),
            decay,
        }
    }

    /// A particle with random identity at a random spot in `bounds`.
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, bounds: Extent) -> Self {
        let size = rng.gen_range(1.0..3.0);
        let color = Rgba::opaque(
            rng.gen_range(100.0..255.0),
            rng.gen_range(150.0..255.0),
            rng.gen_range(200.0..255.0),
        );
        let decay = rng.gen_range(0.001..0.006);
        let mut particle = Particle::new(Vec2::ZERO, Vec2::ZERO, size, 1.0, color, decay);
        particle.respawn(rng, bounds);
        particle
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Base color, always fully opaque. Opacity comes from `alpha * life`.
    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// Reset the transient fields: random position in `bounds`, small random
    /// velocity, full life and a fresh alpha.
    pub fn respawn<R: Rng + ?Sized>(&mut self, rng: &mut R, bounds: Extent) {
        self.position = Vec2::new(
            random_coordinate(rng, bounds.width),
            random_coordinate(rng, bounds.height),
        );
        self.velocity = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        self.life = 1.0;
        self.alpha = rng.gen_range(0.2..1.0);
    }

    /// Advance one tick under the pull of `attractors`.
    ///
    /// Deterministic: the result depends only on `self`, `attractors`,
    /// `bounds` and `physics`. Absorption is decided over all attractors
    /// before any force is applied; an absorbed particle is left untouched
    /// and should be respawned by the caller, as should an expired one.
    pub fn advance(&mut self, attractors: &[Attractor], bounds: Extent, physics: &PhysicsParams) -> Fate {
        let absorbed = attractors
            .iter()
            .any(|a| (a.position - self.position).length() < a.radius() * physics.absorption);
        if absorbed {
            return Fate::Absorbed;
        }

        for attractor in attractors {
            let offset = attractor.position - self.position;
            let distance = offset.length();
            if distance < attractor.radius() * physics.influence {
                let distance = distance.max(physics.min_distance);
                let force = physics.gravity * attractor.radius() / (distance * distance);
                self.velocity += offset * force;
                self.velocity += offset.perp() * physics.swirl;
            }
        }

        self.position += self.velocity;
        self.position = Vec2::new(
            wrap(self.position.x, bounds.width),
            wrap(self.position.y, bounds.height),
        );
        self.velocity *= physics.friction;

        self.life -= self.decay;
        if self.life <= 0.0 {
            self.life = 0.0;
            return Fate::Expired;
        }
        Fate::Alive
    }

    /// Nudge towards `pointer` if it is within `radius`.
    pub fn attract_to(&mut self, pointer: Vec2, radius: f32, force: f32) {
        let offset = pointer - self.position;
        if offset.length() < radius {
            self.velocity += offset * force;
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        let fill = self.color.with_alpha(self.alpha * self.life);
        surface.fill_circle(self.position, self.size, fill);

        // Soft halo on top of the core
        surface.set_glow(Some(Glow {
            blur: GLOW_BLUR,
            color: self.color.with_alpha(GLOW_ALPHA),
        }));
        surface.fill_circle(self.position, self.size, fill);
        surface.set_glow(None);
    }
}

fn random_coordinate<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    if extent.is_finite() && extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}

// Toroidal wrap into [0, extent).
fn wrap(coord: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        return 0.0;
    }
    let wrapped = coord.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}
