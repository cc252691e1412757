use glam::Vec2;
use horizon_core::{Extent, RadialGradient, Rgba, Surface};
use rand::Rng;
use std::f32::consts::TAU;
use std::time::Duration;

/// Pulse phase advance per millisecond of elapsed time
const PULSE_SPEED: f32 = 0.02;
const PULSE_DEPTH: f32 = 0.1;

const RING_COUNT: usize = 4;
const TRAIL_DOTS: usize = 8;
const TRAIL_RING: f32 = 1.2;
const TRAIL_DOT_RADIUS: f32 = 2.0;
const TRAIL_COLOR: Rgba = Rgba::new(150.0, 100.0, 255.0, 0.6);

/// A drifting, rotating "black hole" that pulls particles in.
#[derive(Debug, Clone, PartialEq)]
pub struct Attractor {
    pub position: Vec2,
    pub velocity: Vec2,
    radius: f32, // fixed for the attractor's lifetime
    pub rotation: f32,
    pub rotation_speed: f32,
    pub pulse_phase: f32,
}

impl Attractor {
    pub fn new(position: Vec2, radius: f32, velocity: Vec2, rotation_speed: f32, pulse_phase: f32) -> Self {
        Attractor {
            position,
            velocity,
            radius,
            rotation: 0.0,
            rotation_speed,
            pulse_phase,
        }
    }

    /// Random radius, drift, spin and pulse phase at `position`.
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, position: Vec2) -> Self {
        let radius = rng.gen_range(60.0..100.0);
        let velocity = Vec2::new(rng.gen_range(-0.4..0.4), rng.gen_range(-0.4..0.4));
        let rotation_speed = rng.gen_range(0.015..0.025);
        let pulse_phase = rng.gen_range(0.0..TAU);
        Attractor::new(position, radius, velocity, rotation_speed, pulse_phase)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Drift one tick, bouncing off the edges of `bounds` so the whole disc
    /// stays on the surface.
    pub fn update(&mut self, bounds: Extent) {
        self.position += self.velocity;
        self.rotation += self.rotation_speed;

        let (x, vx) = reflect(self.position.x, self.velocity.x, self.radius, bounds.width);
        let (y, vy) = reflect(self.position.y, self.velocity.y, self.radius, bounds.height);
        self.position = Vec2::new(x, y);
        self.velocity = Vec2::new(vx, vy);
    }

    /// Radius multiplier in `[0.9, 1.1]` at `elapsed`.
    pub fn pulse(&self, elapsed: Duration) -> f32 {
        let millis = elapsed.as_secs_f64() * 1000.0;
        // Reduce the phase in f64 so long sessions keep f32 precision
        let phase = (millis * PULSE_SPEED as f64).rem_euclid(std::f64::consts::TAU) as f32;
        (phase + self.pulse_phase).sin() * PULSE_DEPTH + 1.0
    }

    pub fn draw(&self, surface: &mut dyn Surface, elapsed: Duration) {
        let radius = self.radius * self.pulse(elapsed);

        // Event horizon
        surface.fill_radial_gradient(self.position, radius, &horizon_gradient());

        // Accretion disk
        for i in 0..RING_COUNT {
            let i = i as f32;
            let color = Rgba::new(120.0 + i * 30.0, 60.0 + i * 20.0, 200.0 + i * 10.0, 0.4 - i * 0.08);
            surface.stroke_circle(self.position, radius * (0.8 + i * 0.15), color, 2.0 - i * 0.3);
        }

        // Trailing particles
        let trail_radius = radius * TRAIL_RING;
        for i in 0..TRAIL_DOTS {
            let angle = (i as f32 / TRAIL_DOTS as f32) * TAU + self.rotation * 2.0;
            let offset = Vec2::new(angle.cos(), angle.sin()) * trail_radius;
            surface.fill_circle(self.position + offset, TRAIL_DOT_RADIUS, TRAIL_COLOR);
        }
    }
}

// Bounce on one axis: velocity turns back inwards at either edge and the
// coordinate is clamped into [radius, extent - radius]. A surface narrower
// than the disc pins the attractor to its middle.
fn reflect(pos: f32, vel: f32, radius: f32, extent: f32) -> (f32, f32) {
    let (lo, hi) = (radius, extent - radius);
    if lo > hi {
        return (extent * 0.5, vel);
    }
    let vel = if pos <= lo {
        vel.abs()
    } else if pos >= hi {
        -vel.abs()
    } else {
        vel
    };
    (pos.clamp(lo, hi), vel)
}

fn horizon_gradient() -> RadialGradient {
    RadialGradient::new()
        .with_stop(0.0, Rgba::new(0.0, 0.0, 0.0, 1.0))
        .with_stop(0.2, Rgba::new(10.0, 0.0, 20.0, 0.9))
        .with_stop(0.4, Rgba::new(30.0, 0.0, 60.0, 0.7))
        .with_stop(0.6, Rgba::new(50.0, 20.0, 100.0, 0.5))
        .with_stop(0.8, Rgba::new(70.0, 40.0, 140.0, 0.3))
        .with_stop(1.0, Rgba::new(90.0, 60.0, 180.0, 0.1))
}
