use crate::attractor::Attractor;
use crate::params::SimulationParams;
use crate::particle::{Fate, Particle};
use glam::Vec2;
use horizon_core::{Extent, InputEvent, Rgba, Surface};
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::Duration;

/// Vertical jitter around the surface middle when placing attractors
const ATTRACTOR_JITTER: f32 = 100.0;

/// Per-tick counts of particles that had to be respawned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub absorbed: usize,
    pub expired: usize,
}

impl StepReport {
    pub fn respawned(&self) -> usize {
        self.absorbed + self.expired
    }
}

/// Owns the attractors and particles and drives them once per frame.
pub struct Simulation<R: Rng = StdRng> {
    params: SimulationParams,
    bounds: Extent,
    attractors: Vec<Attractor>,
    particles: Vec<Particle>,
    rng: R,
    steps: u64,
}

impl Simulation<StdRng> {
    /// Seeded from OS entropy.
    pub fn new(params: SimulationParams, bounds: Extent) -> Self {
        Simulation::with_rng(params, bounds, StdRng::from_entropy())
    }

    /// Reproducible population for a given `seed`.
    pub fn with_seed(params: SimulationParams, bounds: Extent, seed: u64) -> Self {
        Simulation::with_rng(params, bounds, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulation<R> {
    pub fn with_rng(params: SimulationParams, bounds: Extent, rng: R) -> Self {
        let mut simulation = Simulation {
            params,
            bounds,
            attractors: Vec::new(),
            particles: Vec::new(),
            rng,
            steps: 0,
        };
        simulation.reset();
        simulation
    }

    pub fn bounds(&self) -> Extent {
        self.bounds
    }

    pub fn attractors(&self) -> &[Attractor] {
        &self.attractors
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Direct access for hosts and tests that need to place particles.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Number of physics steps since the last reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Discard every entity and build a fresh population for the current bounds.
    pub fn reset(&mut self) {
        self.attractors.clear();
        self.particles.clear();
        self.steps = 0;

        let count = self.params.attractor_count;
        let spacing = self.bounds.width / (count + 1) as f32;
        let middle = self.bounds.height * 0.5;
        for i in 0..count {
            let x = spacing * (i + 1) as f32;
            let y = middle + self.rng.gen_range(-ATTRACTOR_JITTER..ATTRACTOR_JITTER);
            self.attractors.push(Attractor::spawn(&mut self.rng, Vec2::new(x, y)));
        }

        for _ in 0..self.params.particle_count {
            self.particles.push(Particle::spawn(&mut self.rng, self.bounds));
        }

        debug!(
            "Population reset: {} attractors, {} particles on {}x{}",
            self.attractors.len(),
            self.particles.len(),
            self.bounds.width,
            self.bounds.height
        );
    }

    /// Adopt new surface bounds and rebuild the whole population.
    ///
    /// Bounds that are not [usable](Extent::is_usable) are ignored and the
    /// current population is kept. Returns whether the resize took effect.
    pub fn resize(&mut self, bounds: Extent) -> bool {
        if !bounds.is_usable() {
            warn!("Ignoring resize to {}x{}", bounds.width, bounds.height);
            return false;
        }
        self.bounds = bounds;
        self.reset();
        true
    }

    /// Pull every particle within the pointer radius towards `pointer`.
    pub fn pointer_moved(&mut self, pointer: Vec2) {
        let physics = &self.params.physics;
        for particle in &mut self.particles {
            particle.attract_to(pointer, physics.pointer_radius, physics.pointer_force);
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMove { x, y } => self.pointer_moved(Vec2::new(x, y)),
            InputEvent::Resize { width, height } => {
                self.resize(Extent::new(width, height));
            }
        }
    }

    /// Advance attractors, then particles, by one tick.
    pub fn step(&mut self) -> StepReport {
        for attractor in &mut self.attractors {
            attractor.update(self.bounds);
        }

        let attractors = &self.attractors;
        let bounds = self.bounds;
        let physics = &self.params.physics;
        let fates: Vec<Fate> = self
            .particles
            .par_iter_mut()
            .map(|particle| particle.advance(attractors, bounds, physics))
            .collect();

        // Respawns draw from the shared RNG, so they run serially in particle order
        let mut report = StepReport::default();
        for (particle, fate) in self.particles.iter_mut().zip(fates) {
            if !fate.needs_respawn() {
                continue;
            }
            if fate == Fate::Absorbed {
                report.absorbed += 1;
            } else {
                report.expired += 1;
            }
            particle.respawn(&mut self.rng, bounds);
        }

        self.steps += 1;
        if self.steps % 600 == 0 {
            if let Some(sample) = self.particles.first() {
                trace!(
                    "step {}: respawned {}, sample particle at ({:.1}, {:.1}) life {:.3}",
                    self.steps,
                    report.respawned(),
                    sample.position.x,
                    sample.position.y,
                    sample.life
                );
            }
        }
        report
    }

    /// Paint the current state: trail fade, attractors, then particles.
    pub fn paint(&self, surface: &mut dyn Surface, elapsed: Duration) {
        surface.fill_surface(Rgba::BLACK.with_alpha(self.params.physics.trail_alpha));
        for attractor in &self.attractors {
            attractor.draw(surface, elapsed);
        }
        for particle in &self.particles {
            particle.draw(surface);
        }
    }

    /// One animation frame: [`step`](Self::step) followed by [`paint`](Self::paint).
    pub fn tick(&mut self, surface: &mut dyn Surface, elapsed: Duration) -> StepReport {
        let report = self.step();
        self.paint(surface, elapsed);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PhysicsParams;
    use horizon_transport::{DrawCommand, DrawList};

    const BOUNDS: Extent = Extent::new(1280.0, 720.0);

    fn simulation(seed: u64) -> Simulation {
        Simulation::with_seed(SimulationParams::default(), BOUNDS, seed)
    }

    #[test]
    fn init_builds_default_population() {
        let sim = simulation(1);
        assert_eq!(sim.attractors().len(), 2);
        assert_eq!(sim.particles().len(), 180);

        // Evenly spaced across the width, jittered around the middle
        let xs: Vec<f32> = sim.attractors().iter().map(|a| a.position.x).collect();
        assert!((xs[0] - BOUNDS.width / 3.0).abs() < 1e-3);
        assert!((xs[1] - BOUNDS.width * 2.0 / 3.0).abs() < 1e-3);
        for a in sim.attractors() {
            assert!((a.position.y - BOUNDS.height / 2.0).abs() <= ATTRACTOR_JITTER);
        }
        assert!(sim.particles().iter().all(|p| BOUNDS.contains(p.position)));
    }

    #[test]
    fn same_seed_same_run() {
        let mut a = simulation(42);
        let mut b = simulation(42);
        for _ in 0..200 {
            assert_eq!(a.step(), b.step());
        }
        assert_eq!(a.particles(), b.particles());
        assert_eq!(a.attractors(), b.attractors());
    }

    #[test]
    fn invariants_hold_over_a_long_run() {
        let mut sim = simulation(7);
        for _ in 0..3_000 {
            for p in sim.particles() {
                assert!((0.0..=1.0).contains(&p.life));
            }
            sim.step();
            for a in sim.attractors() {
                let r = a.radius();
                assert!(a.position.x >= r && a.position.x <= BOUNDS.width - r);
                assert!(a.position.y >= r && a.position.y <= BOUNDS.height - r);
            }
            for p in sim.particles() {
                assert!(BOUNDS.contains(p.position), "escaped: {:?}", p.position);
                assert!(p.life > 0.0 && p.life <= 1.0);
            }
        }
        assert_eq!(sim.particles().len(), 180);
        assert_eq!(sim.steps(), 3_000);
    }

    #[test]
    fn absorbed_particle_is_respawned_in_one_step() {
        let mut sim = simulation(3);
        let hole = sim.attractors()[0].clone();
        // Where the attractor will be once it has drifted this tick
        let next = hole.position + hole.velocity;
        {
            let p = &mut sim.particles_mut()[0];
            p.position = next + Vec2::new(hole.radius() * 0.5, 0.0);
            p.velocity = Vec2::ZERO;
            p.life = 0.3;
        }
        let report = sim.step();
        assert!(report.absorbed >= 1);
        assert_eq!(sim.particles()[0].life, 1.0);
    }

    #[test]
    fn expired_particles_come_back_with_full_life() {
        let mut sim = simulation(4);
        for p in sim.particles_mut() {
            p.life = 1e-6;
        }
        let report = sim.step();
        assert_eq!(report.respawned(), 180);
        assert!(sim.particles().iter().all(|p| p.life == 1.0));
    }

    #[test]
    fn pointer_nudges_nearby_particles() {
        let mut sim = simulation(5);
        for p in sim.particles_mut() {
            p.velocity = Vec2::ZERO;
        }
        sim.particles_mut()[0].position = Vec2::new(100.0, 100.0);
        sim.particles_mut()[1].position = Vec2::new(1000.0, 600.0);

        sim.handle_input(InputEvent::PointerMove { x: 150.0, y: 100.0 });

        assert!((sim.particles()[0].velocity.x - 0.025).abs() < 1e-6);
        assert_eq!(sim.particles()[1].velocity, Vec2::ZERO);
    }

    #[test]
    fn resize_rebuilds_everything() {
        let mut sim = simulation(6);
        for _ in 0..10 {
            sim.step();
        }
        let small = Extent::new(400.0, 300.0);
        sim.handle_input(InputEvent::Resize { width: 400.0, height: 300.0 });

        assert_eq!(sim.bounds(), small);
        assert_eq!(sim.steps(), 0);
        assert_eq!(sim.attractors().len(), 2);
        assert_eq!(sim.particles().len(), 180);
        assert!(sim.particles().iter().all(|p| small.contains(p.position) && p.life == 1.0));
        assert!((sim.attractors()[0].position.x - 400.0 / 3.0).abs() < 1e-3);
    }

    #[test]
    fn unusable_resize_keeps_the_population() {
        let mut sim = simulation(12);
        sim.step();
        let before = sim.particles().to_vec();

        // serde_json reads an out-of-range f32 as infinity
        let event: InputEvent =
            serde_json::from_str(r#"{"resize":{"width":1e39,"height":600}}"#).unwrap();
        sim.handle_input(event);
        assert!(!sim.resize(Extent::new(f32::NAN, 600.0)));
        assert!(!sim.resize(Extent::new(0.0, 600.0)));
        assert!(!sim.resize(Extent::new(1e9, 1e9)));

        assert_eq!(sim.bounds(), BOUNDS);
        assert_eq!(sim.steps(), 1);
        assert_eq!(sim.particles(), &before[..]);
        sim.step();
        assert!(sim.particles().iter().all(|p| BOUNDS.contains(p.position)));
    }

    #[test]
    fn custom_population_sizes() {
        let params = SimulationParams {
            attractor_count: 3,
            particle_count: 12,
            physics: PhysicsParams::default(),
        };
        let sim = Simulation::with_seed(params, BOUNDS, 8);
        assert_eq!(sim.attractors().len(), 3);
        assert_eq!(sim.particles().len(), 12);
        assert!((sim.attractors()[2].position.x - BOUNDS.width * 0.75).abs() < 1e-3);
    }

    #[test]
    fn tick_paints_fade_then_attractors_then_particles() {
        let params = SimulationParams {
            attractor_count: 2,
            particle_count: 3,
            physics: PhysicsParams::default(),
        };
        let mut sim = Simulation::with_seed(params, BOUNDS, 9);
        let mut list = DrawList::new(BOUNDS);
        sim.tick(&mut list, Duration::from_millis(16));

        let commands = list.commands();
        // fade + 2 * (gradient + 4 rings + 8 dots) + 3 * (fill, glow, fill, clear)
        assert_eq!(commands.len(), 1 + 2 * 13 + 3 * 4);
        match &commands[0] {
            DrawCommand::FillRect { width, height, color, .. } => {
                assert_eq!((*width, *height), (BOUNDS.width, BOUNDS.height));
                assert_eq!(color.a, 0.05);
            }
            other => panic!("expected fade first, got {:?}", other),
        }
        assert!(matches!(commands[1], DrawCommand::RadialGradient { .. }));
        assert!(matches!(commands[14], DrawCommand::RadialGradient { .. }));
        assert!(matches!(commands[27], DrawCommand::FillCircle { .. }));
        assert_eq!(sim.steps(), 1);
    }
}
