//! Numerical parameters for the attractor/particle physics
//!
//! `PhysicsParams` holds the force and damping constants, `SimulationParams`
//! adds the population sizes. Defaults reproduce the reference animation.

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsParams {
    pub gravity: f32,        // k in force = k * radius / distance^2
    pub swirl: f32,          // scale of the perpendicular impulse
    pub influence: f32,      // attractor pulls within influence * radius
    pub absorption: f32,     // particle is swallowed within absorption * radius
    pub friction: f32,       // per-tick velocity multiplier
    pub min_distance: f32,   // floor on distance in the force term
    pub pointer_radius: f32, // pointer pulls particles within this distance
    pub pointer_force: f32,  // proportional pointer pull
    pub trail_alpha: f32,    // opacity of the per-frame black fade
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: 0.00008,
            swirl: 0.0001,
            influence: 3.0,
            absorption: 0.6,
            friction: 0.995,
            min_distance: 1.0,
            pointer_radius: 150.0,
            pointer_force: 0.0005,
            trail_alpha: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub attractor_count: usize, // fixed for a session
    pub particle_count: usize,  // constant population, particles respawn instead of dying
    pub physics: PhysicsParams,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            attractor_count: 2,
            particle_count: 180,
            physics: PhysicsParams::default(),
        }
    }
}
