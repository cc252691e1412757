//! The black-hole particle animation.
//!
//! Two kinds of entity, both plain data with inherent update/draw methods:
//!
//! - [`Attractor`] – a drifting, pulsing disc whose gravity and swirl pull particles in
//! - [`Particle`]  – a point of light that wraps around the surface and respawns
//!   when it is swallowed or its life runs out
//!
//! [`Simulation`] owns both collections and runs one step + paint per frame.

pub mod attractor;
pub mod params;
pub mod particle;
pub mod simulation;

pub use attractor::Attractor;
pub use params::{PhysicsParams, SimulationParams};
pub use particle::{Fate, Particle};
pub use simulation::{Simulation, StepReport};
