//! Host-facing building blocks shared by the event-horizon crates.
//!
//! - [`surface`]   – the [`Surface`] drawing trait and its color/gradient types
//! - [`raster`]    – [`PixelSurface`], a software implementation of [`Surface`]
//! - [`scheduler`] – the refresh scheduler driving one callback per frame
//! - [`input`]     – pointer and resize events delivered between frames

pub mod input;
pub mod raster;
pub mod scheduler;
pub mod surface;

pub use glam::Vec2;
pub use input::InputEvent;
pub use raster::PixelSurface;
pub use scheduler::{FixedRateScheduler, FrameTick, FrameTiming, RefreshScheduler};
pub use surface::{ColorStop, Extent, Glow, RadialGradient, Rgba, Surface};
