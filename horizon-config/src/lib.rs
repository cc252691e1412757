use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// --- Error Type ---
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format '{0}', expected .json or .toml")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

// --- Enums for Choices ---
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncoderType {
    #[default]
    Json,
    Binary,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkType {
    #[default]
    Stdio,
    File,
    Null,
}

// --- Configuration Sections ---

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SurfaceSettings {
    pub width: f32,
    pub height: f32,
}

/// Tuning constants for the attractor/particle physics.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PhysicsSettings {
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_swirl")]
    pub swirl: f32,
    #[serde(default = "default_influence")]
    pub influence: f32,
    #[serde(default = "default_absorption")]
    pub absorption: f32,
    #[serde(default = "default_friction")]
    pub friction: f32,
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    #[serde(default = "default_pointer_radius")]
    pub pointer_radius: f32,
    #[serde(default = "default_pointer_force")]
    pub pointer_force: f32,
    #[serde(default = "default_trail_alpha")]
    pub trail_alpha: f32,
}

// Default values for the physics
fn default_gravity() -> f32 { 0.00008 }
fn default_swirl() -> f32 { 0.0001 }
fn default_influence() -> f32 { 3.0 }
fn default_absorption() -> f32 { 0.6 }
fn default_friction() -> f32 { 0.995 }
fn default_min_distance() -> f32 { 1.0 }
fn default_pointer_radius() -> f32 { 150.0 }
fn default_pointer_force() -> f32 { 0.0005 }
fn default_trail_alpha() -> f32 { 0.05 }

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            swirl: default_swirl(),
            influence: default_influence(),
            absorption: default_absorption(),
            friction: default_friction(),
            min_distance: default_min_distance(),
            pointer_radius: default_pointer_radius(),
            pointer_force: default_pointer_force(),
            trail_alpha: default_trail_alpha(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    #[serde(default = "default_attractor_count")]
    pub attractor_count: usize,
    #[serde(default = "default_particle_count")]
    pub particle_count: usize,
    /// Fixed RNG seed for reproducible runs; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub physics: PhysicsSettings,
}

fn default_attractor_count() -> usize { 2 }
fn default_particle_count() -> usize { 180 }

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            attractor_count: default_attractor_count(),
            particle_count: default_particle_count(),
            seed: None,
            physics: PhysicsSettings::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EncoderConfig {
    #[serde(rename = "type", default)]
    pub encoder_type: EncoderType,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SinkConfig {
    #[serde(rename = "type", default)]
    pub sink_type: SinkType,
    pub options: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

// --- Top-Level Config Struct ---

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_framerate")]
    pub framerate: u32,
    pub surface: SurfaceSettings,
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_framerate() -> u32 { 60 }

/// Largest accepted surface width or height
pub const MAX_SURFACE_DIMENSION: f32 = 16_384.0;

// --- File Sink Options ---
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct FileSinkOptions {
    pub path: PathBuf,
    /// Append to an existing file instead of truncating it
    #[serde(default)]
    pub append: bool,
}

// --- Helper Methods ---

impl SinkConfig {
    /// Parse file sink options if present and well-formed
    pub fn get_file_options(&self) -> Option<FileSinkOptions> {
        self.options
            .as_ref()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl Config {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.framerate == 0 {
            return Err(ConfigError::Validation("Framerate cannot be zero.".to_string()));
        }

        let dimension_ok = |d: f32| d.is_finite() && d > 0.0 && d <= MAX_SURFACE_DIMENSION;
        if !(dimension_ok(self.surface.width) && dimension_ok(self.surface.height)) {
            return Err(ConfigError::Validation(format!(
                "Surface dimensions must be finite, positive and at most {}, got {}x{}.",
                MAX_SURFACE_DIMENSION, self.surface.width, self.surface.height
            )));
        }

        let sim = &self.simulation;
        if sim.attractor_count == 0 {
            return Err(ConfigError::Validation("Attractor count must be greater than 0.".to_string()));
        }
        if sim.particle_count == 0 {
            return Err(ConfigError::Validation("Particle count must be greater than 0.".to_string()));
        }

        let physics = &sim.physics;
        let named = [
            ("gravity", physics.gravity),
            ("swirl", physics.swirl),
            ("influence", physics.influence),
            ("absorption", physics.absorption),
            ("friction", physics.friction),
            ("min_distance", physics.min_distance),
            ("pointer_radius", physics.pointer_radius),
            ("pointer_force", physics.pointer_force),
            ("trail_alpha", physics.trail_alpha),
        ];
        if let Some((name, value)) = named.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::Validation(format!("{} must be finite, got {}.", name, value)));
        }
        if !(physics.friction > 0.0 && physics.friction <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "Friction must be in (0, 1], got {}.",
                physics.friction
            )));
        }
        if physics.absorption >= physics.influence {
            return Err(ConfigError::Validation(
                "Absorption radius factor must be smaller than the influence factor.".to_string(),
            ));
        }
        if physics.min_distance <= 0.0 {
            return Err(ConfigError::Validation("min_distance must be positive.".to_string()));
        }
        if !(0.0..=1.0).contains(&physics.trail_alpha) {
            return Err(ConfigError::Validation("trail_alpha must be in [0, 1].".to_string()));
        }

        if self.output.sink.sink_type == SinkType::File && self.output.sink.get_file_options().is_none() {
            return Err(ConfigError::Validation(
                "File sink requires options with a 'path'.".to_string(),
            ));
        }

        Ok(())
    }
}

// --- Loading Function ---

/// Load and validate a config file. The format follows the extension:
/// `.json` or `.toml`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let content = fs::read_to_string(path)?;
    let config: Config = match extension.as_str() {
        "json" => serde_json::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        _ => return Err(ConfigError::UnsupportedFormat(extension)),
    };

    config.validate()?;
    Ok(config)
}
