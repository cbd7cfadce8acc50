//! Simulation configuration and construction-time validation
//!
//! Invalid configurations are rejected outright, never clamped. Runtime
//! commands are the forgiving surface; this one is strict.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FIELD_RESOLUTION, DEFAULT_WORLD_SIZE};

/// Configuration rejected at construction time.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// World side length must be finite and positive.
    InvalidWorldSize(f32),
    /// Bilinear sampling needs at least a 2x2 grid.
    ResolutionTooSmall(usize),
    /// Speed multiplier must be finite and positive.
    InvalidSpeed(f32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWorldSize(v) => {
                write!(f, "world size must be finite and positive, got {v}")
            }
            Self::ResolutionTooSmall(v) => {
                write!(f, "field resolution must be at least 2, got {v}")
            }
            Self::InvalidSpeed(v) => {
                write!(f, "speed multiplier must be finite and positive, got {v}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Everything needed to build a reproducible simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Side length of the square arena, in world units
    pub world_size: f32,
    /// Grid resolution of the flow and signal fields (NxN cells)
    pub field_resolution: usize,
    /// Run seed; all randomness derives from it
    pub seed: u64,
    /// Initial speed multiplier for the step driver
    pub speed: f32,
    /// Initial population per kind, placed at seeded-random positions
    pub initial_red_cells: usize,
    pub initial_pathogens: usize,
    pub initial_neutrophils: usize,
    pub initial_macrophages: usize,
    pub initial_t_cells: usize,
    pub initial_b_cells: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_size: DEFAULT_WORLD_SIZE,
            field_resolution: DEFAULT_FIELD_RESOLUTION,
            seed: 0,
            speed: 1.0,
            initial_red_cells: 40,
            initial_pathogens: 0,
            initial_neutrophils: 2,
            initial_macrophages: 1,
            initial_t_cells: 1,
            initial_b_cells: 1,
        }
    }
}

impl SimConfig {
    /// Default configuration with the given run seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Width of one field grid cell in world units.
    pub fn cell_size(&self) -> f32 {
        self.world_size / self.field_resolution as f32
    }

    /// Reject invalid configurations before any state is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.world_size.is_finite() || self.world_size <= 0.0 {
            return Err(ConfigError::InvalidWorldSize(self.world_size));
        }
        if self.field_resolution < 2 {
            return Err(ConfigError::ResolutionTooSmall(self.field_resolution));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(ConfigError::InvalidSpeed(self.speed));
        }
        Ok(())
    }
}
