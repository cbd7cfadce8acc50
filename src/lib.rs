//! Hemosim - an immune response sandbox
//!
//! Core modules:
//! - `sim`: Deterministic simulation (fields, agents, interaction rules, tick driver)
//! - `config`: Construction-time configuration and validation
//! - `export`: Metrics time-series export

pub mod config;
pub mod export;
pub mod sim;

pub use config::{ConfigError, SimConfig};
pub use sim::{Command, Simulation, Snapshot};

/// Simulation tuning constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per advance call to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Arena defaults
    pub const DEFAULT_WORLD_SIZE: f32 = 1000.0;
    pub const DEFAULT_FIELD_RESOLUTION: usize = 32;

    /// Velocity damping applied on each wall bounce (10% energy loss)
    pub const BOUNCE_DAMPING: f32 = 0.9;

    /// Wall integrity
    pub const WALL_MAX_INTEGRITY: f32 = 100.0;
    pub const WALL_HIT_DAMAGE: f32 = 1.0;
    /// Signal released at the arena center when a wall takes damage
    pub const WALL_HIT_SIGNAL: f32 = 2.0;

    /// Pathogen lifecycle
    pub const PATHOGEN_HEALTH: f32 = 3.0;
    pub const REPLICATION_MIN_SECS: f32 = 6.0;
    pub const REPLICATION_MAX_SECS: f32 = 10.0;
    pub const OFFSPRING_MIN: u32 = 2;
    pub const OFFSPRING_MAX: u32 = 5;
    /// Total hue drift span for offspring (uniform, centered on parent)
    pub const HUE_DRIFT: f32 = 20.0;

    /// Neutrophil kamikaze behavior
    pub const NEUTROPHIL_ENGAGE_RADIUS: f32 = 25.0;
    pub const NEUTROPHIL_FUSE_SECS: f32 = 0.3;
    pub const NEUTROPHIL_BLAST_RADIUS: f32 = 25.0;

    /// Macrophage digestion
    pub const MACROPHAGE_DIGESTION_SECS: f32 = 4.0;
    pub const MACROPHAGE_DIGEST_DAMPING: f32 = 0.2;
    pub const MACROPHAGE_SIGNAL_DEPOSIT: f32 = 1.0;

    /// Adaptive response
    pub const TCELL_SEEK_FORCE: f32 = 80.0;
    pub const BCELL_COOLDOWN_SECS: f32 = 4.0;
    pub const ANTIBODY_SEEK_FORCE: f32 = 50.0;
    pub const ANTIBODY_LIFESPAN_SECS: f32 = 10.0;

    /// Burst effects
    pub const BURST_PARTICLE_COUNT: usize = 10;
    pub const PARTICLE_LIFE_SECS: f32 = 2.0;
    /// Total span of each burst particle velocity component (uniform, centered on zero)
    pub const PARTICLE_SPEED_SPAN: f32 = 20.0;

    /// Agents spawned per reinforcement command
    pub const REINFORCE_SQUAD_SIZE: usize = 2;
}
