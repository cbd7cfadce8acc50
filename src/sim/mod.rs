//! Deterministic simulation module
//!
//! All simulation logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (insertion order per kind)
//! - No rendering or platform dependencies

pub mod agent;
pub mod behavior;
pub mod driver;
pub mod field;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use agent::{Agent, AgentKind, BurstColor, KindState, Particle, WallSide, Walls};
pub use behavior::{TargetView, nearest_where, pathogen_views, step_agent};
pub use driver::{Command, RunState, Simulation};
pub use field::{FieldStore, ScalarField, VectorField};
pub use snapshot::{AgentSnapshot, FieldSnapshot, Snapshot, WallSnapshot};
pub use state::{KindCounts, MetricsSample, Populations, SimState};
pub use tick::{TickEvent, tick};
