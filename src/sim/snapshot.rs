//! Read-only snapshots for the presentation layer
//!
//! The snapshot is the only export surface: plain serializable data, no
//! references into live state. The renderer and UI consume this; they
//! never touch the simulation directly.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentKind, KindState, Particle, WallSide};
use super::state::{MetricsSample, SimState};

/// Pure-state view of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: u32,
    pub kind: AgentKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Remaining lifetime in seconds; `None` when unbounded
    pub life: Option<f32>,
    /// Kind-specific display attributes (hue, flags, timers)
    pub state: KindState,
}

impl AgentSnapshot {
    fn capture(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            kind: agent.kind(),
            pos: agent.pos,
            vel: agent.vel,
            radius: agent.radius(),
            life: agent.life.is_finite().then_some(agent.life),
            state: agent.state.clone(),
        }
    }
}

/// Raw field contents plus the grid geometry needed to draw them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub resolution: usize,
    pub world_size: f32,
    /// Row-major cell data
    pub blood: Vec<Vec2>,
    pub lymph: Vec<Vec2>,
    pub signal: Vec<f32>,
}

/// Wall integrity per side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSnapshot {
    pub side: WallSide,
    pub integrity: f32,
}

/// Everything the presentation layer needs after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub time: f32,
    pub running: bool,
    pub speed: f32,
    pub immune_memory: bool,
    pub agents: Vec<AgentSnapshot>,
    pub particles: Vec<Particle>,
    pub walls: Vec<WallSnapshot>,
    pub fields: FieldSnapshot,
    pub metrics: Vec<MetricsSample>,
}

impl Snapshot {
    pub(crate) fn capture(state: &SimState, running: bool, speed: f32) -> Self {
        Self {
            tick: state.time_ticks,
            time: state.time,
            running,
            speed,
            immune_memory: state.immune_memory,
            agents: state
                .populations
                .iter_all()
                .map(AgentSnapshot::capture)
                .collect(),
            particles: state.particles.clone(),
            walls: WallSide::ALL
                .iter()
                .map(|&side| WallSnapshot {
                    side,
                    integrity: state.walls.integrity(side),
                })
                .collect(),
            fields: FieldSnapshot {
                resolution: state.fields.signal.resolution(),
                world_size: state.fields.world_size(),
                blood: state.fields.blood.cells().to_vec(),
                lymph: state.fields.lymph.cells().to_vec(),
                signal: state.fields.signal.cells().to_vec(),
            },
            metrics: state.metrics.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimConfig;

    #[test]
    fn test_snapshot_covers_whole_population() {
        let state = SimState::new(&SimConfig::default());
        let snap = Snapshot::capture(&state, false, 1.0);
        let total: usize = 40 + 2 + 1 + 1 + 1;
        assert_eq!(snap.agents.len(), total);
        assert_eq!(snap.walls.len(), 4);
        assert_eq!(snap.fields.blood.len(), 32 * 32);
        assert!(!snap.running);
    }

    #[test]
    fn test_unbounded_life_serializes_as_none() {
        let state = SimState::new(&SimConfig::default());
        let snap = Snapshot::capture(&state, false, 1.0);
        assert!(snap.agents.iter().all(|a| a.life.is_none()));
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let state = SimState::new(&SimConfig::with_seed(3));
        let snap = Snapshot::capture(&state, true, 2.0);
        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
