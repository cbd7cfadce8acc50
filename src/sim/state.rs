//! Simulation state and the population registry
//!
//! All state for one run lives here: fields, per-kind agent collections,
//! walls, the seeded RNG, and the metrics log. Collections are
//! insertion-ordered; spawns append at the tail and removals compact while
//! preserving relative order, so iteration is stable and deterministic.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentKind, BurstColor, KindState, Particle, Walls};
use super::field::FieldStore;
use crate::SimConfig;
use crate::consts::*;

/// Live agent count per kind at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub red_cells: usize,
    pub pathogens: usize,
    pub neutrophils: usize,
    pub macrophages: usize,
    pub t_cells: usize,
    pub b_cells: usize,
    pub antibodies: usize,
}

/// One row of the exported time series. Append-only; never read back by
/// the simulation itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    pub time: f32,
    pub counts: KindCounts,
}

/// Insertion-ordered collections for every agent kind.
#[derive(Debug, Clone, Default)]
pub struct Populations {
    pub red_cells: Vec<Agent>,
    pub pathogens: Vec<Agent>,
    pub neutrophils: Vec<Agent>,
    pub macrophages: Vec<Agent>,
    pub t_cells: Vec<Agent>,
    pub b_cells: Vec<Agent>,
    pub antibodies: Vec<Agent>,
}

impl Populations {
    pub fn collection_mut(&mut self, kind: AgentKind) -> &mut Vec<Agent> {
        match kind {
            AgentKind::RedCell => &mut self.red_cells,
            AgentKind::Pathogen => &mut self.pathogens,
            AgentKind::Neutrophil => &mut self.neutrophils,
            AgentKind::Macrophage => &mut self.macrophages,
            AgentKind::TCell => &mut self.t_cells,
            AgentKind::BCell => &mut self.b_cells,
            AgentKind::Antibody => &mut self.antibodies,
        }
    }

    /// All agents in the fixed per-kind step order.
    pub fn iter_all(&self) -> impl Iterator<Item = &Agent> {
        self.red_cells
            .iter()
            .chain(&self.pathogens)
            .chain(&self.neutrophils)
            .chain(&self.macrophages)
            .chain(&self.t_cells)
            .chain(&self.b_cells)
            .chain(&self.antibodies)
    }

    /// Mutable iteration in the same fixed order the tick uses.
    pub fn iter_all_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.red_cells
            .iter_mut()
            .chain(&mut self.pathogens)
            .chain(&mut self.neutrophils)
            .chain(&mut self.macrophages)
            .chain(&mut self.t_cells)
            .chain(&mut self.b_cells)
            .chain(&mut self.antibodies)
    }

    pub fn pathogen_mut(&mut self, id: u32) -> Option<&mut Agent> {
        self.pathogens.iter_mut().find(|p| p.id == id)
    }

    pub fn counts(&self) -> KindCounts {
        KindCounts {
            red_cells: self.red_cells.len(),
            pathogens: self.pathogens.len(),
            neutrophils: self.neutrophils.len(),
            macrophages: self.macrophages.len(),
            t_cells: self.t_cells.len(),
            b_cells: self.b_cells.len(),
            antibodies: self.antibodies.len(),
        }
    }
}

/// Complete state of one simulation run. Owned by the step driver and
/// never shared; commands mutate it only between ticks.
#[derive(Debug, Clone)]
pub struct SimState {
    pub fields: FieldStore,
    pub populations: Populations,
    pub particles: Vec<Particle>,
    pub walls: Walls,
    pub rng: Pcg32,
    pub time_ticks: u64,
    /// Elapsed simulation time in seconds
    pub time: f32,
    pub metrics: Vec<MetricsSample>,
    /// Latched once the infection clears with adaptive agents present
    pub immune_memory: bool,
    next_id: u32,
}

impl SimState {
    /// Build and seed the initial population from a validated config.
    pub fn new(config: &SimConfig) -> Self {
        let mut state = Self {
            fields: FieldStore::new(config.world_size, config.field_resolution),
            populations: Populations::default(),
            particles: Vec::new(),
            walls: Walls::default(),
            rng: Pcg32::seed_from_u64(config.seed),
            time_ticks: 0,
            time: 0.0,
            metrics: Vec::new(),
            immune_memory: false,
            next_id: 1,
        };
        let seeding = [
            (AgentKind::RedCell, config.initial_red_cells),
            (AgentKind::Pathogen, config.initial_pathogens),
            (AgentKind::Neutrophil, config.initial_neutrophils),
            (AgentKind::Macrophage, config.initial_macrophages),
            (AgentKind::TCell, config.initial_t_cells),
            (AgentKind::BCell, config.initial_b_cells),
        ];
        for (kind, count) in seeding {
            for _ in 0..count {
                state.spawn_at_random(kind);
            }
        }
        state
    }

    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn world_size(&self) -> f32 {
        self.fields.world_size()
    }

    /// Append a new agent of `kind` at `pos` to the tail of its collection.
    pub fn spawn(&mut self, kind: AgentKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        let agent = Agent::spawn(id, kind, pos, &mut self.rng);
        self.populations.collection_mut(kind).push(agent);
        id
    }

    pub fn spawn_at_random(&mut self, kind: AgentKind) -> u32 {
        let w = self.world_size();
        let pos = Vec2::new(self.rng.random_range(0.0..w), self.rng.random_range(0.0..w));
        self.spawn(kind, pos)
    }

    /// Spawn a replication offspring carrying the parent's drifted hue.
    pub fn spawn_offspring(&mut self, pos: Vec2, parent_hue: f32) -> u32 {
        let id = self.spawn(AgentKind::Pathogen, pos);
        // spawn() drew a fresh hue; offspring inherit the parent's line.
        if let Some(child) = self.populations.pathogens.last_mut()
            && let KindState::Pathogen { hue, .. } = &mut child.state
        {
            *hue = parent_hue;
        }
        id
    }

    /// Emit a burst of decorative particles at an event location.
    pub fn burst(&mut self, pos: Vec2, color: BurstColor) {
        for _ in 0..BURST_PARTICLE_COUNT {
            let vel = Vec2::new(
                (self.rng.random::<f32>() - 0.5) * PARTICLE_SPEED_SPAN,
                (self.rng.random::<f32>() - 0.5) * PARTICLE_SPEED_SPAN,
            );
            self.particles.push(Particle {
                pos,
                vel,
                color,
                life: PARTICLE_LIFE_SECS,
            });
        }
    }

    /// True when no pathogens remain and at least one adaptive-response
    /// agent (T-cell or B-cell) exists.
    pub fn infection_cleared(&self) -> bool {
        self.populations.pathogens.is_empty()
            && (!self.populations.t_cells.is_empty() || !self.populations.b_cells.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_seeding_matches_config() {
        let state = SimState::new(&SimConfig::default());
        let counts = state.populations.counts();
        assert_eq!(counts.red_cells, 40);
        assert_eq!(counts.pathogens, 0);
        assert_eq!(counts.neutrophils, 2);
        assert_eq!(counts.macrophages, 1);
        assert_eq!(counts.t_cells, 1);
        assert_eq!(counts.b_cells, 1);
        assert_eq!(counts.antibodies, 0);
    }

    #[test]
    fn test_seeded_agents_are_inside_the_arena() {
        let state = SimState::new(&SimConfig::default());
        let w = state.world_size();
        for a in state.populations.iter_all() {
            assert!(a.pos.x >= 0.0 && a.pos.x <= w);
            assert!(a.pos.y >= 0.0 && a.pos.y <= w);
        }
    }

    #[test]
    fn test_spawn_appends_at_tail_with_fresh_ids() {
        let mut state = SimState::new(&SimConfig::default());
        let first = state.spawn(AgentKind::Pathogen, Vec2::new(10.0, 10.0));
        let second = state.spawn(AgentKind::Pathogen, Vec2::new(20.0, 20.0));
        assert!(second > first);
        let ids: Vec<u32> = state.populations.pathogens.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_offspring_inherits_parent_hue() {
        let mut state = SimState::new(&SimConfig::default());
        state.spawn_offspring(Vec2::new(5.0, 5.0), 123.0);
        let child = state.populations.pathogens.last().unwrap();
        assert!(matches!(
            child.state,
            KindState::Pathogen { hue, .. } if (hue - 123.0).abs() < 1e-6
        ));
    }

    #[test]
    fn test_same_seed_same_seeding() {
        let a = SimState::new(&SimConfig::with_seed(5));
        let b = SimState::new(&SimConfig::with_seed(5));
        for (x, y) in a.populations.iter_all().zip(b.populations.iter_all()) {
            assert_eq!(x.pos, y.pos);
        }
    }

    #[test]
    fn test_burst_emits_fixed_particle_count() {
        let mut state = SimState::new(&SimConfig::default());
        state.burst(Vec2::new(100.0, 100.0), BurstColor::Orange);
        assert_eq!(state.particles.len(), BURST_PARTICLE_COUNT);
        assert!(state.particles.iter().all(|p| p.life == PARTICLE_LIFE_SECS));
    }

    #[test]
    fn test_infection_cleared_needs_adaptive_agents() {
        let mut config = SimConfig::default();
        config.initial_t_cells = 0;
        config.initial_b_cells = 0;
        let state = SimState::new(&config);
        assert!(!state.infection_cleared());

        let state = SimState::new(&SimConfig::default());
        assert!(state.infection_cleared());
    }
}
