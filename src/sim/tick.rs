//! Fixed timestep simulation tick
//!
//! One tick, in order: record a metrics sample, step every collection
//! against a read-only targeting view, apply the emitted events as a
//! single batch, sweep out dead agents, then evaluate the emergent
//! infection-cleared condition. Structural changes never happen while a
//! collection is being scanned.

use glam::Vec2;

use super::agent::{BurstColor, KindState, WallSide};
use super::behavior;
use super::state::{MetricsSample, SimState};
use crate::consts::*;

/// A cross-agent effect decided during the step phase and applied at
/// tick end, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    /// Lethal damage to a pathogen, by id
    KillPathogen(u32),
    /// Mark a pathogen for T-cell predation
    FlagPathogen(u32),
    /// Additive signal release at a world position
    Deposit { pos: Vec2, amount: f32 },
    /// Replication offspring at the parent's position
    SpawnPathogen { pos: Vec2, hue: f32 },
    /// B-cell antibody production
    SpawnAntibody { pos: Vec2 },
    /// Decorative particle burst
    Burst { pos: Vec2, color: BurstColor },
    /// A boundary reflection happened on this side
    WallHit(WallSide),
}

/// Advance the whole simulation by one fixed timestep.
pub fn tick(state: &mut SimState, dt: f32) {
    // 1. Metrics sample of the pre-tick population.
    state.metrics.push(MetricsSample {
        time: state.time,
        counts: state.populations.counts(),
    });

    // 2. Step every agent against the tick-start targeting view.
    let targets = behavior::pathogen_views(&state.populations.pathogens);
    let mut events = Vec::new();
    for agent in state.populations.iter_all_mut() {
        behavior::step_agent(agent, &state.fields, &targets, &mut state.rng, &mut events, dt);
    }
    for p in &mut state.particles {
        p.pos += p.vel * dt;
        p.life -= dt;
    }

    // 3. Apply structural changes in emission order.
    apply_events(state, events);

    // 4. Sweep the dead, emitting death bursts for pathogens.
    sweep(state);

    // 5. Emergent condition: immune memory latches when the infection
    // clears while adaptive agents are present.
    if !state.immune_memory && state.infection_cleared() {
        state.immune_memory = true;
        log::info!("infection cleared at t={:.2}s, immune memory acquired", state.time);
    }

    state.time_ticks += 1;
    state.time += dt;
}

fn apply_events(state: &mut SimState, events: Vec<TickEvent>) {
    for event in events {
        match event {
            TickEvent::KillPathogen(id) => {
                if let Some(p) = state.populations.pathogen_mut(id)
                    && let KindState::Pathogen { health, .. } = &mut p.state
                {
                    *health = 0.0;
                }
            }
            TickEvent::FlagPathogen(id) => {
                if let Some(p) = state.populations.pathogen_mut(id)
                    && let KindState::Pathogen { flagged, .. } = &mut p.state
                {
                    *flagged = true;
                }
            }
            TickEvent::Deposit { pos, amount } => {
                state.fields.signal.deposit(pos.x, pos.y, amount);
            }
            TickEvent::SpawnPathogen { pos, hue } => {
                state.spawn_offspring(pos, hue);
            }
            TickEvent::SpawnAntibody { pos } => {
                state.spawn(super::agent::AgentKind::Antibody, pos);
            }
            TickEvent::Burst { pos, color } => {
                state.burst(pos, color);
            }
            TickEvent::WallHit(side) => {
                state.walls.damage(side, WALL_HIT_DAMAGE);
                // Damage recruits responders toward the arena center.
                let center = state.world_size() / 2.0;
                state.fields.signal.deposit(center, center, WALL_HIT_SIGNAL);
            }
        }
    }
}

/// Remove agents whose lifetime or death condition fired, preserving the
/// relative order of survivors.
fn sweep(state: &mut SimState) {
    let mut death_bursts: Vec<Vec2> = Vec::new();
    state.populations.pathogens.retain(|p| {
        if p.dead() {
            death_bursts.push(p.pos);
            false
        } else {
            true
        }
    });
    for pos in death_bursts {
        state.burst(pos, BurstColor::Orange);
    }

    state.populations.red_cells.retain(|a| !a.dead());
    state.populations.neutrophils.retain(|a| !a.dead());
    state.populations.macrophages.retain(|a| !a.dead());
    state.populations.t_cells.retain(|a| !a.dead());
    state.populations.b_cells.retain(|a| !a.dead());
    state.populations.antibodies.retain(|a| !a.dead());
    state.particles.retain(|p| p.life > 0.0);
}
