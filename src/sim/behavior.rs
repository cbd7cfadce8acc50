//! Per-kind interaction rules
//!
//! Every step composes the same skeleton: sample the relevant fields,
//! add kind-specific steering, add jitter, evaluate interaction triggers,
//! then integrate and resolve the boundary. Cross-agent effects never
//! mutate other collections directly; they are emitted as [`TickEvent`]s
//! and applied in a batch at tick end. Targeting reads an immutable view
//! of the pathogen population captured at tick start, so decisions are
//! independent of update order within the tick.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::agent::{Agent, AgentKind, BurstColor, KindState};
use super::field::FieldStore;
use super::tick::TickEvent;
use crate::consts::*;

/// Read-only view of one pathogen, captured at tick start.
#[derive(Debug, Clone, Copy)]
pub struct TargetView {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub flagged: bool,
}

/// Capture the targeting view of the current pathogen population.
pub fn pathogen_views(pathogens: &[Agent]) -> Vec<TargetView> {
    pathogens
        .iter()
        .map(|p| TargetView {
            id: p.id,
            pos: p.pos,
            radius: p.radius(),
            flagged: matches!(p.state, KindState::Pathogen { flagged: true, .. }),
        })
        .collect()
}

/// Nearest view satisfying `pred`, by Euclidean distance. Linear scan;
/// fine at the population sizes this simulation runs at. `None` when no
/// candidate qualifies - callers fall back to ambient field forces.
pub fn nearest_where<'a>(
    pos: Vec2,
    targets: &'a [TargetView],
    pred: impl Fn(&TargetView) -> bool,
) -> Option<&'a TargetView> {
    let mut best: Option<(&TargetView, f32)> = None;
    for t in targets.iter().filter(|t| pred(t)) {
        let d = pos.distance_squared(t.pos);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((t, d));
        }
    }
    best.map(|(t, _)| t)
}

/// Bounded uniform jitter force: each component in `[-span/2, span/2]`.
fn jitter(rng: &mut Pcg32, span: f32) -> Vec2 {
    Vec2::new(
        (rng.random::<f32>() - 0.5) * span,
        (rng.random::<f32>() - 0.5) * span,
    )
}

/// Unit steering direction toward a target, zero if on top of it.
fn seek(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Integrate, bounce, age; reports wall hits as events.
fn finish(agent: &mut Agent, world_size: f32, events: &mut Vec<TickEvent>, dt: f32) {
    agent.integrate(dt);
    let (hit_x, hit_y) = agent.resolve_boundary(world_size);
    for side in [hit_x, hit_y].into_iter().flatten() {
        events.push(TickEvent::WallHit(side));
    }
    agent.tick_life(dt);
}

/// Advance one agent by `dt`, dispatching on its kind.
pub fn step_agent(
    agent: &mut Agent,
    fields: &FieldStore,
    targets: &[TargetView],
    rng: &mut Pcg32,
    events: &mut Vec<TickEvent>,
    dt: f32,
) {
    match agent.kind() {
        AgentKind::RedCell => step_red_cell(agent, fields, rng, events, dt),
        AgentKind::Pathogen => step_pathogen(agent, fields, rng, events, dt),
        AgentKind::Neutrophil => step_neutrophil(agent, fields, targets, rng, events, dt),
        AgentKind::Macrophage => step_macrophage(agent, fields, targets, rng, events, dt),
        AgentKind::TCell => step_t_cell(agent, fields, targets, rng, events, dt),
        AgentKind::BCell => step_b_cell(agent, fields, rng, events, dt),
        AgentKind::Antibody => step_antibody(agent, fields, targets, rng, events, dt),
    }
}

/// Passive flow tracer: advected by blood flow plus jitter, no interactions.
fn step_red_cell(
    agent: &mut Agent,
    fields: &FieldStore,
    rng: &mut Pcg32,
    events: &mut Vec<TickEvent>,
    dt: f32,
) {
    let kind = agent.kind();
    let flow = fields.blood.sample(agent.pos.x, agent.pos.y);
    agent.apply_force(flow * kind.flow_factor(), dt);
    agent.apply_force(jitter(rng, kind.jitter_span()), dt);
    finish(agent, fields.world_size(), events, dt);
}

/// Drifts with the flow and replicates on a countdown. Replication is
/// the sole growth mechanism and is unbounded unless checked by predation.
fn step_pathogen(
    agent: &mut Agent,
    fields: &FieldStore,
    rng: &mut Pcg32,
    events: &mut Vec<TickEvent>,
    dt: f32,
) {
    let kind = agent.kind();
    let flow = fields.blood.sample(agent.pos.x, agent.pos.y);
    agent.apply_force(flow * kind.flow_factor(), dt);
    agent.apply_force(jitter(rng, kind.jitter_span()), dt);

    let pos = agent.pos;
    if let KindState::Pathogen { rep_timer, hue, .. } = &mut agent.state {
        *rep_timer -= dt;
        if *rep_timer <= 0.0 {
            *rep_timer = rng.random_range(REPLICATION_MIN_SECS..REPLICATION_MAX_SECS);
            let brood = rng.random_range(OFFSPRING_MIN..=OFFSPRING_MAX);
            for _ in 0..brood {
                events.push(TickEvent::SpawnPathogen {
                    pos,
                    hue: *hue + (rng.random::<f32>() - 0.5) * HUE_DRIFT,
                });
            }
            log::debug!("pathogen {} replicated into {} offspring", agent.id, brood);
        }
    }

    finish(agent, fields.world_size(), events, dt);
}

/// Chemotaxis hunter with kamikaze semantics: once the nearest pathogen
/// comes within engagement range a short fuse is armed; detonation kills
/// everything in the blast radius and the neutrophil with it.
fn step_neutrophil(
    agent: &mut Agent,
    fields: &FieldStore,
    targets: &[TargetView],
    rng: &mut Pcg32,
    events: &mut Vec<TickEvent>,
    dt: f32,
) {
    let kind = agent.kind();
    let flow = fields.blood.sample(agent.pos.x, agent.pos.y);
    let grad = fields.signal.gradient(agent.pos.x, agent.pos.y);
    agent.apply_force(flow * kind.flow_factor() + grad * kind.chemotaxis_gain(), dt);
    agent.apply_force(jitter(rng, kind.jitter_span()), dt);

    let pos = agent.pos;
    let mut detonated = false;
    if let KindState::Neutrophil { fuse } = &mut agent.state {
        if fuse.is_none()
            && let Some(t) = nearest_where(pos, targets, |_| true)
            && pos.distance(t.pos) < NEUTROPHIL_ENGAGE_RADIUS
        {
            *fuse = Some(NEUTROPHIL_FUSE_SECS);
        }
        if let Some(remaining) = fuse {
            *remaining -= dt;
            if *remaining <= 0.0 {
                detonated = true;
            }
        }
    }
    if detonated {
        for t in targets {
            if pos.distance(t.pos) < NEUTROPHIL_BLAST_RADIUS {
                events.push(TickEvent::KillPathogen(t.id));
            }
        }
        events.push(TickEvent::Burst {
            pos,
            color: BurstColor::Blue,
        });
        agent.expire();
        log::debug!("neutrophil {} detonated", agent.id);
    }

    finish(agent, fields.world_size(), events, dt);
}

/// Engulfs on contact, then digests: motion is heavily damped and further
/// kills are gated until digestion completes. Each kill releases signal,
/// recruiting more responders toward the site.
fn step_macrophage(
    agent: &mut Agent,
    fields: &FieldStore,
    targets: &[TargetView],
    rng: &mut Pcg32,
    events: &mut Vec<TickEvent>,
    dt: f32,
) {
    let kind = agent.kind();
    let flow = fields.blood.sample(agent.pos.x, agent.pos.y);
    let grad = fields.signal.gradient(agent.pos.x, agent.pos.y);
    agent.apply_force(flow * kind.flow_factor() + grad * kind.chemotaxis_gain(), dt);
    agent.apply_force(jitter(rng, kind.jitter_span()), dt);

    let mut hunting = false;
    if let KindState::Macrophage { digestion } = &mut agent.state {
        if *digestion > 0.0 {
            *digestion -= dt;
        } else {
            hunting = true;
        }
    }
    if hunting {
        let pos = agent.pos;
        let radius = agent.radius();
        let contact =
            nearest_where(pos, targets, |t| pos.distance(t.pos) < radius + t.radius);
        if let Some(t) = contact {
            events.push(TickEvent::KillPathogen(t.id));
            events.push(TickEvent::Deposit {
                pos,
                amount: MACROPHAGE_SIGNAL_DEPOSIT,
            });
            if let KindState::Macrophage { digestion } = &mut agent.state {
                *digestion = MACROPHAGE_DIGESTION_SECS;
            }
            log::debug!("macrophage {} engulfed pathogen {}", agent.id, t.id);
        }
    } else {
        agent.vel *= MACROPHAGE_DIGEST_DAMPING;
    }

    finish(agent, fields.world_size(), events, dt);
}

/// Hunts flagged pathogens specifically: direct pursuit when one exists,
/// ambient chemotaxis otherwise. Lethal only to flagged targets.
fn step_t_cell(
    agent: &mut Agent,
    fields: &FieldStore,
    targets: &[TargetView],
    rng: &mut Pcg32,
    events: &mut Vec<TickEvent>,
    dt: f32,
) {
    let kind = agent.kind();
    let pos = agent.pos;
    let flow = fields.blood.sample(pos.x, pos.y);
    let steer = match nearest_where(pos, targets, |t| t.flagged) {
        Some(t) => seek(pos, t.pos) * TCELL_SEEK_FORCE,
        None => fields.signal.gradient(pos.x, pos.y) * kind.chemotaxis_gain(),
    };
    agent.apply_force(flow * kind.flow_factor() + steer, dt);
    agent.apply_force(jitter(rng, kind.jitter_span()), dt);

    let radius = agent.radius();
    for t in targets {
        if t.flagged && pos.distance(t.pos) < radius + t.radius {
            events.push(TickEvent::KillPathogen(t.id));
        }
    }

    finish(agent, fields.world_size(), events, dt);
}

/// Produces an antibody at its own position on a fixed cooldown.
fn step_b_cell(
    agent: &mut Agent,
    fields: &FieldStore,
    rng: &mut Pcg32,
    events: &mut Vec<TickEvent>,
    dt: f32,
) {
    let kind = agent.kind();
    let flow = fields.blood.sample(agent.pos.x, agent.pos.y);
    let grad = fields.signal.gradient(agent.pos.x, agent.pos.y);
    agent.apply_force(flow * kind.flow_factor() + grad * kind.chemotaxis_gain(), dt);
    agent.apply_force(jitter(rng, kind.jitter_span()), dt);

    let pos = agent.pos;
    if let KindState::BCell { cooldown } = &mut agent.state {
        *cooldown -= dt;
        if *cooldown <= 0.0 {
            *cooldown = BCELL_COOLDOWN_SECS;
            events.push(TickEvent::SpawnAntibody { pos });
        }
    }

    finish(agent, fields.world_size(), events, dt);
}

/// Seeks the nearest pathogen directly (no field gradient). On contact it
/// flags the target for T-cell predation and expires; otherwise it
/// expires when its lifespan runs out.
fn step_antibody(
    agent: &mut Agent,
    fields: &FieldStore,
    targets: &[TargetView],
    rng: &mut Pcg32,
    events: &mut Vec<TickEvent>,
    dt: f32,
) {
    let kind = agent.kind();
    let target = nearest_where(agent.pos, targets, |_| true).copied();
    if let Some(t) = target {
        let steer = seek(agent.pos, t.pos) * ANTIBODY_SEEK_FORCE;
        agent.apply_force(steer, dt);
    }
    agent.apply_force(jitter(rng, kind.jitter_span()), dt);
    finish(agent, fields.world_size(), events, dt);

    // Contact check against the post-move position.
    if let Some(t) = target
        && agent.pos.distance(t.pos) < agent.radius() + t.radius
    {
        events.push(TickEvent::FlagPathogen(t.id));
        agent.expire();
        log::debug!("antibody {} flagged pathogen {}", agent.id, t.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: u32, x: f32, y: f32, flagged: bool) -> TargetView {
        TargetView {
            id,
            pos: Vec2::new(x, y),
            radius: 12.0,
            flagged,
        }
    }

    #[test]
    fn test_nearest_where_empty_is_none() {
        assert!(nearest_where(Vec2::ZERO, &[], |_| true).is_none());
    }

    #[test]
    fn test_nearest_where_picks_closest() {
        let targets = [view(1, 100.0, 0.0, false), view(2, 10.0, 0.0, false)];
        let t = nearest_where(Vec2::ZERO, &targets, |_| true).unwrap();
        assert_eq!(t.id, 2);
    }

    #[test]
    fn test_nearest_where_respects_filter() {
        let targets = [view(1, 10.0, 0.0, false), view(2, 500.0, 0.0, true)];
        let t = nearest_where(Vec2::ZERO, &targets, |t| t.flagged).unwrap();
        assert_eq!(t.id, 2);
        assert!(nearest_where(Vec2::ZERO, &targets[..1], |t| t.flagged).is_none());
    }

    #[test]
    fn test_seek_is_unit_length() {
        let s = seek(Vec2::ZERO, Vec2::new(30.0, 40.0));
        assert!((s.length() - 1.0).abs() < 1e-5);
        assert_eq!(seek(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
    }
}
