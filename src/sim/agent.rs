//! Agent model: kinds, physics, walls, and burst particles
//!
//! Agents are a closed tagged union over the fixed set of kinds. Position
//! and velocity are mutated only by the agent's own step within a tick;
//! radius and mass are immutable after creation.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// The fixed set of agent kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    RedCell,
    Pathogen,
    Neutrophil,
    Macrophage,
    TCell,
    BCell,
    Antibody,
}

impl AgentKind {
    /// Collision radius in world units.
    pub fn radius(&self) -> f32 {
        match self {
            Self::RedCell | Self::Pathogen => 12.0,
            Self::Neutrophil => 15.0,
            Self::Macrophage => 20.0,
            Self::TCell | Self::BCell => 13.0,
            Self::Antibody => 5.0,
        }
    }

    pub fn mass(&self) -> f32 {
        match self {
            Self::RedCell => 1.0,
            Self::Pathogen => 0.8,
            Self::Neutrophil => 1.4,
            Self::Macrophage => 2.2,
            Self::TCell => 1.2,
            Self::BCell => 1.1,
            Self::Antibody => 0.5,
        }
    }

    /// Multiplier on the sampled blood flow force. Antibodies swim free.
    pub fn flow_factor(&self) -> f32 {
        match self {
            Self::RedCell => 2.0,
            Self::Pathogen => 1.0,
            Self::Neutrophil => 0.5,
            Self::Macrophage => 0.3,
            Self::TCell | Self::BCell => 0.4,
            Self::Antibody => 0.0,
        }
    }

    /// Multiplier on the signal gradient (chemotaxis strength).
    pub fn chemotaxis_gain(&self) -> f32 {
        match self {
            Self::Neutrophil => 100.0,
            Self::Macrophage => 60.0,
            Self::TCell => 80.0,
            Self::BCell => 50.0,
            Self::RedCell | Self::Pathogen | Self::Antibody => 0.0,
        }
    }

    /// Total span of the per-axis jitter force (uniform, centered on zero).
    pub fn jitter_span(&self) -> f32 {
        match self {
            Self::RedCell | Self::Neutrophil => 10.0,
            Self::Pathogen | Self::Macrophage | Self::TCell | Self::BCell => 8.0,
            Self::Antibody => 5.0,
        }
    }
}

/// Kind-specific mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KindState {
    RedCell,
    Pathogen {
        health: f32,
        /// Seconds until the next replication burst
        rep_timer: f32,
        /// Set by an antibody; marks the pathogen for T-cell predation
        flagged: bool,
        /// Display hue, drifts across generations
        hue: f32,
    },
    Neutrophil {
        /// Armed detonation countdown; irreversible once set
        fuse: Option<f32>,
    },
    Macrophage {
        /// Remaining digestion time; gates kills and damps motion
        digestion: f32,
    },
    TCell,
    BCell {
        /// Seconds until the next antibody is produced
        cooldown: f32,
    },
    Antibody,
}

impl KindState {
    pub fn kind(&self) -> AgentKind {
        match self {
            Self::RedCell => AgentKind::RedCell,
            Self::Pathogen { .. } => AgentKind::Pathogen,
            Self::Neutrophil { .. } => AgentKind::Neutrophil,
            Self::Macrophage { .. } => AgentKind::Macrophage,
            Self::TCell => AgentKind::TCell,
            Self::BCell { .. } => AgentKind::BCell,
            Self::Antibody => AgentKind::Antibody,
        }
    }
}

/// One side of the arena boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl WallSide {
    pub const ALL: [WallSide; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

    fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Bottom => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }
}

/// Integrity of the four arena walls, each in `[0, WALL_MAX_INTEGRITY]`.
///
/// Integrity only decreases via bounce damage and only increases via
/// explicit repair commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Walls {
    integrity: [f32; 4],
}

impl Default for Walls {
    fn default() -> Self {
        Self {
            integrity: [WALL_MAX_INTEGRITY; 4],
        }
    }
}

impl Walls {
    pub fn integrity(&self, side: WallSide) -> f32 {
        self.integrity[side.index()]
    }

    /// Reduce a wall's integrity, floored at zero.
    pub fn damage(&mut self, side: WallSide, amount: f32) {
        let hp = &mut self.integrity[side.index()];
        let before = *hp;
        *hp = (*hp - amount).max(0.0);
        if before > 0.0 && *hp == 0.0 {
            log::warn!("{side:?} wall breached");
        }
    }

    /// Raise a wall's integrity, capped at the maximum.
    pub fn repair(&mut self, side: WallSide, amount: f32) {
        let hp = &mut self.integrity[side.index()];
        *hp = (*hp + amount).min(WALL_MAX_INTEGRITY);
    }
}

/// A mobile agent. Radius and mass are fixed at creation.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    radius: f32,
    mass: f32,
    /// Remaining lifetime in seconds; infinite by default
    pub life: f32,
    pub state: KindState,
}

impl Agent {
    /// Create an agent of the given kind with its initial kind state.
    /// Pathogens draw their replication timer and hue from `rng`.
    pub fn spawn(id: u32, kind: AgentKind, pos: Vec2, rng: &mut Pcg32) -> Self {
        let state = match kind {
            AgentKind::RedCell => KindState::RedCell,
            AgentKind::Pathogen => KindState::Pathogen {
                health: PATHOGEN_HEALTH,
                rep_timer: rng.random_range(REPLICATION_MIN_SECS..REPLICATION_MAX_SECS),
                flagged: false,
                hue: rng.random_range(0.0..360.0),
            },
            AgentKind::Neutrophil => KindState::Neutrophil { fuse: None },
            AgentKind::Macrophage => KindState::Macrophage { digestion: 0.0 },
            AgentKind::TCell => KindState::TCell,
            AgentKind::BCell => KindState::BCell { cooldown: 0.0 },
            AgentKind::Antibody => KindState::Antibody,
        };
        let life = match kind {
            AgentKind::Antibody => ANTIBODY_LIFESPAN_SECS,
            _ => f32::INFINITY,
        };
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: kind.radius(),
            mass: kind.mass(),
            life,
            state,
        }
    }

    pub fn kind(&self) -> AgentKind {
        self.state.kind()
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Semi-implicit Euler: velocity is updated before position.
    pub fn apply_force(&mut self, force: Vec2, dt: f32) {
        self.vel += force / self.mass * dt;
    }

    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    /// Age the agent; infinite lifetimes stay infinite.
    pub fn tick_life(&mut self, dt: f32) {
        self.life -= dt;
    }

    /// Mark the agent for removal in this tick's sweep.
    pub fn expire(&mut self) {
        self.life = 0.0;
    }

    /// True once the lifetime or a kind-specific death condition fires.
    pub fn dead(&self) -> bool {
        if self.life <= 0.0 {
            return true;
        }
        matches!(self.state, KindState::Pathogen { health, .. } if health <= 0.0)
    }

    /// Reflect off any penetrated arena edge with damping and clamp the
    /// position inside `[radius, world_size - radius]`. Returns the hit
    /// side per axis so the caller can account wall damage.
    pub fn resolve_boundary(&mut self, world_size: f32) -> (Option<WallSide>, Option<WallSide>) {
        let r = self.radius;
        let mut hit_x = None;
        let mut hit_y = None;
        if self.pos.x - r < 0.0 {
            self.pos.x = r;
            self.vel.x = -self.vel.x * BOUNCE_DAMPING;
            hit_x = Some(WallSide::Left);
        } else if self.pos.x + r > world_size {
            self.pos.x = world_size - r;
            self.vel.x = -self.vel.x * BOUNCE_DAMPING;
            hit_x = Some(WallSide::Right);
        }
        if self.pos.y - r < 0.0 {
            self.pos.y = r;
            self.vel.y = -self.vel.y * BOUNCE_DAMPING;
            hit_y = Some(WallSide::Top);
        } else if self.pos.y + r > world_size {
            self.pos.y = world_size - r;
            self.vel.y = -self.vel.y * BOUNCE_DAMPING;
            hit_y = Some(WallSide::Bottom);
        }
        (hit_x, hit_y)
    }
}

/// Burst color hints for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurstColor {
    /// Neutrophil detonation
    Blue,
    /// Pathogen death
    Orange,
}

/// A decorative burst particle. Ballistic, no interactions, no bounce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: BurstColor,
    pub life: f32,
}
