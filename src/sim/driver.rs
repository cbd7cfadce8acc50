//! Step driver: run state, speed, and the command surface
//!
//! The driver owns the simulation state outright. External commands are
//! queued and drained before the next tick runs, so nothing can mutate
//! state mid-tick. Advancing uses the fixed timestep with an accumulator;
//! the speed multiplier scales the wall-clock delta, not the timestep, so
//! replication timers, cooldowns, and lifespans stay consistent.

use glam::Vec2;

use super::agent::{AgentKind, WallSide};
use super::snapshot::Snapshot;
use super::state::{MetricsSample, SimState};
use super::tick::tick;
use crate::consts::{MAX_SUBSTEPS, REINFORCE_SQUAD_SIZE, SIM_DT};
use crate::{ConfigError, SimConfig};

/// Whether the clock is advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

/// Commands issued by the host UI. Applied between ticks, in order.
/// Invalid-state commands are no-ops, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    /// Execute exactly one tick; ignored while running
    Step,
    /// Replace the speed multiplier; non-positive values are rejected
    SetSpeed(f32),
    Spawn { kind: AgentKind, pos: Vec2 },
    /// Spawn a small squad of the given kind at random positions
    Reinforce(AgentKind),
    /// Restore wall integrity, capped at the maximum
    RepairWall { side: WallSide, amount: f32 },
    /// Rebuild the run from its config and seed
    Reset,
}

/// A single simulation run and its clock.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    state: SimState,
    run_state: RunState,
    speed: f32,
    accumulator: f32,
    queued: Vec<Command>,
}

impl Simulation {
    /// Validate the config and seed the initial population.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "simulation initialized: seed={}, world={}, grid={}x{}",
            config.seed,
            config.world_size,
            config.field_resolution,
            config.field_resolution
        );
        let state = SimState::new(&config);
        let speed = config.speed;
        Ok(Self {
            config,
            state,
            run_state: RunState::Stopped,
            speed,
            accumulator: 0.0,
            queued: Vec::new(),
        })
    }

    /// Queue a command for application before the next tick.
    pub fn queue(&mut self, command: Command) {
        self.queued.push(command);
    }

    /// Drain queued commands, then run pending fixed ticks if playing.
    ///
    /// `frame_dt` is the wall-clock delta since the last call; it is
    /// scaled by the speed multiplier and capped to avoid a spiral of
    /// death after a long stall.
    pub fn advance(&mut self, frame_dt: f32) {
        self.drain_commands();
        if self.run_state != RunState::Running {
            return;
        }
        self.accumulator += frame_dt.min(0.1) * self.speed;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
    }

    fn drain_commands(&mut self) {
        for command in std::mem::take(&mut self.queued) {
            self.apply_command(command);
        }
    }

    fn apply_command(&mut self, command: Command) {
        match command {
            Command::Play => {
                self.run_state = RunState::Running;
            }
            Command::Pause => {
                self.run_state = RunState::Stopped;
            }
            Command::Step => {
                if self.run_state == RunState::Stopped {
                    tick(&mut self.state, SIM_DT);
                }
            }
            Command::SetSpeed(multiplier) => {
                if multiplier.is_finite() && multiplier > 0.0 {
                    self.speed = multiplier;
                } else {
                    log::warn!("ignoring invalid speed multiplier {multiplier}");
                }
            }
            Command::Spawn { kind, pos } => {
                self.state.spawn(kind, pos);
            }
            Command::Reinforce(kind) => {
                for _ in 0..REINFORCE_SQUAD_SIZE {
                    self.state.spawn_at_random(kind);
                }
                log::debug!("reinforced with {REINFORCE_SQUAD_SIZE} {kind:?}");
            }
            Command::RepairWall { side, amount } => {
                self.state.walls.repair(side, amount);
            }
            Command::Reset => {
                log::info!("simulation reset (seed {})", self.config.seed);
                self.state = SimState::new(&self.config);
                self.accumulator = 0.0;
            }
        }
    }

    // Convenience wrappers over the command queue.

    pub fn play(&mut self) {
        self.queue(Command::Play);
    }

    pub fn pause(&mut self) {
        self.queue(Command::Pause);
    }

    pub fn step(&mut self) {
        self.queue(Command::Step);
    }

    pub fn set_speed(&mut self, multiplier: f32) {
        self.queue(Command::SetSpeed(multiplier));
    }

    pub fn spawn(&mut self, kind: AgentKind, x: f32, y: f32) {
        self.queue(Command::Spawn {
            kind,
            pos: Vec2::new(x, y),
        });
    }

    pub fn reinforce(&mut self, kind: AgentKind) {
        self.queue(Command::Reinforce(kind));
    }

    pub fn reset(&mut self) {
        self.queue(Command::Reset);
    }

    // Read-only queries.

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn metrics(&self) -> &[MetricsSample] {
        &self.state.metrics
    }

    /// Serializable view of the whole run for the presentation layer.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state, self.is_running(), self.speed)
    }

    /// The recorded time series as delimited text.
    pub fn metrics_csv(&self) -> String {
        crate::export::metrics_csv(&self.state.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::WALL_MAX_INTEGRITY;

    fn sim(seed: u64) -> Simulation {
        Simulation::new(SimConfig::with_seed(seed)).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = SimConfig::default();
        config.speed = 0.0;
        assert!(Simulation::new(config).is_err());
    }

    #[test]
    fn test_does_not_advance_while_stopped() {
        let mut s = sim(1);
        s.advance(1.0);
        assert_eq!(s.state().time_ticks, 0);
    }

    #[test]
    fn test_play_then_advance_ticks() {
        let mut s = sim(1);
        s.play();
        s.advance(SIM_DT);
        assert_eq!(s.state().time_ticks, 1);
        s.advance(SIM_DT);
        assert_eq!(s.state().time_ticks, 2);
    }

    #[test]
    fn test_step_runs_exactly_one_tick_while_stopped() {
        let mut s = sim(1);
        s.step();
        s.advance(0.0);
        assert_eq!(s.state().time_ticks, 1);
    }

    #[test]
    fn test_step_is_noop_while_running() {
        let mut s = sim(1);
        s.play();
        s.advance(SIM_DT); // 1 tick
        s.step();
        s.advance(0.0); // step ignored, no accumulated time
        assert_eq!(s.state().time_ticks, 1);
    }

    #[test]
    fn test_speed_scales_tick_rate() {
        let mut s = sim(1);
        s.play();
        s.set_speed(4.0);
        // 1.1 frames at 4x speed: 4.4 ticks of accumulated time.
        s.advance(SIM_DT * 1.1);
        assert_eq!(s.state().time_ticks, 4);
    }

    #[test]
    fn test_invalid_speed_is_rejected_at_runtime() {
        let mut s = sim(1);
        s.set_speed(-1.0);
        s.advance(0.0);
        assert_eq!(s.speed(), 1.0);
    }

    #[test]
    fn test_substeps_are_bounded() {
        let mut s = sim(1);
        s.play();
        s.advance(10.0); // huge stall, capped to 0.1s then MAX_SUBSTEPS
        assert!(s.state().time_ticks <= MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_spawn_command_lands_before_next_tick() {
        let mut s = sim(1);
        s.spawn(AgentKind::Pathogen, 500.0, 500.0);
        s.step();
        s.advance(0.0);
        // The spawned pathogen was already visible to the first sample.
        assert_eq!(s.metrics()[0].counts.pathogens, 1);
    }

    #[test]
    fn test_reinforce_spawns_a_squad() {
        let mut s = sim(1);
        s.reinforce(AgentKind::Neutrophil);
        s.advance(0.0);
        assert_eq!(
            s.state().populations.neutrophils.len(),
            2 + REINFORCE_SQUAD_SIZE
        );
    }

    #[test]
    fn test_repair_wall_restores_integrity() {
        let mut s = sim(1);
        s.state.walls.damage(WallSide::Top, 40.0);
        s.queue(Command::RepairWall {
            side: WallSide::Top,
            amount: 15.0,
        });
        s.advance(0.0);
        assert_eq!(
            s.state().walls.integrity(WallSide::Top),
            WALL_MAX_INTEGRITY - 40.0 + 15.0
        );
    }

    #[test]
    fn test_reset_restores_initial_run() {
        let mut s = sim(7);
        s.spawn(AgentKind::Pathogen, 100.0, 100.0);
        s.play();
        for _ in 0..30 {
            s.advance(SIM_DT);
        }
        assert!(!s.metrics().is_empty());
        s.state.walls.damage(WallSide::Left, 25.0);

        s.reset();
        s.advance(0.0);
        let state = s.state();
        assert_eq!(state.time_ticks, 0);
        assert!(state.metrics.is_empty());
        for side in WallSide::ALL {
            assert_eq!(state.walls.integrity(side), WALL_MAX_INTEGRITY);
        }
        // Back to the seeded initial population, nothing more.
        let counts = state.populations.counts();
        assert_eq!(counts.pathogens, 0);
        assert_eq!(counts.red_cells, 40);

        // Same seed: the rebuilt run matches a fresh one exactly.
        let fresh = sim(7);
        for (a, b) in state
            .populations
            .iter_all()
            .zip(fresh.state().populations.iter_all())
        {
            assert_eq!(a.pos, b.pos);
        }
    }

    #[test]
    fn test_csv_rows_match_ticks() {
        let mut s = sim(1);
        s.play();
        for _ in 0..10 {
            s.advance(SIM_DT);
        }
        let csv = s.metrics_csv();
        // Header plus one row per executed tick.
        assert_eq!(csv.lines().count(), 1 + 10);
    }
}
