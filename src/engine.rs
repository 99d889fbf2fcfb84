use std::time::Instant;

use crate::body::BodyStore;
use crate::collision::{self, CollisionStats};
use crate::config::EngineConfig;
use crate::energy::{self, EnergyReport};
use crate::errors::{EngineError, Result};
use crate::force::{self, ForceMethod};
use crate::integrator;
use crate::soa::BodyArrays;

/// A body samples its trail once every this many steps (spec §4.1: "a body
/// appends to its own trail once every N physics sub-steps (N=5 in
/// source)"); the ratio belongs to the trail-sampling subsystem, not to the
/// physics itself.
pub const TRAIL_SAMPLE_PERIOD: u64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Idle,
    Stepping,
}

/// Per-phase timings and counters from the most recently completed step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineStats {
    pub method: ForceMethod,
    pub total_micros: u64,
    pub force_micros: u64,
    pub integrate_micros: u64,
    pub collide_micros: u64,
    pub tree_micros: u64,
    pub body_count: usize,
    pub force_ops: u64,
    pub collisions: u64,
}

impl Default for EngineStats {
    fn default() -> Self {
        Self {
            method: ForceMethod::NaiveDirect,
            total_micros: 0,
            force_micros: 0,
            integrate_micros: 0,
            collide_micros: 0,
            tree_micros: 0,
            body_count: 0,
            force_ops: 0,
            collisions: 0,
        }
    }
}

/// Sequences the per-step pipeline (spec §4.8): force evaluation, then
/// collision resolution, then integration, with stats recorded at the end.
/// Config changes and reads are snapshotted at step boundaries; re-entering
/// `step` before a prior call returns is refused rather than silently
/// queued (spec §4.8's `{Idle, Stepping}` state machine).
#[derive(Debug)]
pub struct PhysicsEngine {
    config: EngineConfig,
    state: RunState,
    stats: EngineStats,
    step_count: u64,
}

impl PhysicsEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: RunState::Idle,
            stats: EngineStats::default(),
            step_count: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rejected while a step is in progress; otherwise takes effect for the
    /// next call to `step`.
    pub fn set_config(&mut self, config: EngineConfig) -> Result<()> {
        if self.state == RunState::Stepping {
            return Err(EngineError::ReentrantStep);
        }
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Diagnostic only; reads `bodies` without mutating it and has no
    /// bearing on `step`.
    pub fn energy(&self, bodies: &BodyStore) -> EnergyReport {
        energy::compute(bodies.as_slice(), self.config.gravitational_constant)
    }

    /// Advances `bodies` by `dt` (spec §4.8). A no-op on an empty store.
    /// Fixed and dragged bodies are excluded from motion by the integrator,
    /// not here.
    pub fn step(&mut self, bodies: &mut BodyStore, dt: f64) -> Result<()> {
        if self.state == RunState::Stepping {
            return Err(EngineError::ReentrantStep);
        }
        if bodies.is_empty() {
            return Ok(());
        }

        self.state = RunState::Stepping;
        let result = self.step_inner(bodies, dt);
        self.state = RunState::Idle;
        result
    }

    fn step_inner(&mut self, bodies: &mut BodyStore, dt: f64) -> Result<()> {
        let total_start = Instant::now();
        let slice = bodies.as_mut_slice();

        let h = if self.config.adaptive_time_step {
            integrator::adaptive_step(slice, &self.config)
        } else {
            dt * self.config.time_scale
        };

        let arrays = BodyArrays::from_bodies(slice);

        let force_start = Instant::now();
        let (method, force_stats) = force::evaluate(slice, &arrays, &self.config);
        let force_micros = force_start.elapsed().as_micros() as u64;

        let collide_start = Instant::now();
        let collision_stats = if self.config.enable_collisions {
            collision::resolve(slice, &self.config)
        } else {
            CollisionStats::default()
        };
        let collide_micros = collide_start.elapsed().as_micros() as u64;

        let integrate_start = Instant::now();
        integrator::integrate(slice, h, &self.config)?;
        let integrate_micros = integrate_start.elapsed().as_micros() as u64;

        self.step_count += 1;
        if self.step_count % TRAIL_SAMPLE_PERIOD == 0 {
            for body in slice.iter_mut() {
                let position = body.position;
                body.trail.push(position);
            }
        }

        self.stats = EngineStats {
            method,
            total_micros: total_start.elapsed().as_micros() as u64,
            force_micros,
            integrate_micros,
            collide_micros,
            tree_micros: force_stats.tree_micros,
            body_count: slice.len(),
            force_ops: force_stats.force_ops,
            collisions: collision_stats.collisions,
        };

        Ok(())
    }
}
