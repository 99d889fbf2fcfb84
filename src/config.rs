use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};

/// Constants internal to the engine; exposed so collaborators (scene
/// builders, UI panels) can reason about defaults without duplicating them.
pub mod constants {
    pub const R_MIN: f64 = 2.0;
    pub const R_MAX: f64 = 100.0;
    pub const DEFAULT_DENSITY: f64 = 0.1;
    pub const MIN_MASS: f64 = 0.1;
    pub const MIN_DENSITY: f64 = 1e-3;
    pub const V_MAX: f64 = 500.0;
    pub const F_MAX_DIRECT: f64 = 1e4;
    pub const MIN_NODE_SIZE: f64 = 0.1;
    pub const NODE_PADDING: f64 = 1.05;
    pub const EPS_MIN_PAIR: f64 = 1e-6;
    pub const SOFTENING_LENGTH_DEFAULT: f64 = 0.1;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntegratorKind {
    Leapfrog,
    SemiImplicitEuler,
    PositionVerlet,
}

fn default_integrator() -> IntegratorKind {
    IntegratorKind::Leapfrog
}

fn default_barnes_hut_theta() -> f64 {
    0.6
}

fn default_max_bodies_for_direct() -> usize {
    1000
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub gravitational_constant: f64,
    pub time_step: f64,
    pub time_scale: f64,
    pub softening_length: f64,
    pub damping_factor: f64,
    pub use_barnes_hut: bool,
    #[serde(default = "default_barnes_hut_theta")]
    pub barnes_hut_theta: f64,
    pub enable_collisions: bool,
    pub restitution: f64,
    pub adaptive_time_step: bool,
    pub min_time_step: f64,
    pub max_time_step: f64,
    #[serde(default = "default_max_bodies_for_direct")]
    pub max_bodies_for_direct: usize,
    #[serde(default = "default_integrator")]
    pub integrator: IntegratorKind,
    pub use_gpu: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: 1.0,
            time_step: 0.016,
            time_scale: 1.0,
            softening_length: constants::SOFTENING_LENGTH_DEFAULT,
            damping_factor: 1.0,
            use_barnes_hut: true,
            barnes_hut_theta: default_barnes_hut_theta(),
            enable_collisions: true,
            restitution: 0.8,
            adaptive_time_step: false,
            min_time_step: 0.001,
            max_time_step: 0.033,
            max_bodies_for_direct: default_max_bodies_for_direct(),
            integrator: default_integrator(),
            use_gpu: false,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.gravitational_constant.is_finite() || self.gravitational_constant <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "gravitational_constant must be finite and > 0".to_string(),
            ));
        }
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "time_step must be finite and > 0".to_string(),
            ));
        }
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "time_scale must be finite and > 0".to_string(),
            ));
        }
        if !self.softening_length.is_finite() || self.softening_length < 0.0 {
            return Err(EngineError::InvalidConfig(
                "softening_length must be finite and >= 0".to_string(),
            ));
        }
        if !self.damping_factor.is_finite() || self.damping_factor < 0.0 {
            return Err(EngineError::InvalidConfig(
                "damping_factor must be finite and >= 0".to_string(),
            ));
        }
        if !self.barnes_hut_theta.is_finite() || self.barnes_hut_theta <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "barnes_hut_theta must be finite and > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(EngineError::InvalidConfig(
                "restitution must be in [0, 1]".to_string(),
            ));
        }
        if !self.min_time_step.is_finite() || self.min_time_step <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "min_time_step must be finite and > 0".to_string(),
            ));
        }
        if !self.max_time_step.is_finite() || self.max_time_step < self.min_time_step {
            return Err(EngineError::InvalidConfig(
                "max_time_step must be finite and >= min_time_step".to_string(),
            ));
        }
        if self.max_bodies_for_direct == 0 {
            return Err(EngineError::InvalidConfig(
                "max_bodies_for_direct must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
