use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Propagated half of the error taxonomy. Degenerate geometry, bodies
/// drifting outside the tree's root box, and empty-input evaluations are
/// handled silently in place (stats counters, zero contributions, empty
/// results) rather than surfaced as `Err` — physics never fails mid-step.
/// Invalid mass/density/trail-capacity writes are clamped to the nearest
/// valid value at the setter, not rejected, so they have no variant here.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
    #[error("step() called while a previous step was still in progress")]
    ReentrantStep,
}
