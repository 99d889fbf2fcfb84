pub mod body;
pub mod collision;
pub mod config;
pub mod energy;
pub mod engine;
pub mod errors;
pub mod force;
pub mod integrator;
pub mod math;
pub mod quadtree;
pub mod soa;
pub mod trail;

pub use body::{Body, BodyHandle, BodyStore, Color};
pub use config::{EngineConfig, IntegratorKind};
pub use energy::EnergyReport;
pub use engine::{EngineStats, PhysicsEngine};
pub use errors::{EngineError, Result};
pub use force::ForceMethod;
pub use math::Vec2;
pub use quadtree::QuadTree;
pub use soa::BodyArrays;
pub use trail::Trail;
