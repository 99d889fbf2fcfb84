use crate::body::{Body, Color};
use crate::math::Vec2;

/// Structure-of-arrays mirror of a `BodyStore`, refreshed once per physics
/// step ahead of force evaluation. Never a source of truth: the engine
/// writes results back onto `Body` directly, it never reads state back out
/// of a `BodyArrays` after the force pass.
#[derive(Clone, Debug, Default)]
pub struct BodyArrays {
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
    pub accelerations: Vec<Vec2>,
    pub forces: Vec<Vec2>,
    pub masses: Vec<f64>,
    pub radii: Vec<f64>,
    pub colors: Vec<Color>,
    pub fixed: Vec<bool>,
}

impl BodyArrays {
    pub fn from_bodies(bodies: &[Body]) -> Self {
        let len = bodies.len();
        let mut arrays = Self {
            positions: Vec::with_capacity(len),
            velocities: Vec::with_capacity(len),
            accelerations: Vec::with_capacity(len),
            forces: Vec::with_capacity(len),
            masses: Vec::with_capacity(len),
            radii: Vec::with_capacity(len),
            colors: Vec::with_capacity(len),
            fixed: Vec::with_capacity(len),
        };
        for body in bodies {
            arrays.positions.push(body.position);
            arrays.velocities.push(body.velocity);
            arrays.accelerations.push(body.acceleration);
            arrays.forces.push(body.force);
            arrays.masses.push(body.mass());
            arrays.radii.push(body.radius());
            arrays.colors.push(body.color);
            arrays.fixed.push(body.fixed);
        }
        arrays
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyStore;

    #[test]
    fn mirrors_store_positions_and_masses() {
        let mut store = BodyStore::new();
        store.add(Vec2::new(1.0, 2.0), Vec2::ZERO, 5.0);
        store.add(Vec2::new(3.0, 4.0), Vec2::ZERO, 7.0);

        let arrays = BodyArrays::from_bodies(store.as_slice());
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays.positions[0], Vec2::new(1.0, 2.0));
        assert_eq!(arrays.masses[1], 7.0);
    }
}
