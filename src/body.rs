use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::constants::{DEFAULT_DENSITY, MIN_DENSITY, MIN_MASS, R_MAX, R_MIN};
use crate::math::Vec2;
use crate::trail::Trail;

/// Opaque, copyable identity for a body, stable for its lifetime in the
/// store even as other bodies are added or removed and indices shift.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };
}

#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    handle: BodyHandle,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub force: Vec2,
    mass: f64,
    density: f64,
    radius: f64,
    pub color: Color,
    pub selected: bool,
    pub dragged: bool,
    pub fixed: bool,
    pub trail: Trail,
}

impl Body {
    pub(crate) fn new(
        handle: BodyHandle,
        position: Vec2,
        velocity: Vec2,
        mass: f64,
        density: f64,
        color: Color,
    ) -> Self {
        let mass = mass.max(MIN_MASS);
        let density = density.max(MIN_DENSITY);
        Self {
            handle,
            position,
            velocity,
            acceleration: Vec2::ZERO,
            force: Vec2::ZERO,
            mass,
            density,
            radius: derive_radius(mass, density),
            color,
            selected: false,
            dragged: false,
            fixed: false,
            trail: Trail::default(),
        }
    }

    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Clamped to `MIN_MASS`; recomputes the derived radius.
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass.max(MIN_MASS);
        self.radius = derive_radius(self.mass, self.density);
    }

    /// Clamped to `MIN_DENSITY`; recomputes the derived radius.
    pub fn set_density(&mut self, density: f64) {
        self.density = density.max(MIN_DENSITY);
        self.radius = derive_radius(self.mass, self.density);
    }

    /// `r = clamp(sqrt(m / (pi * rho)), R_MIN, R_MAX)`.
    pub fn derived_radius(&self) -> f64 {
        derive_radius(self.mass, self.density)
    }

    pub fn is_movable(&self) -> bool {
        !self.fixed && !self.dragged
    }
}

fn derive_radius(mass: f64, density: f64) -> f64 {
    (mass / (std::f64::consts::PI * density))
        .sqrt()
        .clamp(R_MIN, R_MAX)
}

/// Owned, index-addressable collection of bodies. The store exclusively
/// owns its bodies; indices shift on removal, but each body's `BodyHandle`
/// stays valid for as long as the body remains in the store.
#[derive(Clone, Debug, Default)]
pub struct BodyStore {
    bodies: Vec<Body>,
    index_of: HashMap<BodyHandle, usize>,
    next_handle: u64,
}

impl BodyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, position: Vec2, velocity: Vec2, mass: f64) -> BodyHandle {
        self.add_with_density(position, velocity, mass, DEFAULT_DENSITY, Color::WHITE)
    }

    pub fn add_with_density(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        mass: f64,
        density: f64,
        color: Color,
    ) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        let body = Body::new(handle, position, velocity, mass, density, color);
        self.index_of.insert(handle, self.bodies.len());
        self.bodies.push(body);
        handle
    }

    /// O(N): removes the body, shifting later indices down by one and
    /// clearing any cached lookup for the removed handle.
    pub fn remove(&mut self, handle: BodyHandle) -> bool {
        let Some(&index) = self.index_of.get(&handle) else {
            return false;
        };
        self.bodies.remove(index);
        self.index_of.remove(&handle);
        for stored_index in self.index_of.values_mut() {
            if *stored_index > index {
                *stored_index -= 1;
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.index_of.clear();
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.index_of.get(&handle).map(|&i| &self.bodies[i])
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        let index = *self.index_of.get(&handle)?;
        Some(&mut self.bodies[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.bodies.iter_mut()
    }

    pub fn as_slice(&self) -> &[Body] {
        &self.bodies
    }

    pub fn as_mut_slice(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    /// Nearest body whose position lies within `tolerance` of `position`,
    /// defaulting to `2 * radius` when `tolerance` is `None`.
    pub fn find_by_position(&self, position: Vec2, tolerance: Option<f64>) -> Option<BodyHandle> {
        let mut best: Option<(BodyHandle, f64)> = None;
        for body in &self.bodies {
            let tol = tolerance.unwrap_or(2.0 * body.radius());
            let dist_sq = (body.position - position).norm_squared();
            if dist_sq <= tol * tol {
                if best.is_none_or(|(_, best_dist_sq)| dist_sq < best_dist_sq) {
                    best = Some((body.handle, dist_sq));
                }
            }
        }
        best.map(|(handle, _)| handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_radius_respects_clamp() {
        let mut store = BodyStore::new();
        let handle = store.add(Vec2::ZERO, Vec2::ZERO, 1e12);
        let body = store.get_mut(handle).unwrap();
        assert_eq!(body.radius(), R_MAX);

        body.set_mass(1e-9);
        body.set_density(1e9);
        assert_eq!(body.radius(), R_MIN);
    }

    #[test]
    fn mass_and_density_are_clamped_on_write() {
        let mut store = BodyStore::new();
        let handle = store.add(Vec2::ZERO, Vec2::ZERO, -5.0);
        let body = store.get(handle).unwrap();
        assert_eq!(body.mass(), MIN_MASS);

        let body = store.get_mut(handle).unwrap();
        body.set_density(-1.0);
        assert_eq!(body.density(), MIN_DENSITY);
    }

    #[test]
    fn handles_stay_valid_across_unrelated_removals() {
        let mut store = BodyStore::new();
        let a = store.add(Vec2::new(0.0, 0.0), Vec2::ZERO, 1.0);
        let b = store.add(Vec2::new(1.0, 0.0), Vec2::ZERO, 1.0);
        let c = store.add(Vec2::new(2.0, 0.0), Vec2::ZERO, 1.0);

        assert!(store.remove(a));
        assert!(store.get(b).is_some());
        assert!(store.get(c).is_some());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(b).unwrap().position.x, 1.0);
        assert_eq!(store.get(c).unwrap().position.x, 2.0);
    }

    #[test]
    fn find_by_position_returns_nearest_within_tolerance() {
        let mut store = BodyStore::new();
        let near = store.add(Vec2::new(0.0, 0.0), Vec2::ZERO, 1.0);
        store.add(Vec2::new(50.0, 0.0), Vec2::ZERO, 1.0);

        let found = store.find_by_position(Vec2::new(0.5, 0.0), Some(5.0));
        assert_eq!(found, Some(near));
    }
}
