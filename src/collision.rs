use crate::body::Body;
use crate::config::EngineConfig;
use crate::math::Vec2;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CollisionStats {
    pub collisions: u64,
}

/// All-pairs broad+narrow phase: every unordered pair within `r_i + r_j` of
/// each other gets a positional separation followed by an elastic impulse.
/// Runs only when `config.enable_collisions`; pairs are visited in a
/// deterministic `(i, j)` order so serial runs stay reproducible.
pub fn resolve(bodies: &mut [Body], config: &EngineConfig) -> CollisionStats {
    let mut stats = CollisionStats::default();
    if !config.enable_collisions {
        return stats;
    }

    let count = bodies.len();
    for i in 0..count {
        for j in (i + 1)..count {
            let delta = bodies[j].position - bodies[i].position;
            let distance = delta.norm();
            let collision_distance = bodies[i].radius() + bodies[j].radius();

            if distance > collision_distance {
                continue;
            }

            stats.collisions += 1;

            let normal = if distance > 0.0 {
                delta / distance
            } else {
                Vec2::new(1.0, 0.0)
            };
            let overlap = collision_distance - distance;

            separate(bodies, i, j, normal, overlap);
            apply_impulse(bodies, i, j, normal, config.restitution);
        }
    }

    stats
}

/// Splits the overlap between movable bodies, half each along the
/// separation normal. A fixed or dragged body does not move; the other
/// absorbs the full correction.
fn separate(bodies: &mut [Body], i: usize, j: usize, normal: Vec2, overlap: f64) {
    if overlap <= 0.0 {
        return;
    }
    let (first, second) = get_pair_mut(bodies, i, j);
    let first_movable = first.is_movable();
    let second_movable = second.is_movable();

    if !first_movable && !second_movable {
        return;
    }

    if first_movable && second_movable {
        first.position -= normal * (overlap * 0.5);
        second.position += normal * (overlap * 0.5);
    } else if first_movable {
        first.position -= normal * overlap;
    } else {
        second.position += normal * overlap;
    }
}

/// `J = -(1 + e) * v_n / (1/m_i + 1/m_j)`. Fixed/dragged bodies act as
/// infinite mass: only the other body's velocity changes.
fn apply_impulse(bodies: &mut [Body], i: usize, j: usize, normal: Vec2, restitution: f64) {
    let (first, second) = get_pair_mut(bodies, i, j);

    let relative_velocity = second.velocity - first.velocity;
    let normal_speed = relative_velocity.dot(normal);
    if normal_speed >= 0.0 {
        return;
    }

    let first_inv_mass = if first.is_movable() { 1.0 / first.mass() } else { 0.0 };
    let second_inv_mass = if second.is_movable() { 1.0 / second.mass() } else { 0.0 };
    let inverse_mass_sum = first_inv_mass + second_inv_mass;
    if inverse_mass_sum <= 0.0 {
        return;
    }

    let impulse_scalar = -(1.0 + restitution) * normal_speed / inverse_mass_sum;
    let impulse = normal * impulse_scalar;

    first.velocity -= impulse * first_inv_mass;
    second.velocity += impulse * second_inv_mass;
}

fn get_pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert!(i < j);
    let (left, right) = bodies.split_at_mut(j);
    (&mut left[i], &mut right[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyStore, Color};

    fn sum_momentum(store: &BodyStore) -> Vec2 {
        store.iter().fold(Vec2::ZERO, |acc, b| acc + b.velocity * b.mass())
    }

    fn sum_kinetic_energy(store: &BodyStore) -> f64 {
        store.iter().map(|b| 0.5 * b.mass() * b.velocity.norm_squared()).sum()
    }

    #[test]
    fn elastic_head_on_equal_mass_conserves_momentum_and_energy() {
        let mut store = BodyStore::new();
        store.add_with_density(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0), 1.0, 1e6, Color::WHITE);
        store.add_with_density(Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0), 1.0, 1e6, Color::WHITE);

        let config = EngineConfig {
            restitution: 1.0,
            ..EngineConfig::default()
        };

        let momentum_before = sum_momentum(&store);
        let ke_before = sum_kinetic_energy(&store);

        resolve(store.as_mut_slice(), &config);

        let momentum_after = sum_momentum(&store);
        let ke_after = sum_kinetic_energy(&store);

        assert!((momentum_before.x - momentum_after.x).abs() < 1e-9);
        assert!((ke_before - ke_after).abs() < 1e-9);

        let bodies: Vec<_> = store.iter().collect();
        assert!(bodies[0].velocity.x < 0.0);
        assert!(bodies[1].velocity.x > 0.0);
    }

    #[test]
    fn inelastic_collision_strictly_reduces_kinetic_energy() {
        let mut store = BodyStore::new();
        store.add_with_density(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0), 1.0, 1e6, Color::WHITE);
        store.add_with_density(Vec2::new(1.0, 0.0), Vec2::new(-1.0, 0.0), 1.0, 1e6, Color::WHITE);

        let config = EngineConfig {
            restitution: 0.5,
            ..EngineConfig::default()
        };

        let ke_before = sum_kinetic_energy(&store);
        resolve(store.as_mut_slice(), &config);
        let ke_after = sum_kinetic_energy(&store);

        assert!(ke_after < ke_before);
    }

    #[test]
    fn fixed_body_is_immovable_and_infinite_mass_in_collision() {
        let mut store = BodyStore::new();
        let fixed = store.add_with_density(Vec2::new(0.0, 0.0), Vec2::ZERO, 10.0, 1e6, Color::WHITE);
        store.get_mut(fixed).unwrap().fixed = true;
        store.add_with_density(Vec2::new(1.5, 0.0), Vec2::new(-1.0, 0.0), 1.0, 1e6, Color::WHITE);

        let config = EngineConfig::default();
        resolve(store.as_mut_slice(), &config);

        let fixed_body = store.get(fixed).unwrap();
        assert_eq!(fixed_body.position, Vec2::ZERO);
        assert_eq!(fixed_body.velocity, Vec2::ZERO);
    }

    #[test]
    fn disabled_collisions_leave_overlapping_bodies_untouched() {
        let mut store = BodyStore::new();
        store.add_with_density(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), 1.0, 1e6, Color::WHITE);
        store.add_with_density(Vec2::new(0.5, 0.0), Vec2::new(-1.0, 0.0), 1.0, 1e6, Color::WHITE);

        let config = EngineConfig {
            enable_collisions: false,
            ..EngineConfig::default()
        };

        let stats = resolve(store.as_mut_slice(), &config);
        assert_eq!(stats.collisions, 0);
    }
}
