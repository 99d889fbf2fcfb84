use rayon::prelude::*;

use crate::body::Body;
use crate::config::constants::F_MAX_DIRECT;
use crate::config::EngineConfig;
use crate::math::Vec2;
use crate::quadtree::QuadTree;
use crate::soa::BodyArrays;

const DEGENERATE_SEPARATION_SQ: f64 = 1e-10;
const MORTON_DIRECT_THRESHOLD: usize = 100;
const BLOCKED_DIRECT_THRESHOLD: usize = 50;
const BLOCK_SIZE: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceMethod {
    NaiveDirect,
    BlockedDirect,
    MortonDirect,
    BarnesHut,
}

impl ForceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForceMethod::NaiveDirect => "naive_direct",
            ForceMethod::BlockedDirect => "blocked_direct",
            ForceMethod::MortonDirect => "morton_direct",
            ForceMethod::BarnesHut => "barnes_hut",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForceStats {
    pub force_ops: u64,
    pub bodies_outside_tree: usize,
    pub tree_micros: u64,
}

/// Selects a force evaluation method per §4.4's threshold chain and writes
/// `body.force` (here: acceleration scaled by nothing extra — contributions
/// are "force per unit target mass", so the integrator treats `force` as an
/// acceleration directly) for every body in `arrays`/`bodies`.
pub fn evaluate(bodies: &mut [Body], arrays: &BodyArrays, config: &EngineConfig) -> (ForceMethod, ForceStats) {
    for body in bodies.iter_mut() {
        body.force = Vec2::ZERO;
    }

    let count = arrays.len();
    if count == 0 {
        return (ForceMethod::NaiveDirect, ForceStats::default());
    }

    // GPU compute is out of scope for this core; always fall back.
    let use_tree = !config.use_gpu && config.use_barnes_hut && count > config.max_bodies_for_direct;

    let (method, forces, stats) = if use_tree {
        let (forces, stats) = barnes_hut(arrays, config);
        (ForceMethod::BarnesHut, forces, stats)
    } else if count > MORTON_DIRECT_THRESHOLD {
        let forces = morton_direct(arrays, config);
        (ForceMethod::MortonDirect, forces, direct_stats(count))
    } else if count > BLOCKED_DIRECT_THRESHOLD {
        let forces = blocked_direct(arrays, config);
        (ForceMethod::BlockedDirect, forces, direct_stats(count))
    } else {
        let forces = naive_direct(arrays, config);
        (ForceMethod::NaiveDirect, forces, direct_stats(count))
    };

    for (body, force) in bodies.iter_mut().zip(forces) {
        body.force = force;
    }

    (method, stats)
}

fn direct_stats(count: usize) -> ForceStats {
    ForceStats {
        force_ops: (count as u64) * (count.saturating_sub(1) as u64) / 2,
        bodies_outside_tree: 0,
        tree_micros: 0,
    }
}

fn pair_contribution(
    delta: Vec2,
    source_mass: f64,
    gravitational_constant: f64,
    epsilon_sq: f64,
) -> Option<Vec2> {
    let dist_sq = delta.norm_squared() + epsilon_sq;
    if dist_sq < DEGENERATE_SEPARATION_SQ {
        return None;
    }
    let inv_dist = dist_sq.sqrt().recip();
    let inv_dist3 = inv_dist * inv_dist * inv_dist;
    let magnitude = gravitational_constant * source_mass * inv_dist3;
    let contribution = delta * magnitude;
    let clamped_mag = contribution.norm().min(F_MAX_DIRECT);
    Some(contribution.normalized_or(Vec2::ZERO) * clamped_mag)
}

/// Naive O(N^2) all-pairs sum. Every non-tree variant below computes this
/// same quantity; they differ only in iteration order for cache locality.
fn naive_direct(arrays: &BodyArrays, config: &EngineConfig) -> Vec<Vec2> {
    let count = arrays.len();
    let epsilon_sq = config.softening_length * config.softening_length;
    let mut forces = vec![Vec2::ZERO; count];

    for i in 0..count {
        if arrays.fixed[i] {
            continue;
        }
        for j in 0..count {
            if i == j {
                continue;
            }
            let delta = arrays.positions[j] - arrays.positions[i];
            if let Some(contribution) =
                pair_contribution(delta, arrays.masses[j], config.gravitational_constant, epsilon_sq)
            {
                forces[i] += contribution;
            }
        }
    }

    forces
}

/// Same sum, iterated in blocks of `BLOCK_SIZE` rows at a time so the
/// column sweep for a block stays hot in cache.
fn blocked_direct(arrays: &BodyArrays, config: &EngineConfig) -> Vec<Vec2> {
    let count = arrays.len();
    let epsilon_sq = config.softening_length * config.softening_length;
    let mut forces = vec![Vec2::ZERO; count];

    let mut block_start = 0;
    while block_start < count {
        let block_end = (block_start + BLOCK_SIZE).min(count);
        for i in block_start..block_end {
            if arrays.fixed[i] {
                continue;
            }
            for j in 0..count {
                if i == j {
                    continue;
                }
                let delta = arrays.positions[j] - arrays.positions[i];
                if let Some(contribution) = pair_contribution(
                    delta,
                    arrays.masses[j],
                    config.gravitational_constant,
                    epsilon_sq,
                ) {
                    forces[i] += contribution;
                }
            }
        }
        block_start = block_end;
    }

    forces
}

/// Same sum again, but receivers are visited in Morton (Z-order) order so
/// spatially nearby bodies are processed back-to-back. This is a cache
/// locality heuristic only, not a true spatial index: the inner loop is
/// still a full O(N) sweep per receiver.
fn morton_direct(arrays: &BodyArrays, config: &EngineConfig) -> Vec<Vec2> {
    let count = arrays.len();
    let epsilon_sq = config.softening_length * config.softening_length;
    let mut forces = vec![Vec2::ZERO; count];

    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by_key(|&i| morton_key(arrays.positions[i]));

    for &i in &order {
        if arrays.fixed[i] {
            continue;
        }
        for j in 0..count {
            if i == j {
                continue;
            }
            let delta = arrays.positions[j] - arrays.positions[i];
            if let Some(contribution) =
                pair_contribution(delta, arrays.masses[j], config.gravitational_constant, epsilon_sq)
            {
                forces[i] += contribution;
            }
        }
    }

    forces
}

/// Interleaves the low 16 bits of each truncated, offset coordinate into a
/// single 32-bit key. Purely a sort key for cache locality, not a spatial
/// index: collisions and wraparound beyond the offset range are harmless.
fn morton_key(position: Vec2) -> u32 {
    let to_u16 = |v: f64| -> u16 { (v.clamp(-32768.0, 32767.0) + 32768.0) as u16 };
    let spread = |v: u16| -> u32 {
        let mut x = v as u32;
        x = (x | (x << 8)) & 0x00FF00FF;
        x = (x | (x << 4)) & 0x0F0F0F0F;
        x = (x | (x << 2)) & 0x33333333;
        x = (x | (x << 1)) & 0x55555555;
        x
    };
    spread(to_u16(position.x)) | (spread(to_u16(position.y)) << 1)
}

/// Barnes-Hut: one quadtree build, then an embarrassingly parallel pass
/// over receivers (spec §5: force evaluation is the parallel phase; the
/// tree is read-only once built). No max-force clamp here (spec §4.4/§9:
/// present in the direct kernels, deliberately absent in the tree path).
fn barnes_hut(arrays: &BodyArrays, config: &EngineConfig) -> (Vec<Vec2>, ForceStats) {
    let tree_start = std::time::Instant::now();
    let tree = QuadTree::build(&arrays.positions, &arrays.masses);
    let tree_micros = tree_start.elapsed().as_micros() as u64;

    let forces: Vec<Vec2> = (0..arrays.len())
        .into_par_iter()
        .map(|i| {
            if arrays.fixed[i] {
                return Vec2::ZERO;
            }
            tree.acceleration_at(
                i,
                arrays.positions[i],
                config.gravitational_constant,
                config.softening_length,
                config.barnes_hut_theta,
            )
        })
        .collect();

    (
        forces,
        ForceStats {
            force_ops: 0,
            bodies_outside_tree: tree.bodies_outside_root,
            tree_micros,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyStore;

    fn base_config() -> EngineConfig {
        EngineConfig {
            softening_length: 1e-3,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn two_body_direct_force_is_symmetric_and_opposite() {
        let mut store = BodyStore::new();
        store.add(Vec2::new(0.0, 0.0), Vec2::ZERO, 1.0);
        store.add(Vec2::new(2.0, 0.0), Vec2::ZERO, 5.0);

        let config = base_config();
        let arrays = BodyArrays::from_bodies(store.as_slice());
        let (method, _) = evaluate(store.as_mut_slice(), &arrays, &config);
        assert_eq!(method, ForceMethod::NaiveDirect);

        let bodies = store.as_slice();
        assert!(bodies[0].force.x > 0.0);
        assert!(bodies[1].force.x < 0.0);
        assert!((bodies[0].force.y).abs() < 1e-12);

        let d_sq_soft = 4.0 + config.softening_length * config.softening_length;
        let expected = config.gravitational_constant * 5.0 / d_sq_soft;
        assert!((bodies[0].force.x - expected).abs() < 1e-8);
        assert!((bodies[1].force.x + expected * (1.0 / 5.0)).abs() < 1e-8);
    }

    #[test]
    fn fixed_bodies_receive_no_force_but_still_source() {
        let mut store = BodyStore::new();
        let fixed = store.add(Vec2::new(0.0, 0.0), Vec2::ZERO, 10.0);
        store.add(Vec2::new(1.0, 0.0), Vec2::ZERO, 1.0);
        store.get_mut(fixed).unwrap().fixed = true;

        let config = base_config();
        let arrays = BodyArrays::from_bodies(store.as_slice());
        evaluate(store.as_mut_slice(), &arrays, &config);

        let bodies = store.as_slice();
        assert_eq!(bodies[0].force, Vec2::ZERO);
        assert!(bodies[1].force.x < 0.0);
    }

    #[test]
    fn direct_and_tree_agree_within_tolerance() {
        let mut store = BodyStore::new();
        let mut seed = 12345u64;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((seed >> 33) as f64 / u32::MAX as f64) * 20.0 - 10.0
        };
        for _ in 0..80 {
            store.add(Vec2::new(next(), next()), Vec2::ZERO, 1.0 + next().abs());
        }

        let arrays = BodyArrays::from_bodies(store.as_slice());
        let mut direct_config = base_config();
        direct_config.use_barnes_hut = false;
        let mut direct_bodies = store.clone();
        evaluate(direct_bodies.as_mut_slice(), &arrays, &direct_config);

        let mut tree_config = base_config();
        tree_config.use_barnes_hut = true;
        tree_config.max_bodies_for_direct = 0;
        tree_config.barnes_hut_theta = 0.3;
        let mut tree_bodies = store.clone();
        evaluate(tree_bodies.as_mut_slice(), &arrays, &tree_config);

        for (a, b) in direct_bodies.iter().zip(tree_bodies.iter()) {
            let diff = (a.force - b.force).norm();
            let scale = a.force.norm().max(1e-9);
            assert!(diff / scale < 2e-2, "relative error too large: {}", diff / scale);
        }
    }
}
