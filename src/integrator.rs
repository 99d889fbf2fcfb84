use crate::body::Body;
use crate::config::constants::V_MAX;
use crate::config::{EngineConfig, IntegratorKind};
use crate::errors::{EngineError, Result};
use crate::force::evaluate;
use crate::math::Vec2;
use crate::soa::BodyArrays;

/// Advances every body by `h` (already scaled by `time_scale`) using the
/// configured scheme. Fixed and dragged bodies are skipped; their velocity
/// is forced to zero so a re-enabled body never carries stale momentum.
pub fn integrate(bodies: &mut [Body], h: f64, config: &EngineConfig) -> Result<()> {
    for body in bodies.iter_mut() {
        if body.fixed || body.dragged {
            body.velocity = Vec2::ZERO;
        }
    }

    match config.integrator {
        IntegratorKind::Leapfrog => leapfrog(bodies, h, config),
        IntegratorKind::SemiImplicitEuler => semi_implicit_euler(bodies, h),
        IntegratorKind::PositionVerlet => position_verlet(bodies, h, config),
    }
}

/// Kick-drift-kick leapfrog. Both half-kicks happen around a single drift,
/// with a fresh force evaluation between them so the second half-kick uses
/// the post-drift acceleration (second-order accurate at the cost of one
/// extra force pass per step).
fn leapfrog(bodies: &mut [Body], h: f64, config: &EngineConfig) -> Result<()> {
    for body in bodies.iter_mut() {
        if !body.is_movable() {
            continue;
        }
        let acceleration = body.force / body.mass();
        body.velocity = body.velocity * config.damping_factor + acceleration * (h * 0.5);
        body.position += body.velocity * h;
    }

    let arrays = BodyArrays::from_bodies(bodies);
    evaluate(bodies, &arrays, config);

    for body in bodies.iter_mut() {
        if !body.is_movable() {
            continue;
        }
        let acceleration = body.force / body.mass();
        body.velocity += acceleration * (h * 0.5);
        body.acceleration = acceleration;
        clamp_speed(body);
        ensure_finite(body)?;
    }

    Ok(())
}

fn semi_implicit_euler(bodies: &mut [Body], h: f64) -> Result<()> {
    for body in bodies.iter_mut() {
        if !body.is_movable() {
            continue;
        }
        let acceleration = body.force / body.mass();
        body.velocity += acceleration * h;
        body.position += body.velocity * h;
        body.acceleration = acceleration;
        clamp_speed(body);
        ensure_finite(body)?;
    }
    Ok(())
}

/// Textbook position-Verlet: half-drift to the midpoint, recompute
/// acceleration there, apply the full velocity kick, then drift the
/// remaining half-step. Distinct from the kick-drift-kick leapfrog above
/// only in where the force sample is taken (midpoint position rather than
/// the post-drift position).
fn position_verlet(bodies: &mut [Body], h: f64, config: &EngineConfig) -> Result<()> {
    for body in bodies.iter_mut() {
        if !body.is_movable() {
            continue;
        }
        body.position += body.velocity * (h * 0.5);
    }

    let arrays = BodyArrays::from_bodies(bodies);
    evaluate(bodies, &arrays, config);

    for body in bodies.iter_mut() {
        if !body.is_movable() {
            continue;
        }
        let acceleration = body.force / body.mass();
        body.velocity += acceleration * h;
        body.position += body.velocity * (h * 0.5);
        body.acceleration = acceleration;
        clamp_speed(body);
        ensure_finite(body)?;
    }

    Ok(())
}

fn clamp_speed(body: &mut Body) {
    let speed = body.velocity.norm();
    if speed > V_MAX {
        body.velocity = body.velocity * (V_MAX / speed);
    }
}

fn ensure_finite(body: &Body) -> Result<()> {
    if !body.position.is_finite() || !body.velocity.is_finite() {
        return Err(EngineError::NumericalInstability(
            "body produced non-finite state during integration".to_string(),
        ));
    }
    Ok(())
}

/// `h_adapt = sqrt(epsilon / a_max)`, clamped to `[min_time_step,
/// max_time_step]`. `a_max` is the largest current acceleration magnitude
/// across movable bodies.
pub fn adaptive_step(bodies: &[Body], config: &EngineConfig) -> f64 {
    if !config.adaptive_time_step {
        return config.time_step;
    }

    let mut a_max: f64 = 0.0;
    for body in bodies {
        if !body.is_movable() {
            continue;
        }
        let acceleration = (body.force / body.mass()).norm();
        a_max = a_max.max(acceleration);
    }

    if a_max <= 0.0 {
        return config
            .time_step
            .clamp(config.min_time_step, config.max_time_step);
    }

    (config.softening_length / a_max)
        .sqrt()
        .clamp(config.min_time_step, config.max_time_step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyStore;

    #[test]
    fn fixed_body_never_moves() {
        let mut store = BodyStore::new();
        let fixed = store.add(Vec2::new(3.0, 4.0), Vec2::new(1.0, 1.0), 5.0);
        store.get_mut(fixed).unwrap().fixed = true;
        store.add(Vec2::new(0.0, 0.0), Vec2::ZERO, 1.0);

        let config = EngineConfig::default();
        let arrays = BodyArrays::from_bodies(store.as_slice());
        evaluate(store.as_mut_slice(), &arrays, &config);
        integrate(store.as_mut_slice(), 0.01, &config).unwrap();

        let body = store.get(fixed).unwrap();
        assert_eq!(body.position, Vec2::new(3.0, 4.0));
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn position_verlet_samples_acceleration_at_the_midpoint() {
        let config = EngineConfig {
            integrator: IntegratorKind::PositionVerlet,
            enable_collisions: false,
            softening_length: 0.0,
            ..EngineConfig::default()
        };

        let mut store = BodyStore::new();
        let star = store.add(Vec2::ZERO, Vec2::ZERO, 1000.0);
        store.get_mut(star).unwrap().fixed = true;
        let orbiter = store.add(Vec2::new(10.0, 0.0), Vec2::new(0.0, 5.0), 1.0);

        let h = 0.01;
        let p0 = Vec2::new(10.0, 0.0);
        let v0 = Vec2::new(0.0, 5.0);
        let p_mid = p0 + v0 * (h * 0.5);
        let delta = Vec2::ZERO - p_mid;
        let dist_sq = delta.norm_squared();
        let inv_dist3 = dist_sq.sqrt().recip().powi(3);
        let a_mid = delta * (config.gravitational_constant * 1000.0 * inv_dist3);
        let v1 = v0 + a_mid * h;
        let expected = p_mid + v1 * (h * 0.5);

        integrate(store.as_mut_slice(), h, &config).unwrap();

        let got = store.get(orbiter).unwrap().position;
        assert!((got.x - expected.x).abs() < 1e-9);
        assert!((got.y - expected.y).abs() < 1e-9);
    }

    #[test]
    fn speed_is_clamped_to_v_max() {
        let mut store = BodyStore::new();
        let handle = store.add(Vec2::ZERO, Vec2::new(10_000.0, 0.0), 1.0);
        store.get_mut(handle).unwrap().force = Vec2::ZERO;

        let config = EngineConfig::default();
        integrate(store.as_mut_slice(), 0.01, &config).unwrap();
        let body = store.get(handle).unwrap();
        assert!(body.velocity.norm() <= V_MAX + 1e-9);
    }
}
