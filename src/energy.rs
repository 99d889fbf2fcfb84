use crate::body::Body;
use crate::config::constants::EPS_MIN_PAIR;

/// Kinetic, potential and total energy of a population. Diagnostic only:
/// nothing in `PhysicsEngine::step` reads this back.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnergyReport {
    pub kinetic: f64,
    pub potential: f64,
    pub total: f64,
}

/// `KE = sum 1/2 m v^2`. `PE = -sum_{i<j} G m_i m_j / |p_i - p_j|`, skipping
/// pairs closer than `EPS_MIN_PAIR` so a coincident pair doesn't blow up the
/// sum to infinity.
pub fn compute(bodies: &[Body], gravitational_constant: f64) -> EnergyReport {
    let kinetic: f64 = bodies
        .iter()
        .map(|body| 0.5 * body.mass() * body.velocity.norm_squared())
        .sum();

    let mut potential = 0.0;
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let distance = (bodies[j].position - bodies[i].position).norm();
            if distance > EPS_MIN_PAIR {
                potential -= gravitational_constant * bodies[i].mass() * bodies[j].mass() / distance;
            }
        }
    }

    EnergyReport {
        kinetic,
        potential,
        total: kinetic + potential,
    }
}
