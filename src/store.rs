use crate::Particle;
use cgmath::{InnerSpace, Vector2};

/// Fixed-size particle arena. Particles are addressed by their index for the
/// whole lifetime of the store; nothing is inserted or removed after creation.
#[derive(Clone, Debug)]
pub struct ParticleStore {
  particles: Vec<Particle>,
}

impl ParticleStore {
  #[must_use]
  pub fn new(particles: Vec<Particle>) -> Self {
    Self { particles }
  }

  pub fn len(&self) -> usize {
    self.particles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.particles.is_empty()
  }

  pub fn as_slice(&self) -> &[Particle] {
    &self.particles
  }

  pub fn as_mut_slice(&mut self) -> &mut [Particle] {
    &mut self.particles
  }

  pub fn kinetic_energy(&self) -> f64 {
    self
      .particles
      .iter()
      .map(|p| 0.5 * f64::from(p.mass) * f64::from(Vector2::from(p.vel).magnitude2()))
      .sum()
  }
}

/// Borrows two distinct particles mutably. Panics if `a == b`, which the
/// collision traversal never produces.
pub fn pair_mut(particles: &mut [Particle], a: usize, b: usize) -> (&mut Particle, &mut Particle) {
  assert_ne!(a, b, "pair_mut called with identical indices");
  if a < b {
    let (lo, hi) = particles.split_at_mut(b);
    (&mut lo[a], &mut hi[0])
  } else {
    let (lo, hi) = particles.split_at_mut(a);
    (&mut hi[0], &mut lo[b])
  }
}
