use crate::Particle;
use rayon::prelude::*;

/// Advances every particle by `vel * dt` and bounces it off the walls of the
/// `bounds` rectangle. Each axis is reflected independently with no energy
/// loss.
pub fn integrate(particles: &mut [Particle], bounds: (f32, f32), dt: f32) {
  particles.par_iter_mut().for_each(|p| {
    p.pos[0] += p.vel[0] * dt;
    p.pos[1] += p.vel[1] * dt;
    reflect_axis(&mut p.pos[0], &mut p.vel[0], p.radius, bounds.0);
    reflect_axis(&mut p.pos[1], &mut p.vel[1], p.radius, bounds.1);
  });
}

fn reflect_axis(pos: &mut f32, vel: &mut f32, radius: f32, bound: f32) {
  if *pos - radius < 0.0 {
    *pos = radius;
    *vel = -*vel;
  } else if *pos + radius > bound {
    *pos = bound - radius;
    *vel = -*vel;
  }
}
