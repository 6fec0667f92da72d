use crate::{Particle, SimParams};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};

/// Scatters `num_particles` bodies over the render area. The generator is
/// seeded from `sim_params.seed`, so equal parameters give equal particles.
#[must_use]
pub fn create_particles(sim_params: &SimParams) -> Vec<Particle> {
  let mut rng = SmallRng::seed_from_u64(sim_params.seed);
  let mut particles = Vec::with_capacity(sim_params.num_particles as usize);

  let radius = Uniform::new_inclusive(sim_params.min_radius, sim_params.max_radius);
  let speed = Uniform::new_inclusive(-sim_params.initial_speed, sim_params.initial_speed);

  for _ in 0..sim_params.num_particles {
    // whole-pixel starting positions
    let pos = [
      rng.gen_range(0..sim_params.render_width) as f32,
      rng.gen_range(0..sim_params.render_height) as f32,
    ];
    let vel = [speed.sample(&mut rng), speed.sample(&mut rng)];
    let r = radius.sample(&mut rng);
    let color = random_color(&mut rng);

    particles.push(Particle::new(pos, vel, r, sim_params.mass_per_radius, color));
  }

  log::info!(
    "seeded {} particles (seed {}, radius {}..={})",
    particles.len(),
    sim_params.seed,
    sim_params.min_radius,
    sim_params.max_radius
  );
  particles
}

fn random_color(rng: &mut SmallRng) -> u32 {
  let r = rng.gen_range(0..255u32);
  let g = rng.gen_range(0..255u32);
  let b = rng.gen_range(0..255u32);
  (r << 24) | (g << 16) | (b << 8) | 0xFF
}
