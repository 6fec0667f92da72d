//! Integration tests for the particle simulation
//! Run with: cargo test --release
//!
//! These drive the public API end to end:
//! - grid coverage and capacity under random particle sets
//! - the two-body collision scenario through a full tick
//! - reproducibility of seeded runs

use particle_sim::collision::{check_collision, resolve_collision};
use particle_sim::grid::SpatialGrid;
use particle_sim::interaction::PointerInput;
use particle_sim::simulation::Simulation;
use particle_sim::surface::{draw_particles, PixelBuffer};
use particle_sim::{Particle, SimParams};
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn random_particles(rng: &mut SmallRng, n: usize, extent: f32) -> Vec<Particle> {
  (0..n)
    .map(|_| {
      Particle::new(
        [rng.gen_range(-20.0..extent + 20.0), rng.gen_range(-20.0..extent + 20.0)],
        [rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)],
        rng.gen_range(1.0..4.0),
        4.0,
        0xFFFF_FFFF,
      )
    })
    .collect()
}

#[test]
fn grid_holds_every_in_bounds_particle_or_is_full() {
  let mut rng = SmallRng::seed_from_u64(3);
  for capacity in [2u32, 8, 64] {
    let particles = random_particles(&mut rng, 2000, 256.0);
    let mut grid = SpatialGrid::new(16, capacity, 256, 256);
    let stats = grid.build(&particles);

    let mut found = vec![false; particles.len()];
    for y in 0..16 {
      for x in 0..16 {
        for &idx in grid.cell(x, y) {
          assert!(!found[idx as usize], "particle {idx} in two cells");
          found[idx as usize] = true;
        }
      }
    }

    for (i, p) in particles.iter().enumerate() {
      match grid.cell_of(p.pos) {
        None => assert!(!found[i]),
        Some((x, y)) => {
          assert!(found[i] || grid.count(x, y) == capacity as usize, "particle {i} lost");
        }
      }
    }
    assert_eq!(
      (stats.inserted + stats.out_of_bounds + stats.overflowed) as usize,
      particles.len()
    );
  }
}

#[test]
fn collision_check_is_symmetric_for_random_pairs() {
  let mut rng = SmallRng::seed_from_u64(11);
  let particles = random_particles(&mut rng, 400, 64.0);
  for pair in particles.chunks_exact(2) {
    for dt in [0.0, 0.008, 0.016, 0.05] {
      assert_eq!(
        check_collision(&pair[0], &pair[1], dt),
        check_collision(&pair[1], &pair[0], dt)
      );
    }
  }
}

#[test]
fn resolved_pairs_never_keep_approaching() {
  let mut rng = SmallRng::seed_from_u64(5);
  let particles = random_particles(&mut rng, 1000, 32.0);
  for pair in particles.chunks_exact(2) {
    let (mut a, mut b) = (pair[0], pair[1]);
    let nx = b.pos[0] - a.pos[0];
    let ny = b.pos[1] - a.pos[1];
    let len = (nx * nx + ny * ny).sqrt();
    if len == 0.0 {
      continue;
    }
    let (nx, ny) = (nx / len, ny / len);
    if resolve_collision(&mut a, &mut b, 0.9) {
      let vn = (b.vel[0] - a.vel[0]) * nx + (b.vel[1] - a.vel[1]) * ny;
      assert!(vn >= -1e-3, "still approaching: {vn}");
    } else {
      assert_eq!((a, b), (pair[0], pair[1]));
    }
  }
}

#[test]
fn two_body_scenario_through_a_tick() {
  let params = SimParams {
    render_width: 256,
    render_height: 256,
    grid_resolution: 8,
    ..SimParams::default()
  };
  // both start in the same 32px cell
  let particles = vec![
    Particle::new([100.0, 100.0], [50.0, 0.0], 6.0, 4.0, 0xFF00_00FF),
    Particle::new([114.0, 100.0], [-50.0, 0.0], 10.0, 4.0, 0x00FF_00FF),
  ];
  let mut sim = Simulation::from_particles(params, particles).unwrap();
  let stats = sim.tick(0.016, None);

  assert_eq!(stats.collisions.pairs_tested, 1);
  assert_eq!(stats.collisions.resolved, 1);
  let [a, b] = sim.particles() else {
    panic!("expected two particles");
  };
  assert!((a.vel[0] - -68.75).abs() < 1e-3);
  assert!((b.vel[0] - 21.25).abs() < 1e-3);
  assert!(b.pos[0] - a.pos[0] >= a.radius + b.radius - 1e-3);
}

#[test]
fn seeded_runs_are_identical() {
  let params = SimParams {
    num_particles: 2000,
    render_width: 512,
    render_height: 512,
    grid_resolution: 64,
    ..SimParams::default()
  };
  let dts = [0.016, 0.017, 0.015, 0.033, 0.008];
  let run = || {
    let mut sim = Simulation::new(params).unwrap();
    for i in 0..60 {
      sim.tick(dts[i % dts.len()], None);
    }
    sim.particles().to_vec()
  };
  assert_eq!(run(), run());
}

#[test]
fn pointer_pushes_crowd_apart() {
  let params = SimParams {
    num_particles: 1500,
    render_width: 512,
    render_height: 512,
    grid_resolution: 64,
    ..SimParams::default()
  };
  let mut sim = Simulation::new(params).unwrap();
  let pointer = PointerInput {
    held: true,
    position: (256, 256),
    window_size: (512, 512),
  };
  let mut pushed = 0;
  for _ in 0..10 {
    pushed += sim.tick(0.016, Some(pointer)).pushed;
  }
  assert!(pushed > 0);
  for p in sim.particles() {
    assert!(p.pos.iter().chain(&p.vel).all(|v| v.is_finite()));
  }
}

#[test]
fn frame_can_be_drawn_after_ticks() {
  let params = SimParams {
    num_particles: 200,
    render_width: 128,
    render_height: 128,
    grid_resolution: 16,
    ..SimParams::default()
  };
  let mut sim = Simulation::new(params).unwrap();
  sim.tick(0.016, None);
  let mut frame = PixelBuffer::new(128, 128);
  draw_particles(&mut frame, sim.particles());
  assert!(frame.take_committed());
  assert!(frame.as_bytes().chunks_exact(4).any(|px| px[3] == 0xFF));
}
