//! Broad-phase traversal, predictive narrow-phase and impulse response.

use crate::grid::SpatialGrid;
use crate::store::pair_mut;
use crate::{CollisionParams, Particle};
use cgmath::{InnerSpace, Vector2};

/// Forward half of the Moore neighbourhood: right, below-left, below,
/// below-right. Each adjacent cell pair is visited from exactly one side.
const FORWARD_NEIGHBOURS: [(isize, isize); 4] = [(1, 0), (-1, 1), (0, 1), (1, 1)];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionStats {
  pub pairs_tested: u32,
  pub resolved: u32,
}

/// A strategy for running the collision phase over a freshly built grid.
///
/// Every implementation must reproduce the results of [`HostCollisionPass`]
/// within floating point tolerance.
pub trait CollisionPass {
  fn run(
    &mut self,
    particles: &mut [Particle],
    grid: &SpatialGrid,
    params: &CollisionParams,
    dt: f32,
  ) -> CollisionStats;
}

/// Sequential reference pass. Pairs are resolved in cell scan order and each
/// resolution sees the state left by the previous one.
#[derive(Copy, Clone, Debug, Default)]
pub struct HostCollisionPass;

impl CollisionPass for HostCollisionPass {
  fn run(
    &mut self,
    particles: &mut [Particle],
    grid: &SpatialGrid,
    params: &CollisionParams,
    dt: f32,
  ) -> CollisionStats {
    let mut stats = CollisionStats::default();
    let res = grid.resolution();

    for y in 0..res {
      for x in 0..res {
        let cell = grid.cell(x, y);
        for (i, &p1) in cell.iter().enumerate() {
          for &p2 in &cell[i + 1..] {
            test_pair(particles, p1, p2, params, dt, &mut stats);
          }

          for (dx, dy) in FORWARD_NEIGHBOURS {
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if nx < 0 || nx >= res as isize || ny >= res as isize {
              continue;
            }
            for &p2 in grid.cell(nx as usize, ny as usize) {
              test_pair(particles, p1, p2, params, dt, &mut stats);
            }
          }
        }
      }
    }

    stats
  }
}

fn test_pair(
  particles: &mut [Particle],
  p1: u32,
  p2: u32,
  params: &CollisionParams,
  dt: f32,
  stats: &mut CollisionStats,
) {
  stats.pairs_tested += 1;
  let (a, b) = pair_mut(particles, p1 as usize, p2 as usize);
  if check_collision(a, b, dt) && resolve_collision(a, b, params.restitution) {
    stats.resolved += 1;
  }
}

/// True when the two discs overlap after both advance by `dt` at their current
/// velocity.
pub fn check_collision(a: &Particle, b: &Particle, dt: f32) -> bool {
  let next_a = Vector2::from(a.pos) + Vector2::from(a.vel) * dt;
  let next_b = Vector2::from(b.pos) + Vector2::from(b.vel) * dt;
  let reach = a.radius + b.radius;
  (next_a - next_b).magnitude2() <= reach * reach
}

/// Applies a restitution impulse along the contact normal and pushes the pair
/// apart by the current overlap. Returns `false` without touching either
/// particle when they coincide or are already separating.
pub fn resolve_collision(a: &mut Particle, b: &mut Particle, restitution: f32) -> bool {
  let delta = Vector2::from(b.pos) - Vector2::from(a.pos);
  let dist = delta.magnitude();
  if dist == 0.0 {
    return false;
  }
  let normal = delta / dist;

  let rel_vel = Vector2::from(b.vel) - Vector2::from(a.vel);
  let vel_along_normal = rel_vel.dot(normal);
  if vel_along_normal >= 0.0 {
    return false;
  }

  let inv_mass_a = 1.0 / a.mass;
  let inv_mass_b = 1.0 / b.mass;
  let j = -(1.0 + restitution) * vel_along_normal / (inv_mass_a + inv_mass_b);
  let impulse = normal * j;
  a.vel = (Vector2::from(a.vel) - impulse * inv_mass_a).into();
  b.vel = (Vector2::from(b.vel) + impulse * inv_mass_b).into();

  // predicted contacts may not overlap yet; never pull them together
  let overlap = (a.radius + b.radius - dist).max(0.0);
  let correction = normal * (overlap * 0.5);
  a.pos = (Vector2::from(a.pos) - correction).into();
  b.pos = (Vector2::from(b.pos) + correction).into();

  true
}

#[cfg(test)]
mod tests {
  use super::*;

  fn particle(pos: [f32; 2], vel: [f32; 2], radius: f32) -> Particle {
    Particle::new(pos, vel, radius, 4.0, 0xFFFF_FFFF)
  }

  #[test]
  fn head_on_pair_collides_and_bounces() {
    let mut a = particle([100.0, 100.0], [50.0, 0.0], 6.0);
    let mut b = particle([114.0, 100.0], [-50.0, 0.0], 10.0);
    assert_eq!(a.mass, 24.0);
    assert_eq!(b.mass, 40.0);

    assert!(check_collision(&a, &b, 0.016));
    assert!(resolve_collision(&mut a, &mut b, 0.9));

    assert!(a.vel[0] < 0.0 && b.vel[0] > 0.0);
    assert!((a.vel[0] - -68.75).abs() < 1e-3);
    assert!((b.vel[0] - 21.25).abs() < 1e-3);
    // restitution-scaled separation speed
    assert!(((b.vel[0] - a.vel[0]) - 90.0).abs() < 1e-3);
    assert_eq!(a.vel[1], 0.0);
    assert_eq!(b.vel[1], 0.0);

    let dist = (Vector2::from(b.pos) - Vector2::from(a.pos)).magnitude();
    assert!(dist >= 16.0 - 1e-4, "still overlapping: {dist}");
  }

  #[test]
  fn check_collision_is_symmetric() {
    let cases = [
      (particle([0.0, 0.0], [10.0, 3.0], 2.0), particle([5.0, 1.0], [-4.0, 0.0], 1.5)),
      (particle([0.0, 0.0], [0.0, 0.0], 1.0), particle([2.0, 0.0], [0.0, 0.0], 1.0)),
      (particle([0.0, 0.0], [-100.0, 0.0], 1.0), particle([30.0, 0.0], [100.0, 0.0], 1.0)),
      (particle([10.0, 10.0], [200.0, 200.0], 3.0), particle([20.0, 20.0], [0.0, 0.0], 3.0)),
    ];
    for dt in [0.0, 0.016, 0.1] {
      for (a, b) in &cases {
        assert_eq!(check_collision(a, b, dt), check_collision(b, a, dt));
      }
    }
  }

  #[test]
  fn prediction_catches_tunnelling_pair() {
    // currently far apart, overlapping after one step
    let a = particle([0.0, 0.0], [500.0, 0.0], 2.0);
    let b = particle([10.0, 0.0], [0.0, 0.0], 2.0);
    assert!(!check_collision(&a, &b, 0.0));
    assert!(check_collision(&a, &b, 0.02));
  }

  #[test]
  fn approaching_pair_ends_non_approaching() {
    let mut a = particle([0.0, 0.0], [30.0, 20.0], 5.0);
    let mut b = particle([6.0, 8.0], [-10.0, -40.0], 7.0);
    let normal = (Vector2::from(b.pos) - Vector2::from(a.pos)).normalize();
    assert!((Vector2::from(b.vel) - Vector2::from(a.vel)).dot(normal) < 0.0);

    assert!(resolve_collision(&mut a, &mut b, 0.9));
    let after = (Vector2::from(b.vel) - Vector2::from(a.vel)).dot(normal);
    assert!(after >= 0.0);
  }

  #[test]
  fn separating_pair_is_untouched() {
    let mut a = particle([0.0, 0.0], [-5.0, 0.0], 5.0);
    let mut b = particle([8.0, 0.0], [5.0, 1.0], 5.0);
    let (before_a, before_b) = (a, b);
    assert!(!resolve_collision(&mut a, &mut b, 0.9));
    assert_eq!(a, before_a);
    assert_eq!(b, before_b);
  }

  #[test]
  fn predicted_contact_bounces_without_moving() {
    // 10px gap now, touching after the step
    let mut a = particle([0.0, 0.0], [500.0, 0.0], 2.0);
    let mut b = particle([10.0, 0.0], [0.0, 0.0], 2.0);
    assert!(check_collision(&a, &b, 0.02));
    assert!(resolve_collision(&mut a, &mut b, 0.9));
    assert_eq!(a.pos, [0.0, 0.0]);
    assert_eq!(b.pos, [10.0, 0.0]);
    assert!(a.vel[0] < 500.0);
    assert!(b.vel[0] > 0.0);
  }

  #[test]
  fn coincident_pair_is_untouched() {
    let mut a = particle([5.0, 5.0], [1.0, 0.0], 2.0);
    let mut b = particle([5.0, 5.0], [-1.0, 0.0], 2.0);
    let (before_a, before_b) = (a, b);
    assert!(!resolve_collision(&mut a, &mut b, 0.9));
    assert_eq!(a, before_a);
    assert_eq!(b, before_b);
  }

  #[test]
  fn momentum_is_conserved_by_impulse() {
    let mut a = particle([0.0, 0.0], [40.0, 5.0], 6.0);
    let mut b = particle([10.0, 3.0], [-20.0, 0.0], 9.0);
    let momentum = |a: &Particle, b: &Particle| {
      Vector2::from(a.vel) * a.mass + Vector2::from(b.vel) * b.mass
    };
    let before = momentum(&a, &b);
    assert!(resolve_collision(&mut a, &mut b, 0.9));
    let after = momentum(&a, &b);
    assert!((before - after).magnitude() < 1e-2);
  }

  /// Two touching particles straddling the boundary between `first` and
  /// `second`, moving towards each other.
  fn straddling_pair(first: [f32; 2], second: [f32; 2]) -> Vec<Particle> {
    let towards = (Vector2::from(second) - Vector2::from(first)) * 5.0;
    vec![
      particle(first, towards.into(), 1.5),
      particle(second, (-towards).into(), 1.5),
    ]
  }

  fn run_pass(particles: &mut [Particle], grid: &mut SpatialGrid) -> CollisionStats {
    grid.build(particles);
    HostCollisionPass.run(particles, grid, &CollisionParams::default(), 0.016)
  }

  #[test]
  fn half_stencil_covers_all_neighbour_directions() {
    // 4x4 grid of 10px cells
    let cases = [
      ([9.0, 5.0], [11.0, 5.0]),   // right
      ([5.0, 9.0], [5.0, 11.0]),   // below
      ([9.0, 9.0], [11.0, 11.0]),  // below-right
      ([11.0, 9.0], [9.0, 11.0]),  // below-left
      ([39.0, 9.0], [39.0, 11.0]), // below, last column
      ([9.0, 39.0], [11.0, 39.0]), // right, last row
      ([31.0, 29.0], [29.0, 31.0]), // below-left into last row
    ];
    for (first, second) in cases {
      let mut particles = straddling_pair(first, second);
      let mut grid = SpatialGrid::new(4, 8, 40, 40);
      let stats = run_pass(&mut particles, &mut grid);
      assert_eq!(stats.pairs_tested, 1, "pair {first:?} / {second:?}");
      assert_eq!(stats.resolved, 1, "pair {first:?} / {second:?}");
    }
  }

  #[test]
  fn each_pair_is_tested_once() {
    // a 3x3 block of particles, one per cell
    let mut particles: Vec<Particle> = (0..9)
      .map(|i| particle([5.0 + 10.0 * (i % 3) as f32, 5.0 + 10.0 * (i / 3) as f32], [0.0, 0.0], 1.0))
      .collect();
    let mut grid = SpatialGrid::new(3, 4, 30, 30);
    let stats = run_pass(&mut particles, &mut grid);
    // adjacent cell pairs in a 3x3 block: 6 horizontal, 6 vertical, 8 diagonal
    assert_eq!(stats.pairs_tested, 20);
    assert_eq!(stats.resolved, 0);
  }

  #[test]
  fn distant_cells_are_not_tested() {
    let mut particles = vec![
      particle([5.0, 5.0], [0.0, 0.0], 1.0),
      particle([25.0, 5.0], [0.0, 0.0], 1.0),
    ];
    let mut grid = SpatialGrid::new(4, 4, 40, 40);
    let stats = run_pass(&mut particles, &mut grid);
    assert_eq!(stats.pairs_tested, 0);
  }
}
