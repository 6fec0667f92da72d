//! Per-tick orchestration of the simulation phases.

use crate::collision::{CollisionPass, CollisionStats, HostCollisionPass};
use crate::grid::{GridStats, SpatialGrid};
use crate::initialize::create_particles;
use crate::integrate::integrate;
use crate::interaction::{apply_pointer_force, PointerInput};
use crate::store::ParticleStore;
use crate::{Particle, Result, SimParams};

const FRAME_TIME_SMOOTHING: f32 = 0.99;

/// Counters gathered during one [`Simulation::tick`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
  pub grid: GridStats,
  pub collisions: CollisionStats,
  pub pushed: usize,
}

/// Owns the particle store, the grid and the collision strategy. Nothing is
/// global; front ends hold one of these and call [`Simulation::tick`].
pub struct Simulation {
  params: SimParams,
  store: ParticleStore,
  grid: SpatialGrid,
  collision_pass: Box<dyn CollisionPass>,
  avg_frame_time: f32,
  tick_count: u64,
}

impl Simulation {
  pub fn new(params: SimParams) -> Result<Self> {
    params.validate()?;
    let store = ParticleStore::new(create_particles(&params));
    Ok(Self::with_store(params, store))
  }

  /// Builds a simulation around an explicit particle set instead of the
  /// seeded distribution. `params.num_particles` is ignored.
  pub fn from_particles(params: SimParams, particles: Vec<Particle>) -> Result<Self> {
    params.validate()?;
    Ok(Self::with_store(params, ParticleStore::new(particles)))
  }

  fn with_store(params: SimParams, store: ParticleStore) -> Self {
    let grid = SpatialGrid::new(
      params.grid_resolution,
      params.cell_capacity,
      params.render_width,
      params.render_height,
    );
    let (cell_w, cell_h) = grid.cell_size();
    log::info!(
      "simulation: {} particles, {}x{} grid of {cell_w}x{cell_h}px cells, capacity {}",
      store.len(),
      params.grid_resolution,
      params.grid_resolution,
      params.cell_capacity
    );
    Self {
      params,
      store,
      grid,
      collision_pass: Box::new(HostCollisionPass),
      avg_frame_time: 0.0,
      tick_count: 0,
    }
  }

  /// Replaces the collision execution strategy.
  #[must_use]
  pub fn with_collision_pass(mut self, pass: impl CollisionPass + 'static) -> Self {
    self.collision_pass = Box::new(pass);
    self
  }

  /// Runs one full tick: grid build, collisions, pointer field, integration.
  /// The pointer snapshot is held fixed for the whole tick.
  pub fn tick(&mut self, dt: f32, pointer: Option<PointerInput>) -> TickStats {
    self.avg_frame_time =
      FRAME_TIME_SMOOTHING * self.avg_frame_time + (1.0 - FRAME_TIME_SMOOTHING) * dt;

    let particles = self.store.as_mut_slice();
    let grid = self.grid.build(particles);
    let collisions = self
      .collision_pass
      .run(particles, &self.grid, &self.params.collision, dt);

    let render_size = (self.params.render_width, self.params.render_height);
    let pushed = pointer.map_or(0, |pointer| {
      apply_pointer_force(
        particles,
        &self.grid,
        &pointer,
        render_size,
        &self.params.field,
        dt,
      )
    });

    integrate(
      particles,
      (render_size.0 as f32, render_size.1 as f32),
      dt,
    );
    self.tick_count += 1;

    if grid.out_of_bounds > 0 || grid.overflowed > 0 {
      log::debug!(
        "tick {}: {} out of bounds, {} dropped from full cells",
        self.tick_count,
        grid.out_of_bounds,
        grid.overflowed
      );
    }
    log::trace!(
      "tick {}: {} pairs tested, {} resolved, {} pushed",
      self.tick_count,
      collisions.pairs_tested,
      collisions.resolved,
      pushed
    );

    TickStats {
      grid,
      collisions,
      pushed,
    }
  }

  pub fn particles(&self) -> &[Particle] {
    self.store.as_slice()
  }

  pub fn grid(&self) -> &SpatialGrid {
    &self.grid
  }

  pub fn params(&self) -> &SimParams {
    &self.params
  }

  /// Exponentially smoothed tick duration in seconds. Diagnostic only.
  pub fn avg_frame_time(&self) -> f32 {
    self.avg_frame_time
  }

  pub fn tick_count(&self) -> u64 {
    self.tick_count
  }

  pub fn kinetic_energy(&self) -> f64 {
    self.store.kinetic_energy()
  }
}
