pub mod collision;
pub mod error;
pub mod grid;
pub mod initialize;
pub mod integrate;
pub mod interaction;
pub mod render;
pub mod simulation;
pub mod state;
pub mod store;
pub mod surface;

pub use error::{Result, SimError};

#[derive(Copy, Clone, Debug)]
pub struct SimParams {
  pub num_particles: u32,
  pub grid_resolution: u32,
  pub cell_capacity: u32,
  pub render_width: u32,
  pub render_height: u32,
  pub seed: u64,
  pub min_radius: f32,
  pub max_radius: f32,
  pub mass_per_radius: f32,
  pub initial_speed: f32,
  pub max_dt: f32,
  pub collision: CollisionParams,
  pub field: FieldParams,
}

impl Default for SimParams {
  fn default() -> Self {
    Self {
      num_particles: 1e4 as u32,
      grid_resolution: 128,
      cell_capacity: 32,
      render_width: 1024,
      render_height: 1024,
      seed: 0,
      min_radius: 6.0,
      max_radius: 9.0,
      mass_per_radius: 4.0,
      initial_speed: 100.0,
      max_dt: 0.05,
      collision: CollisionParams::default(),
      field: FieldParams::default(),
    }
  }
}

impl SimParams {
  /// Rejects parameter sets the engine cannot run with. Physics edge cases are
  /// not checked here; those are absorbed at runtime.
  pub fn validate(&self) -> Result<()> {
    if self.num_particles == 0 {
      return Err(SimError::invalid_config("num_particles must be at least 1"));
    }
    if self.grid_resolution == 0 || self.cell_capacity == 0 {
      return Err(SimError::invalid_config(
        "grid_resolution and cell_capacity must be at least 1",
      ));
    }
    if self.render_width == 0 || self.render_height == 0 {
      return Err(SimError::invalid_config("render size must be non-zero"));
    }
    if !(self.min_radius > 0.0 && self.min_radius <= self.max_radius && self.max_radius.is_finite()) {
      return Err(SimError::invalid_config(format!(
        "radius range {}..{} is not a positive, ordered, finite range",
        self.min_radius, self.max_radius
      )));
    }
    if !(self.mass_per_radius > 0.0 && self.mass_per_radius.is_finite()) {
      return Err(SimError::invalid_config("mass_per_radius must be positive and finite"));
    }
    // the initial velocity range -s..=s must have a finite width
    if !(self.initial_speed >= 0.0 && (2.0 * self.initial_speed).is_finite()) {
      return Err(SimError::invalid_config(format!(
        "initial_speed {} must be non-negative and finite",
        self.initial_speed
      )));
    }
    if !(self.max_dt > 0.0 && self.max_dt.is_finite()) {
      return Err(SimError::invalid_config("max_dt must be positive and finite"));
    }
    if !(0.0..=1.0).contains(&self.collision.restitution) {
      return Err(SimError::invalid_config(format!(
        "restitution {} is outside 0..=1",
        self.collision.restitution
      )));
    }
    let field = [self.field.radius, self.field.strength, self.field.max_speed];
    if !field.iter().all(|v| *v > 0.0 && v.is_finite()) {
      return Err(SimError::invalid_config(
        "field radius, strength and max_speed must be positive and finite",
      ));
    }
    Ok(())
  }
}

#[derive(Copy, Clone, Debug)]
pub struct CollisionParams {
  pub restitution: f32,
}

impl Default for CollisionParams {
  fn default() -> Self {
    Self { restitution: 0.9 }
  }
}

/// Pointer-driven repulsion field.
#[derive(Copy, Clone, Debug)]
pub struct FieldParams {
  /// Particles farther than this (in render pixels) are unaffected.
  pub radius: f32,
  pub strength: f32,
  pub max_speed: f32,
}

impl Default for FieldParams {
  fn default() -> Self {
    Self {
      radius: 128.0,
      strength: 25.0 * 128.0 * 128.0,
      max_speed: 256.0,
    }
  }
}

/// A circular rigid body. `radius`, `mass` and `color` are fixed once the
/// particle is created; only `pos` and `vel` change between ticks.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Particle {
  pub pos: [f32; 2],
  pub vel: [f32; 2],
  pub radius: f32,
  pub mass: f32,
  /// Packed 0xRRGGBBAA.
  pub color: u32,
}

impl Particle {
  #[must_use]
  pub fn new(pos: [f32; 2], vel: [f32; 2], radius: f32, mass_per_radius: f32, color: u32) -> Self {
    Self {
      pos,
      vel,
      radius,
      mass: radius * mass_per_radius,
      color,
    }
  }
}
