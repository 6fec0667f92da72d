//! Uniform bucket grid over the render area.
//!
//! The grid owns no particle data. Each cell stores up to `capacity` indices
//! into the particle store plus an occupancy counter, and the whole grid is
//! rebuilt from scratch every tick.

use crate::Particle;

/// Particles that could not be placed during the last [`SpatialGrid::build`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GridStats {
  pub inserted: u32,
  /// Position outside the grid extent (or NaN).
  pub out_of_bounds: u32,
  /// Target cell was already full.
  pub overflowed: u32,
}

pub struct SpatialGrid {
  resolution: usize,
  capacity: usize,
  cell_width: f32,
  cell_height: f32,
  counts: Vec<u32>,
  entries: Vec<u32>,
}

impl SpatialGrid {
  /// Allocates a `resolution × resolution` grid covering `width × height`.
  #[must_use]
  pub fn new(resolution: u32, capacity: u32, width: u32, height: u32) -> Self {
    let resolution = resolution as usize;
    let capacity = capacity as usize;
    let cells = resolution * resolution;
    Self {
      resolution,
      capacity,
      cell_width: width as f32 / resolution as f32,
      cell_height: height as f32 / resolution as f32,
      counts: vec![0; cells],
      entries: vec![0; cells * capacity],
    }
  }

  pub fn resolution(&self) -> usize {
    self.resolution
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn cell_size(&self) -> (f32, f32) {
    (self.cell_width, self.cell_height)
  }

  pub fn cell_index(&self, x: usize, y: usize) -> usize {
    x + y * self.resolution
  }

  /// Grid coordinates of `pos`, or `None` if it falls outside the grid.
  pub fn cell_of(&self, pos: [f32; 2]) -> Option<(usize, usize)> {
    let gx = (pos[0] / self.cell_width).floor();
    let gy = (pos[1] / self.cell_height).floor();
    let res = self.resolution as f32;
    // NaN fails both comparisons and is rejected here as well.
    if gx >= 0.0 && gx < res && gy >= 0.0 && gy < res {
      Some((gx as usize, gy as usize))
    } else {
      None
    }
  }

  pub fn count(&self, x: usize, y: usize) -> usize {
    self.counts[self.cell_index(x, y)] as usize
  }

  /// Particle indices stored in cell `(x, y)`, in insertion order.
  pub fn cell(&self, x: usize, y: usize) -> &[u32] {
    let idx = self.cell_index(x, y);
    let start = idx * self.capacity;
    &self.entries[start..start + self.counts[idx] as usize]
  }

  /// Rebuilds the grid from `particles`. Particles outside the grid or landing
  /// in a full cell are left out for this tick.
  pub fn build(&mut self, particles: &[Particle]) -> GridStats {
    self.counts.fill(0);
    let mut stats = GridStats::default();

    for (i, p) in particles.iter().enumerate() {
      let Some((gx, gy)) = self.cell_of(p.pos) else {
        stats.out_of_bounds += 1;
        continue;
      };
      let cell = self.cell_index(gx, gy);
      let count = self.counts[cell] as usize;
      if count < self.capacity {
        self.entries[cell * self.capacity + count] = i as u32;
        self.counts[cell] += 1;
        stats.inserted += 1;
      } else {
        stats.overflowed += 1;
      }
    }

    stats
  }
}
