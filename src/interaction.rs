use crate::grid::SpatialGrid;
use crate::{FieldParams, Particle};
use cgmath::{InnerSpace, Vector2};

/// Pointer state sampled once per tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PointerInput {
  /// Primary button held.
  pub held: bool,
  /// Cursor position in window pixels.
  pub position: (i32, i32),
  pub window_size: (u32, u32),
}

impl PointerInput {
  /// Position in render space, or `None` when the field should not act this
  /// tick (button released or cursor outside the window).
  pub fn to_render_space(&self, render_size: (u32, u32)) -> Option<Vector2<f32>> {
    let (x, y) = self.position;
    let (w, h) = self.window_size;
    if !self.held || x < 0 || y < 0 || x as u32 >= w || y as u32 >= h {
      return None;
    }
    let xscale = render_size.0 as f32 / w as f32;
    let yscale = render_size.1 as f32 / h as f32;
    Some(Vector2::new(x as f32 * xscale, y as f32 * yscale))
  }
}

/// Pushes particles near the pointer away from it with an inverse-square
/// falloff, then caps their speed. Returns how many particles were pushed.
pub fn apply_pointer_force(
  particles: &mut [Particle],
  grid: &SpatialGrid,
  pointer: &PointerInput,
  render_size: (u32, u32),
  field: &FieldParams,
  dt: f32,
) -> usize {
  let Some(cursor) = pointer.to_render_space(render_size) else {
    return 0;
  };

  let res = grid.resolution();
  let (cell_w, cell_h) = grid.cell_size();
  let gx = ((cursor.x / cell_w) as usize).min(res - 1);
  let gy = ((cursor.y / cell_h) as usize).min(res - 1);
  let reach_x = (field.radius / cell_w).ceil() as usize;
  let reach_y = (field.radius / cell_h).ceil() as usize;

  let x_range = gx.saturating_sub(reach_x)..=gx.saturating_add(reach_x).min(res - 1);
  let y_range = gy.saturating_sub(reach_y)..=gy.saturating_add(reach_y).min(res - 1);
  let radius_sq = field.radius * field.radius;
  let mut pushed = 0;

  for y in y_range {
    for x in x_range.clone() {
      for &idx in grid.cell(x, y) {
        let p = &mut particles[idx as usize];
        let diff = Vector2::from(p.pos) - cursor;
        let dist_sq = diff.magnitude2();
        // exactly on the pointer: no direction to push in
        if dist_sq == 0.0 || dist_sq > radius_sq {
          continue;
        }

        let force = field.strength / dist_sq;
        let mut vel = Vector2::from(p.vel) + diff * (force * dt);
        let speed = vel.magnitude();
        if speed > field.max_speed {
          vel = vel / speed * field.max_speed;
        }
        p.vel = vel.into();
        pushed += 1;
      }
    }
  }

  pushed
}
