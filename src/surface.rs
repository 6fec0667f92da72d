//! Output surface the particles are splatted onto.

use crate::Particle;
use cgmath::{InnerSpace, Vector2};

/// An addressable pixel target sized to the render area. Colors are packed
/// 0xRRGGBBAA.
pub trait Surface {
  fn width(&self) -> u32;
  fn height(&self) -> u32;
  fn clear(&mut self);
  fn plot_pixel(&mut self, x: u32, y: u32, color: u32);
  /// Marks the current contents as ready for display.
  fn commit(&mut self);
}

/// CPU pixel buffer. Pixels are kept in RGBA byte order so the buffer can be
/// uploaded to an `Rgba8` texture without conversion.
pub struct PixelBuffer {
  width: u32,
  height: u32,
  pixels: Vec<u32>,
  dirty: bool,
}

impl PixelBuffer {
  #[must_use]
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      pixels: vec![0; (width * height) as usize],
      dirty: false,
    }
  }

  /// Packed 0xRRGGBBAA color at `(x, y)`.
  pub fn pixel(&self, x: u32, y: u32) -> u32 {
    u32::from_be(self.pixels[(x + y * self.width) as usize])
  }

  pub fn as_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.pixels)
  }

  /// Returns whether a commit happened since the last call.
  pub fn take_committed(&mut self) -> bool {
    std::mem::take(&mut self.dirty)
  }
}

impl Surface for PixelBuffer {
  fn width(&self) -> u32 {
    self.width
  }

  fn height(&self) -> u32 {
    self.height
  }

  fn clear(&mut self) {
    self.pixels.fill(0);
  }

  fn plot_pixel(&mut self, x: u32, y: u32, color: u32) {
    if x < self.width && y < self.height {
      self.pixels[(x + y * self.width) as usize] = color.to_be();
    }
  }

  fn commit(&mut self) {
    self.dirty = true;
  }
}

/// Color derived from the direction of travel: x maps to red, y to green.
/// Particles at rest keep their own color.
pub fn velocity_color(p: &Particle) -> u32 {
  let vel = Vector2::from(p.vel);
  if vel.magnitude2() == 0.0 {
    return p.color;
  }
  let dir = vel.normalize();
  let r = (dir.x * 127.0 + 128.0) as u32;
  let g = (dir.y * 127.0 + 128.0) as u32;
  (r << 24) | (g << 16) | 0xFF
}

/// Clears `surface`, draws every particle as a filled disc and commits.
pub fn draw_particles(surface: &mut impl Surface, particles: &[Particle]) {
  surface.clear();
  let width = surface.width() as i64;
  let height = surface.height() as i64;

  for p in particles {
    let radius = p.radius as i64;
    let radius_sq = radius * radius;
    let cx = p.pos[0] as i64;
    let cy = p.pos[1] as i64;
    let color = velocity_color(p);

    let y_start = (cy - radius).max(0);
    let y_end = (cy + radius).min(height - 1);
    let x_start = (cx - radius).max(0);
    let x_end = (cx + radius).min(width - 1);

    for y in y_start..=y_end {
      for x in x_start..=x_end {
        let (dx, dy) = (x - cx, y - cy);
        if dx * dx + dy * dy < radius_sq {
          surface.plot_pixel(x as u32, y as u32, color);
        }
      }
    }
  }

  surface.commit();
}
