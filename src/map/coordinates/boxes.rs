use serde::{Deserialize, Serialize};

use super::{Coordinate, PixelCoordinate, coords::CANVAS_SIZE};

/// An axis aligned box in ``PixelCoordinate``s. Starts out invalid and becomes valid with the first
/// coordinate added.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
  max_x: f32,
  min_x: f32,
  max_y: f32,
  min_y: f32,
}

impl Default for BoundingBox {
  fn default() -> Self {
    Self::new()
  }
}

impl BoundingBox {
  #[must_use]
  pub fn new() -> Self {
    Self::get_invalid()
  }

  #[must_use]
  pub fn get_invalid() -> Self {
    Self {
      max_x: f32::MIN,
      min_x: f32::MAX,
      max_y: f32::MIN,
      min_y: f32::MAX,
    }
  }

  pub fn from_iterator<C: Coordinate, I: IntoIterator<Item = C>>(positions: I) -> Self {
    let mut bb = Self::get_invalid();
    positions
      .into_iter()
      .for_each(|pos| bb.add_coordinate(pos.as_pixel_coordinate()));
    bb
  }

  #[must_use]
  pub fn center(&self) -> PixelCoordinate {
    PixelCoordinate {
      x: f32::midpoint(self.max_x, self.min_x),
      y: f32::midpoint(self.max_y, self.min_y),
    }
  }

  /// A box is valid if it contains at least one coordinate on the canvas.
  #[must_use]
  pub fn is_valid(&self) -> bool {
    let on_canvas = |v: f32| v.is_finite() && (-CANVAS_SIZE..=2. * CANVAS_SIZE).contains(&v);
    self.min_y <= self.max_y
      && self.min_x <= self.max_x
      && on_canvas(self.min_x)
      && on_canvas(self.min_y)
      && on_canvas(self.max_x)
      && on_canvas(self.max_y)
  }

  /// Valid and with a non-zero area.
  #[must_use]
  pub fn is_box(&self) -> bool {
    self.is_valid() && self.width() > 0. && self.height() > 0.
  }

  pub fn frame(&mut self, frame: f32) {
    self.min_x -= frame;
    self.min_y -= frame;
    self.max_x += frame;
    self.max_y += frame;
  }

  pub fn add_coordinate(&mut self, pp: PixelCoordinate) {
    self.min_y = self.min_y.min(pp.y);
    self.min_x = self.min_x.min(pp.x);
    self.max_y = self.max_y.max(pp.y);
    self.max_x = self.max_x.max(pp.x);
  }

  #[must_use]
  pub fn extend(self, bb: &Self) -> Self {
    if !self.is_valid() {
      return *bb;
    }

    if !bb.is_valid() {
      return self;
    }

    Self {
      min_x: self.min_x.min(bb.min_x),
      min_y: self.min_y.min(bb.min_y),
      max_x: self.max_x.max(bb.max_x),
      max_y: self.max_y.max(bb.max_y),
    }
  }

  #[must_use]
  pub fn width(&self) -> f32 {
    self.max_x - self.min_x
  }

  #[must_use]
  pub fn height(&self) -> f32 {
    self.max_y - self.min_y
  }

  #[must_use]
  pub fn contains(&self, p: PixelCoordinate) -> bool {
    self.is_valid()
      && (self.min_x..=self.max_x).contains(&p.x)
      && (self.min_y..=self.max_y).contains(&p.y)
  }
}
