use serde::{Deserialize, Serialize};

use crate::style::StyleConfig;

use super::{
  coordinates::{BoundingBox, PixelCoordinate, WGS84Coordinate},
  geometry_collection::Geometry,
};

/// How a camera fit is performed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
  /// Screen space margin around the fitted region in pixels.
  pub padding: f32,
  pub animate: bool,
}

impl Default for FitOptions {
  fn default() -> Self {
    Self {
      padding: 50.,
      animate: true,
    }
  }
}

/// Title and body shown when a primitive is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
  pub title: String,
  pub body: String,
}

/// One drawable feature of the vector layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
  pub geometry: Geometry<PixelCoordinate>,
  pub popup: Popup,
}

/// The contents of the single vector layer a host draws.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorLayer {
  pub primitives: Vec<Primitive>,
  pub style: StyleConfig,
}

impl VectorLayer {
  #[must_use]
  pub fn bounding_box(&self) -> BoundingBox {
    self
      .primitives
      .iter()
      .map(|p| p.geometry.bounding_box())
      .fold(BoundingBox::default(), |acc, b| acc.extend(&b))
  }
}

/// The map canvas the layer is drawn on. Implementations own the viewport and the vector layer.
/// The layer is only ever mutated through these calls.
pub trait MapHost {
  /// Centers the map on a coordinate with an OSM style zoom level.
  fn set_view(&mut self, center: WGS84Coordinate, zoom: u8);

  /// Asks the host to recompute its size before the next fit.
  fn invalidate_size(&mut self);

  /// Moves the camera so the region is visible.
  fn fit_bounds(&mut self, bounds: BoundingBox, options: FitOptions);

  fn replace_layer(&mut self, layer: VectorLayer);

  /// Changes the style of the current layer without touching its primitives.
  fn restyle_layer(&mut self, style: StyleConfig);

  fn clear_layer(&mut self);
}
