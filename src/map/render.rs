use crate::style::StyleConfig;

use super::{
  coordinates::{BoundingBox, PixelCoordinate},
  geometry_collection::{Feature, Geometry, GeometryCollection},
  host::{MapHost, Popup, Primitive, VectorLayer},
};

/// Popup body of features without a name.
pub const UNNAMED_FEATURE: &str = "Obiekt wojskowy";

/// What the host got to draw. Signals that rendering of a collection is complete.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderReport {
  pub primitives: usize,
  pub bounds: BoundingBox,
}

impl Default for RenderReport {
  fn default() -> Self {
    Self {
      primitives: 0,
      bounds: BoundingBox::get_invalid(),
    }
  }
}

/// Binds a collection and a style to the vector layer of a [`MapHost`].
///
/// The collection is identified by the generation of the load that produced it. Binding a new
/// generation replaces the layer, binding the same generation again only restyles it.
#[derive(Debug, Default)]
pub struct RenderBinding {
  bound: Option<u64>,
  report: RenderReport,
}

impl RenderBinding {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn bind<H: MapHost + ?Sized>(
    &mut self,
    host: &mut H,
    generation: u64,
    collection: &GeometryCollection,
    style: &StyleConfig,
    active_label: &str,
  ) -> RenderReport {
    if self.bound == Some(generation) {
      log::trace!("Restyling layer of generation {generation}");
      host.restyle_layer(*style);
      return self.report;
    }

    let layer = VectorLayer {
      primitives: collection
        .features()
        .iter()
        .filter_map(|f| primitive(f, active_label))
        .collect(),
      style: *style,
    };
    self.report = RenderReport {
      primitives: layer.primitives.len(),
      bounds: layer.bounding_box(),
    };
    log::debug!(
      "Binding generation {generation}: {} of {} features drawable",
      self.report.primitives,
      collection.len()
    );
    self.bound = Some(generation);
    host.replace_layer(layer);
    self.report
  }

  pub fn clear<H: MapHost + ?Sized>(&mut self, host: &mut H) {
    self.bound = None;
    self.report = RenderReport::default();
    host.clear_layer();
  }

  /// The generation currently on the host, if any.
  #[must_use]
  pub fn bound_generation(&self) -> Option<u64> {
    self.bound
  }
}

fn primitive(feature: &Feature, active_label: &str) -> Option<Primitive> {
  if feature.geometry.is_degenerate() {
    return None;
  }
  let geometry: Geometry<PixelCoordinate> = feature.geometry.clone().into();
  Some(Primitive {
    geometry,
    popup: Popup {
      title: active_label.to_string(),
      body: feature.name().unwrap_or(UNNAMED_FEATURE).to_string(),
    },
  })
}
