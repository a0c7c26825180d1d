use egui::Rect;

use crate::map::coordinates::{BoundingBox, CANVAS_SIZE, PixelCoordinate, PixelPosition, Transform};

pub const MAX_ZOOM: f32 = 524_288.;
pub const MIN_ZOOM: f32 = 0.25;

/// Moves the map so that `coord` ends up at `cursor`.
pub(crate) fn set_coordinate_to_pixel(
  coord: PixelCoordinate,
  cursor: PixelPosition,
  transform: &mut Transform,
) {
  let current_pos_in_gui = transform.apply(coord);
  transform.translate(current_pos_in_gui * (-1.) + cursor);
}

/// Converts a point, e.g. from a click, to a coordinate.
pub(crate) fn point_to_coordinate(point: PixelPosition, transform: &Transform) -> PixelCoordinate {
  transform.invert().apply(point)
}

/// The transform zoom showing the map like a slippy map at an OSM zoom level with 256px tiles.
pub(crate) fn zoom_for_level(level: u8) -> f32 {
  (256. * 2f32.powi(i32::from(level)) / CANVAS_SIZE).clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Keeps the zoom in range and the canvas on screen.
pub(crate) fn fit_to_screen(transform: &mut Transform, rect: &Rect) {
  transform.zoom = transform.zoom.clamp(MIN_ZOOM, MAX_ZOOM);

  let inv = transform.invert();
  let PixelCoordinate { x, y } = inv.apply(rect.min.into());
  if x < 0. || y < 0. {
    transform.translate(
      PixelPosition {
        x: x.min(0.),
        y: y.min(0.),
      } * transform.zoom,
    );
  }

  let PixelCoordinate { x, y } = inv.apply(rect.max.into());
  if x > CANVAS_SIZE || y > CANVAS_SIZE {
    transform.translate(
      PixelPosition {
        x: (x - CANVAS_SIZE).max(0.),
        y: (y - CANVAS_SIZE).max(0.),
      } * transform.zoom,
    );
  }
}

/// Shows a bounding box with `padding` pixels around it. Boxes without area are framed first.
pub(crate) fn show_box(transform: &mut Transform, bb: &BoundingBox, rect: Rect, padding: f32) {
  if !bb.is_valid() {
    return;
  }
  let mut bb = *bb;
  if !bb.is_box() {
    bb.frame(0.02);
  }
  let inner = rect.shrink(padding.min(rect.width() / 4.).min(rect.height() / 4.).max(0.));
  let zoom = (inner.width() / bb.width())
    .min(inner.height() / bb.height())
    .clamp(MIN_ZOOM, MAX_ZOOM);
  transform.zoom = zoom;
  set_coordinate_to_pixel(bb.center(), rect.center().into(), transform);
}
