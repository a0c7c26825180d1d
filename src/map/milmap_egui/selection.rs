use crate::map::{
  coordinates::{PixelCoordinate, Transform},
  geometry_collection::{Geometry, polygon_contains},
  host::Primitive,
};

/// Clicks further away than this many screen pixels select nothing.
pub(crate) const MAX_SELECTION_DISTANCE: f32 = 10.;

/// Index of the primitive closest to a click, if close enough. Clicks inside a polygon hit it,
/// clicks into one of its holes only hit its outline.
pub(crate) fn closest_primitive(
  primitives: &[Primitive],
  click: PixelCoordinate,
  transform: &Transform,
) -> Option<usize> {
  primitives
    .iter()
    .enumerate()
    .map(|(i, p)| (i, distance_to_geometry(&p.geometry, click) * transform.zoom))
    .filter(|(_, d)| *d <= MAX_SELECTION_DISTANCE)
    .min_by(|(_, a), (_, b)| a.total_cmp(b))
    .map(|(i, _)| i)
}

/// Distance in canvas coordinates.
fn distance_to_geometry(geometry: &Geometry<PixelCoordinate>, click: PixelCoordinate) -> f32 {
  match geometry {
    Geometry::GeometryCollection(geometries) => geometries
      .iter()
      .map(|g| distance_to_geometry(g, click))
      .fold(f32::INFINITY, f32::min),
    Geometry::Point(coord) => coord.sq_dist(&click).sqrt(),
    Geometry::LineString(coords) => distance_to_line(coords, click),
    Geometry::Polygon(rings) => {
      if polygon_contains(rings, click) {
        0.
      } else {
        rings
          .iter()
          .map(|ring| distance_to_ring(ring, click))
          .fold(f32::INFINITY, f32::min)
      }
    }
  }
}

fn distance_to_ring(ring: &[PixelCoordinate], click: PixelCoordinate) -> f32 {
  let closing = ring.last().zip(ring.first());
  let closing = closing.map_or(f32::INFINITY, |(a, b)| {
    click.sq_distance_line_segment(a, b).sqrt()
  });
  distance_to_line(ring, click).min(closing)
}

fn distance_to_line(coords: &[PixelCoordinate], click: PixelCoordinate) -> f32 {
  coords
    .windows(2)
    .map(|s| click.sq_distance_line_segment(&s[0], &s[1]).sqrt())
    .fold(f32::INFINITY, f32::min)
}
