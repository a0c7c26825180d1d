use egui::{
  Color32, Stroke,
  epaint::{CircleShape, PathShape, PathStroke},
};

use super::BACKGROUND;
use crate::{
  map::{
    coordinates::{PixelCoordinate, Transform},
    geometry_collection::Geometry,
  },
  style::StyleConfig,
};

type Painter = egui::Painter;

const POINT_RADIUS: f32 = 4.0;

/// Shapes of a geometry under the given transform and style. Holes are painted over with the map
/// background after the exterior ring is filled.
pub(crate) fn shapes(
  geometry: &Geometry<PixelCoordinate>,
  transform: &Transform,
  style: &StyleConfig,
) -> Vec<egui::Shape> {
  let stroke_width = f32::from(style.stroke_weight);
  let to_screen = |coords: &[PixelCoordinate]| {
    coords
      .iter()
      .map(|c| transform.apply(*c).into())
      .collect::<Vec<egui::Pos2>>()
  };

  let ring = |coords: &[PixelCoordinate], fill: Color32| {
    egui::Shape::Path(PathShape {
      points: to_screen(coords),
      closed: true,
      fill,
      stroke: PathStroke::new(stroke_width, style.stroke_color),
    })
  };

  geometry
    .flat_iterate()
    .filter(|g| !g.is_degenerate())
    .flat_map(|el| match el {
      Geometry::GeometryCollection(_) => vec![],
      Geometry::Point(coord) => vec![egui::Shape::Circle(CircleShape {
        center: transform.apply(*coord).into(),
        radius: POINT_RADIUS + stroke_width / 2.,
        fill: style.fill_color(),
        stroke: Stroke::new(stroke_width, style.stroke_color),
      })],
      Geometry::LineString(coords) => vec![egui::Shape::Path(PathShape {
        points: to_screen(coords),
        closed: false,
        fill: Color32::TRANSPARENT,
        stroke: PathStroke::new(stroke_width, style.stroke_color),
      })],
      Geometry::Polygon(rings) => rings
        .iter()
        .enumerate()
        .filter(|(_, r)| r.len() >= 3)
        .map(|(i, r)| {
          let fill = if i == 0 { style.fill_color() } else { BACKGROUND };
          ring(r, fill)
        })
        .collect(),
    })
    .collect()
}

pub(crate) fn draw(
  painter: &Painter,
  geometry: &Geometry<PixelCoordinate>,
  transform: &Transform,
  style: &StyleConfig,
) {
  painter.extend(shapes(geometry, transform, style));
}
