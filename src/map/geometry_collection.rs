use std::iter::once;

use itertools::Either;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::coordinates::{BoundingBox, Coordinate, PixelCoordinate, WGS84Coordinate};

/// The property key conventionally used to name a feature.
pub const NAME_PROPERTY: &str = "name";

/// Property bag of a feature. Values are scalars (string, number, bool or null).
pub type Properties = Map<String, Value>;

/// A geometry. Multi-part geometries are represented as `GeometryCollection`s of their parts.
/// Polygons are a list of rings, the exterior ring first and holes after it.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum Geometry<C: Coordinate> {
  GeometryCollection(Vec<Geometry<C>>),
  Point(C),
  LineString(Vec<C>),
  Polygon(Vec<Vec<C>>),
}

impl From<Geometry<WGS84Coordinate>> for Geometry<PixelCoordinate> {
  fn from(value: Geometry<WGS84Coordinate>) -> Self {
    let convert = |coords: Vec<WGS84Coordinate>| {
      coords
        .into_iter()
        .map(|c| c.as_pixel_coordinate())
        .collect::<Vec<_>>()
    };
    match value {
      Geometry::GeometryCollection(geometries) => {
        Geometry::GeometryCollection(geometries.into_iter().map(Geometry::from).collect())
      }
      Geometry::Point(coord) => Geometry::Point(coord.into()),
      Geometry::LineString(coords) => Geometry::LineString(convert(coords)),
      Geometry::Polygon(rings) => Geometry::Polygon(rings.into_iter().map(convert).collect()),
    }
  }
}

impl<C: Coordinate> Geometry<C> {
  pub fn bounding_box(&self) -> BoundingBox {
    match self {
      Geometry::GeometryCollection(geometries) => geometries
        .iter()
        .map(Geometry::bounding_box)
        .fold(BoundingBox::default(), |acc, b| acc.extend(&b)),
      Geometry::Point(coord) => BoundingBox::from_iterator(once(*coord)),
      Geometry::LineString(coords) => BoundingBox::from_iterator(coords.iter().copied()),
      Geometry::Polygon(rings) => BoundingBox::from_iterator(rings.iter().flatten().copied()),
    }
  }

  /// Iterates over the leaves, i.e. everything that is not a `GeometryCollection`.
  pub fn flat_iterate(&self) -> impl Iterator<Item = &Geometry<C>> + '_ {
    if let Geometry::GeometryCollection(geometries) = self {
      Either::Left(
        geometries
          .iter()
          .flat_map(|g| g.flat_iterate().collect::<Vec<_>>()),
      )
    } else {
      Either::Right(once(self))
    }
  }

  /// A leaf that cannot be drawn: no coordinates, a line with less than two or a polygon whose
  /// exterior ring has less than three points.
  #[must_use]
  pub fn is_degenerate(&self) -> bool {
    match self {
      Geometry::GeometryCollection(geometries) => geometries.iter().all(Geometry::is_degenerate),
      Geometry::Point(_) => false,
      Geometry::LineString(coords) => coords.len() < 2,
      Geometry::Polygon(rings) => rings.first().is_none_or(|exterior| exterior.len() < 3),
    }
  }

  #[must_use]
  pub fn type_name(&self) -> &'static str {
    match self {
      Geometry::GeometryCollection(_) => "GeometryCollection",
      Geometry::Point(_) => "Point",
      Geometry::LineString(_) => "LineString",
      Geometry::Polygon(_) => "Polygon",
    }
  }
}

/// Even-odd ray casting on a single ring, evaluated in canvas space.
pub fn ring_contains<C: Coordinate>(ring: &[C], p: C) -> bool {
  let p = p.as_pixel_coordinate();
  let ring: Vec<PixelCoordinate> = ring.iter().map(C::as_pixel_coordinate).collect();
  let mut inside = false;
  let mut j = ring.len().wrapping_sub(1);
  for (i, a) in ring.iter().enumerate() {
    let Some(b) = ring.get(j) else {
      break;
    };
    if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
      inside = !inside;
    }
    j = i;
  }
  inside
}

/// Inside the exterior ring and outside every hole.
pub fn polygon_contains<C: Coordinate>(rings: &[Vec<C>], p: C) -> bool {
  let Some((exterior, holes)) = rings.split_first() else {
    return false;
  };
  ring_contains(exterior, p) && !holes.iter().any(|hole| ring_contains(hole, p))
}

/// A geometry with its properties.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Feature {
  pub geometry: Geometry<WGS84Coordinate>,
  #[serde(default)]
  pub properties: Properties,
}

impl Feature {
  #[must_use]
  pub fn new(geometry: Geometry<WGS84Coordinate>) -> Self {
    Self {
      geometry,
      properties: Properties::new(),
    }
  }

  #[must_use]
  pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
    self.properties.insert(key.to_string(), value.into());
    self
  }

  /// The display name, if the feature has a non-empty one.
  #[must_use]
  pub fn name(&self) -> Option<&str> {
    self
      .properties
      .get(NAME_PROPERTY)
      .and_then(Value::as_str)
      .filter(|n| !n.trim().is_empty())
  }
}

/// An ordered sequence of features. Order is meaningful, duplicates are kept.
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct GeometryCollection {
  features: Vec<Feature>,
}

impl GeometryCollection {
  #[must_use]
  pub fn new(features: Vec<Feature>) -> Self {
    Self { features }
  }

  /// Concatenates collections in the given order.
  pub fn concat(collections: impl IntoIterator<Item = GeometryCollection>) -> Self {
    Self {
      features: collections
        .into_iter()
        .flat_map(|c| c.features)
        .collect(),
    }
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.features.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.features.is_empty()
  }

  #[must_use]
  pub fn features(&self) -> &[Feature] {
    &self.features
  }

  pub fn push(&mut self, feature: Feature) {
    self.features.push(feature);
  }

  #[must_use]
  pub fn bounding_box(&self) -> BoundingBox {
    self
      .features
      .iter()
      .map(|f| f.geometry.bounding_box())
      .fold(BoundingBox::default(), |acc, b| acc.extend(&b))
  }
}

impl FromIterator<Feature> for GeometryCollection {
  fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
    Self::new(iter.into_iter().collect())
  }
}

impl IntoIterator for GeometryCollection {
  type Item = Feature;
  type IntoIter = std::vec::IntoIter<Feature>;

  fn into_iter(self) -> Self::IntoIter {
    self.features.into_iter()
  }
}
