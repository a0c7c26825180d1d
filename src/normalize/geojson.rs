use serde_json::{Map, Value, json};

use super::ParseFailure;
use crate::map::{
  coordinates::WGS84Coordinate,
  geometry_collection::{Feature, Geometry, GeometryCollection, Properties},
};

/// Normalizes a `GeoJSON` FeatureCollection, Feature or bare geometry.
pub(super) fn normalize(value: &Value) -> Result<GeometryCollection, ParseFailure> {
  let obj = value.as_object().ok_or(ParseFailure::NotAnObject)?;
  let geotype = obj
    .get("type")
    .and_then(Value::as_str)
    .ok_or(ParseFailure::MissingMember("type"))?;

  match geotype {
    "FeatureCollection" => {
      let features = obj
        .get("features")
        .and_then(Value::as_array)
        .ok_or(ParseFailure::MissingMember("features"))?;
      Ok(features.iter().filter_map(parse_feature).collect())
    }
    "Feature" => Ok(parse_feature(value).into_iter().collect()),
    "Point" | "LineString" | "Polygon" | "MultiPoint" | "MultiLineString" | "MultiPolygon"
    | "GeometryCollection" => Ok(parse_geometry(value).map(Feature::new).into_iter().collect()),
    _ => Err(ParseFailure::UnknownGeoJsonType(geotype.to_string())),
  }
}

fn parse_feature(feature: &Value) -> Option<Feature> {
  let obj = feature.as_object()?;
  let Some(geometry) = obj.get("geometry").and_then(parse_geometry) else {
    log::debug!("Skipping feature without usable geometry");
    return None;
  };
  Some(Feature {
    geometry,
    properties: scalar_properties(obj.get("properties")),
  })
}

/// Keeps scalar values only, the property bag has no nesting.
fn scalar_properties(properties: Option<&Value>) -> Properties {
  let Some(Value::Object(props)) = properties else {
    return Properties::new();
  };
  props
    .iter()
    .filter(|(key, value)| {
      let scalar = !(value.is_object() || value.is_array());
      if !scalar {
        log::debug!("Dropping non-scalar property '{key}'");
      }
      scalar
    })
    .map(|(k, v)| (k.clone(), v.clone()))
    .collect()
}

fn parse_geometry(geometry: &Value) -> Option<Geometry<WGS84Coordinate>> {
  let obj = geometry.as_object()?;
  let geom_type = obj.get("type")?.as_str()?;

  if geom_type == "GeometryCollection" {
    let geometries = obj
      .get("geometries")?
      .as_array()?
      .iter()
      .filter_map(parse_geometry)
      .collect();
    return Some(Geometry::GeometryCollection(geometries));
  }

  let coordinates = obj.get("coordinates")?;
  match geom_type {
    "Point" => parse_coordinate(coordinates).map(Geometry::Point),
    "LineString" => parse_line(coordinates),
    "Polygon" => parse_polygon(coordinates),
    "MultiPoint" => Some(Geometry::GeometryCollection(
      coordinates
        .as_array()?
        .iter()
        .filter_map(parse_coordinate)
        .map(Geometry::Point)
        .collect(),
    )),
    "MultiLineString" => Some(Geometry::GeometryCollection(
      coordinates.as_array()?.iter().filter_map(parse_line).collect(),
    )),
    "MultiPolygon" => Some(Geometry::GeometryCollection(
      coordinates
        .as_array()?
        .iter()
        .filter_map(parse_polygon)
        .collect(),
    )),
    _ => None,
  }
}

fn parse_line(coordinates: &Value) -> Option<Geometry<WGS84Coordinate>> {
  let coords = parse_coordinate_array(coordinates)?;
  (coords.len() >= 2).then_some(Geometry::LineString(coords))
}

/// The exterior ring needs three points, holes with less are dropped.
fn parse_polygon(coordinates: &Value) -> Option<Geometry<WGS84Coordinate>> {
  let (exterior, holes) = coordinates.as_array()?.split_first()?;
  let exterior = parse_coordinate_array(exterior)?;
  if exterior.len() < 3 {
    return None;
  }
  let rings = std::iter::once(exterior)
    .chain(
      holes
        .iter()
        .filter_map(parse_coordinate_array)
        .filter(|hole| hole.len() >= 3),
    )
    .collect();
  Some(Geometry::Polygon(rings))
}

/// Parse a single coordinate [lon, lat] or [lon, lat, elevation]
#[allow(clippy::cast_possible_truncation)]
fn parse_coordinate(coord: &Value) -> Option<WGS84Coordinate> {
  let array = coord.as_array()?;
  if array.len() < 2 {
    return None;
  }
  let lon = array[0].as_f64()? as f32;
  let lat = array[1].as_f64()? as f32;
  Some(WGS84Coordinate::new(lat, lon)).filter(WGS84Coordinate::is_valid)
}

/// Parse an array of coordinates [[lon, lat], [lon, lat], ...]
fn parse_coordinate_array(coords: &Value) -> Option<Vec<WGS84Coordinate>> {
  Some(
    coords
      .as_array()?
      .iter()
      .filter_map(parse_coordinate)
      .collect(),
  )
}

/// Serializes a collection as a `GeoJSON` FeatureCollection. Multi-part geometries become
/// `Multi*` geometries when all parts have the same type.
#[must_use]
pub fn to_geojson(collection: &GeometryCollection) -> Value {
  let features: Vec<Value> = collection
    .features()
    .iter()
    .map(|feature| {
      json!({
        "type": "Feature",
        "geometry": geometry_to_geojson(&feature.geometry),
        "properties": Value::Object(feature.properties.clone()),
      })
    })
    .collect();
  json!({"type": "FeatureCollection", "features": features})
}

fn position(c: &WGS84Coordinate) -> Value {
  json!([c.lon, c.lat])
}

fn ring(coords: &[WGS84Coordinate]) -> Value {
  Value::Array(coords.iter().map(position).collect())
}

fn rings(polygon: &[Vec<WGS84Coordinate>]) -> Value {
  Value::Array(polygon.iter().map(|r| ring(r)).collect())
}

fn geometry_to_geojson(geometry: &Geometry<WGS84Coordinate>) -> Value {
  let mut obj = Map::new();
  match geometry {
    Geometry::Point(c) => {
      obj.insert("type".into(), "Point".into());
      obj.insert("coordinates".into(), position(c));
    }
    Geometry::LineString(coords) => {
      obj.insert("type".into(), "LineString".into());
      obj.insert("coordinates".into(), ring(coords));
    }
    Geometry::Polygon(polygon) => {
      obj.insert("type".into(), "Polygon".into());
      obj.insert("coordinates".into(), rings(polygon));
    }
    Geometry::GeometryCollection(parts) => {
      let same = |name: &str| !parts.is_empty() && parts.iter().all(|p| p.type_name() == name);
      if same("Point") {
        obj.insert("type".into(), "MultiPoint".into());
        let points = parts.iter().filter_map(|p| match p {
          Geometry::Point(c) => Some(position(c)),
          _ => None,
        });
        obj.insert("coordinates".into(), Value::Array(points.collect()));
      } else if same("LineString") {
        obj.insert("type".into(), "MultiLineString".into());
        let lines = parts.iter().filter_map(|p| match p {
          Geometry::LineString(coords) => Some(ring(coords)),
          _ => None,
        });
        obj.insert("coordinates".into(), Value::Array(lines.collect()));
      } else if same("Polygon") {
        obj.insert("type".into(), "MultiPolygon".into());
        let polygons = parts.iter().filter_map(|p| match p {
          Geometry::Polygon(polygon) => Some(rings(polygon)),
          _ => None,
        });
        obj.insert("coordinates".into(), Value::Array(polygons.collect()));
      } else {
        obj.insert("type".into(), "GeometryCollection".into());
        obj.insert(
          "geometries".into(),
          Value::Array(parts.iter().map(geometry_to_geojson).collect()),
        );
      }
    }
  }
  Value::Object(obj)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::normalize::{SourceKind, normalize as normalize_any, normalize_str};

  fn load(filename: &str) -> GeometryCollection {
    let path = format!("{}/tests/resources/{filename}", env!("CARGO_MANIFEST_DIR"));
    let text =
      std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("Could not open test file: {path}"));
    normalize_str(&text, Some(SourceKind::GeoJson)).expect("valid geojson")
  }

  #[test]
  fn feature_collection_from_file() {
    let collection = load("feature_collection.geojson");
    assert_eq!(collection.len(), 3);

    let types: Vec<_> = collection
      .features()
      .iter()
      .map(|f| f.geometry.type_name())
      .collect();
    assert_eq!(types, vec!["Point", "LineString", "Polygon"]);
    assert_eq!(collection.features()[0].name(), Some("Jednostka Wojskowa 1234"));
    assert_eq!(collection.features()[2].properties["military"], "training_area");
  }

  #[test]
  fn multigeometries_become_collections() {
    let collection = load("multigeometry.geojson");
    assert_eq!(collection.len(), 3);
    for feature in collection.features() {
      assert!(matches!(feature.geometry, Geometry::GeometryCollection(_)));
    }
  }

  #[test]
  fn null_geometries_and_nested_properties_are_dropped() {
    let value = json!({
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "geometry": null, "properties": {"name": "ghost"}},
        {"type": "Feature", "geometry": {"type": "Point", "coordinates": [19.0, 52.0]},
         "properties": {"name": "real", "nested": {"a": 1}, "list": [1, 2], "height": 3}}
      ]
    });
    let collection = normalize_any(&value, SourceKind::GeoJson).unwrap();
    assert_eq!(collection.len(), 1);
    let props = &collection.features()[0].properties;
    assert_eq!(props.len(), 2);
    assert_eq!(props["height"], 3);
  }

  #[test]
  fn single_feature_and_bare_geometry() {
    let feature = json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [19.0, 52.0]}});
    assert_eq!(normalize(&feature).unwrap().len(), 1);

    let bare = json!({"type": "LineString", "coordinates": [[19.0, 52.0], [19.1, 52.1]]});
    assert_eq!(normalize(&bare).unwrap().len(), 1);
  }

  #[test]
  fn unknown_type_fails() {
    assert_eq!(
      normalize(&json!({"type": "Topology"})),
      Err(ParseFailure::UnknownGeoJsonType("Topology".to_string()))
    );
    assert_eq!(
      normalize(&json!({"type": "FeatureCollection"})),
      Err(ParseFailure::MissingMember("features"))
    );
  }

  #[test]
  fn export_can_be_read_back() {
    let collection = load("multigeometry.geojson");
    let exported = to_geojson(&collection);
    let reread = normalize(&exported).unwrap();
    assert_eq!(reread, collection);
  }

  #[test]
  fn polygon_holes_survive_export() {
    let value = json!({"type": "Polygon", "coordinates": [
      [[15.0, 50.0], [17.0, 50.0], [17.0, 52.0], [15.0, 52.0], [15.0, 50.0]],
      [[15.5, 50.5], [16.5, 50.5], [16.5, 51.5], [15.5, 50.5]],
      [[16.0, 51.0], [16.1, 51.0]]
    ]});
    let collection = normalize(&value).unwrap();
    let Geometry::Polygon(polygon) = &collection.features()[0].geometry else {
      panic!("should be a polygon");
    };
    assert_eq!(polygon.len(), 2);
    assert_eq!(polygon[1].len(), 4);

    let exported = to_geojson(&collection);
    assert_eq!(
      exported["features"][0]["geometry"]["coordinates"]
        .as_array()
        .map(Vec::len),
      Some(2)
    );
    assert_eq!(normalize(&exported).unwrap(), collection);
  }
}
