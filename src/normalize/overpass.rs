use serde::Deserialize;
use serde_json::Value;

use super::ParseFailure;
use crate::map::{
  coordinates::WGS84Coordinate,
  geometry_collection::{Feature, Geometry, GeometryCollection, Properties, ring_contains},
};

/// A response of the overpass API in JSON format.
#[derive(Deserialize, Debug)]
struct OverpassResponse {
  elements: Vec<Element>,
  /// Set when the server gave up, e.g. on a timeout. The elements are incomplete then.
  #[serde(default)]
  remark: Option<String>,
}

const RUNTIME_ERROR: &str = "runtime error";

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
  Node {
    id: i64,
    lat: f64,
    lon: f64,
    #[serde(default)]
    tags: Properties,
  },
  Way {
    id: i64,
    #[serde(default)]
    geometry: Vec<Option<LatLon>>,
    #[serde(default)]
    tags: Properties,
  },
  Relation {
    id: i64,
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    tags: Properties,
  },
  /// `area`, `count` and friends carry no geometry.
  #[serde(other)]
  Other,
}

/// Overpass puts `null` into `geometry` for vertices outside the queried bounding box.
#[derive(Deserialize, Debug, Clone, Copy)]
struct LatLon {
  lat: f64,
  lon: f64,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Member {
  Node {
    lat: f64,
    lon: f64,
  },
  Way {
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Vec<Option<LatLon>>,
  },
  #[serde(other)]
  Other,
}

#[allow(clippy::cast_possible_truncation)]
fn coordinate(lat: f64, lon: f64) -> Option<WGS84Coordinate> {
  Some(WGS84Coordinate::new(lat as f32, lon as f32)).filter(WGS84Coordinate::is_valid)
}

fn coordinates(geometry: &[Option<LatLon>]) -> Vec<WGS84Coordinate> {
  geometry
    .iter()
    .flatten()
    .filter_map(|p| coordinate(p.lat, p.lon))
    .collect()
}

fn is_closed(coords: &[WGS84Coordinate]) -> bool {
  coords.len() >= 4 && coords.first() == coords.last()
}

fn properties(kind: &str, id: i64, tags: &Properties) -> Properties {
  let mut properties: Properties = tags
    .iter()
    .filter(|(_, v)| !(v.is_object() || v.is_array()))
    .map(|(k, v)| (k.clone(), v.clone()))
    .collect();
  properties.insert("@id".to_string(), Value::String(format!("{kind}/{id}")));
  properties
}

fn has_tag(tags: &Properties, key: &str, value: &str) -> bool {
  tags.get(key).and_then(Value::as_str) == Some(value)
}

/// Closed ways are areas unless explicitly tagged otherwise.
fn way_geometry(
  coords: Vec<WGS84Coordinate>,
  tags: &Properties,
) -> Option<Geometry<WGS84Coordinate>> {
  if coords.len() < 2 {
    return None;
  }
  if is_closed(&coords) && !has_tag(tags, "area", "no") {
    Some(Geometry::Polygon(vec![coords]))
  } else {
    Some(Geometry::LineString(coords))
  }
}

/// Joins way segments sharing end points into closed rings. Segments that cannot be closed are
/// dropped.
fn assemble_rings(mut segments: Vec<Vec<WGS84Coordinate>>) -> Vec<Vec<WGS84Coordinate>> {
  let mut rings = Vec::new();
  segments.retain(|s| s.len() >= 2);

  while let Some(mut ring) = segments.pop() {
    while !is_closed(&ring) {
      let (Some(&first), Some(&last)) = (ring.first(), ring.last()) else {
        break;
      };
      let Some(idx) = segments.iter().position(|s| {
        s.first() == Some(&last)
          || s.last() == Some(&last)
          || s.first() == Some(&first)
          || s.last() == Some(&first)
      }) else {
        break;
      };
      let mut next = segments.swap_remove(idx);
      if next.first() == Some(&last) {
        ring.extend(next.into_iter().skip(1));
      } else if next.last() == Some(&last) {
        next.reverse();
        ring.extend(next.into_iter().skip(1));
      } else if next.last() == Some(&first) {
        next.extend(ring.into_iter().skip(1));
        ring = next;
      } else {
        next.reverse();
        next.extend(ring.into_iter().skip(1));
        ring = next;
      }
    }

    if is_closed(&ring) {
      rings.push(ring);
    } else {
      log::warn!("Dropping unclosed ring with {} vertices", ring.len());
    }
  }
  rings.reverse();
  rings
}

/// Member ways with the given roles.
fn member_segments(members: &[Member], roles: &[&str]) -> Vec<Vec<WGS84Coordinate>> {
  members
    .iter()
    .filter_map(|m| match m {
      Member::Way { role, geometry } if roles.contains(&role.as_str()) => {
        Some(coordinates(geometry))
      }
      _ => None,
    })
    .collect()
}

/// One polygon per outer ring. Each inner ring becomes a hole of the first outer ring containing
/// it.
fn multipolygon(members: &[Member]) -> Vec<Geometry<WGS84Coordinate>> {
  let mut polygons: Vec<Vec<Vec<WGS84Coordinate>>> =
    assemble_rings(member_segments(members, &["outer", ""]))
      .into_iter()
      .map(|outer| vec![outer])
      .collect();

  for inner in assemble_rings(member_segments(members, &["inner"])) {
    let Some(&vertex) = inner.first() else {
      continue;
    };
    match polygons
      .iter_mut()
      .find(|rings| ring_contains(&rings[0], vertex))
    {
      Some(rings) => rings.push(inner),
      None => log::warn!("Dropping inner ring outside of every outer ring"),
    }
  }

  polygons.into_iter().map(Geometry::Polygon).collect()
}

fn relation_geometry(members: &[Member], tags: &Properties) -> Option<Geometry<WGS84Coordinate>> {
  let is_area = has_tag(tags, "type", "multipolygon") || has_tag(tags, "type", "boundary");

  let parts: Vec<Geometry<WGS84Coordinate>> = if is_area {
    multipolygon(members)
  } else {
    members
      .iter()
      .filter_map(|m| match m {
        Member::Node { lat, lon } => coordinate(*lat, *lon).map(Geometry::Point),
        Member::Way { geometry, .. } => {
          let coords = coordinates(geometry);
          (coords.len() >= 2).then_some(Geometry::LineString(coords))
        }
        Member::Other => None,
      })
      .collect()
  };

  (!parts.is_empty()).then_some(Geometry::GeometryCollection(parts))
}

/// Normalizes an overpass `out geom` response.
pub(super) fn normalize(value: &Value) -> Result<GeometryCollection, ParseFailure> {
  if !value.is_object() {
    return Err(ParseFailure::NotAnObject);
  }
  let response = OverpassResponse::deserialize(value).map_err(|e| {
    log::error!("Unexpected overpass payload: {e}");
    ParseFailure::MissingMember("elements")
  })?;
  if let Some(remark) = response
    .remark
    .as_deref()
    .filter(|r| r.trim_start().starts_with(RUNTIME_ERROR))
  {
    log::error!("Overpass aborted the query: {remark}");
    return Err(ParseFailure::ServerRemark(remark.to_string()));
  }
  if let Some(remark) = &response.remark {
    log::warn!("Overpass remark: {remark}");
  }

  let mut collection = GeometryCollection::default();
  for element in &response.elements {
    let feature = match element {
      // Untagged nodes are vertices of ways and relations.
      Element::Node { tags, .. } if tags.is_empty() => None,
      Element::Node { id, lat, lon, tags } => coordinate(*lat, *lon).map(|c| Feature {
        geometry: Geometry::Point(c),
        properties: properties("node", *id, tags),
      }),
      Element::Way { id, geometry, tags } => {
        way_geometry(coordinates(geometry), tags).map(|geometry| Feature {
          geometry,
          properties: properties("way", *id, tags),
        })
      }
      Element::Relation { id, members, tags } => {
        relation_geometry(members, tags).map(|geometry| Feature {
          geometry,
          properties: properties("relation", *id, tags),
        })
      }
      Element::Other => None,
    };

    match feature {
      Some(feature) => collection.push(feature),
      None => log::trace!("Skipping element without geometry: {element:?}"),
    }
  }
  Ok(collection)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn c(lat: f32, lon: f32) -> WGS84Coordinate {
    WGS84Coordinate::new(lat, lon)
  }

  #[test]
  fn tagged_node_becomes_point() {
    let payload = json!({"elements": [
      {"type": "node", "id": 7, "lat": 54.5, "lon": 18.5, "tags": {"military": "naval_base", "name": "Port Wojenny"}},
      {"type": "node", "id": 8, "lat": 54.6, "lon": 18.6}
    ]});
    let collection = normalize(&payload).unwrap();
    assert_eq!(collection.len(), 1);
    let feature = &collection.features()[0];
    assert_eq!(feature.geometry, Geometry::Point(c(54.5, 18.5)));
    assert_eq!(feature.name(), Some("Port Wojenny"));
    assert_eq!(feature.properties["@id"], "node/7");
  }

  #[test]
  fn closed_way_is_polygon_open_way_is_line() {
    let payload = json!({"elements": [
      {"type": "way", "id": 1, "tags": {"military": "range"},
       "geometry": [{"lat": 52.0, "lon": 19.0}, {"lat": 52.0, "lon": 19.1}, {"lat": 52.1, "lon": 19.1}, {"lat": 52.0, "lon": 19.0}]},
      {"type": "way", "id": 2, "tags": {"military": "danger_area"},
       "geometry": [{"lat": 52.0, "lon": 19.0}, {"lat": 52.2, "lon": 19.2}]},
      {"type": "way", "id": 3, "tags": {"military": "checkpoint", "area": "no"},
       "geometry": [{"lat": 52.0, "lon": 19.0}, {"lat": 52.0, "lon": 19.1}, {"lat": 52.1, "lon": 19.1}, {"lat": 52.0, "lon": 19.0}]},
      {"type": "way", "id": 4, "tags": {"military": "checkpoint"}, "geometry": [{"lat": 52.0, "lon": 19.0}]}
    ]});
    let types: Vec<_> = normalize(&payload)
      .unwrap()
      .features()
      .iter()
      .map(|f| f.geometry.type_name())
      .collect();
    assert_eq!(types, vec!["Polygon", "LineString", "LineString"]);
  }

  #[test]
  fn null_vertices_are_skipped() {
    let payload = json!({"elements": [
      {"type": "way", "id": 1, "tags": {"military": "range"},
       "geometry": [{"lat": 52.0, "lon": 19.0}, null, {"lat": 52.2, "lon": 19.2}]}
    ]});
    let collection = normalize(&payload).unwrap();
    assert_eq!(
      collection.features()[0].geometry,
      Geometry::LineString(vec![c(52.0, 19.0), c(52.2, 19.2)])
    );
  }

  #[test]
  fn multipolygon_outer_segments_are_joined() {
    let payload = json!({"elements": [
      {"type": "relation", "id": 99, "tags": {"type": "multipolygon", "military": "training_area", "name": "Poligon Drawsko"},
       "members": [
         {"type": "way", "ref": 1, "role": "outer", "geometry": [{"lat": 53.0, "lon": 16.0}, {"lat": 53.0, "lon": 16.5}]},
         {"type": "way", "ref": 2, "role": "outer", "geometry": [{"lat": 53.5, "lon": 16.5}, {"lat": 53.0, "lon": 16.5}]},
         {"type": "way", "ref": 3, "role": "outer", "geometry": [{"lat": 53.5, "lon": 16.5}, {"lat": 53.0, "lon": 16.0}]},
         {"type": "way", "ref": 4, "role": "inner", "geometry": [{"lat": 53.05, "lon": 16.2}, {"lat": 53.05, "lon": 16.3}]},
         {"type": "way", "ref": 5, "role": "inner", "geometry": [{"lat": 53.05, "lon": 16.3}, {"lat": 53.15, "lon": 16.3}, {"lat": 53.05, "lon": 16.2}]},
         {"type": "way", "ref": 6, "role": "inner", "geometry": [{"lat": 54.0, "lon": 18.0}, {"lat": 54.0, "lon": 18.1}, {"lat": 54.1, "lon": 18.1}, {"lat": 54.0, "lon": 18.0}]},
         {"type": "node", "ref": 7, "role": "label", "lat": 53.2, "lon": 16.3}
       ]}
    ]});
    let collection = normalize(&payload).unwrap();
    assert_eq!(collection.len(), 1);
    let Geometry::GeometryCollection(parts) = &collection.features()[0].geometry else {
      panic!("relation should be a multi geometry");
    };
    assert_eq!(parts.len(), 1);
    let Geometry::Polygon(rings) = &parts[0] else {
      panic!("multipolygon parts should be polygons");
    };
    assert_eq!(rings.len(), 2, "the stray inner ring is dropped");
    for ring in rings {
      assert_eq!(ring.len(), 4);
      assert_eq!(ring.first(), ring.last());
    }
    assert!(rings[1].contains(&c(53.15, 16.3)));
    assert_eq!(collection.features()[0].properties["@id"], "relation/99");
  }

  #[test]
  fn other_relations_keep_member_geometry() {
    let payload = json!({"elements": [
      {"type": "relation", "id": 5, "tags": {"type": "site", "military": "airfield"},
       "members": [
         {"type": "node", "ref": 1, "role": "", "lat": 52.0, "lon": 20.0},
         {"type": "way", "ref": 2, "role": "", "geometry": [{"lat": 52.0, "lon": 20.0}, {"lat": 52.1, "lon": 20.1}]}
       ]},
      {"type": "relation", "id": 6, "tags": {"type": "site"}, "members": []}
    ]});
    let collection = normalize(&payload).unwrap();
    assert_eq!(collection.len(), 1);
    let types: Vec<_> = collection.features()[0]
      .geometry
      .flat_iterate()
      .map(Geometry::type_name)
      .collect();
    assert_eq!(types, vec!["Point", "LineString"]);
  }

  #[test]
  fn unknown_element_types_are_ignored() {
    let payload = json!({"elements": [{"type": "area", "id": 3600049715_i64, "tags": {"ISO3166-1": "PL"}}]});
    assert!(normalize(&payload).unwrap().is_empty());
  }

  #[test]
  fn missing_elements_is_a_failure() {
    assert_eq!(
      normalize(&json!({"version": 0.6})),
      Err(ParseFailure::MissingMember("elements"))
    );
  }

  #[test]
  fn runtime_error_remark_is_a_failure() {
    let payload = json!({
      "version": 0.6,
      "elements": [],
      "remark": "runtime error: Query timed out in \"query\" at line 3 after 26 seconds."
    });
    assert!(matches!(
      normalize(&payload),
      Err(ParseFailure::ServerRemark(remark)) if remark.contains("timed out")
    ));
  }

  #[test]
  fn other_remarks_keep_the_elements() {
    let payload = json!({
      "elements": [{"type": "node", "id": 1, "lat": 52.0, "lon": 19.0, "tags": {"military": "bunker"}}],
      "remark": "runtime remark: Timeout is close"
    });
    assert_eq!(normalize(&payload).unwrap().len(), 1);
  }
}
