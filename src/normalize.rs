//! Turns source specific payloads into a [`GeometryCollection`].
//!
//! Normalizing is pure: payloads are only borrowed and a payload without features yields an empty
//! collection, never an error. An overpass answer carrying a `runtime error` remark is a failure
//! even though it is well formed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::map::geometry_collection::GeometryCollection;

mod geojson;
mod overpass;

pub use geojson::to_geojson;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
  #[error("Payload must be a JSON object")]
  NotAnObject,
  #[error("Missing or malformed member '{0}'")]
  MissingMember(&'static str),
  #[error("Unknown GeoJSON type: {0}")]
  UnknownGeoJsonType(String),
  #[error("Cannot tell the payload format")]
  UnknownFormat,
  #[error("Invalid JSON: {0}")]
  InvalidJson(String),
  #[error("Server reported an error: {0}")]
  ServerRemark(String),
}

/// The shape of a raw payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
  /// Overpass API JSON queried with `out geom`.
  Overpass,
  /// A `GeoJSON` document.
  GeoJson,
}

impl SourceKind {
  /// Guesses the kind of a document of unknown origin.
  pub fn detect(payload: &Value) -> Result<SourceKind, ParseFailure> {
    let obj = payload.as_object().ok_or(ParseFailure::NotAnObject)?;
    if obj.get("elements").is_some_and(Value::is_array) {
      Ok(SourceKind::Overpass)
    } else if obj.get("type").is_some_and(Value::is_string) {
      Ok(SourceKind::GeoJson)
    } else {
      Err(ParseFailure::UnknownFormat)
    }
  }
}

/// Normalizes a payload of the given kind.
pub fn normalize(payload: &Value, kind: SourceKind) -> Result<GeometryCollection, ParseFailure> {
  match kind {
    SourceKind::Overpass => overpass::normalize(payload),
    SourceKind::GeoJson => geojson::normalize(payload),
  }
}

/// Parses raw text and normalizes it, detecting the kind when none is given.
pub fn normalize_str(
  text: &str,
  kind: Option<SourceKind>,
) -> Result<GeometryCollection, ParseFailure> {
  let payload: Value =
    serde_json::from_str(text).map_err(|e| ParseFailure::InvalidJson(e.to_string()))?;
  let kind = match kind {
    Some(kind) => kind,
    None => SourceKind::detect(&payload)?,
  };
  normalize(&payload, kind)
}
