//! Where category geometry comes from.

use thiserror::Error;

use crate::{
  category::Category, map::geometry_collection::GeometryCollection, normalize::ParseFailure,
};

mod overpass;
mod static_files;

pub use overpass::{DEFAULT_COUNTRY, DEFAULT_OVERPASS_URL, OverpassSource};
pub use static_files::StaticSource;

/// A failed fetch of one category. The detail is meant for logs, not for users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
  #[error("Could not fetch {category}: {detail}")]
  Transport { category: Category, detail: String },
  #[error("Could not parse {category}: {source}")]
  Parse {
    category: Category,
    source: ParseFailure,
  },
}

impl LoadError {
  #[must_use]
  pub fn category(&self) -> Category {
    match self {
      LoadError::Transport { category, .. } | LoadError::Parse { category, .. } => *category,
    }
  }
}

/// A source of normalized geometry for a single category.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
  /// Human-readable name of the source, used in logs.
  fn name(&self) -> &str;

  /// Fetches and normalizes all features of a category.
  async fn fetch(&self, category: Category) -> Result<GeometryCollection, LoadError>;
}

/// Reads a successful HTTP response body or reports the failure as transport error.
pub(crate) async fn get_text(
  client: &surf::Client,
  url: &str,
  category: Category,
) -> Result<String, LoadError> {
  let transport = |detail: String| LoadError::Transport { category, detail };

  let mut response = client
    .get(url)
    .header("User-Agent", concat!("milmap/", env!("CARGO_PKG_VERSION")))
    .await
    .map_err(|e| transport(e.to_string()))?;

  if !response.status().is_success() {
    let body = response.body_string().await.unwrap_or_default();
    return Err(transport(format!(
      "HTTP {}: {}",
      response.status(),
      body.chars().take(200).collect::<String>()
    )));
  }

  response
    .body_string()
    .await
    .map_err(|e| transport(e.to_string()))
}
