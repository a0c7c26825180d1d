use std::path::PathBuf;

use super::{DataSource, LoadError, get_text};
use crate::{
  category::Category, map::geometry_collection::GeometryCollection, normalize::normalize_str,
};

/// Pre-fetched documents, one per category at `<base>/<category>.json`. The base is either a
/// directory or an `http(s)://` prefix. Documents may be `GeoJSON` or raw overpass responses.
pub struct StaticSource {
  base: String,
  client: surf::Client,
}

impl StaticSource {
  #[must_use]
  pub fn new(base: impl Into<String>) -> Self {
    Self {
      base: base.into(),
      client: surf::Client::new(),
    }
  }

  fn is_remote(&self) -> bool {
    self.base.starts_with("http://") || self.base.starts_with("https://")
  }

  /// Where the document of a category lives.
  #[must_use]
  pub fn location(&self, category: Category) -> String {
    let file = format!("{}.json", category.id());
    if self.is_remote() {
      format!("{}/{file}", self.base.trim_end_matches('/'))
    } else {
      PathBuf::from(&self.base).join(file).display().to_string()
    }
  }

  async fn read(&self, category: Category) -> Result<String, LoadError> {
    let location = self.location(category);
    if self.is_remote() {
      get_text(&self.client, &location, category).await
    } else {
      tokio::fs::read_to_string(&location)
        .await
        .map_err(|e| LoadError::Transport {
          category,
          detail: format!("{location}: {e}"),
        })
    }
  }
}

#[async_trait::async_trait]
impl DataSource for StaticSource {
  fn name(&self) -> &str {
    "static"
  }

  async fn fetch(&self, category: Category) -> Result<GeometryCollection, LoadError> {
    let text = self.read(category).await?;
    log::debug!(
      "Read {} bytes for {category} from {}",
      text.len(),
      self.location(category)
    );
    normalize_str(&text, None).map_err(|source| LoadError::Parse { category, source })
  }
}
