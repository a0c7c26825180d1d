use super::{DataSource, LoadError, get_text};
use crate::{
  category::Category,
  map::geometry_collection::GeometryCollection,
  normalize::{SourceKind, normalize_str},
};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
/// ISO3166-1 code of the country all queries are restricted to.
pub const DEFAULT_COUNTRY: &str = "PL";

/// Queries an overpass API instance for every object tagged `military=<category>` in a country.
pub struct OverpassSource {
  base_url: String,
  country: String,
  client: surf::Client,
}

impl OverpassSource {
  #[must_use]
  pub fn new(base_url: Option<String>, country: Option<String>) -> Self {
    Self {
      base_url: base_url.unwrap_or_else(|| DEFAULT_OVERPASS_URL.to_string()),
      country: country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
      client: surf::Client::new(),
    }
  }

  /// The overpass QL query for a category.
  #[must_use]
  pub fn query(&self, category: Category) -> String {
    let country = &self.country;
    let tag = category.id();
    format!(
      r#"
[out:json][timeout:25];
area["ISO3166-1"="{country}"]->.a;
(
  node["military"="{tag}"](area.a);
  way["military"="{tag}"](area.a);
  relation["military"="{tag}"](area.a);
);
out geom;
"#
    )
  }

  #[must_use]
  pub fn url(&self, category: Category) -> String {
    format!(
      "{}?data={}",
      self.base_url,
      urlencoding::encode(&self.query(category))
    )
  }
}

#[async_trait::async_trait]
impl DataSource for OverpassSource {
  fn name(&self) -> &str {
    "overpass"
  }

  async fn fetch(&self, category: Category) -> Result<GeometryCollection, LoadError> {
    let url = self.url(category);
    log::debug!("Querying overpass for {category}: {url}");

    let text = get_text(&self.client, &url, category).await?;
    log::debug!("Overpass returned {} bytes for {category}", text.len());
    log::trace!("Raw overpass payload for {category}: {text}");

    normalize_str(&text, Some(SourceKind::Overpass))
      .map_err(|source| LoadError::Parse { category, source })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn query_filters_category_and_country() {
    let source = OverpassSource::new(None, None);
    let query = source.query(Category::NavalBase);
    assert!(query.contains(r#"area["ISO3166-1"="PL"]->.a;"#));
    assert!(query.contains(r#"node["military"="naval_base"](area.a);"#));
    assert!(query.contains(r#"way["military"="naval_base"](area.a);"#));
    assert!(query.contains(r#"relation["military"="naval_base"](area.a);"#));
    assert!(query.trim_end().ends_with("out geom;"));
  }

  #[test]
  fn url_is_encoded() {
    let source = OverpassSource::new(
      Some("http://localhost:1234/api".to_string()),
      Some("CZ".to_string()),
    );
    let url = source.url(Category::Range);
    assert!(url.starts_with("http://localhost:1234/api?data="));
    assert!(!url.contains(' '));
    assert!(!url.contains('"'));
    assert!(url.contains("%22CZ%22"));
    assert!(url.contains("%22range%22"));
  }
}
