//! Fetches the geometry of a selection and derives the user facing outcome.

use std::sync::Arc;

use futures::{StreamExt as _, stream};

use crate::{
  category::{Category, Selection},
  map::geometry_collection::GeometryCollection,
  source::{DataSource, LoadError},
};

/// Result of loading a selection.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
  Success(GeometryCollection),
  /// The sources answered but had nothing. Carries the user message.
  Empty(String),
  /// At least one source failed. Carries the user message.
  Failure(String),
}

impl LoadOutcome {
  #[must_use]
  pub fn message(&self) -> Option<&str> {
    match self {
      LoadOutcome::Success(_) => None,
      LoadOutcome::Empty(message) | LoadOutcome::Failure(message) => Some(message),
    }
  }
}

#[must_use]
pub fn empty_message(selection: Selection) -> String {
  format!("Nie znaleziono obiektów typu: {}", selection.category_labels())
}

#[must_use]
pub fn failure_message(category: Category) -> String {
  format!(
    "Nie udało się pobrać danych ({}). Sprawdź połączenie.",
    category.label()
  )
}

/// Public overpass instances hand out two query slots per client address.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 2;

/// Loads selections from a [`DataSource`]. Cheap to clone, clones share the source.
#[derive(Clone)]
pub struct DataLoader {
  source: Arc<dyn DataSource>,
  max_concurrent_requests: usize,
}

impl DataLoader {
  pub fn new(source: Arc<dyn DataSource>) -> Self {
    Self {
      source,
      max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
    }
  }

  /// Caps the number of fetches in flight. At least one fetch always runs.
  #[must_use]
  pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
    self.max_concurrent_requests = max.max(1);
    self
  }

  #[must_use]
  pub fn max_concurrent_requests(&self) -> usize {
    self.max_concurrent_requests
  }

  #[must_use]
  pub fn source_name(&self) -> &str {
    self.source.name()
  }

  /// Fetches every category of the selection, at most `max_concurrent_requests` at a time.
  /// Results are in registry order.
  pub async fn load_each(
    &self,
    selection: Selection,
  ) -> Vec<(Category, Result<GeometryCollection, LoadError>)> {
    let fetches = selection.categories().iter().copied().map(|category| {
      let source = Arc::clone(&self.source);
      async move { (category, source.fetch(category).await) }
    });
    stream::iter(fetches)
      .buffered(self.max_concurrent_requests)
      .collect()
      .await
  }

  /// Loads a selection. Any failing category fails the whole selection.
  pub async fn load(&self, selection: Selection) -> LoadOutcome {
    log::debug!("Loading {selection} from {}", self.source.name());
    let mut collections = Vec::new();
    let mut first_error = None;

    for (category, result) in self.load_each(selection).await {
      match result {
        Ok(collection) => {
          log::debug!("{category}: {} features", collection.len());
          collections.push(collection);
        }
        Err(e) => {
          log::error!("{e}");
          first_error.get_or_insert(e);
        }
      }
    }

    if let Some(error) = first_error {
      return LoadOutcome::Failure(failure_message(error.category()));
    }
    let merged = GeometryCollection::concat(collections);
    if merged.is_empty() {
      log::info!("No features for {selection}");
      return LoadOutcome::Empty(empty_message(selection));
    }
    log::info!("Loaded {} features for {selection}", merged.len());
    LoadOutcome::Success(merged)
  }
}
