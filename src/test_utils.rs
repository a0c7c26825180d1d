//! Sources and hosts for tests.

use std::{
  collections::HashMap,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
};

use tokio::sync::Notify;

use crate::{
  category::Category,
  map::{
    coordinates::{BoundingBox, WGS84Coordinate},
    geometry_collection::{Feature, Geometry, GeometryCollection},
    host::{FitOptions, MapHost, VectorLayer},
  },
  source::{DataSource, LoadError},
  style::StyleConfig,
};

/// `n` named points spread over Poland.
pub fn fixture_collection(n: usize) -> GeometryCollection {
  (0..n)
    .map(|i| {
      #[allow(clippy::cast_precision_loss)]
      let offset = i as f32 * 0.5;
      Feature::new(Geometry::Point(WGS84Coordinate::new(50. + offset, 16. + offset)))
        .with_property("name", format!("Obiekt {i}"))
    })
    .collect()
}

/// Answers from memory. Categories without an entry are empty.
#[derive(Default, Clone)]
pub struct FixtureSource {
  results: HashMap<Category, Result<GeometryCollection, LoadError>>,
}

impl FixtureSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, category: Category, collection: GeometryCollection) -> Self {
    self.results.insert(category, Ok(collection));
    self
  }

  pub fn failing(mut self, category: Category, error: LoadError) -> Self {
    self.results.insert(category, Err(error));
    self
  }
}

#[async_trait::async_trait]
impl DataSource for FixtureSource {
  fn name(&self) -> &str {
    "fixture"
  }

  async fn fetch(&self, category: Category) -> Result<GeometryCollection, LoadError> {
    self
      .results
      .get(&category)
      .cloned()
      .unwrap_or_else(|| Ok(GeometryCollection::default()))
  }
}

/// A [`FixtureSource`] whose fetches block until the category is released.
pub struct GatedSource {
  inner: FixtureSource,
  gates: HashMap<Category, Arc<Notify>>,
}

impl GatedSource {
  pub fn new(inner: FixtureSource) -> Self {
    Self {
      inner,
      gates: Category::all()
        .iter()
        .map(|&c| (c, Arc::new(Notify::new())))
        .collect(),
    }
  }

  /// Lets one pending (or the next) fetch of the category complete.
  pub fn release(&self, category: Category) {
    self.gates[&category].notify_one();
  }
}

#[async_trait::async_trait]
impl DataSource for GatedSource {
  fn name(&self) -> &str {
    "gated"
  }

  async fn fetch(&self, category: Category) -> Result<GeometryCollection, LoadError> {
    let gate = Arc::clone(&self.gates[&category]);
    gate.notified().await;
    self.inner.fetch(category).await
  }
}

/// A [`FixtureSource`] that tracks how many fetches overlap.
pub struct CountingSource {
  inner: FixtureSource,
  in_flight: AtomicUsize,
  max_in_flight: AtomicUsize,
}

impl CountingSource {
  pub fn new(inner: FixtureSource) -> Self {
    Self {
      inner,
      in_flight: AtomicUsize::new(0),
      max_in_flight: AtomicUsize::new(0),
    }
  }

  /// The highest number of fetches that were running at the same time.
  pub fn max_in_flight(&self) -> usize {
    self.max_in_flight.load(Ordering::SeqCst)
  }
}

#[async_trait::async_trait]
impl DataSource for CountingSource {
  fn name(&self) -> &str {
    "counting"
  }

  async fn fetch(&self, category: Category) -> Result<GeometryCollection, LoadError> {
    let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(running, Ordering::SeqCst);
    // Give the other fetches a chance to start.
    for _ in 0..3 {
      tokio::task::yield_now().await;
    }
    self.in_flight.fetch_sub(1, Ordering::SeqCst);
    self.inner.fetch(category).await
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
  SetView(WGS84Coordinate, u8),
  InvalidateSize,
  FitBounds(BoundingBox, FitOptions),
  ReplaceLayer(VectorLayer),
  RestyleLayer(StyleConfig),
  ClearLayer,
}

/// Records every call and keeps the current layer.
#[derive(Debug, Default)]
pub struct RecordingHost {
  pub calls: Vec<HostCall>,
  layer: Option<VectorLayer>,
}

impl RecordingHost {
  pub fn layer(&self) -> Option<&VectorLayer> {
    self.layer.as_ref()
  }

  pub fn fits(&self) -> Vec<(BoundingBox, FitOptions)> {
    self
      .calls
      .iter()
      .filter_map(|c| match c {
        HostCall::FitBounds(bounds, options) => Some((*bounds, *options)),
        _ => None,
      })
      .collect()
  }

  pub fn primitive_count(&self) -> usize {
    self.layer.as_ref().map_or(0, |l| l.primitives.len())
  }
}

impl MapHost for RecordingHost {
  fn set_view(&mut self, center: WGS84Coordinate, zoom: u8) {
    self.calls.push(HostCall::SetView(center, zoom));
  }

  fn invalidate_size(&mut self) {
    self.calls.push(HostCall::InvalidateSize);
  }

  fn fit_bounds(&mut self, bounds: BoundingBox, options: FitOptions) {
    self.calls.push(HostCall::FitBounds(bounds, options));
  }

  fn replace_layer(&mut self, layer: VectorLayer) {
    self.calls.push(HostCall::ReplaceLayer(layer.clone()));
    self.layer = Some(layer);
  }

  fn restyle_layer(&mut self, style: StyleConfig) {
    self.calls.push(HostCall::RestyleLayer(style));
    if let Some(layer) = self.layer.as_mut() {
      layer.style = style;
    }
  }

  fn clear_layer(&mut self) {
    self.calls.push(HostCall::ClearLayer);
    self.layer = None;
  }
}
