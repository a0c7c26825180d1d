//! The layer controller ties selection, loading, rendering and camera fitting together.
//!
//! All state lives on the thread that owns the controller. Loads run as tokio tasks and report
//! back over a channel; completions are applied in [`LayerController::poll`] (once per UI frame) or
//! awaited with [`LayerController::settle`].

use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::{
  category::Selection,
  loader::{DataLoader, LoadOutcome},
  map::{
    coordinates::WGS84Coordinate,
    geometry_collection::GeometryCollection,
    host::{FitOptions, MapHost},
    render::{RenderBinding, RenderReport},
  },
  style::{StyleConfig, StyleState, StyleUpdate},
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
  #[default]
  Idle,
  Loading,
  Ready,
  Empty,
  Error(String),
}

/// Called from the load task once an outcome was sent, e.g. to wake up the UI.
pub type RepaintHook = Arc<dyn Fn() + Send + Sync>;

/// Startup parameters of a [`LayerController`].
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
  pub center: WGS84Coordinate,
  pub zoom: u8,
  pub style: StyleConfig,
  pub fit_padding: f32,
}

impl Default for ControllerOptions {
  fn default() -> Self {
    Self {
      center: WGS84Coordinate::new(52.069_167, 19.480_556),
      zoom: 7,
      style: StyleConfig::default(),
      fit_padding: FitOptions::default().padding,
    }
  }
}

struct Completion {
  generation: u64,
  selection: Selection,
  outcome: LoadOutcome,
}

pub struct LayerController<H: MapHost> {
  host: H,
  loader: DataLoader,
  binding: RenderBinding,
  style: StyleState,
  fit_padding: f32,

  selection: Selection,
  status: LoadStatus,
  collection: GeometryCollection,
  message: Option<String>,
  generation: u64,
  fit_pending: bool,

  sender: UnboundedSender<Completion>,
  receiver: UnboundedReceiver<Completion>,
  repaint: Option<RepaintHook>,
}

impl<H: MapHost> LayerController<H> {
  /// Takes ownership of the host and puts it into the initial view. Nothing is loaded yet.
  pub fn new(mut host: H, loader: DataLoader, options: ControllerOptions) -> Self {
    host.set_view(options.center, options.zoom);
    host.invalidate_size();
    let (sender, receiver) = unbounded_channel();
    Self {
      host,
      loader,
      binding: RenderBinding::new(),
      style: StyleState::new(options.style),
      fit_padding: options.fit_padding,
      selection: Selection::default(),
      status: LoadStatus::Idle,
      collection: GeometryCollection::default(),
      message: None,
      generation: 0,
      fit_pending: false,
      sender,
      receiver,
      repaint: None,
    }
  }

  #[must_use]
  pub fn with_repaint(mut self, repaint: RepaintHook) -> Self {
    self.repaint = Some(repaint);
    self
  }

  /// Makes `selection` the active one and starts loading it. Loads of earlier selections keep
  /// running but their results are discarded. Must be called within a tokio runtime.
  pub fn select(&mut self, selection: Selection) {
    self.generation += 1;
    let generation = self.generation;
    log::debug!("Selecting {selection} (generation {generation})");

    self.selection = selection;
    self.status = LoadStatus::Loading;
    self.collection = GeometryCollection::default();
    self.message = None;
    self.fit_pending = false;
    self.binding.clear(&mut self.host);

    let loader = self.loader.clone();
    let sender = self.sender.clone();
    let repaint = self.repaint.clone();
    tokio::spawn(async move {
      let outcome = loader.load(selection).await;
      let completion = Completion {
        generation,
        selection,
        outcome,
      };
      if sender.send(completion).is_err() {
        log::debug!("Controller is gone, dropping result of generation {generation}");
        return;
      }
      if let Some(repaint) = repaint {
        repaint();
      }
    });
  }

  /// Applies all completions that arrived so far. Returns whether any of them was current.
  pub fn poll(&mut self) -> bool {
    let mut applied = false;
    while let Ok(completion) = self.receiver.try_recv() {
      applied |= self.apply(completion);
    }
    applied
  }

  /// Waits for the next completion and applies it. Returns whether it was current.
  pub async fn next_completion(&mut self) -> bool {
    match self.receiver.recv().await {
      Some(completion) => self.apply(completion),
      None => false,
    }
  }

  /// Waits until the current load has finished.
  pub async fn settle(&mut self) {
    while self.status == LoadStatus::Loading {
      self.next_completion().await;
    }
  }

  fn apply(&mut self, completion: Completion) -> bool {
    if completion.generation != self.generation {
      log::debug!(
        "Ignoring stale result for {} (generation {}, current {})",
        completion.selection,
        completion.generation,
        self.generation
      );
      return false;
    }

    match completion.outcome {
      LoadOutcome::Success(collection) => {
        self.collection = collection;
        self.message = None;
        self.status = LoadStatus::Ready;
        self.fit_pending = true;
        let report = self.render();
        self.fit_once(report);
      }
      LoadOutcome::Empty(message) => {
        self.collection = GeometryCollection::default();
        self.binding.clear(&mut self.host);
        self.message = Some(message);
        self.status = LoadStatus::Empty;
      }
      LoadOutcome::Failure(message) => {
        self.collection = GeometryCollection::default();
        self.binding.clear(&mut self.host);
        self.message = Some(message.clone());
        self.status = LoadStatus::Error(message);
      }
    }
    log::debug!("{} is now {:?}", self.selection, self.status);
    true
  }

  fn render(&mut self) -> RenderReport {
    self.binding.bind(
      &mut self.host,
      self.generation,
      &self.collection,
      self.style.current(),
      self.selection.label(),
    )
  }

  /// Fits the camera to the rendered layer the first time it reports something drawn.
  fn fit_once(&mut self, report: RenderReport) {
    if !self.fit_pending || report.primitives == 0 {
      return;
    }
    self.fit_pending = false;
    if report.bounds.is_valid() {
      self.host.fit_bounds(
        report.bounds,
        FitOptions {
          padding: self.fit_padding,
          animate: true,
        },
      );
    } else {
      log::debug!("No valid bounds for {}, not fitting", self.selection);
    }
  }

  /// Merges a style edit and restyles the layer. Status, collection and camera stay untouched.
  pub fn set_style(&mut self, update: &StyleUpdate) {
    if self.style.set_style(update) && self.status == LoadStatus::Ready {
      self.render();
    }
  }

  #[must_use]
  pub fn style(&self) -> &StyleConfig {
    self.style.current()
  }

  #[must_use]
  pub fn selection(&self) -> Selection {
    self.selection
  }

  #[must_use]
  pub fn active_label(&self) -> &'static str {
    self.selection.label()
  }

  #[must_use]
  pub fn status(&self) -> &LoadStatus {
    &self.status
  }

  /// The empty or error message of the current selection.
  #[must_use]
  pub fn message(&self) -> Option<&str> {
    self.message.as_deref()
  }

  #[must_use]
  pub fn feature_count(&self) -> usize {
    if self.status == LoadStatus::Ready {
      self.collection.len()
    } else {
      0
    }
  }

  #[must_use]
  pub fn collection(&self) -> &GeometryCollection {
    &self.collection
  }

  #[must_use]
  pub fn host(&self) -> &H {
    &self.host
  }

  pub fn host_mut(&mut self) -> &mut H {
    &mut self.host
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::{
    category::Category,
    source::LoadError,
    test_utils::{FixtureSource, GatedSource, HostCall, RecordingHost, fixture_collection},
  };

  fn controller(source: FixtureSource) -> LayerController<RecordingHost> {
    LayerController::new(
      RecordingHost::default(),
      DataLoader::new(Arc::new(source)),
      ControllerOptions::default(),
    )
  }

  #[tokio::test]
  async fn starts_idle_with_initial_view() {
    let controller = controller(FixtureSource::new());
    assert_eq!(controller.status(), &LoadStatus::Idle);
    assert_eq!(controller.feature_count(), 0);
    assert_eq!(
      controller.host().calls,
      vec![
        HostCall::SetView(WGS84Coordinate::new(52.069_167, 19.480_556), 7),
        HostCall::InvalidateSize
      ]
    );
  }

  #[tokio::test]
  async fn barracks_with_three_features() {
    let collection = fixture_collection(3);
    let expected_bounds = collection.bounding_box();
    let mut controller = controller(FixtureSource::new().with(Category::Barracks, collection));

    controller.select(Category::Barracks.into());
    assert_eq!(controller.status(), &LoadStatus::Loading);
    controller.settle().await;

    assert_eq!(controller.status(), &LoadStatus::Ready);
    assert_eq!(controller.feature_count(), 3);
    assert_eq!(controller.active_label(), "Koszary");
    assert_eq!(controller.message(), None);
    assert_eq!(controller.host().primitive_count(), 3);
    assert_eq!(
      controller.host().fits(),
      vec![(
        expected_bounds,
        FitOptions {
          padding: 50.,
          animate: true
        }
      )]
    );
  }

  #[tokio::test]
  async fn range_without_features() {
    let mut controller = controller(FixtureSource::new());
    controller.select(Category::Range.into());
    controller.settle().await;

    assert_eq!(controller.status(), &LoadStatus::Empty);
    assert!(controller.message().unwrap().contains("Strzelnica"));
    assert_eq!(controller.feature_count(), 0);
    assert!(controller.host().fits().is_empty());
    assert!(controller.host().layer().is_none());
  }

  #[tokio::test]
  async fn all_with_one_failure_renders_nothing() {
    let source = FixtureSource::new()
      .with(Category::Barracks, fixture_collection(3))
      .with(Category::Office, fixture_collection(2))
      .failing(
        Category::Airfield,
        LoadError::Transport {
          category: Category::Airfield,
          detail: "HTTP 504".to_string(),
        },
      );
    let mut controller = controller(source);
    controller.select(Selection::All);
    controller.settle().await;

    let LoadStatus::Error(message) = controller.status() else {
      panic!("expected error, got {:?}", controller.status());
    };
    assert!(message.contains("Lotnisko wojskowe"));
    assert!(!message.contains("HTTP 504"));
    assert_eq!(controller.feature_count(), 0);
    assert_eq!(controller.host().primitive_count(), 0);
    assert!(controller.host().fits().is_empty());
  }

  #[tokio::test]
  async fn last_selection_wins() {
    let source = Arc::new(GatedSource::new(
      FixtureSource::new()
        .with(Category::Barracks, fixture_collection(3))
        .with(Category::Bunker, fixture_collection(2)),
    ));
    let mut controller = LayerController::new(
      RecordingHost::default(),
      DataLoader::new(source.clone()),
      ControllerOptions::default(),
    );

    controller.select(Category::Barracks.into());
    controller.select(Category::Bunker.into());

    source.release(Category::Barracks);
    assert!(!controller.next_completion().await);
    assert_eq!(controller.status(), &LoadStatus::Loading);
    assert_eq!(controller.host().primitive_count(), 0);

    source.release(Category::Bunker);
    controller.settle().await;
    assert_eq!(controller.status(), &LoadStatus::Ready);
    assert_eq!(controller.feature_count(), 2);
    assert_eq!(controller.active_label(), "Bunkier");
    assert_eq!(controller.host().fits().len(), 1);
  }

  #[tokio::test]
  async fn stale_result_arriving_late_is_ignored() {
    let source = Arc::new(GatedSource::new(
      FixtureSource::new()
        .with(Category::Barracks, fixture_collection(3))
        .with(Category::Bunker, fixture_collection(2)),
    ));
    let mut controller = LayerController::new(
      RecordingHost::default(),
      DataLoader::new(source.clone()),
      ControllerOptions::default(),
    );

    controller.select(Category::Barracks.into());
    controller.select(Category::Bunker.into());
    source.release(Category::Bunker);
    controller.settle().await;

    source.release(Category::Barracks);
    assert!(!controller.next_completion().await);
    assert_eq!(controller.feature_count(), 2);
    assert_eq!(controller.active_label(), "Bunkier");
  }

  #[tokio::test]
  async fn style_edits_do_not_touch_state() {
    let mut controller =
      controller(FixtureSource::new().with(Category::Barracks, fixture_collection(3)));
    controller.select(Category::Barracks.into());
    controller.settle().await;

    controller.set_style(&StyleUpdate::default().with_weight(50).with_opacity(-1.));

    assert_eq!(controller.status(), &LoadStatus::Ready);
    assert_eq!(controller.feature_count(), 3);
    assert_eq!(controller.style().stroke_weight, 10);
    assert_eq!(controller.host().fits().len(), 1);
    assert_eq!(
      controller.host().layer().map(|l| l.style),
      Some(*controller.style())
    );
    assert!(matches!(
      controller.host().calls.last(),
      Some(HostCall::RestyleLayer(_))
    ));
  }

  #[tokio::test]
  async fn style_edit_while_empty_keeps_message() {
    let mut controller = controller(FixtureSource::new());
    controller.select(Category::Range.into());
    controller.settle().await;

    controller.set_style(&StyleUpdate::default().with_weight(5));
    assert_eq!(controller.status(), &LoadStatus::Empty);
    assert!(controller.message().is_some());
    assert_eq!(controller.style().stroke_weight, 5);
  }

  #[tokio::test]
  async fn reselecting_fits_again() {
    let mut controller =
      controller(FixtureSource::new().with(Category::Barracks, fixture_collection(2)));
    controller.select(Category::Barracks.into());
    controller.settle().await;
    controller.select(Category::Barracks.into());
    controller.settle().await;
    assert_eq!(controller.host().fits().len(), 2);
  }

  #[tokio::test]
  async fn repaint_hook_is_called() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut controller = controller(FixtureSource::new()).with_repaint(Arc::new(move || {
      counter.fetch_add(1, Ordering::SeqCst);
    }));
    controller.select(Category::Office.into());
    controller.settle().await;
    // The load task calls the hook in the same poll that sent the outcome.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn poll_applies_pending_completions() {
    let mut controller =
      controller(FixtureSource::new().with(Category::Bunker, fixture_collection(4)));
    controller.select(Category::Bunker.into());
    for _ in 0..100 {
      if controller.poll() {
        break;
      }
      tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(controller.feature_count(), 4);
  }
}
