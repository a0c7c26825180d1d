use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use dirs::home_dir;
use log::error;
use serde::{Deserialize, Serialize};

use crate::{
  category::Selection,
  controller::ControllerOptions,
  loader::{DEFAULT_MAX_CONCURRENT_REQUESTS, DataLoader},
  map::{coordinates::WGS84Coordinate, host::FitOptions},
  source::{DEFAULT_COUNTRY, DEFAULT_OVERPASS_URL, DataSource, OverpassSource, StaticSource},
  style::StyleConfig,
};

/// Where the map starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialView {
  pub center: WGS84Coordinate,
  pub zoom: u8,
}

impl Default for InitialView {
  fn default() -> Self {
    let defaults = ControllerOptions::default();
    Self {
      center: defaults.center,
      zoom: defaults.zoom,
    }
  }
}

/// Application configuration. Every field is optional so that environment, config file and
/// defaults can be layered on top of each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub config_path: Option<PathBuf>,
  pub overpass_url: Option<String>,
  /// A directory or URL prefix with one document per category. Switches to static mode.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data_dir: Option<String>,
  pub country: Option<String>,
  pub initial_view: Option<InitialView>,
  pub default_selection: Option<Selection>,
  pub style: Option<StyleConfig>,
  pub fit_padding: Option<f32>,
  /// How many categories are fetched at the same time when loading "all".
  pub max_concurrent_requests: Option<usize>,
}

impl Config {
  /// Environment, then config file, then defaults. Creates the config directory and a default
  /// config file on first use.
  #[must_use]
  pub fn new() -> Self {
    let from_env = Self::from_env();
    let from_file = Self::from_file();

    let mut merged = from_env;
    if let Some(from_file) = &from_file {
      merged = merged.merge(from_file);
    }
    merged = merged.merge(&Self::defaults());

    if merged.config_path.is_some() && from_file.is_none() {
      merged.init_cfg_file();
    }

    merged
  }

  fn from_env() -> Self {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
    Self {
      config_path: var("MILMAP_CONFIG").map(PathBuf::from),
      overpass_url: var("MILMAP_OVERPASS_URL"),
      data_dir: var("MILMAP_DATA_DIR"),
      country: var("MILMAP_COUNTRY"),
      max_concurrent_requests: var("MILMAP_MAX_CONCURRENT_REQUESTS").and_then(|v| {
        v.parse()
          .inspect_err(|e| error!("Invalid MILMAP_MAX_CONCURRENT_REQUESTS '{v}': {e}"))
          .ok()
      }),
      ..Self::default()
    }
  }

  /// Every field set to its built in value.
  #[must_use]
  pub fn defaults() -> Self {
    Self {
      config_path: home_dir().map(|p| p.join(".config").join("milmap")),
      overpass_url: Some(DEFAULT_OVERPASS_URL.to_string()),
      data_dir: None,
      country: Some(DEFAULT_COUNTRY.to_string()),
      initial_view: Some(InitialView::default()),
      default_selection: Some(Selection::default()),
      style: Some(StyleConfig::default()),
      fit_padding: Some(FitOptions::default().padding),
      max_concurrent_requests: Some(DEFAULT_MAX_CONCURRENT_REQUESTS),
    }
  }

  /// Fields set in `self` win.
  #[must_use]
  pub fn merge(self, other: &Self) -> Self {
    Self {
      config_path: self.config_path.or_else(|| other.config_path.clone()),
      overpass_url: self.overpass_url.or_else(|| other.overpass_url.clone()),
      data_dir: self.data_dir.or_else(|| other.data_dir.clone()),
      country: self.country.or_else(|| other.country.clone()),
      initial_view: self.initial_view.or(other.initial_view),
      default_selection: self.default_selection.or(other.default_selection),
      style: self.style.or(other.style),
      fit_padding: self.fit_padding.or(other.fit_padding),
      max_concurrent_requests: self.max_concurrent_requests.or(other.max_concurrent_requests),
    }
  }

  fn from_file() -> Option<Self> {
    let config_path = std::env::var("MILMAP_CONFIG")
      .ok()
      .map(PathBuf::from)
      .or_else(|| home_dir().map(|p| p.join(".config").join("milmap")))?;
    Self::read_file(&config_path.join("config.json"))
  }

  /// Reads a config file. Missing files are silently ignored, broken ones are logged.
  #[must_use]
  pub fn read_file(path: &Path) -> Option<Self> {
    serde_json::from_str(&std::fs::read_to_string(path).ok()?)
      .inspect_err(|e| error!("Failed to read config file {}: {e}", path.display()))
      .ok()
  }

  fn init_cfg_file(&self) {
    let Some(path) = &self.config_path else {
      return;
    };
    if !path.exists() {
      let _ = std::fs::create_dir_all(path).inspect_err(|e| {
        error!("Failed to create config directory: {e}");
      });
    }

    let path = path.join("config.json");
    if !path.exists() {
      match serde_json::to_string_pretty(self) {
        Ok(config) => {
          let _ = std::fs::write(path, config).inspect_err(|e| {
            error!("Failed to write config file: {e}");
          });
        }
        Err(e) => error!("Failed to serialize config: {e}"),
      }
    }
  }

  /// The static source if a data dir is configured, the overpass API otherwise.
  #[must_use]
  pub fn data_source(&self) -> Arc<dyn DataSource> {
    match &self.data_dir {
      Some(dir) => {
        log::info!("Reading pre-fetched documents from {dir}");
        Arc::new(StaticSource::new(dir.clone()))
      }
      None => Arc::new(OverpassSource::new(
        self.overpass_url.clone(),
        self.country.clone(),
      )),
    }
  }

  /// A loader over [`Config::data_source`] with the configured request cap.
  #[must_use]
  pub fn loader(&self) -> DataLoader {
    DataLoader::new(self.data_source()).with_max_concurrent_requests(
      self
        .max_concurrent_requests
        .unwrap_or(DEFAULT_MAX_CONCURRENT_REQUESTS),
    )
  }

  #[must_use]
  pub fn controller_options(&self) -> ControllerOptions {
    let defaults = ControllerOptions::default();
    let view = self.initial_view.unwrap_or_default();
    ControllerOptions {
      center: view.center,
      zoom: view.zoom,
      style: self.style.unwrap_or(defaults.style).clamped(),
      fit_padding: self.fit_padding.unwrap_or(defaults.fit_padding),
    }
  }

  #[must_use]
  pub fn default_selection(&self) -> Selection {
    self.default_selection.unwrap_or_default()
  }
}
