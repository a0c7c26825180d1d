use std::sync::Arc;

use anyhow::anyhow;
use clap::Parser as _;
use milmap::{
  Selection,
  config::Config,
  controller::LayerController,
  map::milmap_egui::Map,
  milmap_ui::MilmapApp,
};

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// The category shown on startup, e.g. barracks, or "all".
  #[arg(short, long)]
  selection: Option<Selection>,

  /// Reads pre-fetched per-category documents from this directory or URL prefix.
  #[arg(short, long)]
  data_dir: Option<String>,

  /// Overpass API interpreter endpoint.
  #[arg(long)]
  overpass_url: Option<String>,

  /// ISO3166-1 code of the country to query.
  #[arg(long)]
  country: Option<String>,
}

fn main() -> anyhow::Result<()> {
  // init logger.
  env_logger::init();
  let args = Args::parse();

  let config = Config {
    overpass_url: args.overpass_url,
    data_dir: args.data_dir,
    country: args.country,
    default_selection: args.selection,
    ..Config::default()
  }
  .merge(&Config::new());

  // Tokio runtime for the loads, the UI runs on the main thread.
  let rt = tokio::runtime::Runtime::new()?;
  let _enter = rt.enter();

  let options = eframe::NativeOptions {
    viewport: egui::ViewportBuilder {
      inner_size: Some(egui::vec2(1400.0, 1000.0)),
      clamp_size_to_monitor_size: Some(true),
      ..Default::default()
    },
    ..Default::default()
  };

  eframe::run_native(
    "milmap",
    options,
    Box::new(move |cc| {
      let ctx = cc.egui_ctx.clone();
      let loader = config.loader();
      log::info!("Loading from {}", loader.source_name());
      let mut controller = LayerController::new(Map::new(), loader, config.controller_options())
        .with_repaint(Arc::new(move || ctx.request_repaint()));
      controller.select(config.default_selection());
      Ok(Box::new(MilmapApp::new(controller)))
    }),
  )
  .map_err(|e| anyhow!("{e}"))
}
