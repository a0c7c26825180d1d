use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser as _;
use milmap::{Selection, config::Config, normalize::to_geojson};

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Fetches military installations and prints their counts.", long_about = None)]
struct Args {
  /// A category, e.g. naval_base, or "all".
  #[arg(default_value = "all")]
  selection: Selection,

  /// Writes one GeoJSON document per category into this directory.
  #[arg(short, long)]
  out: Option<PathBuf>,

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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  env_logger::init();
  let args = Args::parse();

  let config = Config {
    overpass_url: args.overpass_url,
    data_dir: args.data_dir,
    country: args.country,
    ..Config::default()
  }
  .merge(&Config::new());

  let loader = config.loader();
  if let Some(out) = &args.out {
    std::fs::create_dir_all(out)
      .with_context(|| format!("Could not create {}", out.display()))?;
  }

  let mut failed = 0;
  let mut total = 0;
  for (category, result) in loader.load_each(args.selection).await {
    match result {
      Ok(collection) => {
        println!("{:<15} {:>6}  {}", category.id(), collection.len(), category.label());
        total += collection.len();
        if let Some(out) = &args.out {
          let path = out.join(format!("{}.json", category.id()));
          let document = serde_json::to_string_pretty(&to_geojson(&collection))?;
          std::fs::write(&path, document)
            .with_context(|| format!("Could not write {}", path.display()))?;
          log::info!("Wrote {}", path.display());
        }
      }
      Err(e) => {
        failed += 1;
        eprintln!("{:<15} {e}", category.id());
      }
    }
  }
  println!("{:<15} {total:>6}", "total");

  if failed > 0 {
    anyhow::bail!("{failed} categories could not be loaded");
  }
  Ok(())
}
