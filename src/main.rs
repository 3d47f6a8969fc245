use anyhow::Context;
use clap::{Parser, Subcommand};
use outage_map::config::AppConfig;
use outage_map::render::{MapRenderer, MemorySurface};
use outage_map::server;
use outage_map::store::DistrictStore;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the district document and print a render summary
    Inspect {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the interactive power-status map
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

fn load_store(config: &AppConfig) -> anyhow::Result<DistrictStore> {
    let mut store = DistrictStore::new(config.input.properties.clone());
    let file = File::open(&config.input.geojson)
        .with_context(|| format!("Failed to open district file: {:?}", config.input.geojson))?;
    store
        .load(BufReader::new(file))
        .with_context(|| format!("Failed to load districts from {:?}", config.input.geojson))?;
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Inspect { config } => {
            let app_config = AppConfig::load_from_file(config)?;
            let store = load_store(&app_config)?;
            let dataset = store.current()?;

            let renderer = MapRenderer::new(app_config.map.clone());
            let mut surface = MemorySurface::new();
            renderer.render(&dataset, &mut surface);

            println!("{} districts loaded", dataset.len());
            for region in &surface.regions {
                let popup = &region.popup;
                println!(
                    "{:<24} status={:<12} color={:<8} pop={} outage={} .. {}",
                    region.district,
                    popup.status,
                    region.style.color,
                    popup.population,
                    popup.outage_start,
                    popup.outage_end,
                );
            }
            println!(
                "{} labels placed (shown at zoom >= {})",
                surface.labels.len(),
                app_config.map.label_zoom_threshold
            );
        }
        Commands::Serve { config } => {
            let app_config = AppConfig::load_from_file(config)?;
            let store = load_store(&app_config)?;
            server::start_server(app_config, store).await?;
        }
    }

    Ok(())
}
