use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gallery_engine::common::config::{Config, config_file};
use gallery_engine::common::log;
use gallery_engine::gallery::{Catalog, InMemorySource, Library, WindowEntry};
use gallery_engine::model::{Item, PhotoId};

#[derive(Parser)]
struct Cli {
    /// JSON catalog of photos and albums to serve.
    #[arg(long, value_name = "PATH")]
    catalog: PathBuf,

    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Check the configuration file and exit.
    #[arg(long)]
    validate: bool,

    /// Open the gallery around this photo.
    #[arg(long, value_name = "ID")]
    around: Option<String>,

    /// Only show photos matching this search.
    #[arg(long)]
    query: Option<String>,

    /// Container width to lay out at.
    #[arg(long, default_value_t = 1200.0)]
    width: f64,

    /// Top of the printed window.
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// Bottom of the printed window.
    #[arg(long, default_value_t = 2000.0)]
    to: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Cli::parse();
    log::init_logging();

    let config_path = opt.config.clone().unwrap_or_else(config_file);
    let config = Config::read_or_default(&config_path)?;

    if opt.validate {
        let issues = config.validate();
        if issues.is_empty() {
            println!("Config validation passed");
            return Ok(());
        }
        for issue in issues {
            eprintln!("{issue}");
        }
        process::exit(1);
    }

    let raw = std::fs::read_to_string(&opt.catalog)
        .with_context(|| format!("reading catalog {}", opt.catalog.display()))?;
    let catalog: Catalog = serde_json::from_str(&raw)
        .with_context(|| format!("parsing catalog {}", opt.catalog.display()))?;
    let library = Library::new(Arc::new(InMemorySource::from_catalog(catalog)), config);

    let gallery = library.search_gallery(opt.query.as_deref().unwrap_or_default()).await?;
    gallery.layout(opt.width)?;

    if let Some(around) = &opt.around {
        let neighborhood = gallery.load_around(&PhotoId::from(around.as_str())).await?;
        println!(
            "around {around}: previous {}, next {}",
            neighborhood.before_id.as_ref().map_or("-", |id| id.as_str()),
            neighborhood.after_id.as_ref().map_or("-", |id| id.as_str()),
        );
    }

    let window = gallery.get_between(opt.from, opt.to);
    println!(
        "{} items, {:.0}px tall; {} loaded",
        gallery.len(),
        gallery.height(),
        gallery.loaded_count()
    );
    println!("{:.0}px above", window.before_height);
    for WindowEntry { before, item, .. } in &window.entries {
        match item {
            Item::Row(row) => println!("row at {:.0}, {:.0}px", before.height, row.height),
            Item::Photo(photo) => {
                println!("  {} {:.0}px", photo.id, photo.display_width.unwrap_or_default())
            }
            Item::Text(text) => println!("text {} {:.0}px: {}", text.id, text.height, text.text),
            Item::Placeholder(ph) => {
                println!("{} not loaded, about {:.0}px", ph.count, ph.height)
            }
        }
    }
    println!("{:.0}px below", window.after_height);
    Ok(())
}
