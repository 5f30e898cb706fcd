//! Anime catalog CLI application.

use anime_catalog::views::{self, GenrePage};
use anime_catalog::{
    CatalogEngine, HttpGateway, Listing, LoadOutcome, StaticSession, ViewQuery,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::{AnimeRecord, Config, LogConfig};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// User id, overriding the configured session
    #[arg(long, global = true)]
    user_id: Option<String>,

    /// Catalog API base URL, overriding the configuration
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default configuration file to the --config path
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// List the whole catalog
    List {
        /// Title prefix filter
        #[arg(short, long, default_value = "")]
        search: String,

        /// Sort by title instead of server order
        #[arg(short, long)]
        alphabetical: bool,
    },

    /// Show the catalog grouped by genre, one page per group
    Genres {
        #[arg(short, long, default_value = "")]
        search: String,

        /// Viewport width in pixels, overriding the configuration
        #[arg(short, long)]
        width: Option<u32>,

        /// Page to show for a genre, e.g. --page action=2
        #[arg(short, long = "page", value_parser = parse_page)]
        pages: Vec<(String, usize)>,
    },

    /// List the user's favorites
    Favorites {
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// List recently added anime
    Recent {
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// List top rated anime
    Top,

    /// Show one anime
    Show { id: String },

    /// Toggle an anime in the user's favorites
    Favorite { id: String },

    /// Rate an anime from 1 to 5 stars
    Rate {
        id: String,
        #[arg(allow_hyphen_values = true)]
        stars: i64,
    },
}

/// Parse `GENRE=N` (pages are 1-based on the command line)
fn parse_page(value: &str) -> Result<(String, usize), String> {
    let (genre, page) = value
        .split_once('=')
        .ok_or_else(|| format!("expected GENRE=PAGE, got '{}'", value))?;
    let page: usize = page
        .trim()
        .parse()
        .map_err(|_| format!("invalid page number '{}'", page))?;
    Ok((genre.trim().to_lowercase(), page.saturating_sub(1)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Command::Init { force } = args.command {
        return write_default_config(&args.config, force);
    }

    // Load configuration
    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(user_id) = &args.user_id {
        config.session.user_id = Some(user_id.clone());
    }
    if let Some(base_url) = &args.base_url {
        config.api.base_url = base_url.clone();
    }

    // Initialize logging
    let mut log_config = LogConfig::from_config(&config, env!("CARGO_PKG_NAME"));
    if args.verbose {
        log_config.level = tracing::Level::DEBUG;
    }
    shared::logging::init(&log_config)?;

    info!(config_file = %args.config.display(), "Anime catalog starting");

    let gateway = HttpGateway::from_config(&config.api, &config.session)
        .context("Failed to create catalog API client")?;
    let session = StaticSession::from_config(&config);
    let engine = CatalogEngine::new(gateway, session);

    match args.command {
        // Returned early above
        Command::Init { .. } => {}
        Command::List {
            search,
            alphabetical,
        } => {
            load(&engine, Listing::All).await?;
            let mut query = ViewQuery::new(config.view.viewport_width);
            query.set_search_term(search);
            engine.read(|store| {
                let favorites = store.favorites();
                let records = if alphabetical {
                    views::alphabetical_view(store, &query)
                } else {
                    views::catalog_view(store, &query)
                };
                print_records(&records, |id| favorites.contains(id));
            });
        }
        Command::Genres {
            search,
            width,
            pages,
        } => {
            load(&engine, Listing::All).await?;
            let mut query = ViewQuery::new(width.unwrap_or(config.view.viewport_width));
            query.set_search_term(search);
            engine.read(|store| {
                query.sync_catalog(store.version());
                for (genre, page) in &pages {
                    query.set_page(genre, *page);
                }
                for page in views::genre_view(store, &query) {
                    print_genre_page(&page, |id| store.is_favorite(id));
                }
            });
        }
        Command::Favorites { search } => {
            load(&engine, Listing::Favorites).await?;
            let mut query = ViewQuery::new(config.view.viewport_width);
            query.set_search_term(search);
            engine.read(|store| {
                print_records(&views::favorites_view(store, &query), |_| true);
            });
        }
        Command::Recent { search } => {
            load(&engine, Listing::Recent).await?;
            let mut query = ViewQuery::new(config.view.viewport_width);
            query.set_search_term(search);
            engine.read(|store| {
                print_records(&views::recent_view(store, &query), |id| {
                    store.is_favorite(id)
                });
            });
        }
        Command::Top => {
            load(&engine, Listing::Top).await?;
            engine.read(|store| {
                for (rank, record) in views::top_view(store).into_iter().enumerate() {
                    println!(
                        "{:>3}. {}  ({})",
                        rank + 1,
                        record.title,
                        format_global(record.global_rating)
                    );
                }
            });
        }
        Command::Show { id } => {
            load(&engine, Listing::All).await?;
            let record = engine
                .anime_details(&id)
                .await
                .with_context(|| format!("Failed to fetch anime {}", id))?;
            let favorite = engine.read(|store| store.is_favorite(&id));
            print_details(&record, favorite);
        }
        Command::Favorite { id } => {
            load(&engine, Listing::All).await?;
            let change = engine
                .toggle_favorite(&id)
                .await
                .with_context(|| format!("Failed to toggle favorite for anime {}", id))?;
            let title = engine
                .read(|store| store.record(&id).map(|record| record.title.clone()))
                .unwrap_or_else(|| id.clone());
            if change.is_favorite {
                println!("Added {} to favorites", title);
            } else {
                println!("Removed {} from favorites", title);
            }
        }
        Command::Rate { id, stars } => {
            load(&engine, Listing::All).await?;
            let receipt = engine
                .rate_anime(&id, stars)
                .await
                .with_context(|| format!("Failed to rate anime {}", id))?;
            let record = engine.read(|store| store.record(&id).cloned());
            if let Some(record) = record {
                println!(
                    "Rated {}: {} (average {})",
                    record.title,
                    format_own(record.current_user_rating),
                    format_global(record.global_rating)
                );
            } else {
                println!("Rated {}: {:?}", id, receipt);
            }
        }
    }

    info!("Anime catalog finished");

    Ok(())
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; pass --force to replace it", path.display());
    }
    Config::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

async fn load(
    engine: &CatalogEngine<HttpGateway, StaticSession>,
    listing: Listing,
) -> Result<()> {
    let outcome = engine
        .load(listing)
        .await
        .with_context(|| format!("Failed to load {} listing", listing))?;

    match outcome {
        LoadOutcome::NoUser => {
            bail!("No user id configured; pass --user-id or set session.user_id in the config")
        }
        LoadOutcome::Loaded(summary) => {
            if let Some(warning) = summary.warning {
                eprintln!("warning: {}", warning);
            }
            Ok(())
        }
    }
}

fn format_own(rating: Option<u8>) -> String {
    match rating {
        Some(stars) => format!("{}/5", stars),
        None => "not rated".to_string(),
    }
}

fn format_global(rating: Option<f64>) -> String {
    match rating {
        Some(rating) => format!("{:.1}", rating),
        None => "-".to_string(),
    }
}

fn print_records(records: &[&AnimeRecord], is_favorite: impl Fn(&str) -> bool) {
    if records.is_empty() {
        println!("No anime found");
        return;
    }
    for record in records {
        print_line(record, is_favorite(&record.id));
    }
}

fn print_line(record: &AnimeRecord, favorite: bool) {
    println!(
        "{} {}  {} ({})  [{}]  yours: {}",
        if favorite { "*" } else { " " },
        record.id,
        record.title,
        record.year,
        record.genre,
        format_own(record.current_user_rating)
    );
}

fn print_genre_page(page: &GenrePage<'_>, is_favorite: impl Fn(&str) -> bool) {
    println!(
        "== {} (page {}/{}) ==",
        page.label,
        page.window.index + 1,
        page.window.total_pages.max(1)
    );
    for record in &page.items {
        print_line(record, is_favorite(&record.id));
    }
}

fn print_details(record: &AnimeRecord, favorite: bool) {
    println!("{}", record.title);
    println!("  id:          {}", record.id);
    println!("  genre:       {}", record.primary_genre());
    println!("  tags:        {}", record.tags().collect::<Vec<_>>().join(", "));
    println!("  year:        {}", record.year);
    println!("  average:     {}", format_global(record.global_rating));
    println!("  your rating: {}", format_own(record.current_user_rating));
    println!("  favorite:    {}", if favorite { "yes" } else { "no" });
    if let Some(image_url) = &record.image_url {
        println!("  image:       {}", image_url);
    }
    if !record.description.is_empty() {
        println!();
        println!("{}", record.description);
    }
}
