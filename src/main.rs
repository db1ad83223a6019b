use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};

use movie_catalog::{
    config::Config,
    omdb::OmdbClient,
    store::{JsonMovieStore, MovieRepository},
    sync::{self, DEFAULT_IMDB_IDS},
};

/// Movie catalog API and OMDb importer.
#[derive(Parser)]
#[command(name = "movie-catalog", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,

    /// Pull metadata from OMDb into the movie document once
    Sync {
        /// Overrides OMDB_API_KEY
        #[arg(long)]
        api_key: Option<String>,

        /// IMDb ids to import; defaults to the built-in list
        #[arg(long = "id", value_name = "IMDB_ID")]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,movie_catalog=debug".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let store = Arc::new(JsonMovieStore::new(config.movies_path.clone()));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, store).await,
        Command::Sync { api_key, ids } => run_sync(&config, store, api_key, ids).await,
    }
}

async fn serve(config: &Config, store: Arc<JsonMovieStore>) -> anyhow::Result<()> {
    tracing::info!(path = %store.path().display(), "using movie document");
    let app = movie_catalog::app(store);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_sync(
    config: &Config,
    store: Arc<JsonMovieStore>,
    api_key: Option<String>,
    ids: Vec<String>,
) -> anyhow::Result<()> {
    let api_key = api_key.unwrap_or_else(|| config.omdb_api_key.clone());
    if api_key.trim().is_empty() {
        anyhow::bail!("no OMDb API key: set OMDB_API_KEY or pass --api-key");
    }

    let ids = if ids.is_empty() {
        DEFAULT_IMDB_IDS.iter().map(|s| s.to_string()).collect()
    } else {
        ids
    };

    let http = reqwest::Client::builder()
        .user_agent("movie-catalog/0.1")
        .timeout(Duration::from_secs(config.omdb_timeout_secs))
        .build()?;
    let omdb = OmdbClient::new(http, api_key, config.omdb_base_url.clone(), config.omdb_rps);

    let report = sync::run(&omdb, store.as_ref() as &dyn MovieRepository, &ids)
        .await
        .with_context(|| format!("saving {}", store.path().display()))?;

    println!("Sync finished");
    println!("  new movies:     {}", report.created);
    println!("  updated movies: {}", report.updated);
    println!("  errors:         {}", report.errors);
    println!("  total in store: {}", report.total);
    Ok(())
}
