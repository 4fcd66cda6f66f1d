use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use movie_rec_api::{
    config::Config,
    db::{Cache, PgStore},
    services::{IngestionJob, IngestionService, TmdbClient},
    telemetry,
};

/// Fetch movies from TMDb into the catalog
#[derive(Parser, Debug)]
#[command(name = "fetch-movies")]
#[command(about = "Fetch trending movies from TMDb and save the new ones")]
struct Cli {
    /// Fetch the recommendations for this TMDb movie id instead of the trending list
    #[arg(long, value_name = "ID")]
    recommendations_for: Option<i64>,

    /// Leave the cache untouched, even when new movies were saved
    #[arg(long)]
    keep_cache: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    println!("Starting to fetch movies...");

    match run(cli).await {
        Ok(()) => {
            println!("Successfully fetched and saved movies.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error fetching movies: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    telemetry::init_tracing();
    config.warn_insecure_defaults();

    // Checked before touching Redis so a misconfigured run clears nothing
    let database_url = config.require_database_url()?;
    let store = Arc::new(PgStore::connect(database_url).await?);
    let cache = Cache::connect(&config).await?;
    let catalog = Arc::new(TmdbClient::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
    ));
    let service = IngestionService::new(
        store,
        catalog,
        cache,
        config.tmdb_image_base_url.clone(),
    )
    .with_cache_invalidation(!cli.keep_cache);

    let job = match cli.recommendations_for {
        Some(seed_external_id) => IngestionJob::Recommendations { seed_external_id },
        None => IngestionJob::Trending,
    };

    let created = service.run_to_completion(job).await?;
    tracing::info!(job = %job, created = created, "Fetch finished");

    Ok(())
}
