use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use catalog::CatalogStore;
use metadata::{AnyProvider, EnrichConfig, Enricher, OfflineProvider, SpotifyProvider};
use recommender::{Recommender, DEFAULT_MAX_CONCURRENCY};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: recommend [--no-enrich] <title> [k]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut enrich = true;
    let mut positional = Vec::new();
    for arg in env::args().skip(1) {
        if arg == "--no-enrich" {
            enrich = false;
        } else {
            positional.push(arg);
        }
    }
    let mut positional = positional.into_iter();
    let title = positional.next().ok_or(USAGE)?;
    let k = match positional.next() {
        Some(value) => value.parse::<usize>().map_err(|_| USAGE)?,
        None => 10,
    };

    let catalog_path = env::var("CATALOG_PATH").unwrap_or_else(|_| "data/catalog.json".to_string());
    let similarity_path =
        env::var("SIMILARITY_PATH").unwrap_or_else(|_| "data/similarity.bin".to_string());
    let store = Arc::new(CatalogStore::load(
        &PathBuf::from(catalog_path),
        &PathBuf::from(similarity_path),
    )?);

    if !enrich {
        let query_index = store.resolve_index(&title)?;
        for (rank, (index, score)) in recommender::rank(&store, query_index, k).into_iter().enumerate() {
            let song = &store.songs()[index];
            println!("{}. {} - {} ({:.4})", rank + 1, song.title, song.artist, score);
        }
        return Ok(());
    }

    let provider = provider_from_env()?;
    let enricher = Enricher::new(provider, EnrichConfig::default());
    let recommender = Recommender::new(store, enricher, DEFAULT_MAX_CONCURRENCY);
    let items = recommender.recommend(&title, k).await?;
    for (rank, item) in items.iter().enumerate() {
        println!(
            "{}. {} - {} ({:.4}) [{}]",
            rank + 1,
            item.song,
            item.artist,
            item.score,
            item.album
        );
    }
    Ok(())
}

fn provider_from_env() -> Result<AnyProvider, reqwest::Error> {
    let client_id = env::var("SPOTIFY_CLIENT_ID").unwrap_or_default();
    let client_secret = env::var("SPOTIFY_CLIENT_SECRET").unwrap_or_default();
    let client = reqwest::Client::builder()
        .user_agent("song-recommender/0.1")
        .build()?;
    let spotify = SpotifyProvider::new(client, &client_id, &client_secret, Duration::from_secs(8));
    if spotify.has_credentials() {
        info!("Using Spotify metadata provider");
        Ok(AnyProvider::Spotify(spotify))
    } else {
        info!("Spotify credentials not set; using fallback metadata");
        Ok(AnyProvider::Offline(OfflineProvider))
    }
}
