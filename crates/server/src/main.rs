mod api;
mod config;
mod state;
mod utils;

use std::sync::Arc;
use std::time::Duration;

use api::api_router;
use axum::Router;
use catalog::CatalogStore;
use config::{
    apply_env_credentials, config_path_from_env, load_or_create_config, resolve_path,
    MetadataConfig,
};
use metadata::{
    test_provider, AnyProvider, EnrichConfig, Enricher, OfflineProvider, Provider,
    SpotifyProvider,
};
use recommender::Recommender;
use reqwest::Client;
use state::AppState;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (mut config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }
    apply_env_credentials(&mut config.metadata);

    let catalog_path = resolve_path(&config_path, &config.catalog_path);
    let similarity_path = resolve_path(&config_path, &config.similarity_path);
    let store = Arc::new(CatalogStore::load(&catalog_path, &similarity_path)?);
    if store.is_empty() {
        warn!("Catalog is empty; every recommendation request will be not found");
    }

    let external_client = Client::builder()
        .user_agent("song-recommender/0.1")
        .build()?;
    let provider = build_provider(&config.metadata, external_client);
    if let Err(err) = test_provider(&provider).await {
        warn!("Metadata provider check failed, results will use fallback metadata: {}", err);
    }

    let enricher = Enricher::new(
        provider,
        EnrichConfig {
            timeout: Duration::from_secs(config.metadata.timeout_secs),
            fallback_image_url: config.metadata.fallback_image_url.clone(),
        },
    );
    let recommender = Recommender::new(store, enricher, config.metadata.max_concurrency);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let state = AppState {
        config: Arc::new(config),
        recommender: Arc::new(recommender),
    };

    let app = Router::new()
        .nest("/api/v1", api_router(state))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_provider(config: &MetadataConfig, client: Client) -> AnyProvider {
    match config.provider {
        Provider::Spotify => {
            let spotify = SpotifyProvider::new(
                client,
                &config.client_id,
                &config.client_secret,
                Duration::from_secs(config.timeout_secs),
            );
            if spotify.has_credentials() {
                info!("Using Spotify metadata provider");
                AnyProvider::Spotify(spotify)
            } else {
                warn!("Spotify credentials not configured; using fallback metadata only");
                AnyProvider::Offline(OfflineProvider)
            }
        }
        Provider::None => {
            info!("Metadata provider disabled; using fallback metadata only");
            AnyProvider::Offline(OfflineProvider)
        }
    }
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Cannot listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let reason = tokio::select! {
        _ = interrupt => "ctrl-c",
        _ = terminate => "SIGTERM",
    };
    info!(reason, "Stopping recommender server");
}
