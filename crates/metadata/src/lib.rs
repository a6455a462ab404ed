mod provider;
mod spotify;

use std::future::Future;
use std::time::Duration;

use common::{DetailsSource, TrackDetails, DEFAULT_IMAGE_URL, UNKNOWN_ALBUM};
use tracing::{debug, warn};

pub use provider::{provider_from_str, test_provider, AnyProvider, OfflineProvider, Provider};
pub use spotify::SpotifyProvider;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TrackMatch {
    pub album_art_urls: Vec<String>,
    pub artist: String,
    pub album: String,
    pub preview_url: Option<String>,
}

pub trait MetadataProvider: Send + Sync {
    fn search_track(
        &self,
        title: &str,
        artist: &str,
    ) -> impl Future<Output = Result<Option<TrackMatch>, MetadataError>> + Send;
}

#[derive(Debug)]
pub enum MetadataError {
    Http(reqwest::Error),
    Status(u16),
    Auth(String),
    Timeout(Duration),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Http(err) => write!(f, "http error: {}", err),
            MetadataError::Status(status) => write!(f, "http {}", status),
            MetadataError::Auth(message) => write!(f, "auth error: {}", message),
            MetadataError::Timeout(limit) => write!(f, "timed out after {:?}", limit),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<reqwest::Error> for MetadataError {
    fn from(err: reqwest::Error) -> Self {
        MetadataError::Http(err)
    }
}

enum Lookup {
    Found(TrackMatch),
    Missing,
    Failed(MetadataError),
}

#[derive(Clone, Debug)]
pub struct EnrichConfig {
    pub timeout: Duration,
    pub fallback_image_url: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            fallback_image_url: DEFAULT_IMAGE_URL.to_string(),
        }
    }
}

/// Never fails: any lookup failure yields the fallback record.
pub struct Enricher<P> {
    provider: P,
    config: EnrichConfig,
}

impl<P: MetadataProvider> Enricher<P> {
    pub fn new(provider: P, config: EnrichConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn enrich(&self, title: &str, artist: &str) -> TrackDetails {
        match self.lookup(title, artist).await {
            Lookup::Found(track) => details_from_match(track, artist, &self.config.fallback_image_url),
            Lookup::Missing => {
                debug!("No metadata match for {:?} by {:?}", title, artist);
                TrackDetails::fallback(artist, &self.config.fallback_image_url)
            }
            Lookup::Failed(err) => {
                warn!("Metadata lookup failed for {:?} by {:?}: {}", title, artist, err);
                TrackDetails::fallback(artist, &self.config.fallback_image_url)
            }
        }
    }

    async fn lookup(&self, title: &str, artist: &str) -> Lookup {
        let search = self.provider.search_track(title, artist);
        match tokio::time::timeout(self.config.timeout, search).await {
            Ok(Ok(Some(track))) => Lookup::Found(track),
            Ok(Ok(None)) => Lookup::Missing,
            Ok(Err(err)) => Lookup::Failed(err),
            Err(_) => Lookup::Failed(MetadataError::Timeout(self.config.timeout)),
        }
    }
}

fn details_from_match(track: TrackMatch, artist: &str, fallback_image_url: &str) -> TrackDetails {
    let image_url = track
        .album_art_urls
        .into_iter()
        .find_map(|url| clean_text(Some(url)))
        .unwrap_or_else(|| fallback_image_url.to_string());
    let artist = clean_text(Some(track.artist)).unwrap_or_else(|| artist.to_string());
    let album = clean_text(Some(track.album)).unwrap_or_else(|| UNKNOWN_ALBUM.to_string());
    TrackDetails {
        image_url,
        artist,
        album,
        preview_url: clean_text(track.preview_url),
        source: DetailsSource::Provider,
    }
}

pub(crate) fn clean_text(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
