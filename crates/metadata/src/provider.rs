use serde::{Deserialize, Serialize};

use crate::{MetadataError, MetadataProvider, SpotifyProvider, TrackMatch};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Spotify,
    None,
}

pub fn provider_from_str(value: &str) -> Option<Provider> {
    match value.trim().to_ascii_lowercase().as_str() {
        "spotify" | "spotify_web" => Some(Provider::Spotify),
        "none" | "offline" | "disabled" => Some(Provider::None),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineProvider;

impl MetadataProvider for OfflineProvider {
    async fn search_track(
        &self,
        _title: &str,
        _artist: &str,
    ) -> Result<Option<TrackMatch>, MetadataError> {
        Ok(None)
    }
}

#[derive(Clone)]
pub enum AnyProvider {
    Spotify(SpotifyProvider),
    Offline(OfflineProvider),
}

impl AnyProvider {
    pub fn kind(&self) -> Provider {
        match self {
            AnyProvider::Spotify(_) => Provider::Spotify,
            AnyProvider::Offline(_) => Provider::None,
        }
    }
}

impl MetadataProvider for AnyProvider {
    async fn search_track(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Option<TrackMatch>, MetadataError> {
        match self {
            AnyProvider::Spotify(provider) => provider.search_track(title, artist).await,
            AnyProvider::Offline(provider) => provider.search_track(title, artist).await,
        }
    }
}

pub async fn test_provider(provider: &AnyProvider) -> Result<(), MetadataError> {
    match provider {
        AnyProvider::Spotify(spotify) => spotify.access_token().await.map(|_| ()),
        AnyProvider::Offline(_) => Ok(()),
    }
}
