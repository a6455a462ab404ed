use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::{clean_text, MetadataError, MetadataProvider, TrackMatch};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SEARCH_URL: &str = "https://api.spotify.com/v1/search";
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(30);

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

// Concurrent callers that miss the cache wait on `refresh`, so only one of
// them hits the token endpoint.
#[derive(Default)]
struct TokenCache {
    current: Mutex<Option<CachedToken>>,
    refresh: tokio::sync::Mutex<()>,
}

impl TokenCache {
    fn current(&self) -> Option<String> {
        let guard = self.current.lock();
        guard
            .as_ref()
            .filter(|token| token.expires_at > Instant::now())
            .map(|token| token.access_token.clone())
    }

    fn clear(&self) {
        *self.current.lock() = None;
    }

    async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<String, MetadataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedToken, MetadataError>>,
    {
        if let Some(token) = self.current() {
            return Ok(token);
        }
        let _refreshing = self.refresh.lock().await;
        if let Some(token) = self.current() {
            return Ok(token);
        }
        let fresh = fetch().await?;
        let value = fresh.access_token.clone();
        *self.current.lock() = Some(fresh);
        Ok(value)
    }
}

#[derive(Clone)]
pub struct SpotifyProvider {
    client: Client,
    client_id: String,
    client_secret: String,
    timeout: Duration,
    token: Arc<TokenCache>,
}

impl SpotifyProvider {
    pub fn new(client: Client, client_id: &str, client_secret: &str, timeout: Duration) -> Self {
        Self {
            client,
            client_id: client_id.trim().to_string(),
            client_secret: client_secret.trim().to_string(),
            timeout,
            token: Arc::new(TokenCache::default()),
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    pub async fn access_token(&self) -> Result<String, MetadataError> {
        self.token.get_or_refresh(|| self.request_token()).await
    }

    async fn request_token(&self) -> Result<CachedToken, MetadataError> {
        if !self.has_credentials() {
            return Err(MetadataError::Auth(
                "client_id and client_secret are required".to_string(),
            ));
        }
        let response = self
            .client
            .post(TOKEN_URL)
            .timeout(self.timeout)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(MetadataError::Auth(format!("http {}", response.status())));
        }
        let payload = response.json::<TokenResponse>().await?;
        debug!("Fetched Spotify token valid for {}s", payload.expires_in);
        let lifetime = Duration::from_secs(payload.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        Ok(CachedToken {
            access_token: payload.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

impl MetadataProvider for SpotifyProvider {
    async fn search_track(
        &self,
        title: &str,
        artist: &str,
    ) -> Result<Option<TrackMatch>, MetadataError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}?q={}&type=track&limit=1",
            SEARCH_URL,
            url_escape(&search_query(title, artist))
        );
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .bearer_auth(token)
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.token.clear();
        }
        if !status.is_success() {
            return Err(MetadataError::Status(status.as_u16()));
        }
        let payload = response.json::<SearchResponse>().await?;
        Ok(track_match_from_response(payload))
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    album: Option<SpotifyAlbum>,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
    preview_url: Option<String>,
}

#[derive(Deserialize)]
struct SpotifyAlbum {
    name: Option<String>,
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Deserialize)]
struct SpotifyImage {
    url: String,
}

#[derive(Deserialize)]
struct SpotifyArtist {
    name: String,
}

fn search_query(title: &str, artist: &str) -> String {
    format!("track:{} artist:{}", title.trim(), artist.trim())
}

fn track_match_from_response(payload: SearchResponse) -> Option<TrackMatch> {
    let track = payload.tracks?.items.into_iter().next()?;
    let (album, album_art_urls) = match track.album {
        Some(album) => (
            album.name.unwrap_or_default(),
            album.images.into_iter().map(|image| image.url).collect(),
        ),
        None => (String::new(), Vec::new()),
    };
    let artist = track
        .artists
        .into_iter()
        .next()
        .map(|artist| artist.name)
        .unwrap_or_default();
    Some(TrackMatch {
        album_art_urls,
        artist,
        album,
        preview_url: clean_text(track.preview_url),
    })
}

fn url_escape(input: &str) -> String {
    let mut out = String::new();
    for byte in input.as_bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'~' => out.push(*byte as char),
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
