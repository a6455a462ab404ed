use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_URL: &str = "https://i.postimg.cc/0QNxYz4V/social.png";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub index: usize,
    pub title: String,
    pub artist: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailsSource {
    Provider,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackDetails {
    pub image_url: String,
    pub artist: String,
    pub album: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    pub source: DetailsSource,
}

impl TrackDetails {
    pub fn fallback(artist: &str, image_url: &str) -> Self {
        Self {
            image_url: image_url.to_string(),
            artist: artist.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            preview_url: None,
            source: DetailsSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DetailsSource::Fallback
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub index: usize,
    pub song: String,
    pub artist: String,
    pub score: f32,
    pub album: String,
    pub image_url: String,
    #[serde(default)]
    pub preview_url: Option<String>,
}

impl Recommendation {
    // Keeps the catalog artist; the provider's spelling only lands in `details`.
    pub fn from_details(song: &Song, score: f32, details: TrackDetails) -> Self {
        Self {
            index: song.index,
            song: song.title.clone(),
            artist: song.artist.clone(),
            score,
            album: details.album,
            image_url: details.image_url,
            preview_url: details.preview_url,
        }
    }
}
