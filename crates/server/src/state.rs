use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;
use common::{Recommendation, Song, TrackDetails};
use metadata::AnyProvider;
use recommender::Recommender;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub recommender: Arc<Recommender<AnyProvider>>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ServerInfoResponse {
    pub songs: usize,
    pub provider: String,
    pub default_recommendations: usize,
    pub history_size: usize,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct SongsQuery {
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    pub title: Option<String>,
    pub k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub count: Option<usize>,
}

#[derive(Serialize)]
pub struct SongDetails {
    pub song: Song,
    pub details: TrackDetails,
}

#[derive(Serialize)]
pub struct RecommendationsResponse {
    pub query: SongDetails,
    pub items: Vec<Recommendation>,
}

pub type JsonResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;
