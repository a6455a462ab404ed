use axum::{extract::State, Json};
use metadata::Provider;

use crate::state::{AppState, ServerInfoResponse};

pub async fn get_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    let provider = match state.config.metadata.provider {
        Provider::Spotify => "spotify",
        Provider::None => "none",
    };
    Json(ServerInfoResponse {
        songs: state.recommender.store().len(),
        provider: provider.to_string(),
        default_recommendations: state.config.default_recommendations,
        history_size: state.config.history_size,
    })
}
