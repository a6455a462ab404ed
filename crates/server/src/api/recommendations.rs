use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use recommender::sample_history;
use tracing::debug;

use crate::state::{
    AppState, HistoryQuery, JsonResult, RecommendQuery, RecommendationsResponse, SongDetails,
};
use crate::utils::{query_params, recommend_error, require_title};

const MAX_RECOMMENDATIONS: usize = 50;
const MAX_HISTORY: usize = 20;

pub async fn get_recommendations(
    State(state): State<AppState>,
    query: Result<Query<RecommendQuery>, QueryRejection>,
) -> JsonResult<RecommendationsResponse> {
    let params = query_params(query)?;
    let title = require_title(params.title.as_deref())?;
    let k = params
        .k
        .unwrap_or(state.config.default_recommendations)
        .clamp(1, MAX_RECOMMENDATIONS);

    let recommender = &state.recommender;
    let index = recommender
        .store()
        .resolve_index(title)
        .map_err(|err| recommend_error(err.into()))?;
    let (items, (song, details)) =
        tokio::join!(recommender.recommend_at(index, k), recommender.details_at(index));

    Ok(Json(RecommendationsResponse {
        query: SongDetails { song, details },
        items,
    }))
}

pub async fn get_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> JsonResult<Vec<SongDetails>> {
    let params = query_params(query)?;
    let count = params
        .count
        .unwrap_or(state.config.history_size)
        .clamp(1, MAX_HISTORY);
    let songs = {
        let mut rng = rand::rng();
        sample_history(state.recommender.store(), count, &mut rng)
    };
    debug!("Sampled {} history songs", songs.len());

    let described = state.recommender.describe(songs).await;
    Ok(Json(
        described
            .into_iter()
            .map(|(song, details)| SongDetails { song, details })
            .collect(),
    ))
}
