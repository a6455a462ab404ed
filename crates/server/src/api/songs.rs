use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use common::Song;

use crate::state::{AppState, JsonResult, ListResponse, SongDetails, SongsQuery, TitleQuery};
use crate::utils::{query_params, recommend_error, require_title};

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 500;

pub async fn list_songs(
    State(state): State<AppState>,
    query: Result<Query<SongsQuery>, QueryRejection>,
) -> JsonResult<ListResponse<Song>> {
    let params = query_params(query)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let (items, total) = state
        .recommender
        .store()
        .search(params.search.as_deref(), limit, offset);
    Ok(Json(ListResponse { items, total }))
}

pub async fn song_details(
    State(state): State<AppState>,
    query: Result<Query<TitleQuery>, QueryRejection>,
) -> JsonResult<SongDetails> {
    let params = query_params(query)?;
    let title = require_title(params.title.as_deref())?;
    let (song, details) = state
        .recommender
        .details(title)
        .await
        .map_err(recommend_error)?;
    Ok(Json(SongDetails { song, details }))
}
