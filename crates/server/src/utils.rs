use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::Json;
use recommender::RecommendError;

use crate::state::ErrorResponse;

pub fn json_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn recommend_error(err: RecommendError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        RecommendError::NotFound(_) => json_error(StatusCode::NOT_FOUND, err.to_string()),
    }
}

pub fn query_params<T>(
    query: Result<Query<T>, QueryRejection>,
) -> Result<T, (StatusCode, Json<ErrorResponse>)> {
    match query {
        Ok(Query(params)) => Ok(params),
        Err(rejection) => Err(json_error(StatusCode::BAD_REQUEST, rejection.body_text())),
    }
}

// Lookup is exact, so a non-blank title is passed on untrimmed.
pub fn require_title(title: Option<&str>) -> Result<&str, (StatusCode, Json<ErrorResponse>)> {
    match title {
        Some(title) if !title.trim().is_empty() => Ok(title),
        _ => Err(json_error(StatusCode::BAD_REQUEST, "title is required")),
    }
}
