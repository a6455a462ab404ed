pub mod recommendations;
pub mod server;
pub mod songs;

use axum::{response::IntoResponse, routing::get, Json, Router};

use crate::state::{AppState, HealthResponse};

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/server/info", get(server::get_info))
        .route("/songs", get(songs::list_songs))
        .route("/songs/details", get(songs::song_details))
        .route("/recommendations", get(recommendations::get_recommendations))
        .route("/history", get(recommendations::get_history))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use catalog::{CatalogEntry, CatalogStore};
    use metadata::{AnyProvider, EnrichConfig, Enricher, OfflineProvider, Provider};
    use recommender::Recommender;
    use serde_json::Value;
    use tower::util::ServiceExt;

    use super::api_router;
    use crate::config::ServerConfig;
    use crate::state::AppState;

    fn app() -> Router {
        let entries = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|title| CatalogEntry {
                song: title.to_string(),
                artist: format!("{} artist", title),
            })
            .collect();
        let rows = vec![
            vec![1.0, 0.9, 0.9, 0.3, 0.1],
            vec![0.9, 1.0, 0.2, 0.4, 0.5],
            vec![0.9, 0.2, 1.0, 0.6, 0.7],
            vec![0.3, 0.4, 0.6, 1.0, 0.8],
            vec![0.1, 0.5, 0.7, 0.8, 1.0],
        ];
        let store = Arc::new(CatalogStore::from_parts(entries, rows).unwrap());
        let enricher = Enricher::new(
            AnyProvider::Offline(OfflineProvider),
            EnrichConfig {
                timeout: Duration::from_secs(1),
                ..EnrichConfig::default()
            },
        );
        let mut config = ServerConfig::default();
        config.metadata.provider = Provider::None;
        api_router(AppState {
            config: Arc::new(config),
            recommender: Arc::new(Recommender::new(store, enricher, 2)),
        })
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn recommendations_are_ranked_with_fallbacks() {
        let (status, body) = get("/recommendations?title=A&k=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"]["song"]["index"], 0);
        let items = body["items"].as_array().unwrap();
        let titles: Vec<&str> = items
            .iter()
            .map(|item| item["song"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["B", "C", "D"]);
        assert_eq!(items[0]["album"], "Unknown Album");
        assert_eq!(items[0]["image_url"], common::DEFAULT_IMAGE_URL);
        assert!(items[0]["preview_url"].is_null());
    }

    #[tokio::test]
    async fn default_k_is_capped_by_catalog() {
        let (status, body) = get("/recommendations?title=E").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn unknown_title_is_404() {
        let (status, body) = get("/recommendations?title=no-such-song").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "song not found: no-such-song");
    }

    #[tokio::test]
    async fn blank_title_is_400() {
        let (status, body) = get("/recommendations?title=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "title is required");
    }

    #[tokio::test]
    async fn missing_title_is_json_400() {
        for uri in ["/recommendations", "/songs/details"] {
            let (status, body) = get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "title is required");
        }
    }

    #[tokio::test]
    async fn malformed_numbers_are_json_400() {
        for uri in [
            "/recommendations?title=A&k=abc",
            "/songs?limit=many",
            "/history?count=-1",
        ] {
            let (status, body) = get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].as_str().unwrap().contains("Failed to deserialize"));
        }
    }

    #[tokio::test]
    async fn lists_and_searches_songs() {
        let (status, body) = get("/songs?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 5);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);

        let (_, body) = get("/songs?search=d%20artist").await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["title"], "D");
    }

    #[tokio::test]
    async fn song_details_fall_back_offline() {
        let (status, body) = get("/songs/details?title=C").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["details"]["artist"], "C artist");
        assert_eq!(body["details"]["source"], "fallback");
    }

    #[tokio::test]
    async fn history_samples_distinct_songs() {
        let (status, body) = get("/history?count=3").await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 3);
        let mut indices: Vec<u64> = items
            .iter()
            .map(|item| item["song"]["index"].as_u64().unwrap())
            .collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), 3);
    }

    #[tokio::test]
    async fn server_info_reports_catalog() {
        let (_, body) = get("/server/info").await;
        assert_eq!(body["songs"], 5);
        assert_eq!(body["provider"], "none");
    }
}
