use std::cmp::Ordering;
use std::sync::Arc;

use catalog::{CatalogStore, LookupError};
use common::{Recommendation, Song, TrackDetails};
use futures_util::stream::{self, StreamExt};
use metadata::{Enricher, MetadataProvider};
use tracing::{debug, info};

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    NotFound(String),
}

impl std::fmt::Display for RecommendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecommendError::NotFound(title) => write!(f, "song not found: {}", title),
        }
    }
}

impl std::error::Error for RecommendError {}

impl From<LookupError> for RecommendError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(title) => RecommendError::NotFound(title),
        }
    }
}

// Ties go to the lower index. Only `query_index` itself is excluded, so a
// duplicate title elsewhere stays eligible.
pub fn rank(store: &CatalogStore, query_index: usize, k: usize) -> Vec<(usize, f32)> {
    if k == 0 {
        return Vec::new();
    }
    let mut ranked: Vec<(usize, f32)> = store
        .scores_for(query_index)
        .filter(|(index, _)| *index != query_index)
        .collect();
    if k < ranked.len() {
        ranked.select_nth_unstable_by(k - 1, by_score_then_index);
        ranked.truncate(k);
    }
    ranked.sort_unstable_by(by_score_then_index);
    ranked
}

// Scores are finite (checked at load), so partial_cmp always answers.
fn by_score_then_index(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then(a.0.cmp(&b.0))
}

pub struct Recommender<P> {
    store: Arc<CatalogStore>,
    enricher: Arc<Enricher<P>>,
    max_concurrency: usize,
}

impl<P: MetadataProvider> Recommender<P> {
    pub fn new(store: Arc<CatalogStore>, enricher: Enricher<P>, max_concurrency: usize) -> Self {
        Self {
            store,
            enricher: Arc::new(enricher),
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn rank(&self, query_index: usize, k: usize) -> Vec<(usize, f32)> {
        rank(&self.store, query_index, k)
    }

    pub async fn recommend(
        &self,
        title: &str,
        k: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let query_index = self.store.resolve_index(title)?;
        Ok(self.recommend_at(query_index, k).await)
    }

    pub async fn recommend_at(&self, query_index: usize, k: usize) -> Vec<Recommendation> {
        debug!(query_index, k, "Ranking neighbours");
        let ranked = self.rank(query_index, k);
        if ranked.is_empty() {
            return Vec::new();
        }

        let songs = ranked
            .iter()
            .map(|(index, _)| self.store.songs()[*index].clone())
            .collect();
        let described = self.describe(songs).await;

        let fallbacks = described
            .iter()
            .filter(|(_, details)| details.is_fallback())
            .count();
        info!(
            query_index,
            returned = described.len(),
            fallbacks,
            "Recommended songs for {:?}",
            self.store.songs()[query_index].title
        );

        described
            .into_iter()
            .zip(ranked)
            .map(|((song, details), (_, score))| Recommendation::from_details(&song, score, details))
            .collect()
    }

    pub async fn details(&self, title: &str) -> Result<(Song, TrackDetails), RecommendError> {
        let index = self.store.resolve_index(title)?;
        Ok(self.details_at(index).await)
    }

    pub async fn details_at(&self, index: usize) -> (Song, TrackDetails) {
        let song = self.store.songs()[index].clone();
        let details = self.enricher.enrich(&song.title, &song.artist).await;
        (song, details)
    }

    // Output order matches input order.
    pub async fn describe(&self, songs: Vec<Song>) -> Vec<(Song, TrackDetails)> {
        let enricher = Arc::clone(&self.enricher);
        stream::iter(songs)
            .map(move |song| {
                let enricher = Arc::clone(&enricher);
                async move {
                    let details = enricher.enrich(&song.title, &song.artist).await;
                    (song, details)
                }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await
    }
}
