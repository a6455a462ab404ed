mod engine;
mod history;

pub use engine::{rank, RecommendError, Recommender, DEFAULT_MAX_CONCURRENCY};
pub use history::sample_history;
