//! Topic ranking and question recommendations.
//!
//! History ids are resolved against the corpus, ranked into interest tags,
//! then used to pick questions the user has not seen yet.

pub mod engine;
pub mod topics;

pub use engine::{DEFAULT_PROFILE_BONUS, Recommendation, Recommender, RecommenderConfig};
pub use topics::{DEFAULT_MAX_TOPICS, TopicRanker, rank_topics};
