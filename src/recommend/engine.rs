//! Per-tag, aggregate and learning-path recommendations.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::topics::TopicRanker;
use crate::corpus::{Corpus, Document};
use crate::error::{HubError, Result};

/// Default bonus for sharing a tag with the user's profile.
pub const DEFAULT_PROFILE_BONUS: u32 = 2;

/// Recommendation tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommenderConfig {
    pub max_topics: usize,
    pub profile_bonus: u32,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            max_topics: super::topics::DEFAULT_MAX_TOPICS,
            profile_bonus: DEFAULT_PROFILE_BONUS,
        }
    }
}

/// One aggregate recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation<'a> {
    pub document: &'a Document,
    pub relevance: u32,
}

/// Surfaces unseen questions from a user's history and interests.
#[derive(Debug, Clone)]
pub struct Recommender {
    corpus: Arc<Corpus>,
    ranker: TopicRanker,
    profile_bonus: u32,
}

impl Recommender {
    #[must_use]
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self::with_config(corpus, RecommenderConfig::default())
    }

    #[must_use]
    pub const fn with_config(corpus: Arc<Corpus>, config: RecommenderConfig) -> Self {
        Self {
            corpus,
            ranker: TopicRanker::new(config.max_topics),
            profile_bonus: config.profile_bonus,
        }
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Top tags from `history`, most prominent first.
    #[must_use]
    pub fn rank_topics(&self, history: &[i64]) -> Vec<String> {
        self.ranker.rank(&self.corpus, history)
    }

    /// Unseen questions tagged `tag`, shortest title first.
    pub fn recommend_for_tag(
        &self,
        tag: &str,
        history: &[i64],
        num_recs: usize,
    ) -> Result<Vec<&Document>> {
        ensure_positive(num_recs, "num_recs")?;
        let seen: HashSet<i64> = history.iter().copied().collect();

        let mut picks: Vec<&Document> = self
            .corpus
            .documents()
            .iter()
            .filter(|doc| doc.tags.contains(tag) && !seen.contains(&doc.id))
            .collect();
        picks.sort_by_key(|doc| doc.title_len());
        picks.truncate(num_recs);

        debug!(tag, returned = picks.len(), "per-tag recommendations");
        Ok(picks)
    }

    /// Per-tag recommendations for each ranked topic, in topic order.
    pub fn recommend_by_topic(
        &self,
        history: &[i64],
        num_recs: usize,
    ) -> Result<Vec<(String, Vec<&Document>)>> {
        self.rank_topics(history)
            .into_iter()
            .map(|topic| {
                let picks = self.recommend_for_tag(&topic, history, num_recs)?;
                Ok((topic, picks))
            })
            .collect()
    }

    /// Unseen questions scored against every ranked topic at once.
    ///
    /// Topic `p` of `k` is worth `k - p`; sharing any tag with
    /// `profile_tags` adds the profile bonus. Equal relevance falls back to
    /// the shorter title. Empty when no history id is in the corpus.
    pub fn recommend_all(
        &self,
        history: &[i64],
        profile_tags: &HashSet<String>,
        num_recs: usize,
    ) -> Result<Vec<Recommendation<'_>>> {
        ensure_positive(num_recs, "num_recs")?;
        if self.corpus.resolve_history(history).is_empty() {
            return Ok(Vec::new());
        }
        // Untagged history ranks no topics; the profile bonus still applies.
        let ranked = self.rank_topics(history);

        let k = ranked.len();
        let weights: Vec<(&str, u32)> = ranked
            .iter()
            .enumerate()
            .map(|(p, tag)| (tag.as_str(), u32::try_from(k - p).unwrap_or(u32::MAX)))
            .collect();
        let seen: HashSet<i64> = history.iter().copied().collect();

        let mut recs: Vec<Recommendation<'_>> = self
            .corpus
            .documents()
            .iter()
            .filter(|doc| !seen.contains(&doc.id))
            .map(|doc| {
                let topical: u32 = weights
                    .iter()
                    .filter(|(tag, _)| doc.tags.contains(tag))
                    .map(|(_, w)| w)
                    .sum();
                let bonus = if doc.tags.intersects(profile_tags) {
                    self.profile_bonus
                } else {
                    0
                };
                Recommendation {
                    document: doc,
                    relevance: topical + bonus,
                }
            })
            .collect();

        recs.sort_by(|a, b| {
            b.relevance
                .cmp(&a.relevance)
                .then_with(|| a.document.title_len().cmp(&b.document.title_len()))
        });
        recs.truncate(num_recs);

        debug!(
            topics = k,
            returned = recs.len(),
            top = recs.first().map(|r| r.relevance),
            "aggregate recommendations"
        );
        Ok(recs)
    }

    /// Highest-scored questions carrying `tag`.
    pub fn learning_path(&self, tag: &str, limit: usize) -> Result<Vec<&Document>> {
        ensure_positive(limit, "limit")?;
        let mut path: Vec<&Document> = self
            .corpus
            .documents()
            .iter()
            .filter(|doc| doc.tags.contains(tag))
            .collect();
        path.sort_by(|a, b| b.score.cmp(&a.score));
        path.truncate(limit);
        debug!(tag, returned = path.len(), "learning path");
        Ok(path)
    }
}

fn ensure_positive(value: usize, name: &str) -> Result<()> {
    if value == 0 {
        return Err(HubError::InvalidInput(format!("{name} must be positive")));
    }
    Ok(())
}
