//! Recency-weighted topic ranking over a user's viewing history.

use std::collections::HashMap;

use tracing::trace;

use crate::corpus::Corpus;

/// Default number of topics returned by [`TopicRanker::rank`].
pub const DEFAULT_MAX_TOPICS: usize = 7;

/// Derives a user's most prominent tags from ordered history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicRanker {
    max_topics: usize,
}

impl Default for TopicRanker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOPICS)
    }
}

impl TopicRanker {
    #[must_use]
    pub const fn new(max_topics: usize) -> Self {
        Self { max_topics }
    }

    #[must_use]
    pub const fn max_topics(&self) -> usize {
        self.max_topics
    }

    /// Rank tags by recency-weighted occurrence, most prominent first.
    ///
    /// Entries are weighted linearly from 1.0 (oldest) to 2.0 (newest) and
    /// each entry contributes `floor(weight)` occurrences of every tag it
    /// carries. Equal counts keep first-seen order.
    #[must_use]
    pub fn rank(&self, corpus: &Corpus, history: &[i64]) -> Vec<String> {
        let entries = corpus.resolve_history(history);
        let n = entries.len();
        if n == 0 || self.max_topics == 0 {
            return Vec::new();
        }

        let mut position: HashMap<&str, usize> = HashMap::new();
        let mut tally: Vec<(&str, usize)> = Vec::new();
        for (i, doc) in entries.iter().enumerate() {
            let copies = recency_multiplier(i, n);
            for tag in doc.tags.iter() {
                let slot = *position.entry(tag).or_insert_with(|| {
                    tally.push((tag, 0));
                    tally.len() - 1
                });
                tally[slot].1 += copies;
            }
        }

        // Stable: ties stay in first-seen order.
        tally.sort_by(|a, b| b.1.cmp(&a.1));
        tally.truncate(self.max_topics);
        trace!(entries = n, ?tally, "ranked topics");
        tally.into_iter().map(|(tag, _)| tag.to_string()).collect()
    }
}

/// `floor(1 + i / (n - 1))`, the integer part of the linear recency weight.
///
/// Only the newest entry of a multi-entry history reaches 2.
const fn recency_multiplier(i: usize, n: usize) -> usize {
    if n <= 1 { 1 } else { 1 + i / (n - 1) }
}

/// Rank topics with the default limit of seven.
#[must_use]
pub fn rank_topics(corpus: &Corpus, history: &[i64]) -> Vec<String> {
    TopicRanker::default().rank(corpus, history)
}
