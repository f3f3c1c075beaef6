//! Hybrid question search: vector similarity + exact title match +
//! personalization.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::embeddings::{Embedder, embed_checked, normalize_l2};
use super::index::VectorIndex;
use super::preprocess::preprocess;
use crate::corpus::{Corpus, Document};
use crate::error::{HubError, Result};

/// Score mixing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridConfig {
    /// Weight of vector similarity in the combined score (default: 0.9)
    pub semantic_weight: f32,
    /// Weight of the tag-overlap signal (default: 0.1)
    pub personalization_weight: f32,
    /// Candidates requested from the index per requested result (default: 20)
    pub overfetch: usize,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.9,
            personalization_weight: 0.1,
            overfetch: 20,
        }
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument<'a> {
    pub document: &'a Document,
    pub similarity: f32,
    pub is_exact_match: bool,
    pub personalization_score: u8,
    pub combined_score: f32,
}

/// Read-only search engine over a loaded corpus and its aligned index.
///
/// Shared between callers behind an `Arc`; nothing here mutates after
/// construction.
pub struct SearchEngine {
    corpus: Arc<Corpus>,
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    config: HybridConfig,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("rows", &self.corpus.len())
            .field("dims", &self.index.dims())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SearchEngine {
    /// Assemble an engine, validating row alignment and dimensions.
    pub fn new(
        corpus: Arc<Corpus>,
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        if corpus.len() != index.len() {
            return Err(HubError::IndexMismatch {
                corpus: corpus.len(),
                index: index.len(),
            });
        }
        if embedder.dims() != index.dims() {
            return Err(HubError::DimensionMismatch {
                expected: index.dims(),
                actual: embedder.dims(),
            });
        }
        Ok(Self {
            corpus,
            index,
            embedder,
            config: HybridConfig::default(),
        })
    }

    #[must_use]
    pub const fn with_config(mut self, config: HybridConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    #[must_use]
    pub fn shared_corpus(&self) -> Arc<Corpus> {
        Arc::clone(&self.corpus)
    }

    /// Preprocess, embed and normalize a raw query.
    pub fn encode_query(&self, query: &str) -> Result<Vec<f32>> {
        let processed = preprocess(query);
        let mut vector = embed_checked(self.embedder.as_ref(), &processed)?;
        if vector.len() != self.index.dims() {
            return Err(HubError::DimensionMismatch {
                expected: self.index.dims(),
                actual: vector.len(),
            });
        }
        normalize_l2(&mut vector);
        Ok(vector)
    }

    /// Rank corpus questions against a free-text query.
    ///
    /// Titles equal to the query (ignoring case) always come first with a
    /// combined score of 1.0. Returns at most `top_k` unique documents.
    pub fn find_similar(
        &self,
        query: &str,
        top_k: usize,
        user_tags: &HashSet<String>,
    ) -> Result<Vec<ScoredDocument<'_>>> {
        if top_k == 0 {
            return Err(HubError::InvalidInput("top_k must be positive".into()));
        }
        if self.corpus.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.encode_query(query)?;
        let search_k = self
            .corpus
            .len()
            .min(top_k.saturating_mul(self.config.overfetch.max(1)));
        let candidates = self.index.search(&query_vector, search_k)?;

        let exact = self
            .corpus
            .exact_title_matches(query)
            .map(|doc| (doc, 1.0_f32, true));
        let semantic = candidates
            .into_iter()
            .filter_map(|(row, sim)| self.corpus.row(row).map(|doc| (doc, sim, false)));

        let mut seen = HashSet::new();
        let mut results: Vec<ScoredDocument<'_>> = exact
            .chain(semantic)
            .filter(|(doc, _, _)| seen.insert(doc.id))
            .map(|(doc, similarity, is_exact_match)| {
                self.score(doc, similarity, is_exact_match, user_tags)
            })
            .collect();

        results.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
        results.truncate(top_k);

        debug!(
            query,
            search_k,
            returned = results.len(),
            exact = results.iter().filter(|r| r.is_exact_match).count(),
            "hybrid search complete"
        );
        Ok(results)
    }

    fn score<'a>(
        &self,
        document: &'a Document,
        similarity: f32,
        is_exact_match: bool,
        user_tags: &HashSet<String>,
    ) -> ScoredDocument<'a> {
        let personalization_score = u8::from(document.tags.intersects(user_tags));
        let combined_score = if is_exact_match {
            1.0
        } else {
            self.config.semantic_weight * similarity
                + self.config.personalization_weight * f32::from(personalization_score)
        };
        ScoredDocument {
            document,
            similarity,
            is_exact_match,
            personalization_score,
            combined_score,
        }
    }
}
