//! Question corpus
//!
//! The corpus is an immutable, in-memory table of historical questions loaded
//! once at startup. Row order matters: row `i` is described by vector `i` of
//! the [`VectorIndex`](crate::search::index::VectorIndex).

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HubError, Result};

pub mod loader;
pub mod parquet;

pub use loader::{CorpusRow, load_corpus, load_jsonl, parse_jsonl};
pub use parquet::{load_parquet, write_parquet};

/// Storage sentinel for questions closed without an answer.
pub const CLOSED_SENTINEL: &str = "LQ_CLOSE";

/// Ordered, de-duplicated set of tag tokens.
///
/// Membership is exact token equality, never a substring test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    /// Parse a whitespace-joined tag string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.split_whitespace().collect()
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// True if any tag is also in `other`.
    #[must_use]
    pub fn intersects(&self, other: &HashSet<String>) -> bool {
        self.0.iter().any(|t| other.contains(t))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for tag in iter {
            let tag = tag.as_ref();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        Self(tags)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

/// Stored answer body for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Answer {
    Body(String),
    /// Closed as low quality, no formal answer.
    Closed,
}

impl Answer {
    #[must_use]
    pub fn from_stored(raw: Option<String>) -> Self {
        match raw {
            Some(body) if body == CLOSED_SENTINEL => Self::Closed,
            Some(body) => Self::Body(body),
            None => Self::Body(String::new()),
        }
    }
}

/// One historical question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub tags: TagSet,
    pub score: i64,
    pub answer: Answer,
}

impl Document {
    /// Title length in characters, the difficulty proxy used by the
    /// recommenders.
    #[must_use]
    pub fn title_len(&self) -> usize {
        self.title.chars().count()
    }
}

/// Immutable question table with an id lookup.
#[derive(Debug, Default)]
pub struct Corpus {
    docs: Vec<Document>,
    by_id: HashMap<i64, usize>,
    lower_titles: Vec<String>,
}

impl Corpus {
    /// Build a corpus from rows in storage order. Duplicate ids are rejected.
    pub fn from_documents(docs: Vec<Document>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(docs.len());
        for (row, doc) in docs.iter().enumerate() {
            if by_id.insert(doc.id, row).is_some() {
                return Err(HubError::CorpusLoad(format!(
                    "duplicate document id {} at row {row}",
                    doc.id
                )));
            }
        }
        let lower_titles = docs.iter().map(|d| d.title.to_lowercase()).collect();
        Ok(Self {
            docs,
            by_id,
            lower_titles,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    #[must_use]
    pub fn row(&self, row: usize) -> Option<&Document> {
        self.docs.get(row)
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Document> {
        self.by_id.get(&id).map(|row| &self.docs[*row])
    }

    #[must_use]
    pub fn contains_id(&self, id: i64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Rows whose title equals `query` ignoring case, in corpus order.
    pub fn exact_title_matches<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Document> {
        let needle = query.to_lowercase();
        self.lower_titles
            .iter()
            .zip(self.docs.iter())
            .filter(move |(title, _)| **title == needle)
            .map(|(_, doc)| doc)
    }

    /// Resolve history ids to documents in history order.
    ///
    /// Ids missing from the corpus are skipped and a repeated id only counts
    /// at its first position.
    #[must_use]
    pub fn resolve_history(&self, history: &[i64]) -> Vec<&Document> {
        let mut seen = HashSet::new();
        history
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.get(*id))
            .collect()
    }
}
