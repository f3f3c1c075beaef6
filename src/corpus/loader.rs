//! Corpus file loading.
//!
//! The corpus is a table with the columns `Id`, `Title`, `CleanTags`, `Score`
//! and `Answer`, stored as Parquet or as JSON Lines (one object per row).
//! Any unreadable or malformed row fails the whole load.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::parquet::load_parquet;
use super::{Answer, Corpus, Document, TagSet};
use crate::error::{HubError, Result};

/// On-disk row layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusRow {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "CleanTags", default)]
    pub clean_tags: Option<String>,
    #[serde(rename = "Score", default)]
    pub score: i64,
    #[serde(rename = "Answer", default)]
    pub answer: Option<String>,
}

impl From<CorpusRow> for Document {
    fn from(row: CorpusRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            tags: row.clean_tags.as_deref().map(TagSet::parse).unwrap_or_default(),
            score: row.score,
            answer: Answer::from_stored(row.answer),
        }
    }
}

/// Load a corpus file, picking the format from its extension.
///
/// `.jsonl` and `.json` are read as JSON Lines, anything else as Parquet.
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("jsonl" | "json") => load_jsonl(path),
        _ => load_parquet(path),
    }
}

/// Load a corpus from a JSON Lines file.
pub fn load_jsonl(path: &Path) -> Result<Corpus> {
    let file = File::open(path)
        .map_err(|err| HubError::CorpusLoad(format!("open {}: {err}", path.display())))?;
    let corpus = parse_jsonl(BufReader::new(file)).map_err(|err| match err {
        HubError::CorpusLoad(msg) => HubError::CorpusLoad(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    info!(path = %path.display(), rows = corpus.len(), "corpus loaded");
    Ok(corpus)
}

/// Parse JSON Lines rows from any reader. Blank lines are ignored.
pub fn parse_jsonl(reader: impl BufRead) -> Result<Corpus> {
    let mut docs = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| HubError::CorpusLoad(format!("line {}: {err}", lineno + 1)))?;
        if line.trim().is_empty() {
            continue;
        }
        let row: CorpusRow = serde_json::from_str(&line)
            .map_err(|err| HubError::CorpusLoad(format!("line {}: {err}", lineno + 1)))?;
        docs.push(Document::from(row));
    }
    debug!(rows = docs.len(), "parsed corpus rows");
    Corpus::from_documents(docs)
}
