//! Corpus and engine fixtures shared by unit and integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use crate::corpus::{Answer, Corpus, Document, TagSet, write_parquet};
use crate::search::{HashEmbedder, SearchEngine, build_index};

/// Embedding width used by test engines.
pub const TEST_DIMS: usize = 256;

/// A question with score 0 and an empty answer body.
#[must_use]
pub fn doc(id: i64, title: &str, tags: &str) -> Document {
    Document {
        id,
        title: title.to_string(),
        tags: TagSet::parse(tags),
        score: 0,
        answer: Answer::Body(String::new()),
    }
}

/// Same as [`doc`] with an explicit community score.
#[must_use]
pub fn scored_doc(id: i64, title: &str, tags: &str, score: i64) -> Document {
    Document {
        score,
        ..doc(id, title, tags)
    }
}

#[must_use]
pub fn corpus(docs: Vec<Document>) -> Corpus {
    Corpus::from_documents(docs).expect("fixture corpus has unique ids")
}

/// Engine over `docs` with a hash embedder and a freshly built index.
#[must_use]
pub fn build_engine(docs: Vec<Document>) -> SearchEngine {
    let corpus = Arc::new(corpus(docs));
    let embedder = Arc::new(HashEmbedder::new(TEST_DIMS));
    let index = build_index(&corpus, embedder.as_ref()).expect("fixture index builds");
    SearchEngine::new(corpus, Arc::new(index), embedder).expect("fixture engine is aligned")
}

/// Small mixed-topic corpus used by end-to-end tests.
#[must_use]
pub fn sample_documents() -> Vec<Document> {
    vec![
        scored_doc(1, "Sort a list in python", "python list", 40),
        scored_doc(2, "Sort a dict by value", "python dict", 120),
        scored_doc(3, "Select rows with a join in SQL", "sql join", 15),
        scored_doc(4, "Parse JSON in python", "python json", 60),
        scored_doc(5, "Create an index on a table", "sql index", 8),
        scored_doc(6, "Borrow checker error in a loop", "rust borrow-checker", 33),
        scored_doc(7, "Read a file line by line", "python file", 75),
        Document {
            answer: Answer::Closed,
            ..scored_doc(8, "Why does my code not work", "python", -3)
        },
    ]
}

/// Render documents as corpus JSON Lines.
#[must_use]
pub fn to_jsonl(docs: &[Document]) -> String {
    docs.iter()
        .map(|d| {
            let answer = match &d.answer {
                Answer::Body(body) => body.clone(),
                Answer::Closed => crate::corpus::CLOSED_SENTINEL.to_string(),
            };
            serde_json::json!({
                "Id": d.id,
                "Title": d.title,
                "CleanTags": d.tags.to_string(),
                "Score": d.score,
                "Answer": answer,
            })
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Test fixture providing an isolated data root.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTestFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        println!("[FIXTURE] Created temp directory: {root:?}");
        Self { temp_dir, root }
    }

    /// Create a file under the root.
    #[must_use]
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Write `docs` as `corpus.parquet` under the root.
    #[must_use]
    pub fn create_corpus(&self, docs: &[Document]) -> PathBuf {
        let path = self.root.join("corpus.parquet");
        write_parquet(docs, &path).expect("Failed to write parquet corpus");
        println!("[FIXTURE] Created corpus: {path:?} ({} rows)", docs.len());
        path
    }
}

impl Drop for UnitTestFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.root);
    }
}
