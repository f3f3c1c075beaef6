//! Search engine for questions
//!
//! Implements hybrid search: flat inner-product vector index + exact title
//! matching + tag personalization.

use tracing::info;

use crate::corpus::Corpus;
use crate::error::Result;

pub mod cache;
pub mod context;
pub mod embeddings;
pub mod hybrid;
pub mod index;
pub mod preprocess;

pub use cache::{CacheStats, TtlCache};
pub use context::RequestContext;
pub use embeddings::{Embedder, HashEmbedder, embed_checked};
pub use hybrid::{HybridConfig, ScoredDocument, SearchEngine};
pub use index::VectorIndex;
pub use preprocess::preprocess;

/// Embed every corpus title, in row order, into a new index.
pub fn build_index(corpus: &Corpus, embedder: &dyn Embedder) -> Result<VectorIndex> {
    let vectors = corpus
        .documents()
        .iter()
        .map(|doc| embed_checked(embedder, &preprocess(&doc.title)))
        .collect::<Result<Vec<_>>>()?;
    let index = VectorIndex::build(embedder.dims(), vectors)?;
    info!(rows = index.len(), dims = index.dims(), "embedded corpus");
    Ok(index)
}
