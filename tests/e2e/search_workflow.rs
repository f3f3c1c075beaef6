//! E2E Scenario: hybrid search over a loaded corpus and index
//!
//! - corpus written as Parquet and loaded from disk
//! - index built, saved and reloaded
//! - exact title matches, personalization and history recording

use std::collections::HashSet;
use std::sync::Arc;

use sohub::corpus::load_corpus;
use sohub::search::{
    HashEmbedder, RequestContext, ScoredDocument, SearchEngine, VectorIndex, build_index,
};
use sohub::storage::{MemoryProfileStore, ProfileService};
use sohub::test_utils::fixtures::{UnitTestFixture, build_engine, doc, sample_documents};

fn engine_from_disk(fixture: &UnitTestFixture) -> SearchEngine {
    let corpus_path = fixture.create_corpus(&sample_documents());
    let corpus = Arc::new(load_corpus(&corpus_path).unwrap());
    let embedder = Arc::new(HashEmbedder::new(64));

    let index_path = fixture.root.join("index.sovx");
    build_index(&corpus, embedder.as_ref()).unwrap().save(&index_path).unwrap();
    let index = Arc::new(VectorIndex::load(&index_path).unwrap());

    SearchEngine::new(corpus, index, embedder).unwrap()
}

#[test]
fn test_exact_match_scenario() {
    let engine = build_engine(vec![
        doc(1, "Sort a list in python", "python list"),
        doc(2, "Sort a dict by value", "python dict"),
    ]);
    let results = engine
        .find_similar("sort a dict by value", 5, &HashSet::new())
        .unwrap();

    assert_eq!(results[0].document.id, 2);
    assert!((results[0].combined_score - 1.0).abs() < f32::EPSILON);
    assert_eq!(results[1].document.id, 1);
    assert!(results[1].combined_score < results[0].combined_score);
}

#[test]
fn test_search_from_disk_artifacts() {
    let fixture = UnitTestFixture::new();
    let engine = engine_from_disk(&fixture);

    let results = engine
        .find_similar("Borrow checker error in a loop", 3, &HashSet::new())
        .unwrap();
    assert_eq!(results[0].document.id, 6);
    assert!(results[0].is_exact_match);

    let ids: HashSet<i64> = results.iter().map(|r| r.document.id).collect();
    assert_eq!(ids.len(), results.len());
}

#[test]
fn test_markup_in_query_is_ignored() {
    let fixture = UnitTestFixture::new();
    let engine = engine_from_disk(&fixture);

    let plain = engine.find_similar("parse json python", 3, &HashSet::new()).unwrap();
    let marked = engine
        .find_similar("<p>parse <b>json</b> python</p>", 3, &HashSet::new())
        .unwrap();
    assert_eq!(ids(&plain), ids(&marked));
}

fn ids(results: &[ScoredDocument<'_>]) -> Vec<i64> {
    results.iter().map(|r| r.document.id).collect()
}

#[test]
fn test_personalized_search_records_top_result_once() {
    let engine = build_engine(sample_documents());
    let profiles = ProfileService::new(Arc::new(MemoryProfileStore::new()));
    profiles.add_tag("ana", "sql").unwrap();

    for _ in 0..2 {
        let ctx = RequestContext::from_profile(&profiles.get_or_create("ana").unwrap());
        let results = engine.find_similar("create index on table", 3, &ctx.tags).unwrap();
        let top = results.first().unwrap();
        assert!(top.document.tags.contains("sql"));
        assert_eq!(top.personalization_score, 1);
        profiles.record_search("ana", top.document.id).unwrap();
    }

    let profile = profiles.get_or_create("ana").unwrap();
    assert_eq!(profile.history.len(), 1);
}
