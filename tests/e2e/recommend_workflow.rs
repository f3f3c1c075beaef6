//! E2E Scenario: history-driven recommendations
//!
//! - topic ranking from a recorded history
//! - per-topic and aggregate recommendations never repeat history
//! - profile interests add a flat bonus

use std::collections::HashSet;
use std::sync::Arc;

use sohub::recommend::Recommender;
use sohub::storage::{MemoryProfileStore, ProfileService};
use sohub::test_utils::fixtures::{corpus, doc, sample_documents};

#[test]
fn test_python_then_sql_history() {
    let recommender = Recommender::new(Arc::new(corpus(vec![
        doc(1, "first", "python"),
        doc(2, "second", "python sql"),
    ])));
    assert_eq!(recommender.rank_topics(&[1, 2]), vec!["python", "sql"]);
}

#[test]
fn test_profile_bonus_scenario() {
    let recommender = Recommender::new(Arc::new(corpus(vec![
        doc(1, "Seen question", "python"),
        doc(2, "Joins", "sql"),
        doc(3, "Flexbox", "css"),
    ])));
    let profile_tags: HashSet<String> = ["sql".to_string()].into();

    let recs = recommender.recommend_all(&[1], &profile_tags, 10).unwrap();
    assert_eq!(recs[0].document.id, 2);
    assert_eq!(recs[0].relevance, 2);
    assert_eq!(recs[1].relevance, 0);
}

#[test]
fn test_full_session() {
    let recommender = Recommender::new(Arc::new(corpus(sample_documents())));
    let profiles = ProfileService::new(Arc::new(MemoryProfileStore::new()));

    for id in [1, 3, 4] {
        profiles.record_search("sam", id).unwrap();
    }
    profiles.add_tag("sam", "rust").unwrap();
    let profile = profiles.get_or_create("sam").unwrap();

    let topics = recommender.rank_topics(&profile.history);
    assert_eq!(topics[0], "python");
    assert!(topics.len() <= 7);

    let history: HashSet<i64> = profile.history.iter().copied().collect();
    for (topic, picks) in recommender.recommend_by_topic(&profile.history, 5).unwrap() {
        assert!(picks.iter().all(|d| d.tags.contains(&topic)));
        assert!(picks.iter().all(|d| !history.contains(&d.id)));
    }

    let all = recommender
        .recommend_all(&profile.history, &profile.tag_set(), 10)
        .unwrap();
    assert!(all.iter().all(|r| !history.contains(&r.document.id)));
    let rust = all.iter().find(|r| r.document.id == 6).unwrap();
    assert_eq!(rust.relevance, 2);
    assert!(all.windows(2).all(|w| w[0].relevance >= w[1].relevance));
}
