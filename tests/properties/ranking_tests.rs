use std::collections::HashSet;

use proptest::prelude::*;

use sohub::corpus::Document;
use sohub::recommend::{Recommender, rank_topics};
use sohub::test_utils::fixtures::{build_engine, corpus, doc};

const TAGS: &[&str] = &["python", "sql", "rust", "go", "java", "css", "git", "bash", "c", "json"];
const WORDS: &[&str] = &[
    "sort", "list", "parse", "file", "join", "table", "error", "loop", "string", "index",
];

fn documents() -> impl Strategy<Value = Vec<Document>> {
    prop::collection::vec(
        (
            prop::collection::vec(prop::sample::select(WORDS), 1..6),
            prop::collection::vec(prop::sample::select(TAGS), 1..4),
        ),
        1..30,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (words, tags))| {
                let id = i64::try_from(i).unwrap() + 100;
                doc(id, &words.join(" "), &tags.join(" "))
            })
            .collect()
    })
}

fn history_for(docs: &[Document]) -> impl Strategy<Value = Vec<i64>> + use<> {
    let ids: Vec<i64> = docs.iter().map(|d| d.id).collect();
    prop::collection::vec(prop::sample::select(ids), 0..10)
}

proptest! {
    #[test]
    fn test_find_similar_bounded_and_unique(
        docs in documents(),
        query in prop::collection::vec(prop::sample::select(WORDS), 1..4),
        top_k in 1usize..8,
    ) {
        let engine = build_engine(docs);
        let user_tags: HashSet<String> = ["sql".to_string()].into();
        let results = engine.find_similar(&query.join(" "), top_k, &user_tags).unwrap();

        prop_assert!(results.len() <= top_k);
        let ids: HashSet<i64> = results.iter().map(|r| r.document.id).collect();
        prop_assert_eq!(ids.len(), results.len());
        prop_assert!(results.windows(2).all(|w| w[0].combined_score >= w[1].combined_score));
        for r in &results {
            prop_assert!((-1.0..=1.0).contains(&r.similarity));
        }
    }

    #[test]
    fn test_exact_title_always_first(docs in documents(), pick in any::<prop::sample::Index>()) {
        let target = pick.get(&docs).title.to_uppercase();
        let engine = build_engine(docs);
        let results = engine.find_similar(&target, 3, &HashSet::new()).unwrap();
        prop_assert!(results[0].is_exact_match);
        prop_assert!((results[0].combined_score - 1.0).abs() < f32::EPSILON);
        prop_assert_eq!(results[0].document.title.to_uppercase(), target);
    }

    #[test]
    fn test_rank_topics_at_most_seven((docs, history) in documents().prop_flat_map(|d| {
        let h = history_for(&d);
        (Just(d), h)
    })) {
        let corpus = corpus(docs);
        let topics = rank_topics(&corpus, &history);
        prop_assert!(topics.len() <= 7);
        if history.is_empty() {
            prop_assert!(topics.is_empty());
        }
        let unique: HashSet<&String> = topics.iter().collect();
        prop_assert_eq!(unique.len(), topics.len());
    }

    #[test]
    fn test_recommendations_exclude_history((docs, history) in documents().prop_flat_map(|d| {
        let h = history_for(&d);
        (Just(d), h)
    }), tag in prop::sample::select(TAGS)) {
        let recommender = Recommender::new(std::sync::Arc::new(corpus(docs)));
        let seen: HashSet<i64> = history.iter().copied().collect();

        let per_tag = recommender.recommend_for_tag(tag, &history, 10).unwrap();
        prop_assert!(per_tag.iter().all(|d| !seen.contains(&d.id) && d.tags.contains(tag)));
        prop_assert!(per_tag.windows(2).all(|w| w[0].title_len() <= w[1].title_len()));

        let all = recommender.recommend_all(&history, &HashSet::new(), 10).unwrap();
        prop_assert!(all.iter().all(|r| !seen.contains(&r.document.id)));
        let ordered = all.windows(2).all(|w| {
            w[0].relevance > w[1].relevance
                || (w[0].relevance == w[1].relevance
                    && w[0].document.title_len() <= w[1].document.title_len())
        });
        prop_assert!(ordered);
    }

    #[test]
    fn test_recent_tag_ranks_at_least_as_high(filler in 0usize..5) {
        // "old" only in the oldest entry, "new" only in the newest
        let mut docs = vec![doc(1, "oldest", "old")];
        for i in 0..filler {
            docs.push(doc(10 + i64::try_from(i).unwrap(), "middle", "mid"));
        }
        docs.push(doc(2, "newest", "new"));
        let history: Vec<i64> = docs.iter().map(|d| d.id).collect();
        let topics = rank_topics(&corpus(docs), &history);

        let pos = |t: &str| topics.iter().position(|x| x == t);
        prop_assert!(pos("new") <= pos("old"));
    }
}
