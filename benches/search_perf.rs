//! Criterion benchmarks for the retrieval path.
//!
//! Performance targets:
//! - Preprocess a title: < 20us
//! - Flat index top-100 over 50k rows: < 20ms
//! - find_similar over 10k rows: < 10ms
//! - recommend_all over 10k rows: < 5ms

use std::collections::HashSet;
use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use sohub::corpus::Document;
use sohub::recommend::Recommender;
use sohub::search::embeddings::normalize_l2;
use sohub::search::{VectorIndex, preprocess};
use sohub::test_utils::fixtures::{build_engine, corpus, doc};

const WORDS: &[&str] = &[
    "sort", "list", "python", "dict", "value", "join", "table", "sql", "parse", "json", "file",
    "line", "loop", "error", "borrow", "string", "index", "query", "async", "thread",
];
const TAGS: &[&str] = &["python", "sql", "rust", "go", "java", "pandas", "json", "git"];

fn synthetic_documents(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| {
            let title: Vec<&str> = (0..6).map(|j| WORDS[(i * 7 + j * 13) % WORDS.len()]).collect();
            let tags = format!("{} {}", TAGS[i % TAGS.len()], TAGS[(i / 3) % TAGS.len()]);
            doc(i64::try_from(i).unwrap_or(i64::MAX), &title.join(" "), &tags)
        })
        .collect()
}

fn preprocess_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocess");
    group.bench_function("plain_title", |b| {
        b.iter(|| preprocess(black_box("How do I sort a dictionary by its values in Python 3?")));
    });
    group.bench_function("html_body", |b| {
        let body = "<p>Use <code>sorted(d.items(), key=lambda kv: kv[1])</code> &mdash; \
                    it returns a <em>list</em> of tuples.</p><pre>print(x)</pre>";
        b.iter(|| preprocess(black_box(body)));
    });
    group.finish();
}

fn index_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_index");
    let dims = 384;
    for rows in [1_000usize, 50_000] {
        let vectors = (0..rows).map(|r| {
            let mut v: Vec<f32> = (0..dims)
                .map(|d| (((r * 31 + d * 17) % 97) as f32) - 48.0)
                .collect();
            normalize_l2(&mut v);
            v
        });
        let index = VectorIndex::build(dims, vectors).unwrap();
        let mut query: Vec<f32> = (0..dims).map(|d| (d % 11) as f32).collect();
        normalize_l2(&mut query);

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("top100", rows), &index, |b, index| {
            b.iter(|| index.search(black_box(&query), 100).unwrap());
        });
    }
    group.finish();
}

fn hybrid_benchmarks(c: &mut Criterion) {
    let engine = build_engine(synthetic_documents(10_000));
    let user_tags: HashSet<String> = ["sql".to_string()].into();
    c.bench_function("find_similar_10k", |b| {
        b.iter(|| {
            engine
                .find_similar(black_box("parse json file in python"), 5, &user_tags)
                .unwrap()
        });
    });
}

fn recommend_benchmarks(c: &mut Criterion) {
    let recommender = Recommender::new(Arc::new(corpus(synthetic_documents(10_000))));
    let history: Vec<i64> = (0..50).map(|i| i * 37).collect();
    let profile_tags: HashSet<String> = ["rust".to_string()].into();

    let mut group = c.benchmark_group("recommend");
    group.bench_function("rank_topics", |b| {
        b.iter(|| recommender.rank_topics(black_box(&history)));
    });
    group.bench_function("recommend_all_10k", |b| {
        b.iter(|| {
            recommender
                .recommend_all(black_box(&history), &profile_tags, 10)
                .unwrap()
        });
    });
    group.bench_function("recommend_for_tag_10k", |b| {
        b.iter(|| {
            recommender
                .recommend_for_tag(black_box("python"), &history, 5)
                .unwrap()
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    preprocess_benchmarks,
    index_benchmarks,
    hybrid_benchmarks,
    recommend_benchmarks
);
criterion_main!(benches);
