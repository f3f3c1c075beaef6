use proptest::prelude::*;

use sohub::search::embeddings::{HashEmbedder, similarity};
use sohub::search::preprocess;

fn unit_vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0, dim)
        .prop_filter("non-zero", |v| v.iter().any(|x| x.abs() > 1e-3))
}

proptest! {
    #[test]
    fn test_preprocess_idempotent(text in ".{0,200}") {
        let once = preprocess(&text);
        prop_assert_eq!(preprocess(&once), once);
    }

    #[test]
    fn test_preprocess_idempotent_on_markup(
        words in prop::collection::vec("[a-zA-Z]{1,10}", 0..12)
    ) {
        let html = format!("<div><p>{}</p></div>", words.join(" <i>x</i> "));
        let once = preprocess(&html);
        prop_assert_eq!(preprocess(&once), once);
    }

    #[test]
    fn test_preprocess_output_alphabet(text in ".{0,200}") {
        let out = preprocess(&text);
        prop_assert!(out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' '));
        prop_assert!(!out.contains("  "));
    }

    #[test]
    fn test_hash_embedding_deterministic(text in ".*") {
        let embedder = HashEmbedder::new(64);
        prop_assert_eq!(embedder.embed_text(&text), embedder.embed_text(&text));
    }

    #[test]
    fn test_similarity_symmetric_and_bounded(a in unit_vector(16), b in unit_vector(16)) {
        let ab = similarity(&a, &b);
        let ba = similarity(&b, &a);
        prop_assert!((ab - ba).abs() < 1e-6);
        prop_assert!((-1.0..=1.0).contains(&ab));
    }

    #[test]
    fn test_self_similarity_is_one(a in unit_vector(16)) {
        prop_assert!((similarity(&a, &a) - 1.0).abs() < 1e-5);
    }
}
