//! E2E Scenario: top-answer lookup against a mocked Stack Exchange API
//!
//! - accepted answer preferred over the highest voted one
//! - empty answer list and transport failures degrade to text
//! - successful lookups are cached, failures are not

use httpmock::prelude::*;
use serde_json::json;

use sohub::answers::{AnswerClient, AnswerClientConfig, FETCH_FAILED_PREFIX, NO_ANSWERS_MESSAGE};

fn client(server: &MockServer) -> AnswerClient {
    AnswerClient::new(AnswerClientConfig {
        api_base: server.base_url(),
        ..AnswerClientConfig::default()
    })
    .unwrap()
}

fn answers_path(id: i64) -> String {
    format!("/questions/{id}/answers")
}

#[test]
fn test_accepted_answer_preferred() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path(answers_path(11))
            .query_param("site", "stackoverflow")
            .query_param("sort", "votes")
            .query_param("filter", "withbody");
        then.status(200).json_body(json!({
            "items": [
                {"answer_id": 1, "is_accepted": false, "score": 90, "body": "<p>most votes</p>"},
                {"answer_id": 2, "is_accepted": true, "score": 12, "body": "<p>accepted</p>"}
            ],
            "has_more": false
        }));
    });

    assert_eq!(client(&server).fetch_top_answer(11), "<p>accepted</p>");
    mock.assert();
}

#[test]
fn test_highest_voted_without_accepted() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(answers_path(12));
        then.status(200).json_body(json!({
            "items": [
                {"is_accepted": false, "body": "first"},
                {"is_accepted": false, "body": "second"}
            ]
        }));
    });

    assert_eq!(client(&server).fetch_top_answer(12), "first");
}

#[test]
fn test_no_answers_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(answers_path(13));
        then.status(200).json_body(json!({"items": []}));
    });

    assert_eq!(client(&server).fetch_top_answer(13), NO_ANSWERS_MESSAGE);
}

#[test]
fn test_success_is_cached() {
    let server = MockServer::start();
    let mut mock = server.mock(|when, then| {
        when.method(GET).path(answers_path(14));
        then.status(200)
            .json_body(json!({"items": [{"is_accepted": true, "body": "cached body"}]}));
    });

    let client = client(&server);
    assert_eq!(client.fetch_top_answer(14), "cached body");
    mock.delete();

    // served from the cache, the server no longer knows this path
    assert_eq!(client.fetch_top_answer(14), "cached body");
    assert_eq!(client.cache_stats().hits, 1);
}

#[test]
fn test_http_error_degrades_and_is_not_cached() {
    let server = MockServer::start();
    let mut failing = server.mock(|when, then| {
        when.method(GET).path(answers_path(15));
        then.status(502);
    });

    let client = client(&server);
    let text = client.fetch_top_answer(15);
    assert!(text.starts_with(FETCH_FAILED_PREFIX));
    assert!(text.contains("502"));
    failing.delete();

    server.mock(|when, then| {
        when.method(GET).path(answers_path(15));
        then.status(200)
            .json_body(json!({"items": [{"is_accepted": false, "body": "recovered"}]}));
    });
    assert_eq!(client.fetch_top_answer(15), "recovered");
}

#[test]
fn test_malformed_body_degrades() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(answers_path(16));
        then.status(200).body("not json");
    });

    let text = client(&server).fetch_top_answer(16);
    assert!(text.starts_with(FETCH_FAILED_PREFIX));
}

#[test]
fn test_unreachable_service_degrades() {
    let client = AnswerClient::new(AnswerClientConfig {
        api_base: "http://127.0.0.1:9".to_string(),
        ..AnswerClientConfig::default()
    })
    .unwrap();

    assert!(client.try_fetch_top_answer(17).is_err());
    assert!(client.fetch_top_answer(17).starts_with(FETCH_FAILED_PREFIX));
}
