//! Top-answer lookup against the Stack Exchange API.

pub mod client;

pub use client::{AnswerClient, AnswerClientConfig, FETCH_FAILED_PREFIX, NO_ANSWERS_MESSAGE};
