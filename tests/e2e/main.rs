//! E2E test suite entry point.

mod answer_workflow;
mod recommend_workflow;
mod search_workflow;
