//! sohub - Stack Overflow learning hub
//!
//! Hybrid retrieval over answered questions plus recency-weighted topic
//! recommendations.

pub mod answers;
pub mod app;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod recommend;
pub mod search;
pub mod storage;
pub mod test_utils;

pub use error::{HubError, Result};
