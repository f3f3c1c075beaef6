//! Property test suite entry point.

mod determinism_tests;
mod ranking_tests;
