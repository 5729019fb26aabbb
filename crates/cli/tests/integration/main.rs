//! CLI integration tests for distrobuild.

mod common;

mod build_tests;
mod cli_tests;
mod plan_tests;
