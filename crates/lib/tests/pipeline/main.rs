//! End-to-end tests for the distribution build pipeline.

#![cfg(unix)]

mod common;
mod end_to_end_tests;
