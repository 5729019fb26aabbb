//! distrobuild-lib: per-platform distribution builds driven by an external installer.
//!
//! This crate provides the pieces of the distribution build pipeline:
//! - `config`: the immutable build configuration and its declarations
//! - `matrix`: target discovery, selector filtering and static repository collection
//! - `repo`: the repository cache that materializes remote repositories
//! - `archive`: zip and tar+gzip extraction and repackaging
//! - `supervise`: installer process supervision with concurrent output draining
//! - `build`: the orchestrator that ties everything together per target

pub mod archive;
pub mod build;
pub mod config;
pub mod consts;
pub mod matrix;
pub mod repo;
pub mod supervise;
pub mod util;

pub use build::{BuildError, BuildReport, Plan, build_distros, plan_distros};
pub use config::{BuildConfig, ConfigError, Declaration};
