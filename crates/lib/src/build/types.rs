//! Result types for a build run.

use std::path::PathBuf;

use serde::Serialize;

use crate::matrix::BuildTarget;

/// A target whose distribution was written.
#[derive(Debug, Clone, Serialize)]
pub struct PackagedTarget {
  pub target: BuildTarget,
  pub output: PathBuf,
}

/// A target that was skipped because its installer run or packaging failed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedTarget {
  pub target: BuildTarget,
  pub reason: String,
}

/// What a completed run produced, in target discovery order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
  pub packaged: Vec<PackagedTarget>,
  pub failed: Vec<FailedTarget>,
}

impl BuildReport {
  /// True if every discovered target was packaged.
  pub fn is_success(&self) -> bool {
    self.failed.is_empty()
  }

  pub fn total(&self) -> usize {
    self.packaged.len() + self.failed.len()
  }

  pub(crate) fn record(&mut self, target: BuildTarget, outcome: TargetOutcome) {
    match outcome {
      TargetOutcome::Packaged(output) => self.packaged.push(PackagedTarget { target, output }),
      TargetOutcome::Failed(reason) => self.failed.push(FailedTarget { target, reason }),
    }
  }
}

/// How one target ended without aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TargetOutcome {
  Packaged(PathBuf),
  Failed(String),
}
