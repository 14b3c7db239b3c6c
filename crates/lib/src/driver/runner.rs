//! Child process execution for build steps.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use super::{DispatchError, Step};

/// Runs build steps one at a time.
///
/// Output is inherited so configure and compiler messages reach the user as
/// they happen. In dry-run mode steps are logged and skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepRunner {
  dry_run: bool,
}

impl StepRunner {
  pub fn new() -> Self {
    Self { dry_run: false }
  }

  pub fn dry_run() -> Self {
    Self { dry_run: true }
  }

  pub fn is_dry_run(&self) -> bool {
    self.dry_run
  }

  /// Run `step` with `cwd` as its working directory.
  pub async fn run(&self, step: &Step, cwd: &Path) -> Result<(), DispatchError> {
    if self.dry_run {
      info!(cmd = %step, "dry run, skipping command");
      return Ok(());
    }

    info!(cmd = %step, "executing command");
    debug!(working_dir = ?cwd, "spawning process");

    let status = Command::new(&step.program)
      .args(&step.args)
      .current_dir(cwd)
      .status()
      .await
      .map_err(|source| DispatchError::Spawn {
        cmd: step.to_string(),
        source,
      })?;

    if !status.success() {
      return Err(DispatchError::StepFailed {
        cmd: step.to_string(),
        code: status.code(),
      });
    }

    Ok(())
  }
}
