//! Build dispatch.
//!
//! A [`BuildDriver`] knows how to configure, build and test the library on one
//! kind of machine. Drivers only describe the commands to run as [`Step`]s;
//! [`dispatch`] looks the driver up in a [`DriverRegistry`] and hands the steps
//! to a [`StepRunner`].
//!
//! # Submodules
//!
//! - [`machines`] - built-in drivers for known machines
//! - [`runner`] - child process execution

pub mod machines;
pub mod runner;

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::machine::MachineId;

pub use machines::{BatchLauncher, BuiltinDrivers, ClusterDriver, DesktopDriver, KnownMachine};
pub use runner::StepRunner;

/// Errors that can occur while dispatching a build.
#[derive(Debug, Error)]
pub enum DispatchError {
  #[error("no build driver registered for machine {machine}")]
  UnknownPlatformDriver { machine: MachineId },

  #[error("failed to start `{cmd}`: {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: io::Error,
  },

  #[error("command failed with exit code {code:?}: {cmd}")]
  StepFailed { cmd: String, code: Option<i32> },
}

/// Run modifiers supplied once at entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildOptions {
  pub run_tests: bool,
  pub use_mpi: bool,
  pub debug: bool,
}

/// Everything a driver needs to produce its steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
  pub machine: MachineId,
  pub compiler: String,
  pub options: BuildOptions,
  pub source_dir: PathBuf,
  pub build_dir: PathBuf,
}

/// One external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
  pub program: String,
  pub args: Vec<String>,
}

impl Step {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Run this step through a launcher, e.g. a batch scheduler.
  pub fn wrapped_in(self, launcher: Vec<String>) -> Self {
    let mut parts = launcher.into_iter();
    match parts.next() {
      Some(program) => Step::new(program).args(parts).arg(self.program).args(self.args),
      None => self,
    }
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// A machine-specific configure/build/test recipe.
pub trait BuildDriver {
  /// Short name for logs and reports.
  fn name(&self) -> &'static str;

  fn request(&self) -> &BuildRequest;

  fn configure(&self) -> Vec<Step>;

  fn build(&self) -> Vec<Step>;

  fn test(&self) -> Vec<Step>;

  /// Full sequence: configure, build, and test when requested.
  fn meta_build(&self) -> Vec<Step> {
    let mut steps = self.configure();
    steps.extend(self.build());
    if self.request().options.run_tests {
      steps.extend(self.test());
    }
    steps
  }
}

/// Lookup of drivers by machine.
pub trait DriverRegistry {
  fn driver_for(&self, request: &BuildRequest) -> Option<Box<dyn BuildDriver>>;
}

/// What a dispatch did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
  pub machine: MachineId,
  pub compiler: String,
  pub driver: &'static str,
  pub steps: Vec<Step>,
  pub dry_run: bool,
}

/// Build `request` with the driver registered for its machine.
///
/// Steps run in order and the first failure stops the build.
pub async fn dispatch(
  request: BuildRequest,
  registry: &impl DriverRegistry,
  runner: &StepRunner,
) -> Result<DispatchReport, DispatchError> {
  let driver = registry
    .driver_for(&request)
    .ok_or_else(|| DispatchError::UnknownPlatformDriver {
      machine: request.machine.clone(),
    })?;

  let steps = driver.meta_build();
  info!(
    machine = %request.machine,
    compiler = %request.compiler,
    driver = driver.name(),
    steps = steps.len(),
    "dispatching build"
  );

  for step in &steps {
    runner.run(step, &request.source_dir).await?;
  }

  Ok(DispatchReport {
    machine: request.machine,
    compiler: request.compiler,
    driver: driver.name(),
    steps,
    dry_run: runner.is_dry_run(),
  })
}
