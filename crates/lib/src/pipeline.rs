//! The resolve → select → extract → emit → dispatch pipeline.
//!
//! Each stage runs once, in order, and the first fatal error ends the run.
//! The configuration is loaded up front for hostname matching, but a load
//! failure is only reported once the machine has resolved, so a host that
//! cannot be identified fails at the `machine` stage either way.
//! An unsupported compiler is the only condition that is reported without
//! stopping: it travels in the [`RunReport`] as a diagnostic.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::compiler::{self, CompilerChoice, CompilerError};
use crate::config::{ConfigDocument, ConfigError};
use crate::consts::{MACROS_FILENAME, MACROS_NAMESPACE};
use crate::driver::{self, BuildOptions, BuildRequest, DispatchError, DispatchReport, DriverRegistry, StepRunner};
use crate::machine::{self, HostProbe, MachineError, MachineId, MachineProbe};
use crate::macros::{self, MacroError};
use crate::settings::{self, SettingsRecord};

/// A failed run, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("loading configuration: {0}")]
  Config(#[from] ConfigError),

  #[error("resolving machine: {0}")]
  Machine(#[from] MachineError),

  #[error("selecting compiler: {0}")]
  Compiler(#[from] CompilerError),

  #[error("writing macros: {0}")]
  Macros(#[from] MacroError),

  #[error("building: {0}")]
  Dispatch(#[from] DispatchError),
}

impl PipelineError {
  pub fn stage(&self) -> &'static str {
    match self {
      PipelineError::Config(_) => "config",
      PipelineError::Machine(_) => "machine",
      PipelineError::Compiler(_) => "compiler",
      PipelineError::Macros(_) => "macros",
      PipelineError::Dispatch(_) => "dispatch",
    }
  }
}

/// Options for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
  pub machine: Option<String>,
  pub compiler: Option<String>,
  pub build: BuildOptions,
  pub config_dir: PathBuf,
  /// Library source tree; the macro file is written here.
  pub source_dir: PathBuf,
  /// Build tree, relative to `source_dir` unless absolute.
  pub build_dir: PathBuf,
  pub dry_run: bool,
}

impl Default for RunOptions {
  fn default() -> Self {
    Self {
      machine: None,
      compiler: None,
      build: BuildOptions::default(),
      config_dir: PathBuf::from("."),
      source_dir: PathBuf::from("."),
      build_dir: PathBuf::from("build"),
      dry_run: false,
    }
  }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub machine: MachineId,
  pub compiler: CompilerChoice,
  pub settings: SettingsRecord,
  pub macros_path: PathBuf,
  pub dispatch: DispatchReport,
}

/// Load the configuration from `options.config_dir` and run every stage
/// against the real host.
pub async fn run(options: &RunOptions, registry: &impl DriverRegistry) -> Result<RunReport, PipelineError> {
  match ConfigDocument::load(&options.config_dir) {
    Ok(doc) => run_with(options, &doc, &HostProbe::with_config(&doc), registry).await,
    Err(err) => Err(without_config(options, &HostProbe::new(), err)),
  }
}

/// Error for a run whose configuration failed to load: the machine error
/// when the machine cannot be resolved without it, else the load error.
fn without_config(options: &RunOptions, probe: &impl MachineProbe, err: ConfigError) -> PipelineError {
  match machine::resolve(options.machine.as_deref(), probe) {
    Ok(_) => err.into(),
    Err(unresolved) => unresolved.into(),
  }
}

/// Run every stage against an already loaded configuration.
pub async fn run_with(
  options: &RunOptions,
  doc: &ConfigDocument,
  probe: &impl MachineProbe,
  registry: &impl DriverRegistry,
) -> Result<RunReport, PipelineError> {
  let machine = machine::resolve(options.machine.as_deref(), probe)?;
  let compiler = compiler::select(&machine, options.compiler.as_deref(), doc)?;

  info!(machine = %machine, compiler = %compiler.name, tests = options.build.run_tests, "configure and build");

  let settings = settings::extract(&machine, compiler.as_str(), doc).with_mpi(options.build.use_mpi);

  let source_dir = dunce::canonicalize(&options.source_dir).unwrap_or_else(|_| options.source_dir.clone());
  let macros_path = source_dir.join(MACROS_FILENAME);
  macros::emit(&settings, &macros_path, MACROS_NAMESPACE)?;

  let request = BuildRequest {
    machine: machine.clone(),
    compiler: compiler.name.clone(),
    options: options.build,
    build_dir: source_dir.join(&options.build_dir),
    source_dir,
  };
  let runner = if options.dry_run {
    StepRunner::dry_run()
  } else {
    StepRunner::new()
  };
  let dispatch = driver::dispatch(request, registry, &runner).await?;

  Ok(RunReport {
    machine,
    compiler,
    settings,
    macros_path,
    dispatch,
  })
}
