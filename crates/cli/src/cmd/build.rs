//! Implementation of the `machbuild build` command.
//!
//! Runs the whole pipeline: resolve the machine, select the compiler, write
//! the macro file and hand the build to the machine's driver.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};

use machbuild_lib::driver::{BuildOptions, BuiltinDrivers};
use machbuild_lib::pipeline::{self, RunOptions, RunReport};

use crate::output::{OutputFormat, format_duration, print_info, print_json, print_stat, print_step, print_success, print_warning};

/// Arguments of the build command, as parsed from the command line.
#[derive(Debug, Clone)]
pub struct BuildArgs {
  pub config_dir: PathBuf,
  pub machine: Option<String>,
  pub compiler: Option<String>,
  pub test: bool,
  pub mpi: bool,
  pub debug: bool,
  pub source_dir: PathBuf,
  pub build_dir: PathBuf,
  pub dry_run: bool,
}

impl From<BuildArgs> for RunOptions {
  fn from(args: BuildArgs) -> Self {
    RunOptions {
      machine: args.machine,
      compiler: args.compiler,
      build: BuildOptions {
        run_tests: args.test,
        use_mpi: args.mpi,
        debug: args.debug,
      },
      config_dir: args.config_dir,
      source_dir: args.source_dir,
      build_dir: args.build_dir,
      dry_run: args.dry_run,
    }
  }
}

pub fn cmd_build(args: BuildArgs, output: OutputFormat) -> Result<()> {
  let options = RunOptions::from(args);
  let start = Instant::now();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(pipeline::run(&options, &BuiltinDrivers))
    .map_err(|err| {
      let stage = err.stage();
      anyhow::Error::new(err).context(format!("{} stage failed", stage))
    })?;

  if output.is_json() {
    return print_json(&report);
  }

  print_report(&report);
  let verb = if report.dispatch.dry_run { "Planned" } else { "Finished" };
  print_success(format!(
    "{} build for {} with {} in {}",
    verb,
    report.machine,
    report.compiler.name,
    format_duration(start.elapsed())
  ));
  Ok(())
}

fn print_report(report: &RunReport) {
  print_info(format!(
    "Configure and build for {} {}",
    report.machine, report.compiler.name
  ));
  if let Some(diagnostic) = &report.compiler.diagnostic {
    print_warning(diagnostic);
  }

  let compiler_source = if report.compiler.is_default { "default" } else { "explicit" };
  print_stat("Compiler", format!("{} ({})", report.compiler.name, compiler_source));
  print_stat("Driver", report.dispatch.driver);
  print_stat("Settings", report.settings.len());
  print_stat("Macros", report.macros_path.display());

  if report.dispatch.dry_run {
    println!();
    println!("Steps (not run):");
    for step in &report.dispatch.steps {
      print_step(step);
    }
  } else {
    print_stat("Steps run", report.dispatch.steps.len());
  }
}
