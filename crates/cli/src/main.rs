mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use machbuild_lib::consts::CONFIG_DIR_ENV_VAR;

use crate::cmd::BuildArgs;
use crate::output::OutputFormat;

/// machbuild - configure, build and test a library for the machine you are on
#[derive(Parser)]
#[command(name = "machbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve machine and compiler, write the macro file and run the build
  Build {
    /// Directory holding config_machines.json and config_compilers.json
    #[arg(env = CONFIG_DIR_ENV_VAR)]
    config_dir: PathBuf,

    /// Target machine (detected from the host when omitted)
    #[arg(short, long = "mach")]
    machine: Option<String>,

    /// Compiler (the machine's default when omitted)
    #[arg(short, long)]
    compiler: Option<String>,

    /// Run the test suite after building
    #[arg(long)]
    test: bool,

    /// Build with MPI
    #[arg(long)]
    mpi: bool,

    /// Debug build instead of release
    #[arg(long)]
    debug: bool,

    /// Library source tree; the macro file is written here
    #[arg(long, default_value = ".")]
    source_dir: PathBuf,

    /// Build tree, relative to the source tree unless absolute
    #[arg(long, default_value = "build")]
    build_dir: PathBuf,

    /// Print the build steps instead of running them
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// List configured machines and their compilers
  Machines {
    /// Directory holding config_machines.json and config_compilers.json
    #[arg(env = CONFIG_DIR_ENV_VAR)]
    config_dir: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show host information and the machine it resolves to
  Info {
    /// Directory holding config_machines.json, used for hostname matching
    #[arg(env = CONFIG_DIR_ENV_VAR)]
    config_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "info" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build {
      config_dir,
      machine,
      compiler,
      test,
      mpi,
      debug,
      source_dir,
      build_dir,
      dry_run,
      output,
    } => cmd::cmd_build(
      BuildArgs {
        config_dir,
        machine,
        compiler,
        test,
        mpi,
        debug,
        source_dir,
        build_dir,
        dry_run,
      },
      output,
    ),
    Commands::Machines { config_dir, output } => cmd::cmd_machines(&config_dir, output),
    Commands::Info { config_dir, output } => cmd::cmd_info(config_dir.as_deref(), output),
  }
}
