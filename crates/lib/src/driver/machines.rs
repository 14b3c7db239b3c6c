//! Built-in drivers for known machines.
//!
//! Every driver configures with CMake, builds with `cmake --build` and tests
//! with `ctest`. Desktops run the tests directly; clusters submit them through
//! their batch scheduler so MPI tests land on compute nodes.

use serde::Serialize;

use super::{BuildDriver, BuildRequest, DriverRegistry, Step};
use crate::consts::MACROS_NAMESPACE;

/// Machines with a built-in driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KnownMachine {
  Darwin,
  Goldbach,
  Yellowstone,
  Caldera,
  Edison,
  Hopper,
  Titan,
  Mira,
  Cetus,
}

impl KnownMachine {
  pub const ALL: [KnownMachine; 9] = [
    KnownMachine::Darwin,
    KnownMachine::Goldbach,
    KnownMachine::Yellowstone,
    KnownMachine::Caldera,
    KnownMachine::Edison,
    KnownMachine::Hopper,
    KnownMachine::Titan,
    KnownMachine::Mira,
    KnownMachine::Cetus,
  ];

  /// Case-insensitive lookup by machine name.
  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|m| m.as_str().eq_ignore_ascii_case(name))
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Darwin => "darwin",
      Self::Goldbach => "goldbach",
      Self::Yellowstone => "yellowstone",
      Self::Caldera => "caldera",
      Self::Edison => "edison",
      Self::Hopper => "hopper",
      Self::Titan => "titan",
      Self::Mira => "mira",
      Self::Cetus => "cetus",
    }
  }

  /// Scheduler used to run tests, `None` for machines that run them in place.
  pub fn launcher(&self) -> Option<BatchLauncher> {
    match self {
      Self::Darwin => None,
      Self::Yellowstone | Self::Caldera => Some(BatchLauncher::Lsf),
      Self::Edison => Some(BatchLauncher::Slurm),
      Self::Goldbach | Self::Hopper | Self::Titan => Some(BatchLauncher::Pbs),
      Self::Mira | Self::Cetus => Some(BatchLauncher::Cobalt),
    }
  }

  /// Machine-specific CMake arguments.
  fn configure_args(&self) -> &'static [&'static str] {
    match self {
      // Cray programming environment: always build through the compiler wrappers.
      Self::Edison | Self::Hopper | Self::Titan => &["-DCMAKE_C_COMPILER=cc", "-DCMAKE_Fortran_COMPILER=ftn"],
      Self::Mira | Self::Cetus => &["-DCMAKE_SYSTEM_NAME=BlueGeneQ-static"],
      _ => &[],
    }
  }
}

/// Batch schedulers that can run the test suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchLauncher {
  Lsf,
  Slurm,
  Pbs,
  Cobalt,
}

impl BatchLauncher {
  /// Command prefix that runs a program under the scheduler and waits for it.
  pub fn command(&self) -> Vec<String> {
    let parts: &[&str] = match self {
      Self::Lsf => &["bsub", "-I", "-n", "4", "-W", "00:30"],
      Self::Slurm => &["salloc", "-n", "4", "-t", "00:30:00"],
      Self::Pbs => &["qsub", "-I", "-l", "walltime=00:30:00", "--"],
      Self::Cobalt => &["qsub", "-n", "1", "-t", "30", "--mode", "script"],
    };
    parts.iter().map(|s| s.to_string()).collect()
  }
}

fn on_off(flag: bool) -> &'static str {
  if flag { "ON" } else { "OFF" }
}

fn cmake_configure(request: &BuildRequest, extra: &[&str]) -> Step {
  let options = &request.options;
  Step::new("cmake")
    .arg("-S")
    .arg(request.source_dir.display().to_string())
    .arg("-B")
    .arg(request.build_dir.display().to_string())
    .arg(format!("-DCMAKE_BUILD_TYPE={}", if options.debug { "Debug" } else { "Release" }))
    .arg(format!("-D{}_ENABLE_MPI={}", MACROS_NAMESPACE, on_off(options.use_mpi)))
    .arg(format!("-D{}_ENABLE_TESTS={}", MACROS_NAMESPACE, on_off(options.run_tests)))
    .arg(format!("-D{}_COMPILER={}", MACROS_NAMESPACE, request.compiler))
    .args(extra.iter().copied())
}

fn cmake_build(request: &BuildRequest) -> Step {
  Step::new("cmake")
    .arg("--build")
    .arg(request.build_dir.display().to_string())
    .arg("--parallel")
}

fn ctest(request: &BuildRequest) -> Step {
  Step::new("ctest")
    .arg("--test-dir")
    .arg(request.build_dir.display().to_string())
    .arg("--output-on-failure")
}

/// Laptops and workstations: everything runs locally.
#[derive(Debug, Clone)]
pub struct DesktopDriver {
  request: BuildRequest,
}

impl DesktopDriver {
  pub fn new(request: BuildRequest) -> Self {
    Self { request }
  }
}

impl BuildDriver for DesktopDriver {
  fn name(&self) -> &'static str {
    "desktop"
  }

  fn request(&self) -> &BuildRequest {
    &self.request
  }

  fn configure(&self) -> Vec<Step> {
    vec![cmake_configure(&self.request, &[])]
  }

  fn build(&self) -> Vec<Step> {
    vec![cmake_build(&self.request)]
  }

  fn test(&self) -> Vec<Step> {
    vec![ctest(&self.request)]
  }
}

/// Shared HPC systems: builds on the login node, tests through the scheduler.
#[derive(Debug, Clone)]
pub struct ClusterDriver {
  machine: KnownMachine,
  launcher: BatchLauncher,
  request: BuildRequest,
}

impl ClusterDriver {
  pub fn new(machine: KnownMachine, launcher: BatchLauncher, request: BuildRequest) -> Self {
    Self {
      machine,
      launcher,
      request,
    }
  }
}

impl BuildDriver for ClusterDriver {
  fn name(&self) -> &'static str {
    self.machine.as_str()
  }

  fn request(&self) -> &BuildRequest {
    &self.request
  }

  fn configure(&self) -> Vec<Step> {
    vec![cmake_configure(&self.request, self.machine.configure_args())]
  }

  fn build(&self) -> Vec<Step> {
    vec![cmake_build(&self.request)]
  }

  fn test(&self) -> Vec<Step> {
    vec![ctest(&self.request).wrapped_in(self.launcher.command())]
  }
}

/// Static mapping from [`KnownMachine`] to its driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDrivers;

impl DriverRegistry for BuiltinDrivers {
  fn driver_for(&self, request: &BuildRequest) -> Option<Box<dyn BuildDriver>> {
    let machine = KnownMachine::from_name(request.machine.as_str())?;
    let driver: Box<dyn BuildDriver> = match machine.launcher() {
      None => Box::new(DesktopDriver::new(request.clone())),
      Some(launcher) => Box::new(ClusterDriver::new(machine, launcher, request.clone())),
    };
    Some(driver)
  }
}
