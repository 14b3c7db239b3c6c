//! Test fixtures for machbuild-lib.
//!
//! Configuration documents modelled on a handful of real sites, a helper
//! that writes them to a temporary configuration directory, and shell steps.

use tempfile::TempDir;

use crate::config::ConfigDocument;
use crate::consts::{COMPILERS_FILENAME, COMPILERS_XML_FILENAME, MACHINES_FILENAME, MACHINES_XML_FILENAME};
use crate::driver::Step;

pub const SAMPLE_MACHINES: &str = r#"{
  "machines": {
    "darwin": { "description": "macOS desktops and laptops", "os": "Darwin", "compilers": ["gnu", "clang"] },
    "edison": { "description": "NERSC Cray XC30", "os": "CNL", "compilers": ["intel", "gnu"], "hostnames": ["edison"] },
    "yellowstone": { "os": "LINUX", "compilers": "intel,pgi,gnu", "hostnames": ["ys", "yellowstone"] },
    "geyser": { "compilers": ["intel"], "hostnames": ["ysgeyser"] },
    "caldera": { "compilers": ["intel"], "hostnames": ["caldera"] },
    "bare": {}
  }
}"#;

pub const SAMPLE_COMPILERS: &str = r#"{
  "compilers": [
    {
      "compiler": "gnu",
      "settings": { "FFLAGS": "-O2", "SFC": "gfortran", "SCC": "gcc" },
      "mpi": { "MPICC": "mpicc" }
    },
    { "compiler": "gnu", "machine": "edison", "settings": { "FFLAGS": "-O2 -march=native" } },
    {
      "compiler": "intel",
      "machine": "edison",
      "settings": { "flag": "-O3" },
      "mpi": { "MPICC": "cc" },
      "serial": { "SCC": "icc" }
    }
  ]
}"#;

/// CESM-shaped `config_machines.xml`.
pub const SAMPLE_MACHINES_XML: &str = r#"<?xml version="1.0"?>
<config_machines>
  <machine MACH="edison">
    <DESC>NERSC XC30, os is CNL, 24 pes/node, batch system is SLURM</DESC>
    <NODENAME_REGEX>edison</NODENAME_REGEX>
    <COMPILERS>intel,gnu,cray</COMPILERS>
    <MPILIBS>mpt,mpi-serial</MPILIBS>
    <OS>CNL</OS>
  </machine>
  <machine MACH="yellowstone">
    <DESC>NCAR IBM, os is Linux, 16 pes/node, batch system is LSF</DESC>
    <NODENAME_REGEX>ys.*</NODENAME_REGEX>
    <COMPILERS>intel,pgi,gnu</COMPILERS>
    <OS>LINUX</OS>
  </machine>
</config_machines>
"#;

/// CESM-shaped `config_compilers.xml`: a generic, an OS and a machine entry.
pub const SAMPLE_COMPILERS_XML: &str = r#"<?xml version="1.0"?>
<config_compilers>
  <!-- generic intel -->
  <compiler COMPILER="intel">
    <FFLAGS> -fp-model source -convert big_endian </FFLAGS>
    <ADD_FFLAGS DEBUG="TRUE"> -g -check uninit </ADD_FFLAGS>
    <SFC> ifort </SFC>
    <SCC> icc </SCC>
    <MPIFC> mpif90 </MPIFC>
  </compiler>
  <compiler OS="CNL" COMPILER="intel">
    <MPIFC> ftn </MPIFC>
    <MPICC> cc </MPICC>
  </compiler>
  <compiler COMPILER="intel" MACH="edison">
    <ADD_FFLAGS> -O3 </ADD_FFLAGS>
    <PNETCDF_PATH MPILIB="!mpi-serial">$(PARALLEL_NETCDF_DIR)</PNETCDF_PATH>
    <NETCDF_PATH MPILIB="mpi-serial">$(NETCDF_DIR)</NETCDF_PATH>
  </compiler>
</config_compilers>
"#;

/// Write both documents into a fresh temporary directory and load them.
///
/// The `TempDir` must be kept alive for as long as the directory is needed.
pub fn write_config(machines: &str, compilers: &str) -> (TempDir, ConfigDocument) {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join(MACHINES_FILENAME), machines).unwrap();
  std::fs::write(temp.path().join(COMPILERS_FILENAME), compilers).unwrap();
  let doc = ConfigDocument::load(temp.path()).unwrap();
  (temp, doc)
}

/// Like [`write_config`], with the documents in their XML form.
pub fn write_xml_config(machines: &str, compilers: &str) -> (TempDir, ConfigDocument) {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join(MACHINES_XML_FILENAME), machines).unwrap();
  std::fs::write(temp.path().join(COMPILERS_XML_FILENAME), compilers).unwrap();
  let doc = ConfigDocument::load(temp.path()).unwrap();
  (temp, doc)
}

/// A step that runs `script` through the platform shell.
#[cfg(unix)]
pub fn shell_step(script: &str) -> Step {
  Step::new("/bin/sh").arg("-c").arg(script)
}

#[cfg(windows)]
pub fn shell_step(script: &str) -> Step {
  Step::new("cmd.exe").arg("/C").arg(script)
}
