//! Reader for the XML form of the configuration documents.
//!
//! ```xml
//! <config_machines>
//!   <machine MACH="edison">
//!     <DESC>NERSC XC30</DESC>
//!     <NODENAME_REGEX>edison</NODENAME_REGEX>
//!     <OS>CNL</OS>
//!     <COMPILERS>intel,gnu,cray</COMPILERS>
//!   </machine>
//! </config_machines>
//!
//! <config_compilers>
//!   <compiler COMPILER="intel" MACH="edison">
//!     <ADD_FFLAGS> -O3 </ADD_FFLAGS>
//!     <PNETCDF_PATH MPILIB="!mpi-serial">$(PARALLEL_NETCDF_DIR)</PNETCDF_PATH>
//!   </compiler>
//! </config_compilers>
//! ```
//!
//! Each child of a `<compiler>` becomes one text setting. An `MPILIB`
//! attribute of `mpi-serial` places it in the serial overlay and any other
//! value in the MPI overlay. Children carrying other conditions (`DEBUG`,
//! `COMPILER_VERSION`, ...) are skipped.

use std::collections::BTreeMap;

use roxmltree::{Document, Node};
use tracing::debug;

use super::ParseError;
use super::types::{CompilerEntry, CompilersFile, MachineEntry, MachinesFile, split_compiler_list};
use crate::settings::SettingValue;

const SERIAL_MPILIB: &str = "mpi-serial";

pub(super) fn parse_machines(text: &str) -> Result<MachinesFile, ParseError> {
  let document = Document::parse(text)?;
  let mut machines = BTreeMap::new();

  for node in document.descendants().filter(|n| n.has_tag_name("machine")) {
    let name = required_attribute(node, "MACH")?;
    let mut entry = MachineEntry::default();

    for child in node.children().filter(Node::is_element) {
      let text = element_text(child);
      match child.tag_name().name() {
        "DESC" => entry.description = Some(text.to_string()),
        "OS" => entry.os = Some(text.to_string()),
        "COMPILERS" => entry.compilers = split_compiler_list(text),
        "NODENAME_REGEX" => entry.hostnames.extend(hostname_prefix(text)),
        _ => {}
      }
    }

    if machines.insert(name.to_string(), entry).is_some() {
      debug!(machine = name, "later machine element replaces an earlier one");
    }
  }

  Ok(MachinesFile { machines })
}

pub(super) fn parse_compilers(text: &str) -> Result<CompilersFile, ParseError> {
  let document = Document::parse(text)?;
  let mut compilers = Vec::new();

  for node in document.descendants().filter(|n| n.has_tag_name("compiler")) {
    let mut entry = CompilerEntry {
      compiler: required_attribute(node, "COMPILER")?.to_string(),
      machine: node.attribute("MACH").map(str::to_string),
      os: node.attribute("OS").map(str::to_string),
      settings: Default::default(),
      mpi: Default::default(),
      serial: Default::default(),
    };

    for child in node.children().filter(Node::is_element) {
      let key = child.tag_name().name();
      let value = SettingValue::Text(element_text(child).to_string());
      if child.attributes().any(|attr| attr.name() != "MPILIB") {
        debug!(compiler = %entry.compiler, key, "skipping conditional setting");
        continue;
      }

      let target = match child.attribute("MPILIB") {
        None => &mut entry.settings,
        Some(SERIAL_MPILIB) => &mut entry.serial,
        Some(_) => &mut entry.mpi,
      };
      target.insert(key.to_string(), value);
    }

    compilers.push(entry);
  }

  Ok(CompilersFile { compilers })
}

fn required_attribute<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, ParseError> {
  node.attribute(name).ok_or_else(|| {
    ParseError::Schema(format!(
      "<{}> at byte {} has no {} attribute",
      node.tag_name().name(),
      node.range().start,
      name
    ))
  })
}

fn element_text<'a>(node: Node<'a, '_>) -> &'a str {
  node.text().map(str::trim).unwrap_or_default()
}

/// Literal leading part of a node-name pattern (`^ys.*` -> `ys`).
fn hostname_prefix(pattern: &str) -> Option<String> {
  let pattern = pattern.strip_prefix('^').unwrap_or(pattern);
  let end = pattern
    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
    .unwrap_or(pattern.len());
  let prefix = &pattern[..end];
  (!prefix.is_empty()).then(|| prefix.to_string())
}
