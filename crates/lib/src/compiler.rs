//! Compiler selection for a resolved machine.
//!
//! The machine's compiler list is ordered and its first entry is the default.
//! An explicit choice that the machine does not list is reported as an
//! [`UnsupportedCompiler`] diagnostic and then used anyway, so new toolchains
//! can be tried before the configuration knows about them.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ConfigDocument;
use crate::machine::MachineId;

/// Errors that stop compiler selection.
#[derive(Debug, Error)]
pub enum CompilerError {
  #[error("no compiler given and machine {machine} has no default compiler")]
  NoCompilerAvailable { machine: MachineId },
}

/// Non-fatal: the chosen compiler is not in the machine's supported list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedCompiler {
  pub machine: MachineId,
  pub compiler: String,
  pub supported: Vec<String>,
}

impl fmt::Display for UnsupportedCompiler {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "compiler {} not supported on machine {} (supported: {})",
      self.compiler,
      self.machine,
      self.supported.join(", ")
    )
  }
}

/// The compiler a run will use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerChoice {
  pub name: String,
  /// Whether the name came from the machine's default rather than the caller.
  pub is_default: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub diagnostic: Option<UnsupportedCompiler>,
}

impl CompilerChoice {
  pub fn as_str(&self) -> &str {
    &self.name
  }

  pub fn is_supported(&self) -> bool {
    self.diagnostic.is_none()
  }
}

/// Pick the compiler for `machine`.
///
/// Uses `explicit` when it is not blank, otherwise the first compiler the machine lists.
/// Fails only when there is neither.
pub fn select(machine: &MachineId, explicit: Option<&str>, doc: &ConfigDocument) -> Result<CompilerChoice, CompilerError> {
  let supported = doc.find_machine_compilers(machine.as_str());

  let (name, is_default) = match explicit.filter(|name| !name.trim().is_empty()) {
    Some(name) => (name.to_string(), false),
    None => match supported.first() {
      Some(first) => (first.clone(), true),
      None => {
        return Err(CompilerError::NoCompilerAvailable {
          machine: machine.clone(),
        });
      }
    },
  };

  let diagnostic = if !supported.is_empty() && !supported.contains(&name) {
    let diagnostic = UnsupportedCompiler {
      machine: machine.clone(),
      compiler: name.clone(),
      supported: supported.to_vec(),
    };
    warn!("{}", diagnostic);
    Some(diagnostic)
  } else {
    None
  };

  info!(machine = %machine, compiler = %name, default = is_default, "selected compiler");

  Ok(CompilerChoice {
    name,
    is_default,
    diagnostic,
  })
}
