//! Machine and compiler configuration.
//!
//! A configuration directory holds two documents:
//!
//! ```text
//! <config_dir>/
//! ├── config_machines.json    # machine -> ordered compiler list
//! └── config_compilers.json   # (compiler, machine?) -> settings
//! ```
//!
//! Each document may instead be given in the CESM XML form
//! (`config_machines.xml`, `config_compilers.xml`, see the `xml` module).
//! The JSON file wins when both are present.
//!
//! # Machines
//!
//! ```json
//! {
//!   "machines": {
//!     "edison": { "compilers": ["intel", "gnu"], "hostnames": ["edison"] }
//!   }
//! }
//! ```
//!
//! # Compilers
//!
//! ```json
//! {
//!   "compilers": [
//!     { "compiler": "intel", "settings": { "FFLAGS": "-O2" }, "mpi": { "MPICC": "mpiicc" } },
//!     { "compiler": "intel", "machine": "edison", "settings": { "FFLAGS": "-O3" } }
//!   ]
//! }
//! ```
//!
//! Entries without a `machine` apply to every machine. Entries with an `os`
//! are layered on top for machines of that operating system, and
//! machine-specific entries on top of those.
//!
//! The loaded [`ConfigDocument`] is read-only and owned by a single run.

mod types;
mod xml;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{COMPILERS_FILENAME, COMPILERS_XML_FILENAME, MACHINES_FILENAME, MACHINES_XML_FILENAME};
use crate::settings::SettingsRecord;

pub use types::{CompilerEntry, CompilersFile, MachineEntry, MachinesFile};

/// Errors that can occur when loading configuration documents.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// The document is missing or unreadable.
  #[error("configuration not found: {}: {source}", path.display())]
  ConfigNotFound {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The document was read but does not match the expected schema.
  #[error("failed to parse {}: {source}", path.display())]
  ConfigParse {
    path: PathBuf,
    #[source]
    source: ParseError,
  },
}

/// Why a configuration document could not be parsed.
#[derive(Debug, Error)]
pub enum ParseError {
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  #[error(transparent)]
  Xml(#[from] roxmltree::Error),

  /// Well-formed XML missing a required attribute.
  #[error("{0}")]
  Schema(String),
}

/// Machines and compiler settings loaded from a configuration directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
  dir: PathBuf,
  machines: BTreeMap<String, MachineEntry>,
  compilers: Vec<CompilerEntry>,
}

impl ConfigDocument {
  /// Load both documents from `dir`, each from its JSON or XML file.
  pub fn load(dir: &Path) -> Result<Self, ConfigError> {
    let machines = read_document(dir, MACHINES_FILENAME, MACHINES_XML_FILENAME, xml::parse_machines)?;
    let compilers = read_document(dir, COMPILERS_FILENAME, COMPILERS_XML_FILENAME, xml::parse_compilers)?;

    debug!(
      dir = %dir.display(),
      machines = machines.machines.len(),
      compiler_entries = compilers.compilers.len(),
      "loaded configuration"
    );

    Ok(Self {
      dir: dir.to_path_buf(),
      machines: machines.machines,
      compilers: compilers.compilers,
    })
  }

  /// Directory the documents were loaded from.
  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn machines(&self) -> impl Iterator<Item = (&String, &MachineEntry)> {
    self.machines.iter()
  }

  pub fn find_machine(&self, machine: &str) -> Option<&MachineEntry> {
    self.machines.get(machine)
  }

  /// Compilers supported on `machine`, in configuration order.
  ///
  /// Empty when the machine is unknown or lists no compilers, which means
  /// "no constraint known" rather than an error.
  pub fn find_machine_compilers(&self, machine: &str) -> &[String] {
    self
      .machines
      .get(machine)
      .map(|entry| entry.compilers.as_slice())
      .unwrap_or_default()
  }

  /// Settings for `compiler` on `machine`.
  ///
  /// Generic entries for the compiler are applied first, then entries for the
  /// machine's operating system, then entries for the machine, each in
  /// document order. `None` when no entry matches.
  pub fn find_compiler_settings(&self, machine: &str, compiler: &str) -> Option<SettingsRecord> {
    let machine_os = self.find_machine(machine).and_then(|entry| entry.os.as_deref());
    let for_compiler = move || self.compilers.iter().filter(move |entry| entry.compiler == compiler);
    let generic = for_compiler().filter(|entry| entry.is_generic());
    let for_os = for_compiler().filter(move |entry| entry.is_for_os(machine_os));
    let specific = for_compiler().filter(|entry| entry.machine.as_deref() == Some(machine));

    let mut found: Option<SettingsRecord> = None;
    for entry in generic.chain(for_os).chain(specific) {
      found.get_or_insert_with(SettingsRecord::new).merge(&entry.to_record());
    }
    found
  }

  /// Machine whose `hostnames` prefixes match `hostname`.
  ///
  /// The longest matching prefix wins, so a node-specific prefix beats a
  /// site-wide one.
  pub fn machine_for_hostname(&self, hostname: &str) -> Option<&str> {
    let host = hostname.to_lowercase();
    self
      .machines
      .iter()
      .flat_map(|(name, entry)| entry.hostnames.iter().map(move |prefix| (name, prefix)))
      .filter(|(_, prefix)| !prefix.is_empty() && host.starts_with(&prefix.to_lowercase()))
      .max_by_key(|(_, prefix)| prefix.len())
      .map(|(name, _)| name.as_str())
  }
}

/// Read `json_name` from `dir`, or `xml_name` when only the XML file exists.
///
/// A missing pair is reported against the JSON path.
fn read_document<T: serde::de::DeserializeOwned>(
  dir: &Path,
  json_name: &str,
  xml_name: &str,
  parse_xml: fn(&str) -> Result<T, ParseError>,
) -> Result<T, ConfigError> {
  let json_path = dir.join(json_name);
  let xml_path = dir.join(xml_name);
  let is_xml = !json_path.is_file() && xml_path.is_file();
  let path = if is_xml { xml_path } else { json_path };

  let content = fs::read_to_string(&path).map_err(|source| ConfigError::ConfigNotFound {
    path: path.clone(),
    source,
  })?;
  debug!(path = %path.display(), "reading configuration document");

  let parsed = if is_xml {
    parse_xml(&content)
  } else {
    serde_json::from_str(&content).map_err(ParseError::from)
  };
  parsed.map_err(|source| ConfigError::ConfigParse { path, source })
}
