use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::settings::{SettingsMap, SettingsRecord};

/// Top level of `config_machines.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachinesFile {
  #[serde(default)]
  pub machines: BTreeMap<String, MachineEntry>,
}

/// A machine and the compilers it supports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineEntry {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,

  /// Operating system label, matched against OS-scoped compiler entries.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub os: Option<String>,

  /// Supported compilers. Order matters: the first one is the default.
  ///
  /// Accepts either a JSON list or a comma separated string (`"intel,gnu"`).
  #[serde(default, deserialize_with = "compiler_list")]
  pub compilers: Vec<String>,

  /// Hostname prefixes that identify this machine's login or compute nodes.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub hostnames: Vec<String>,
}

/// Top level of `config_compilers.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompilersFile {
  #[serde(default)]
  pub compilers: Vec<CompilerEntry>,
}

/// Settings for a compiler, either on every machine or on one machine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompilerEntry {
  pub compiler: String,

  /// Restricts the entry to a single machine. Entries without a machine apply everywhere.
  #[serde(default)]
  pub machine: Option<String>,

  /// Restricts a machine-less entry to machines whose `os` matches, ignoring case.
  #[serde(default)]
  pub os: Option<String>,

  #[serde(default)]
  pub settings: SettingsMap,

  #[serde(default)]
  pub mpi: SettingsMap,

  #[serde(default)]
  pub serial: SettingsMap,
}

impl CompilerEntry {
  /// True for entries that apply to every machine.
  pub fn is_generic(&self) -> bool {
    self.machine.is_none() && self.os.is_none()
  }

  /// True for machine-less entries restricted to the operating system `os`.
  pub fn is_for_os(&self, os: Option<&str>) -> bool {
    match (self.machine.as_deref(), self.os.as_deref(), os) {
      (None, Some(wanted), Some(os)) => wanted.eq_ignore_ascii_case(os),
      _ => false,
    }
  }

  pub fn to_record(&self) -> SettingsRecord {
    SettingsRecord {
      values: self.settings.clone(),
      mpi: self.mpi.clone(),
      serial: self.serial.clone(),
    }
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CompilerList {
  List(Vec<String>),
  Csv(String),
}

fn compiler_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match CompilerList::deserialize(deserializer)? {
    CompilerList::List(names) => clean_compiler_names(names),
    CompilerList::Csv(joined) => split_compiler_list(&joined),
  })
}

/// Split a comma separated compiler list, keeping its order.
pub(super) fn split_compiler_list(joined: &str) -> Vec<String> {
  clean_compiler_names(joined.split(','))
}

fn clean_compiler_names<I, S>(names: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  names
    .into_iter()
    .map(|name| name.as_ref().trim().to_string())
    .filter(|name| !name.is_empty())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compilers_accept_list_or_comma_string() {
    let file: MachinesFile = serde_json::from_str(
      r#"{
        "machines": {
          "edison": { "compilers": ["intel", "gnu"] },
          "yellowstone": { "compilers": "intel, pgi,gnu" }
        }
      }"#,
    )
    .unwrap();

    assert_eq!(file.machines["edison"].compilers, vec!["intel", "gnu"]);
    assert_eq!(file.machines["yellowstone"].compilers, vec!["intel", "pgi", "gnu"]);
  }

  #[test]
  fn os_entries_match_case_insensitively() {
    let entry: CompilerEntry = serde_json::from_str(r#"{ "compiler": "intel", "os": "CNL" }"#).unwrap();

    assert!(!entry.is_generic());
    assert!(entry.is_for_os(Some("cnl")));
    assert!(!entry.is_for_os(Some("LINUX")));
    assert!(!entry.is_for_os(None));
  }

  #[test]
  fn missing_compilers_default_to_empty() {
    let file: MachinesFile = serde_json::from_str(r#"{ "machines": { "bare": {} } }"#).unwrap();
    assert!(file.machines["bare"].compilers.is_empty());
  }
}
