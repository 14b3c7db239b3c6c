//! Build settings for one machine/compiler pair.
//!
//! A [`SettingsRecord`] is a flat bag of named values (flags, paths, toggles)
//! plus two optional overlays that only apply to message-passing (`mpi`) or
//! serial builds. [`SettingsRecord::with_mpi`] folds the right overlay in once
//! the run options are known.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ConfigDocument;
use crate::machine::MachineId;

/// A single setting value as written in the compilers document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
  Bool(bool),
  Number(serde_json::Number),
  Text(String),
  List(Vec<String>),
}

impl fmt::Display for SettingValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SettingValue::Bool(b) => write!(f, "{}", b),
      SettingValue::Number(n) => write!(f, "{}", n),
      SettingValue::Text(s) => write!(f, "{}", s),
      SettingValue::List(items) => write!(f, "{}", items.join(" ")),
    }
  }
}

impl From<&str> for SettingValue {
  fn from(value: &str) -> Self {
    SettingValue::Text(value.to_string())
  }
}

impl From<bool> for SettingValue {
  fn from(value: bool) -> Self {
    SettingValue::Bool(value)
  }
}

/// Named settings, kept sorted so rendering is deterministic.
pub type SettingsMap = BTreeMap<String, SettingValue>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsRecord {
  pub values: SettingsMap,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub mpi: SettingsMap,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub serial: SettingsMap,
}

impl SettingsRecord {
  pub fn new() -> Self {
    Self::default()
  }

  /// True when neither the flat values nor any overlay hold a setting.
  pub fn is_empty(&self) -> bool {
    self.values.is_empty() && self.mpi.is_empty() && self.serial.is_empty()
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn get(&self, key: &str) -> Option<&SettingValue> {
    self.values.get(key)
  }

  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
    self.values.insert(key.into(), value.into());
  }

  /// Layer `other` on top of `self`, key by key, overlays included.
  pub fn merge(&mut self, other: &SettingsRecord) {
    self.values.extend(other.values.iter().map(|(k, v)| (k.clone(), v.clone())));
    self.mpi.extend(other.mpi.iter().map(|(k, v)| (k.clone(), v.clone())));
    self.serial.extend(other.serial.iter().map(|(k, v)| (k.clone(), v.clone())));
  }

  /// Fold the overlay matching `use_mpi` into the flat values.
  ///
  /// The returned record has no overlays left.
  pub fn with_mpi(mut self, use_mpi: bool) -> Self {
    let overlay = if use_mpi {
      std::mem::take(&mut self.mpi)
    } else {
      std::mem::take(&mut self.serial)
    };
    self.values.extend(overlay);
    self.mpi.clear();
    self.serial.clear();
    self
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &SettingValue)> {
    self.values.iter()
  }
}

/// Settings for `compiler` on `machine`.
///
/// Returns an empty record when the configuration has nothing for the pair;
/// that simply means no machine-specific overrides are needed.
pub fn extract(machine: &MachineId, compiler: &str, doc: &ConfigDocument) -> SettingsRecord {
  match doc.find_compiler_settings(machine.as_str(), compiler) {
    Some(record) => {
      debug!(machine = %machine, compiler = %compiler, count = record.len(), "extracted compiler settings");
      record
    }
    None => {
      debug!(machine = %machine, compiler = %compiler, "no compiler settings, using empty record");
      SettingsRecord::new()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{SAMPLE_COMPILERS, SAMPLE_MACHINES, write_config};

  fn machine(name: &str) -> MachineId {
    MachineId::new(name).unwrap()
  }

  #[test]
  fn extract_returns_configured_settings() {
    let (_temp, doc) = write_config(SAMPLE_MACHINES, SAMPLE_COMPILERS);

    let record = extract(&machine("edison"), "intel", &doc);

    assert_eq!(record.get("flag"), Some(&SettingValue::from("-O3")));
  }

  #[test]
  fn extract_missing_pair_is_empty_not_an_error() {
    let (_temp, doc) = write_config(SAMPLE_MACHINES, SAMPLE_COMPILERS);

    let record = extract(&machine("edison"), "clang", &doc);
    assert!(record.is_empty());

    let record = extract(&machine("nowhere"), "intel", &doc);
    assert!(record.is_empty());
  }

  #[test]
  fn merge_overrides_key_by_key() {
    let mut base = SettingsRecord::new();
    base.insert("FFLAGS", "-O2");
    base.insert("SCC", "icc");

    let mut site = SettingsRecord::new();
    site.insert("FFLAGS", "-O3");

    base.merge(&site);

    assert_eq!(base.get("FFLAGS"), Some(&SettingValue::from("-O3")));
    assert_eq!(base.get("SCC"), Some(&SettingValue::from("icc")));
  }

  #[test]
  fn with_mpi_folds_only_the_matching_overlay() {
    let mut record = SettingsRecord::new();
    record.insert("CFLAGS", "-g");
    record.mpi.insert("CC".to_string(), SettingValue::from("mpicc"));
    record.serial.insert("CC".to_string(), SettingValue::from("cc"));

    let parallel = record.clone().with_mpi(true);
    assert_eq!(parallel.get("CC"), Some(&SettingValue::from("mpicc")));
    assert!(parallel.mpi.is_empty() && parallel.serial.is_empty());

    let serial = record.with_mpi(false);
    assert_eq!(serial.get("CC"), Some(&SettingValue::from("cc")));
    assert_eq!(serial.get("CFLAGS"), Some(&SettingValue::from("-g")));
  }

  #[test]
  fn untagged_values_deserialize_by_shape() {
    let map: SettingsMap = serde_json::from_str(r#"{"a": true, "b": "x", "c": ["y", "z"], "d": 4, "e": 1.5}"#).unwrap();

    assert_eq!(map["a"], SettingValue::Bool(true));
    assert_eq!(map["d"], SettingValue::Number(4.into()));
    assert_eq!(map["e"].to_string(), "1.5");
    assert_eq!(map["b"], SettingValue::Text("x".to_string()));
    assert_eq!(map["c"], SettingValue::List(vec!["y".to_string(), "z".to_string()]));
  }
}
