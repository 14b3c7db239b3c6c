//! CMake macro file generation.
//!
//! Settings are written as `set(<NAMESPACE>_<KEY> ...)` lines in key order:
//!
//! ```cmake
//! # Generated by machbuild. Do not edit.
//! set(PIO_FFLAGS "-O3")
//! set(PIO_INCLUDES "/opt/netcdf/include" "/opt/pnetcdf/include")
//! set(PIO_USE_OPENMP ON)
//! ```
//!
//! The file is written to a sibling temp file and renamed into place, so the
//! destination holds either the previous content or the complete new content.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consts::APP_NAME;
use crate::settings::{SettingValue, SettingsRecord};

#[derive(Debug, Error)]
pub enum MacroError {
  #[error("failed to write macro file {}: {source}", path.display())]
  MacroWriteError {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Render `record` as CMake under `namespace`.
///
/// The output depends only on the record and the namespace.
///
/// Keys that normalize to the same variable (`use-openmp`, `USE_OPENMP`)
/// produce a single line holding the value of the last such key, and a
/// warning naming both keys.
pub fn render(record: &SettingsRecord, namespace: &str) -> String {
  let mut lines: Vec<(String, &str, String)> = Vec::new();
  for (key, value) in record.iter() {
    let name = variable_name(key);
    match lines.iter_mut().find(|(existing, _, _)| *existing == name) {
      Some(line) => {
        warn!(
          variable = %format!("{}_{}", namespace, name),
          replaced = line.1,
          kept = %key,
          "settings map to the same macro variable"
        );
        line.1 = key.as_str();
        line.2 = cmake_value(value);
      }
      None => lines.push((name, key.as_str(), cmake_value(value))),
    }
  }

  let mut out = format!("# Generated by {}. Do not edit.\n", APP_NAME);
  for (name, _, value) in &lines {
    out.push_str(&format!("set({}_{} {})\n", namespace, name, value));
  }
  out
}

/// Write the rendered settings to `destination`, replacing any previous file.
pub fn emit(record: &SettingsRecord, destination: &Path, namespace: &str) -> Result<(), MacroError> {
  let content = render(record, namespace);
  let temp_path = temp_path_for(destination);

  debug!(path = %temp_path.display(), "writing macro file");

  let written = write_synced(&temp_path, &content).and_then(|()| fs::rename(&temp_path, destination));
  if let Err(source) = written {
    let _ = fs::remove_file(&temp_path);
    return Err(MacroError::MacroWriteError {
      path: destination.to_path_buf(),
      source,
    });
  }

  info!(path = %destination.display(), settings = record.len(), "wrote macro file");
  Ok(())
}

fn write_synced(path: &Path, content: &str) -> io::Result<()> {
  let mut file = File::create(path)?;
  file.write_all(content.as_bytes())?;
  file.sync_all()
}

fn temp_path_for(destination: &Path) -> PathBuf {
  let mut name = destination.file_name().unwrap_or_default().to_os_string();
  name.push(".tmp");
  destination.with_file_name(name)
}

fn variable_name(key: &str) -> String {
  key
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
    .collect()
}

fn cmake_value(value: &SettingValue) -> String {
  match value {
    SettingValue::Bool(true) => "ON".to_string(),
    SettingValue::Bool(false) => "OFF".to_string(),
    SettingValue::Number(number) => number.to_string(),
    SettingValue::Text(text) => quote(text),
    SettingValue::List(items) if items.is_empty() => "\"\"".to_string(),
    SettingValue::List(items) => items.iter().map(|item| quote(item)).collect::<Vec<_>>().join(" "),
  }
}

fn quote(text: &str) -> String {
  format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consts::{MACROS_FILENAME, MACROS_NAMESPACE};
  use tempfile::TempDir;
  use tracing_test::traced_test;

  fn sample_record() -> SettingsRecord {
    let mut record = SettingsRecord::new();
    record.insert("flag", "-O3");
    record.insert("use-openmp", true);
    record.insert("debug", false);
    record.insert(
      "INCLUDES",
      SettingValue::List(vec!["/opt/netcdf/include".to_string(), "/opt/pnetcdf/include".to_string()]),
    );
    record
  }

  #[test]
  fn render_writes_one_set_per_setting_in_key_order() {
    let rendered = render(&sample_record(), "PIO");

    assert_eq!(
      rendered,
      "# Generated by machbuild. Do not edit.\n\
       set(PIO_INCLUDES \"/opt/netcdf/include\" \"/opt/pnetcdf/include\")\n\
       set(PIO_DEBUG OFF)\n\
       set(PIO_FLAG \"-O3\")\n\
       set(PIO_USE_OPENMP ON)\n"
    );
  }

  #[test]
  fn render_escapes_quotes_and_backslashes() {
    let mut record = SettingsRecord::new();
    record.insert("CPPDEFS", r#"-DNAME="pio" -DDIR=C:\tmp"#);

    let rendered = render(&record, "PIO");
    assert!(rendered.contains(r#"set(PIO_CPPDEFS "-DNAME=\"pio\" -DDIR=C:\\tmp")"#));
  }

  #[test]
  #[traced_test]
  fn colliding_keys_render_one_variable() {
    let mut record = SettingsRecord::new();
    record.insert("USE_OPENMP", true);
    record.insert("use-openmp", false);

    let rendered = render(&record, "PIO");

    let lines: Vec<_> = rendered.lines().filter(|l| l.starts_with("set(PIO_USE_OPENMP ")).collect();
    assert_eq!(lines, vec!["set(PIO_USE_OPENMP OFF)"]);
    assert!(logs_contain("settings map to the same macro variable"));
  }

  #[test]
  fn numbers_render_unquoted() {
    let mut record = SettingsRecord::new();
    record.insert("NPROC", SettingValue::Number(4.into()));

    assert!(render(&record, "PIO").contains("set(PIO_NPROC 4)\n"));
  }

  #[test]
  fn empty_record_renders_minimal_file() {
    let rendered = render(&SettingsRecord::new(), "PIO");
    assert_eq!(rendered, "# Generated by machbuild. Do not edit.\n");
  }

  #[test]
  fn emit_overwrites_previous_content() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(MACROS_FILENAME);
    fs::write(&path, "set(PIO_STALE \"yes\")\nmore stale lines\n").unwrap();

    emit(&sample_record(), &path, MACROS_NAMESPACE).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(!written.contains("STALE"));
    assert!(written.contains("set(PIO_FLAG \"-O3\")"));
    assert!(!temp_path_for(&path).exists());
  }

  #[test]
  fn emit_is_byte_identical_across_runs() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(MACROS_FILENAME);

    emit(&sample_record(), &path, MACROS_NAMESPACE).unwrap();
    let first = fs::read(&path).unwrap();
    emit(&sample_record(), &path, MACROS_NAMESPACE).unwrap();
    let second = fs::read(&path).unwrap();

    assert_eq!(first, second);
  }

  #[test]
  fn emit_into_missing_directory_is_write_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("missing").join(MACROS_FILENAME);

    let result = emit(&sample_record(), &path, MACROS_NAMESPACE);

    match result {
      Err(MacroError::MacroWriteError { path: reported, .. }) => assert_eq!(reported, path),
      other => panic!("expected MacroWriteError, got {:?}", other),
    }
    assert!(!temp_path_for(&path).exists());
  }
}
