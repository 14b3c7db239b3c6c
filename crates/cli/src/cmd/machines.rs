//! Implementation of the `machbuild machines` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use machbuild_lib::config::ConfigDocument;
use machbuild_lib::driver::KnownMachine;

use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

#[derive(Debug, Serialize)]
struct MachineSummary<'a> {
  name: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  description: Option<&'a str>,
  compilers: &'a [String],
  default_compiler: Option<&'a str>,
  has_driver: bool,
}

pub fn cmd_machines(config_dir: &Path, output: OutputFormat) -> Result<()> {
  let doc = ConfigDocument::load(config_dir).context("config stage failed")?;

  let summaries: Vec<_> = doc
    .machines()
    .map(|(name, entry)| MachineSummary {
      name,
      description: entry.description.as_deref(),
      compilers: &entry.compilers,
      default_compiler: entry.compilers.first().map(String::as_str),
      has_driver: KnownMachine::from_name(name).is_some(),
    })
    .collect();

  if output.is_json() {
    return print_json(&summaries);
  }

  let dir = dunce::canonicalize(doc.dir()).unwrap_or_else(|_| doc.dir().to_path_buf());
  print_info(format!("{} machine(s) in {}", summaries.len(), dir.display()));
  for machine in &summaries {
    println!();
    let marker = if machine.has_driver { symbols::SUCCESS } else { symbols::WARNING };
    println!("{} {}", marker, machine.name);
    if let Some(description) = machine.description {
      print_stat("Description", description);
    }
    if machine.compilers.is_empty() {
      print_stat("Compilers", "(none)");
    } else {
      print_stat("Compilers", machine.compilers.join(", "));
    }
    if !machine.has_driver {
      print_stat("Driver", "none");
    }
  }
  Ok(())
}
