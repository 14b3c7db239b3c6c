//! Implementation of the `machbuild info` command.
//!
//! Shows what the tool sees of the host and which machine a build without
//! `--mach` would target.

use std::path::Path;

use anyhow::{Context, Result};

use machbuild_lib::config::ConfigDocument;
use machbuild_lib::driver::KnownMachine;
use machbuild_lib::machine::{self, HostProbe};
use machbuild_lib::platform::{self, Os};

use crate::output::{OutputFormat, print_info, print_json, print_stat, print_warning};

pub fn cmd_info(config_dir: Option<&Path>, output: OutputFormat) -> Result<()> {
  let doc = config_dir
    .map(ConfigDocument::load)
    .transpose()
    .context("config stage failed")?;
  let probe = match &doc {
    Some(doc) => HostProbe::with_config(doc),
    None => HostProbe::new(),
  };

  let os = Os::current();
  let hostname = platform::hostname();
  let resolved = machine::resolve(None, &probe);
  let driver = resolved
    .as_ref()
    .ok()
    .and_then(|id| KnownMachine::from_name(id.as_str()));

  if output.is_json() {
    let json_output = serde_json::json!({
      "version": env!("CARGO_PKG_VERSION"),
      "os": os,
      "hostname": hostname,
      "machine": resolved.as_ref().ok(),
      "error": resolved.as_ref().err().map(|e| e.to_string()),
      "driver": driver.map(|m| m.as_str()),
      "config_dir": doc.as_ref().map(|d| d.dir()),
    });
    return print_json(&json_output);
  }

  print_info(format!("machbuild v{}", env!("CARGO_PKG_VERSION")));
  print_stat("OS", os);
  print_stat("Hostname", hostname.as_deref().unwrap_or("(unknown)"));
  if let Some(doc) = &doc {
    print_stat("Config", doc.dir().display());
  }

  match resolved {
    Ok(id) => {
      print_stat("Machine", &id);
      match driver {
        Some(known) => print_stat("Driver", known.as_str()),
        None => print_warning(format!("no build driver for machine {}", id)),
      }
    }
    Err(err) => print_warning(err),
  }
  Ok(())
}
