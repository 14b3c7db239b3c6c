//! Machine identity resolution.
//!
//! An explicit machine name always wins and is taken as given; it is only
//! checked against the configuration later, when a compiler is selected.
//! Without one, desktop-class hosts map to a fixed identity for their OS
//! family and everything else is identified by a [`MachineProbe`] lookup.

use std::env;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ConfigDocument;
use crate::consts::MACHINE_ENV_VAR;
use crate::platform::{self, Os};

/// Errors that can occur while resolving the machine identity.
#[derive(Debug, Error)]
pub enum MachineError {
  #[error("could not resolve machine name (os: {os}); pass one explicitly or set {MACHINE_ENV_VAR}")]
  MachineUnresolved { os: Os },
}

/// Name of a target machine. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MachineId(String);

impl MachineId {
  /// Returns `None` for blank names.
  pub fn new(name: impl Into<String>) -> Option<Self> {
    let name = name.into();
    if name.trim().is_empty() { None } else { Some(Self(name)) }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for MachineId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Source of facts about the local host.
pub trait MachineProbe {
  /// Operating system family of the host.
  fn os(&self) -> Os;

  /// Site name of the host, if one can be determined.
  fn machine_name(&self) -> Option<String>;
}

/// Probe backed by the real host.
///
/// The machine name comes from `MACHBUILD_MACHINE` when set. Otherwise the
/// hostname is matched against the configured `hostnames` prefixes, falling
/// back to the hostname with its domain and node number removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe<'a> {
  config: Option<&'a ConfigDocument>,
}

impl<'a> HostProbe<'a> {
  pub fn new() -> Self {
    Self { config: None }
  }

  /// Use the machines document for hostname matching.
  pub fn with_config(config: &'a ConfigDocument) -> Self {
    Self { config: Some(config) }
  }

  fn name_for_host(&self, host: &str) -> Option<String> {
    if let Some(name) = self.config.and_then(|doc| doc.machine_for_hostname(host)) {
      debug!(hostname = %host, machine = %name, "matched hostname prefix");
      return Some(name.to_string());
    }
    platform::short_hostname(host)
  }
}

impl MachineProbe for HostProbe<'_> {
  fn os(&self) -> Os {
    Os::current()
  }

  fn machine_name(&self) -> Option<String> {
    if let Some(name) = env::var(MACHINE_ENV_VAR).ok().filter(|n| !n.trim().is_empty()) {
      debug!(machine = %name, "machine taken from {}", MACHINE_ENV_VAR);
      return Some(name);
    }

    let host = platform::hostname()?;
    self.name_for_host(&host)
  }
}

/// Determine the target machine.
///
/// A non-blank `explicit` name is returned verbatim. Otherwise the probe is
/// consulted: desktop OS families resolve to their fixed identity, other hosts
/// to the probe's machine name.
pub fn resolve(explicit: Option<&str>, probe: &impl MachineProbe) -> Result<MachineId, MachineError> {
  if let Some(id) = explicit.and_then(MachineId::new) {
    info!(machine = %id, "using explicit machine");
    return Ok(id);
  }

  let os = probe.os();
  if let Some(name) = os.desktop_machine() {
    info!(machine = %name, os = %os, "desktop host, using OS family machine");
    return Ok(MachineId(name.to_string()));
  }

  match probe.machine_name().and_then(MachineId::new) {
    Some(id) => {
      info!(machine = %id, "detected machine");
      Ok(id)
    }
    None => Err(MachineError::MachineUnresolved { os }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{SAMPLE_COMPILERS, SAMPLE_MACHINES, write_config};
  use serial_test::serial;

  struct FakeProbe {
    os: Os,
    name: Option<&'static str>,
  }

  impl MachineProbe for FakeProbe {
    fn os(&self) -> Os {
      self.os
    }

    fn machine_name(&self) -> Option<String> {
      self.name.map(str::to_string)
    }
  }

  #[test]
  fn explicit_name_is_returned_verbatim() {
    let probe = FakeProbe {
      os: Os::MacOs,
      name: Some("ignored"),
    };

    let id = resolve(Some("Not-In-Any-Config"), &probe).unwrap();
    assert_eq!(id.as_str(), "Not-In-Any-Config");
  }

  #[test]
  fn blank_explicit_name_falls_back_to_probe() {
    let probe = FakeProbe {
      os: Os::Linux,
      name: Some("edison"),
    };

    assert_eq!(resolve(Some(""), &probe).unwrap().as_str(), "edison");
    assert_eq!(resolve(Some("   "), &probe).unwrap().as_str(), "edison");
  }

  #[test]
  fn darwin_host_resolves_to_darwin() {
    let probe = FakeProbe {
      os: Os::MacOs,
      name: Some("my-laptop"),
    };

    assert_eq!(resolve(None, &probe).unwrap().as_str(), "darwin");
  }

  #[test]
  fn cluster_host_uses_machine_name_lookup() {
    let probe = FakeProbe {
      os: Os::Linux,
      name: Some("yellowstone"),
    };

    assert_eq!(resolve(None, &probe).unwrap().as_str(), "yellowstone");
  }

  #[test]
  fn unresolvable_host_is_fatal() {
    for name in [None, Some(""), Some("  ")] {
      let probe = FakeProbe { os: Os::Linux, name };
      let result = resolve(None, &probe);
      assert!(
        matches!(result, Err(MachineError::MachineUnresolved { os: Os::Linux })),
        "expected MachineUnresolved for {:?}",
        name
      );
    }
  }

  #[test]
  #[serial]
  fn host_probe_prefers_environment_override() {
    temp_env::with_var(MACHINE_ENV_VAR, Some("edison"), || {
      assert_eq!(HostProbe::new().machine_name().as_deref(), Some("edison"));
    });
  }

  #[test]
  fn host_probe_matches_configured_prefixes_before_short_name() {
    let (_temp, doc) = write_config(SAMPLE_MACHINES, SAMPLE_COMPILERS);

    let probe = HostProbe::with_config(&doc);
    assert_eq!(probe.name_for_host("yslogin4.ucar.edu").as_deref(), Some("yellowstone"));

    let probe = HostProbe::new();
    assert_eq!(probe.name_for_host("yslogin4.ucar.edu").as_deref(), Some("yslogin"));
  }
}
