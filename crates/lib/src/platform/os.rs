use std::fmt;

use serde::Serialize;

/// Operating system families the resolver distinguishes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
  Linux,
  #[serde(rename = "darwin")]
  MacOs,
  Windows,
  Other,
}

impl Os {
  /// Detect the operating system this binary is running on.
  pub fn current() -> Self {
    Self::from_name(std::env::consts::OS)
  }

  /// Map a `std::env::consts::OS` style name onto a family.
  pub fn from_name(name: &str) -> Self {
    match name {
      "linux" => Self::Linux,
      "macos" | "darwin" => Self::MacOs,
      "windows" => Self::Windows,
      _ => Self::Other,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
      Self::Other => "other",
    }
  }

  /// Machine identity used for desktop and laptop class systems.
  ///
  /// Such hosts have no meaningful site name, so every one of them shares a
  /// single identity for the whole OS family. Cluster nodes return `None` and
  /// are looked up by name instead.
  pub fn desktop_machine(&self) -> Option<&'static str> {
    match self {
      Self::MacOs => Some("darwin"),
      _ => None,
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
