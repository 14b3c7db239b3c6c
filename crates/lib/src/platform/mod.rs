//! Facts about the host this tool is running on.
//!
//! Only what machine resolution needs: the OS family and the hostname.

pub mod os;

pub use os::Os;

/// Returns the full hostname, or `None` if it cannot be determined.
pub fn hostname() -> Option<String> {
  whoami::fallible::hostname()
    .ok()
    .map(|h| h.trim().to_string())
    .filter(|h| !h.is_empty())
}

/// Reduce a hostname to a site-level machine name.
///
/// Drops the domain and any trailing node number, so `edison12.nersc.gov`
/// becomes `edison`. Returns `None` when nothing is left.
pub fn short_hostname(host: &str) -> Option<String> {
  let label = host.trim().split('.').next().unwrap_or_default();
  let name = label.trim_end_matches(|c: char| c.is_ascii_digit()).to_lowercase();
  if name.is_empty() { None } else { Some(name) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_hostname_strips_domain_and_node_number() {
    assert_eq!(short_hostname("edison12.nersc.gov").as_deref(), Some("edison"));
    assert_eq!(short_hostname("Yellowstone").as_deref(), Some("yellowstone"));
    assert_eq!(short_hostname("cetus").as_deref(), Some("cetus"));
  }

  #[test]
  fn short_hostname_rejects_numeric_or_empty_names() {
    assert_eq!(short_hostname(""), None);
    assert_eq!(short_hostname("1234.example.org"), None);
    assert_eq!(short_hostname(".example.org"), None);
  }
}
