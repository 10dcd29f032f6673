use semver::Version;

use crate::error::{Error, Result};

/// Kubernetes version the fleet is evaluated against when none is configured
pub const DEFAULT_TARGET: &str = "v1.23.0";

/// Given a Kubernetes version, parse it into a comparable semantic version
///
/// Accepts the `v`-prefixed format used by the deprecation data (`v1.22.0`)
/// as well as the short `1.23` format. Build metadata such as the Amazon EKS
/// suffix in `v1.20.7-eks-123456` is kept as a pre-release tag.
pub fn parse(version: &str) -> Result<Version> {
  let trimmed = version.trim().trim_start_matches('v');

  let normalized = match trimmed.split('.').count() {
    2 => format!("{trimmed}.0"),
    _ => trimmed.to_owned(),
  };

  Version::parse(&normalized).map_err(|source| Error::Version {
    version: version.to_owned(),
    source,
  })
}

/// Parse an optional version where an empty string means "not scheduled"
pub(crate) fn parse_optional(version: &str) -> Result<Option<Version>> {
  if version.trim().is_empty() {
    return Ok(None);
  }

  parse(version).map(Some)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_valid_versions() {
    let cases = vec![
      ("v1.23.0", (1, 23, 0)),
      ("1.23", (1, 23, 0)),
      ("v1.22", (1, 22, 0)),
      ("1.25.3", (1, 25, 3)),
      (" v1.16.0 ", (1, 16, 0)),
    ];

    for (input, (major, minor, patch)) in cases {
      let version = parse(input).unwrap();
      assert_eq!((version.major, version.minor, version.patch), (major, minor, patch), "parse({input})");
    }
  }

  #[test]
  fn parse_eks_suffix_as_pre_release() {
    let version = parse("v1.20.7-eks-123456").unwrap();
    assert_eq!(version.minor, 20);
    assert!(!version.pre.is_empty());
  }

  #[test]
  fn parse_invalid_versions() {
    assert!(parse("").is_err(), "should fail on empty string");
    assert!(parse("123").is_err(), "should fail on '123' (no dot)");
    assert!(parse("v1.x.0").is_err(), "should fail on non-numeric minor");
  }

  #[test]
  fn parse_optional_empty_is_none() {
    assert!(parse_optional("").unwrap().is_none());
    assert!(parse_optional("  ").unwrap().is_none());
    assert_eq!(parse_optional("v1.22.0").unwrap(), Some(Version::new(1, 22, 0)));
  }

  #[test]
  fn ordering_follows_semver() {
    assert!(parse("v1.23.0").unwrap() >= parse("v1.22.0").unwrap());
    assert!(parse("1.9").unwrap() < parse("1.16").unwrap());
  }

  #[test]
  fn default_target_is_valid() {
    assert_eq!(parse(DEFAULT_TARGET).unwrap(), Version::new(1, 23, 0));
  }
}
