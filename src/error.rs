use std::{io, path::PathBuf};

use thiserror::Error;

/// Convenience alias used throughout the library
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced while scanning a fleet
///
/// Fetch, render and classify errors are recoverable at the cluster level and
/// downgrade that cluster to `Unknown`. Report errors are fatal to the run.
#[derive(Debug, Error)]
pub enum Error {
  #[error("Failed to read {path}")]
  ConfigRead {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to parse {path}")]
  ConfigParse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("Failed to fetch chart {chart}: {stderr}")]
  Fetch { chart: String, stderr: String },

  #[error("Failed to render chart {chart}: {stderr}")]
  Render { chart: String, stderr: String },

  #[error("Invalid chart name '{chart}'")]
  InvalidChart { chart: String },

  #[error("Unable to execute {binary}")]
  Spawn {
    binary: String,
    #[source]
    source: io::Error,
  },

  #[error("Unable to prepare chart working directory {path}")]
  Workdir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to parse rendered manifests")]
  Classify(#[source] serde_yaml::Error),

  #[error("Failed to serialize report")]
  Serialize(#[source] serde_yaml::Error),

  #[error("Failed to write report {path}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Invalid Kubernetes version '{version}'")]
  Version {
    version: String,
    #[source]
    source: semver::Error,
  },

  #[error("Invalid deprecation data: {0}")]
  Database(String),
}

impl Error {
  /// Whether the error only affects a single cluster and is worth retrying
  pub fn is_cluster_scoped(&self) -> bool {
    matches!(
      self,
      Error::Fetch { .. } | Error::Render { .. } | Error::Spawn { .. } | Error::Workdir { .. } | Error::Classify(_)
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fetch_error_surfaces_stderr() {
    let err = Error::Fetch {
      chart: "apollo".into(),
      stderr: "chart not found".into(),
    };
    assert_eq!(err.to_string(), "Failed to fetch chart apollo: chart not found");
    assert!(err.is_cluster_scoped());
  }

  #[test]
  fn alternate_format_includes_source() {
    let err = anyhow::Error::from(Error::Workdir {
      path: PathBuf::from("charts"),
      source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
    });
    assert_eq!(
      format!("{err:#}"),
      "Unable to prepare chart working directory charts: permission denied"
    );
  }

  #[test]
  fn invalid_chart_is_not_retried() {
    let err = Error::InvalidChart {
      chart: "../apollo".into(),
    };
    assert_eq!(err.to_string(), "Invalid chart name '../apollo'");
    assert!(!err.is_cluster_scoped());
  }

  #[test]
  fn report_errors_are_not_cluster_scoped() {
    let err = Error::Write {
      path: PathBuf::from("/nope/report.yaml"),
      source: io::Error::new(io::ErrorKind::NotFound, "missing"),
    };
    assert!(!err.is_cluster_scoped());
  }
}
