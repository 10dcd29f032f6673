use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Outcome of evaluating a single cluster
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Entry", from = "Entry")]
pub enum ClusterResult {
  /// The rendered chart uses no offending APIs
  Passed,
  /// Names of the resources using offending APIs
  Failed(Vec<String>),
  /// The chart could not be evaluated
  Unknown,
}

impl ClusterResult {
  /// Build a `Failed` result from offending names, or `Passed` when there are none
  pub fn from_offending<I>(names: I) -> Self
  where
    I: IntoIterator<Item = String>,
  {
    let mut names: Vec<String> = names.into_iter().collect();
    names.sort();
    names.dedup();

    if names.is_empty() {
      ClusterResult::Passed
    } else {
      ClusterResult::Failed(names)
    }
  }

  pub fn status(&self) -> &'static str {
    match self {
      ClusterResult::Passed => "Passed",
      ClusterResult::Failed(_) => "Failed",
      ClusterResult::Unknown => "Unknown",
    }
  }

  pub fn offending(&self) -> &[String] {
    match self {
      ClusterResult::Failed(names) => names,
      _ => &[],
    }
  }
}

impl std::fmt::Display for ClusterResult {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "{}", self.status())
  }
}

/// On-disk shape of a `ClusterResult`
///
/// `Passed` and `Unknown` are plain strings while `Failed` carries the offending
/// resource names (`Failed: [widgets.example.com]`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Entry {
  Status(String),
  Failed {
    #[serde(rename = "Failed")]
    resources: Vec<String>,
  },
}

impl From<ClusterResult> for Entry {
  fn from(result: ClusterResult) -> Self {
    match result {
      ClusterResult::Failed(resources) => Entry::Failed { resources },
      other => Entry::Status(other.status().to_string()),
    }
  }
}

impl From<Entry> for ClusterResult {
  fn from(entry: Entry) -> Self {
    match entry {
      Entry::Failed { resources } => ClusterResult::Failed(resources),
      Entry::Status(status) => match status.as_str() {
        "Passed" => ClusterResult::Passed,
        "Failed" => ClusterResult::Failed(Vec::new()),
        _ => ClusterResult::Unknown,
      },
    }
  }
}

/// Results keyed by cluster name
pub type ReportMap = BTreeMap<String, ClusterResult>;

/// Serialize `report` as YAML
pub fn to_yaml(report: &ReportMap) -> Result<String> {
  serde_yaml::to_string(report).map_err(Error::Serialize)
}

/// Write `report` to `path`, replacing any existing file
pub fn write(path: &Path, report: &ReportMap) -> Result<()> {
  let contents = to_yaml(report)?;

  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(|source| Error::Write {
      path: path.to_owned(),
      source,
    })?;
  }

  fs::write(path, contents).map_err(|source| Error::Write {
    path: path.to_owned(),
    source,
  })
}

/// Read a report previously written with [`write`]
pub fn read(path: &Path) -> Result<ReportMap> {
  let contents = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
    path: path.to_owned(),
    source,
  })?;

  serde_yaml::from_str(&contents).map_err(|source| Error::ConfigParse {
    path: path.to_owned(),
    source,
  })
}
