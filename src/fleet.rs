use std::{collections::BTreeMap, fs, path::Path};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{Error, Result};

/// Root of the fleet file: zones keyed by name
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetSpec {
  #[serde(default)]
  pub zones: BTreeMap<String, ZoneSpec>,
}

impl FleetSpec {
  /// Total number of clusters across all zones
  pub fn cluster_count(&self) -> usize {
    self.zones.values().map(|zone| zone.clusters.len()).sum()
  }
}

/// A group of clusters, typically one per environment or region
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub alias: String,

  #[serde(default, alias = "Clusters")]
  pub clusters: BTreeMap<String, ClusterSpec>,

  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub description: String,

  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub endpoint: String,
}

/// A single chart deployment as declared in the fleet file
///
/// Only `chart`, `chart_version` and `values_files` drive the evaluation;
/// the remaining fields are carried through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
  #[serde(default)]
  pub autosync: bool,

  #[serde(default)]
  pub chart: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub chart_version: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub git_repo: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub helm_repo: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ignore_differences: Option<IgnoreDifferences>,

  #[serde(default)]
  pub name: String,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub sync_options: Vec<String>,

  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub values_files: Vec<String>,
}

impl ClusterSpec {
  /// Whether there is a chart to evaluate at all
  pub fn has_chart(&self) -> bool {
    !self.chart.trim().is_empty()
  }
}

/// Shapes observed for `ignoreDifferences`
///
/// Anything else is kept as opaque YAML and round-tripped without being interpreted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IgnoreDifferences {
  Paths(Vec<String>),
  Rules(Vec<BTreeMap<String, serde_yaml::Value>>),
  Mapping(BTreeMap<String, serde_yaml::Value>),
  Opaque(serde_yaml::Value),
}

/// What to do when the fleet file cannot be read or parsed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnFleetError {
  /// Stop the run with the error
  #[default]
  Abort,
  /// Log the error and continue with zero clusters
  Empty,
}

/// Load the fleet file at `path`
pub fn load(path: &Path) -> Result<FleetSpec> {
  let contents = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
    path: path.to_owned(),
    source,
  })?;

  parse(&contents).map_err(|source| Error::ConfigParse {
    path: path.to_owned(),
    source,
  })
}

/// Load the fleet file, applying `policy` when it cannot be read or parsed
pub fn load_with_policy(path: &Path, policy: OnFleetError) -> Result<FleetSpec> {
  match load(path) {
    Ok(fleet) => {
      debug!(path = %path.display(), zones = fleet.zones.len(), clusters = fleet.cluster_count(), "Loaded fleet");
      Ok(fleet)
    }
    Err(err) => match policy {
      OnFleetError::Abort => Err(err),
      OnFleetError::Empty => {
        let err = anyhow::Error::from(err);
        error!("{err:#}; continuing with an empty fleet");
        Ok(FleetSpec::default())
      }
    },
  }
}

fn parse(contents: &str) -> std::result::Result<FleetSpec, serde_yaml::Error> {
  if contents.trim().is_empty() {
    return Ok(FleetSpec::default());
  }

  serde_yaml::from_str(contents)
}
