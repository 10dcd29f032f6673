use std::{collections::BTreeMap, fs, path::Path};

use rust_embed::RustEmbed;
use semver::Version;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::{
  error::{Error, Result},
  version,
};

/// Describes a deprecated API version (group/version)
///
/// Each `DeprecatedVersion` contains the deprecated API in the `group/version` format,
/// the kind, the versions where it was deprecated and removed, and it may or may
/// not provide a replacement API version (if there is one)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Tabled)]
#[tabled(rename_all = "UpperCase")]
pub struct DeprecatedVersion {
  /// The API version in `group/version` format
  #[tabled(rename = "API VERSION")]
  pub api_version: String,
  /// Kind of the object associated with this version
  pub kind: String,
  /// The version where the API was initially marked as deprecated
  #[tabled(rename = "DEPRECATED IN")]
  #[serde(default)]
  pub deprecated_in: String,
  /// The version where the API was finally removed
  #[tabled(rename = "REMOVED IN")]
  #[serde(default)]
  pub removed_in: String,
  /// The replacement API version, if one is available
  #[tabled(rename = "REPLACEMENT")]
  #[serde(default)]
  pub replacement_api: String,
  /// The component the versions above refer to (`k8s`, `cert-manager`, ...)
  #[serde(default = "default_component")]
  pub component: String,
}

fn default_component() -> String {
  "k8s".to_string()
}

impl DeprecatedVersion {
  /// Lookup key in `apiVersion/kind` format
  pub fn key(&self) -> GroupVersionKind {
    gvk(&self.api_version, &self.kind)
  }

  /// Whether the API is deprecated at `target`
  pub fn is_deprecated_in(&self, target: &Version) -> Result<bool> {
    Ok(version::parse_optional(&self.deprecated_in)?.is_some_and(|v| *target >= v))
  }

  /// Whether the API is no longer served at `target`
  pub fn is_removed_in(&self, target: &Version) -> Result<bool> {
    Ok(version::parse_optional(&self.removed_in)?.is_some_and(|v| *target >= v))
  }
}

/// Represents a group/version/kind
pub type GroupVersionKind = String;

pub(crate) fn gvk(api_version: &str, kind: &str) -> GroupVersionKind {
  format!("{api_version}/{kind}")
}

/// Contains the static data of deprecated API versions in YAML format
///
/// This is the source of truth for the APIs that have been identified as
/// deprecated and/or removed as well as what versions those actions take effect
#[derive(RustEmbed)]
#[folder = "data/"]
struct Data;

const VERSIONS_FILE: &str = "versions.yaml";

/// Deprecated API versions keyed by `GroupVersionKind` for quick lookup
#[derive(Clone, Debug, Default)]
pub struct Database {
  versions: BTreeMap<GroupVersionKind, DeprecatedVersion>,
}

impl Database {
  /// Load the deprecation data compiled into the binary
  pub fn embedded() -> Result<Self> {
    let file = Data::get(VERSIONS_FILE).ok_or_else(|| Error::Database(format!("{VERSIONS_FILE} is not embedded")))?;
    let contents = std::str::from_utf8(file.data.as_ref()).map_err(|e| Error::Database(e.to_string()))?;

    Self::from_yaml(contents)
  }

  /// Build a database from a YAML list of `DeprecatedVersion`s
  pub fn from_yaml(contents: &str) -> Result<Self> {
    let mut database = Database::default();
    database.extend_from_yaml(contents)?;

    Ok(database)
  }

  /// Add (or replace) entries from a YAML list of `DeprecatedVersion`s
  pub fn extend_from_yaml(&mut self, contents: &str) -> Result<()> {
    let data: Vec<DeprecatedVersion> = serde_yaml::from_str(contents).map_err(|e| Error::Database(e.to_string()))?;

    for entry in data {
      // Reject bad versions up front so lookups cannot fail later on
      version::parse_optional(&entry.deprecated_in)?;
      version::parse_optional(&entry.removed_in)?;
      self.versions.insert(entry.key(), entry);
    }

    Ok(())
  }

  /// Add (or replace) entries from a user provided file
  pub fn extend_from_file(&mut self, path: &Path) -> Result<()> {
    let contents =
      fs::read_to_string(path).map_err(|e| Error::Database(format!("unable to read {}: {e}", path.display())))?;

    self.extend_from_yaml(&contents)
  }

  pub fn get(&self, api_version: &str, kind: &str) -> Option<&DeprecatedVersion> {
    self.versions.get(&gvk(api_version, kind))
  }

  /// All entries ordered by `GroupVersionKind`
  pub fn versions(&self) -> impl Iterator<Item = &DeprecatedVersion> {
    self.versions.values()
  }

  pub fn len(&self) -> usize {
    self.versions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.versions.is_empty()
  }
}
