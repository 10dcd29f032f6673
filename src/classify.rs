use std::collections::BTreeMap;

use semver::Version;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::{
  config::ClassifierConfig,
  deprecations::Database,
  error::{Error, Result},
  finding::Finding,
  version,
};

/// The subset of a Kubernetes object needed to identify its API
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Resource {
  #[serde(default)]
  api_version: Option<String>,
  #[serde(default)]
  kind: Option<String>,
  #[serde(default)]
  metadata: Option<Metadata>,
  /// Only populated for `*List` kinds
  #[serde(default)]
  items: Vec<serde_yaml::Value>,
}

/// Only the identifying fields; labels, annotations and the rest are ignored
#[derive(Debug, Default, Deserialize)]
struct Metadata {
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  namespace: Option<String>,
}

/// Matches rendered manifests against the deprecation data
///
/// Built once per run and shared by reference across all cluster evaluations.
#[derive(Clone, Debug)]
pub struct Classifier {
  pub target_versions: BTreeMap<String, Version>,
  pub components: Vec<String>,
  pub ignore_deprecations: bool,
  pub ignore_removals: bool,
  pub only_show_removed: bool,
  database: Database,
}

impl Classifier {
  pub fn new(database: Database, config: &ClassifierConfig) -> Result<Self> {
    let target_versions = config
      .target_versions
      .iter()
      .map(|(component, target)| Ok((component.to_owned(), version::parse(target)?)))
      .collect::<Result<BTreeMap<_, _>>>()?;

    Ok(Self {
      target_versions,
      components: config.components.clone(),
      ignore_deprecations: config.ignore_deprecations,
      ignore_removals: config.ignore_removals,
      only_show_removed: config.only_show_removed,
      database,
    })
  }

  /// Embedded deprecation data, extended with `additional_versions` when configured
  pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
    let mut database = Database::embedded()?;
    if let Some(path) = &config.additional_versions {
      database.extend_from_file(path)?;
    }

    Self::new(database, config)
  }

  pub fn database(&self) -> &Database {
    &self.database
  }

  /// Returns a finding for every resource in `manifests` whose API appears in the deprecation data
  ///
  /// `manifests` may contain any number of YAML documents; empty documents are skipped
  /// and `*List` kinds are expanded into their items.
  pub fn classify(&self, manifests: &[u8]) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    for document in serde_yaml::Deserializer::from_slice(manifests) {
      let value = serde_yaml::Value::deserialize(document).map_err(Error::Classify)?;
      self.classify_value(value, &mut findings)?;
    }

    debug!(findings = findings.len(), "Classified rendered manifests");
    Ok(findings)
  }

  fn classify_value(&self, value: serde_yaml::Value, findings: &mut Vec<Finding>) -> Result<()> {
    if !value.is_mapping() {
      trace!("Skipping non-object document");
      return Ok(());
    }

    let resource: Resource = serde_yaml::from_value(value).map_err(Error::Classify)?;
    let (Some(api_version), Some(kind)) = (resource.api_version.as_deref(), resource.kind.as_deref()) else {
      trace!("Skipping document without apiVersion/kind");
      return Ok(());
    };

    if kind.ends_with("List") {
      for item in resource.items {
        self.classify_value(item, findings)?;
      }
      return Ok(());
    }

    let Some(deprecated) = self.database.get(api_version, kind) else {
      return Ok(());
    };

    let (is_deprecated, is_removed) = match self.target_versions.get(&deprecated.component) {
      Some(target) => (deprecated.is_deprecated_in(target)?, deprecated.is_removed_in(target)?),
      None => (false, false),
    };

    let metadata = resource.metadata.unwrap_or_default();
    let mut finding = Finding {
      symbol: String::new(),
      name: metadata.name.unwrap_or_default(),
      namespace: metadata.namespace.unwrap_or_default(),
      kind: kind.to_owned(),
      api_version: api_version.to_owned(),
      component: deprecated.component.to_owned(),
      deprecated: is_deprecated,
      removed: is_removed,
      deprecated_in: deprecated.deprecated_in.to_owned(),
      removed_in: deprecated.removed_in.to_owned(),
      replacement_api: deprecated.replacement_api.to_owned(),
    };
    finding.symbol = finding.severity().symbol();

    findings.push(finding);
    Ok(())
  }

  /// Applies the component and suppression options to `findings`
  pub fn filter(&self, findings: Vec<Finding>) -> Vec<Finding> {
    findings
      .into_iter()
      .filter(|f| self.components.iter().any(|c| *c == f.component))
      .filter(|f| (f.deprecated && !self.ignore_deprecations) || (f.removed && !self.ignore_removals))
      .filter(|f| !self.only_show_removed || f.removed)
      .collect()
  }
}
