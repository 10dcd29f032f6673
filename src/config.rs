use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{fleet::OnFleetError, version};

/// Top-level configuration loaded from `.helmscan.yaml` or an explicit path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
  /// Helm repository the charts are fetched from (`<chart_repo>/<chart>`)
  #[serde(default = "default_chart_repo")]
  pub chart_repo: String,

  /// Helm binary to invoke
  #[serde(default = "default_helm")]
  pub helm: String,

  /// Scratch directory charts are unpacked into
  #[serde(default = "default_workdir")]
  pub workdir: PathBuf,

  /// Additional attempts made for a failed fetch or render
  #[serde(default)]
  pub retries: u32,

  #[serde(default)]
  pub fail_on: FailurePolicy,

  #[serde(default)]
  pub on_fleet_error: OnFleetError,

  #[serde(default)]
  pub classifier: ClassifierConfig,
}

fn default_chart_repo() -> String {
  "chartrepo".to_string()
}

fn default_helm() -> String {
  "helm".to_string()
}

fn default_workdir() -> PathBuf {
  PathBuf::from(".helmscan/charts")
}

impl Default for Config {
  fn default() -> Self {
    Self {
      chart_repo: default_chart_repo(),
      helm: default_helm(),
      workdir: default_workdir(),
      retries: 0,
      fail_on: FailurePolicy::default(),
      on_fleet_error: OnFleetError::default(),
      classifier: ClassifierConfig::default(),
    }
  }
}

/// Which findings turn a cluster into `Failed`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
  /// CustomResourceDefinitions using an API removed at the target version
  #[default]
  Crds,
  /// Any resource using an API removed at the target version
  Removed,
}

/// Options for matching rendered manifests against the deprecation data
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassifierConfig {
  /// Target version per component, e.g. `k8s: v1.23.0`
  #[serde(default = "default_target_versions")]
  pub target_versions: BTreeMap<String, String>,

  /// Components whose findings are reported
  #[serde(default = "default_components")]
  pub components: Vec<String>,

  /// Suppress findings that are deprecated but not removed
  #[serde(default = "default_true")]
  pub ignore_deprecations: bool,

  /// Suppress findings that are removed
  #[serde(default)]
  pub ignore_removals: bool,

  /// Only report findings that are removed
  #[serde(default = "default_true")]
  pub only_show_removed: bool,

  /// Extra deprecation data merged over the embedded data
  #[serde(default)]
  pub additional_versions: Option<PathBuf>,
}

fn default_target_versions() -> BTreeMap<String, String> {
  BTreeMap::from([("k8s".to_string(), version::DEFAULT_TARGET.to_string())])
}

fn default_components() -> Vec<String> {
  vec!["k8s".to_string()]
}

fn default_true() -> bool {
  true
}

impl Default for ClassifierConfig {
  fn default() -> Self {
    Self {
      target_versions: default_target_versions(),
      components: default_components(),
      ignore_deprecations: true,
      ignore_removals: false,
      only_show_removed: true,
      additional_versions: None,
    }
  }
}

const DEFAULT_CONFIG_FILE: &str = ".helmscan.yaml";

/// Load configuration from an explicit path, the default `.helmscan.yaml` in the
/// current working directory, or fall back to `Config::default()`.
pub fn load(path: Option<&str>) -> Result<Config> {
  load_from(path, std::env::current_dir().ok().as_deref())
}

fn load_from(path: Option<&str>, base_dir: Option<&std::path::Path>) -> Result<Config> {
  if let Some(p) = path {
    let contents = std::fs::read_to_string(p).with_context(|| format!("Failed to read config file: {p}"))?;
    let config: Config =
      serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse config file: {p}"))?;
    return Ok(config);
  }

  if let Some(dir) = base_dir {
    let default_path = dir.join(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
      let contents = std::fs::read_to_string(&default_path)
        .with_context(|| format!("Failed to read config file: {}", default_path.display()))?;
      let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", default_path.display()))?;
      return Ok(config);
    }
  }

  Ok(Config::default())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn config_default() {
    let cfg = Config::default();
    assert_eq!(cfg.chart_repo, "chartrepo");
    assert_eq!(cfg.helm, "helm");
    assert_eq!(cfg.retries, 0);
    assert_eq!(cfg.fail_on, FailurePolicy::Crds);
    assert_eq!(cfg.on_fleet_error, OnFleetError::Abort);
  }

  #[test]
  fn classifier_config_default() {
    let cfg = ClassifierConfig::default();
    assert_eq!(cfg.target_versions["k8s"], "v1.23.0");
    assert_eq!(cfg.components, vec!["k8s"]);
    assert!(cfg.ignore_deprecations);
    assert!(!cfg.ignore_removals);
    assert!(cfg.only_show_removed);
    assert!(cfg.additional_versions.is_none());
  }

  #[test]
  fn deserialize_empty_yaml() {
    let cfg: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(cfg.chart_repo, "chartrepo");
    assert_eq!(cfg.classifier.target_versions["k8s"], "v1.23.0");
    assert!(cfg.classifier.only_show_removed);
  }

  #[test]
  fn deserialize_full_yaml() {
    let yaml = r#"
chart_repo: internal
helm: /usr/local/bin/helm
workdir: /tmp/charts
retries: 2
fail_on: removed
on_fleet_error: empty
classifier:
  target_versions:
    k8s: v1.25.0
    cert-manager: v1.6.0
  components: [k8s, cert-manager]
  ignore_deprecations: false
  ignore_removals: false
  only_show_removed: false
  additional_versions: extra.yaml
"#;
    let cfg: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.chart_repo, "internal");
    assert_eq!(cfg.workdir, PathBuf::from("/tmp/charts"));
    assert_eq!(cfg.retries, 2);
    assert_eq!(cfg.fail_on, FailurePolicy::Removed);
    assert_eq!(cfg.on_fleet_error, OnFleetError::Empty);
    assert_eq!(cfg.classifier.target_versions.len(), 2);
    assert_eq!(cfg.classifier.components.len(), 2);
    assert!(!cfg.classifier.ignore_deprecations);
    assert!(!cfg.classifier.only_show_removed);
    assert_eq!(cfg.classifier.additional_versions, Some(PathBuf::from("extra.yaml")));
  }

  #[test]
  fn deserialize_partial_classifier_yaml() {
    let yaml = r#"
classifier:
  ignore_removals: true
"#;
    let cfg: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.classifier.ignore_removals);
    assert!(cfg.classifier.ignore_deprecations);
    assert_eq!(cfg.classifier.components, vec!["k8s"]);
  }

  #[test]
  fn load_no_path_no_default_file() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = load_from(None, Some(tmp.path())).unwrap();
    assert_eq!(cfg.chart_repo, "chartrepo");
  }

  #[test]
  fn load_explicit_path() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("my-config.yaml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "chart_repo: stable\nretries: 1").unwrap();

    let cfg = load_from(Some(path.to_str().unwrap()), None).unwrap();
    assert_eq!(cfg.chart_repo, "stable");
    assert_eq!(cfg.retries, 1);
  }

  #[test]
  fn load_explicit_path_not_found() {
    let result = load_from(Some("/tmp/does-not-exist-helmscan-test.yaml"), None);
    assert!(result.is_err());
  }

  #[test]
  fn load_default_file_in_base_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let default_path = tmp.path().join(".helmscan.yaml");
    let mut f = std::fs::File::create(&default_path).unwrap();
    writeln!(f, "fail_on: removed").unwrap();

    let cfg = load_from(None, Some(tmp.path())).unwrap();
    assert_eq!(cfg.fail_on, FailurePolicy::Removed);
  }

  #[test]
  fn load_no_base_dir_returns_default() {
    let cfg = load_from(None, None).unwrap();
    assert_eq!(cfg.fail_on, FailurePolicy::Crds);
  }
}
