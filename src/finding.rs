use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// A resource in a rendered chart that uses a deprecated and/or removed API
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Tabled)]
#[tabled(rename_all = "UpperCase")]
pub struct Finding {
  #[tabled(rename = " ")]
  #[serde(skip)]
  pub symbol: String,
  pub name: String,
  #[tabled(skip)]
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub namespace: String,
  pub kind: String,
  #[tabled(rename = "API VERSION")]
  pub api_version: String,
  #[tabled(skip)]
  pub component: String,
  pub deprecated: bool,
  pub removed: bool,
  #[tabled(rename = "DEPRECATED IN")]
  pub deprecated_in: String,
  #[tabled(rename = "REMOVED IN")]
  pub removed_in: String,
  #[tabled(rename = "REPLACEMENT")]
  pub replacement_api: String,
}

impl Finding {
  pub fn severity(&self) -> Severity {
    if self.removed {
      Severity::Removed
    } else if self.deprecated {
      Severity::Deprecated
    } else {
      Severity::Clean
    }
  }
}

/// Overall severity of a set of findings, ordered from least to most severe
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
  /// Nothing deprecated or removed at the target version
  #[default]
  Clean,
  /// APIs that still work at the target version but are scheduled for removal
  Deprecated,
  /// APIs that are no longer served at the target version
  Removed,
}

impl Severity {
  /// The most severe entry in `findings`
  pub fn of(findings: &[Finding]) -> Self {
    findings.iter().map(Finding::severity).max().unwrap_or_default()
  }

  /// Numeric summary code, suitable as a process exit code
  pub fn code(&self) -> i32 {
    match self {
      Severity::Clean => 0,
      Severity::Deprecated => 2,
      Severity::Removed => 3,
    }
  }

  pub(crate) fn symbol(&self) -> String {
    match self {
      Severity::Clean => "✅".to_string(),
      Severity::Deprecated => "⚠️".to_string(),
      Severity::Removed => "❌".to_string(),
    }
  }
}

impl std::fmt::Display for Severity {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match *self {
      Severity::Clean => write!(f, "Clean"),
      Severity::Deprecated => write!(f, "Deprecated"),
      Severity::Removed => write!(f, "Removed"),
    }
  }
}
