use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  sync::Mutex,
};

use helmscan::{Error, error::Result, helm::ChartClient};

/// How the mock responds for a given chart
#[derive(Clone, Debug)]
pub enum Outcome {
  /// Fetch and render succeed, rendering these manifests
  Rendered(String),
  /// `helm fetch` exits non-zero
  FetchFails,
  /// `helm template` exits non-zero
  RenderFails,
}

/// A recorded fetch call
#[derive(Clone, Debug, PartialEq)]
pub struct FetchCall {
  pub repo: String,
  pub chart: String,
  pub version: Option<String>,
}

/// Mock chart client for testing. Charts without an outcome fail to fetch.
#[derive(Default)]
pub struct MockChartClient {
  pub outcomes: HashMap<String, Outcome>,
  pub fetches: Mutex<Vec<FetchCall>>,
  pub renders: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

impl MockChartClient {
  pub fn with(mut self, chart: &str, outcome: Outcome) -> Self {
    self.outcomes.insert(chart.to_string(), outcome);
    self
  }

  pub fn fetch_calls(&self) -> Vec<FetchCall> {
    self.fetches.lock().unwrap().clone()
  }

  pub fn render_calls(&self) -> Vec<(PathBuf, Vec<String>)> {
    self.renders.lock().unwrap().clone()
  }

  fn chart_of(path: &Path) -> String {
    path.file_name().map(|name| name.to_string_lossy().to_string()).unwrap_or_default()
  }
}

impl ChartClient for MockChartClient {
  async fn fetch(&self, repo: &str, chart: &str, version: Option<&str>) -> Result<PathBuf> {
    self.fetches.lock().unwrap().push(FetchCall {
      repo: repo.to_string(),
      chart: chart.to_string(),
      version: version.map(str::to_string),
    });

    match self.outcomes.get(chart) {
      Some(Outcome::FetchFails) | None => Err(Error::Fetch {
        chart: format!("{repo}/{chart}"),
        stderr: "Error: chart not found".into(),
      }),
      Some(_) => Ok(PathBuf::from("charts").join(chart)),
    }
  }

  async fn render(&self, chart_path: &Path, values_files: &[String]) -> Result<Vec<u8>> {
    self
      .renders
      .lock()
      .unwrap()
      .push((chart_path.to_owned(), values_files.to_vec()));

    match self.outcomes.get(&Self::chart_of(chart_path)) {
      Some(Outcome::Rendered(manifests)) => Ok(manifests.clone().into_bytes()),
      _ => Err(Error::Render {
        chart: chart_path.display().to_string(),
        stderr: "Error: template failed".into(),
      }),
    }
  }
}

/// Mock whose fetch fails a fixed number of times before rendering `manifests`
pub struct FlakyChartClient {
  pub failures: Mutex<u32>,
  pub manifests: String,
}

impl FlakyChartClient {
  pub fn new(failures: u32, manifests: &str) -> Self {
    Self {
      failures: Mutex::new(failures),
      manifests: manifests.to_string(),
    }
  }
}

impl ChartClient for FlakyChartClient {
  async fn fetch(&self, repo: &str, chart: &str, _version: Option<&str>) -> Result<PathBuf> {
    let mut failures = self.failures.lock().unwrap();
    if *failures > 0 {
      *failures -= 1;
      return Err(Error::Fetch {
        chart: format!("{repo}/{chart}"),
        stderr: "Error: connection reset".into(),
      });
    }
    Ok(PathBuf::from("charts").join(chart))
  }

  async fn render(&self, _chart_path: &Path, _values_files: &[String]) -> Result<Vec<u8>> {
    Ok(self.manifests.clone().into_bytes())
  }
}
