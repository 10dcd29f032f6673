use std::{
  future::Future,
  path::{Component, Path, PathBuf},
  process::Output,
};

use tokio::{fs, process::Command};
use tracing::debug;

use crate::error::{Error, Result};

/// Characters that make a chart version a range rather than a pinned version
const RANGE_OPERATORS: [char; 4] = ['*', '~', '^', '-'];

/// Trait abstracting the chart operations used by helmscan
pub trait ChartClient {
  /// Fetch and unpack `<repo>/<chart>`, returning the local chart directory
  fn fetch(&self, repo: &str, chart: &str, version: Option<&str>) -> impl Future<Output = Result<PathBuf>> + Send;

  /// Render the chart at `chart_path`, applying `values_files` in order
  fn render(&self, chart_path: &Path, values_files: &[String]) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Whether `version` pins an exact chart version
///
/// Empty versions and versions containing range operators are left for helm to resolve.
pub fn is_pinned(version: &str) -> bool {
  let version = version.trim();
  !version.is_empty() && !version.contains(RANGE_OPERATORS)
}

/// Resolve a values file relative to the unpacked chart directory
pub fn values_path(chart_path: &Path, values_file: &str) -> PathBuf {
  chart_path.join(values_file)
}

/// Whether `chart` is a single plain path component, i.e. stays inside the workdir when joined
pub fn is_chart_name(chart: &str) -> bool {
  let mut components = Path::new(chart).components();
  matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

/// Arguments for `helm fetch`
pub(crate) fn fetch_args(repo: &str, chart: &str, version: Option<&str>, workdir: &Path) -> Vec<String> {
  let mut args = vec!["fetch".to_string(), format!("{repo}/{chart}")];

  if let Some(version) = version.filter(|v| is_pinned(v)) {
    args.push("--version".to_string());
    args.push(version.trim().to_string());
  }

  args.push("--untar".to_string());
  args.push("-d".to_string());
  args.push(workdir.display().to_string());

  args
}

/// Arguments for `helm template`
pub(crate) fn template_args(chart_path: &Path, values_files: &[String]) -> Vec<String> {
  let mut args = vec!["template".to_string(), chart_path.display().to_string()];

  for file in values_files {
    args.push("-f".to_string());
    args.push(values_path(chart_path, file).display().to_string());
  }

  args
}

/// Real implementation invoking the `helm` binary
#[derive(Clone, Debug)]
pub struct HelmCli {
  binary: String,
  workdir: PathBuf,
}

impl HelmCli {
  pub fn new(binary: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
    Self {
      binary: binary.into(),
      workdir: workdir.into(),
    }
  }

  async fn run(&self, args: &[String]) -> Result<Output> {
    debug!("{} {}", self.binary, args.join(" "));

    Command::new(&self.binary)
      .args(args)
      .output()
      .await
      .map_err(|source| Error::Spawn {
        binary: self.binary.to_owned(),
        source,
      })
  }

  /// Remove any previous copy of `chart` so the fetch unpacks into a clean directory
  async fn prepare_workdir(&self, chart: &str) -> Result<PathBuf> {
    if !is_chart_name(chart) {
      return Err(Error::InvalidChart { chart: chart.to_owned() });
    }

    let workdir_err = |path: &Path| {
      let path = path.to_owned();
      move |source: std::io::Error| Error::Workdir { path, source }
    };

    fs::create_dir_all(&self.workdir).await.map_err(workdir_err(&self.workdir))?;

    let chart_path = self.workdir.join(chart);
    if fs::try_exists(&chart_path).await.map_err(workdir_err(&chart_path))? {
      debug!(path = %chart_path.display(), "Removing previous chart copy");
      fs::remove_dir_all(&chart_path).await.map_err(workdir_err(&chart_path))?;
    }

    Ok(chart_path)
  }
}

impl ChartClient for HelmCli {
  async fn fetch(&self, repo: &str, chart: &str, version: Option<&str>) -> Result<PathBuf> {
    let chart_path = self.prepare_workdir(chart).await?;

    let output = self.run(&fetch_args(repo, chart, version, &self.workdir)).await?;
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      debug!(chart, status = %output.status, "{stderr}");
      return Err(Error::Fetch {
        chart: format!("{repo}/{chart}"),
        stderr,
      });
    }

    Ok(chart_path)
  }

  async fn render(&self, chart_path: &Path, values_files: &[String]) -> Result<Vec<u8>> {
    let output = self.run(&template_args(chart_path, values_files)).await?;
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      debug!(chart = %chart_path.display(), status = %output.status, "{stderr}");
      return Err(Error::Render {
        chart: chart_path.display().to_string(),
        stderr,
      });
    }

    Ok(output.stdout)
  }
}
