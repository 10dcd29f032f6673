use std::future::Future;

use tracing::{debug, info, warn};

use crate::{
  classify::Classifier,
  config::FailurePolicy,
  error::Result,
  finding::{Finding, Severity},
  fleet::{ClusterSpec, FleetSpec},
  helm::ChartClient,
  report::{ClusterResult, ReportMap},
};

const CRD_KIND: &str = "CustomResourceDefinition";

/// Per-run settings shared by every cluster evaluation
#[derive(Clone, Debug)]
pub struct Settings {
  /// Repository charts are fetched from
  pub chart_repo: String,
  pub fail_on: FailurePolicy,
  /// Additional attempts for a failed fetch or render
  pub retries: u32,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      chart_repo: "chartrepo".to_string(),
      fail_on: FailurePolicy::default(),
      retries: 0,
    }
  }
}

/// Names of the resources that make a cluster fail under `policy`
pub fn offending(findings: &[Finding], policy: FailurePolicy) -> Vec<String> {
  findings
    .iter()
    .filter(|f| f.removed)
    .filter(|f| match policy {
      FailurePolicy::Crds => f.kind == CRD_KIND,
      FailurePolicy::Removed => true,
    })
    .filter_map(|f| {
      if f.name.is_empty() {
        warn!(kind = %f.kind, api_version = %f.api_version, "Skipping offending resource without a name");
        None
      } else {
        Some(f.name.to_owned())
      }
    })
    .collect()
}

async fn with_retries<T, F, Fut>(retries: u32, what: &str, mut op: F) -> Result<T>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let mut attempt = 0;
  loop {
    match op().await {
      Ok(value) => return Ok(value),
      Err(err) if attempt < retries && err.is_cluster_scoped() => {
        attempt += 1;
        let err = anyhow::Error::from(err);
        debug!(attempt, "Retrying {what}: {err:#}");
      }
      Err(err) => return Err(err),
    }
  }
}

/// Evaluate a single cluster
///
/// Any failure to fetch, render or classify the chart downgrades the cluster to `Unknown`;
/// the reason is logged but not part of the result.
pub async fn evaluate<C: ChartClient>(
  client: &C,
  classifier: &Classifier,
  settings: &Settings,
  name: &str,
  cluster: &ClusterSpec,
) -> ClusterResult {
  if !cluster.has_chart() {
    info!(cluster = name, "No chart to evaluate");
    return ClusterResult::Unknown;
  }

  match findings(client, classifier, settings, cluster).await {
    Ok(findings) => {
      let severity = Severity::of(&findings);
      let result = ClusterResult::from_offending(offending(&findings, settings.fail_on));
      info!(
        cluster = name,
        chart = %cluster.chart,
        %severity,
        code = severity.code(),
        result = %result,
        "Evaluated chart"
      );
      result
    }
    Err(err) => {
      let err = anyhow::Error::from(err);
      warn!(cluster = name, chart = %cluster.chart, "{err:#}");
      ClusterResult::Unknown
    }
  }
}

/// Fetch, render and classify the cluster's chart, returning the filtered findings
async fn findings<C: ChartClient>(
  client: &C,
  classifier: &Classifier,
  settings: &Settings,
  cluster: &ClusterSpec,
) -> Result<Vec<Finding>> {
  let version = cluster.chart_version.as_deref();
  let chart_path = with_retries(settings.retries, "fetch", move || {
    client.fetch(&settings.chart_repo, &cluster.chart, version)
  })
  .await?;

  let chart_path = chart_path.as_path();
  let rendered = with_retries(settings.retries, "render", move || {
    client.render(chart_path, &cluster.values_files)
  })
  .await?;

  let findings = classifier.classify(&rendered)?;
  Ok(classifier.filter(findings))
}

/// Evaluate every cluster of every zone, one at a time
///
/// `on_evaluated` is invoked after each cluster, e.g. to advance a progress bar.
pub async fn scan_fleet<C, F>(
  client: &C,
  classifier: &Classifier,
  settings: &Settings,
  fleet: &FleetSpec,
  mut on_evaluated: F,
) -> ReportMap
where
  C: ChartClient,
  F: FnMut(&str, &str, &ClusterResult),
{
  let mut report = ReportMap::new();

  for (zone_name, zone) in &fleet.zones {
    debug!(zone = %zone_name, clusters = zone.clusters.len(), "Scanning zone");

    for (name, cluster) in &zone.clusters {
      let result = evaluate(client, classifier, settings, name, cluster).await;
      on_evaluated(zone_name, name, &result);

      if report.insert(name.to_owned(), result).is_some() {
        warn!(cluster = %name, zone = %zone_name, "Cluster name is defined in more than one zone; keeping the last result");
      }
    }
  }

  report
}
