use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled, settings::Style};

use crate::{deprecations::DeprecatedVersion, fleet::FleetSpec, report::ReportMap};

/// Converts vec into comma separated string for tabled output
pub fn tabled_vec_to_string(v: &[String]) -> String {
  v.join(", ")
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum Format {
  /// JSON format used for logging or further processing
  Json,
  /// Text format used for writing to stdout
  #[default]
  Text,
}

/// One line of the scan summary
#[derive(Clone, Debug, Serialize, Deserialize, Tabled)]
#[tabled(rename_all = "UpperCase")]
pub struct Summary {
  pub zone: String,
  pub cluster: String,
  pub chart: String,
  pub version: String,
  pub result: String,
  #[tabled(display = "tabled_vec_to_string")]
  pub resources: Vec<String>,
}

/// Joins the fleet definition with the evaluated results, in fleet order
pub fn summarize(fleet: &FleetSpec, report: &ReportMap) -> Vec<Summary> {
  fleet
    .zones
    .iter()
    .flat_map(|(zone_name, zone)| {
      zone.clusters.iter().filter_map(move |(name, cluster)| {
        report.get(name).map(|result| Summary {
          zone: zone_name.to_owned(),
          cluster: name.to_owned(),
          chart: cluster.chart.to_owned(),
          version: cluster.chart_version.clone().unwrap_or_default(),
          result: result.status().to_string(),
          resources: result.offending().to_vec(),
        })
      })
    })
    .collect()
}

fn to_stdout_table<T: Tabled>(rows: &[T]) -> String {
  if rows.is_empty() {
    return String::new();
  }

  let mut table = Table::new(rows);
  table.with(Style::markdown());

  format!("{table}\n")
}

pub fn render_summary(rows: &[Summary], format: Format) -> Result<String> {
  let output = match format {
    Format::Json => serde_json::to_string_pretty(rows)?,
    Format::Text => to_stdout_table(rows),
  };

  Ok(output)
}

pub fn render_versions(versions: &[DeprecatedVersion], format: Format) -> Result<String> {
  let output = match format {
    Format::Json => serde_json::to_string_pretty(versions)?,
    Format::Text => to_stdout_table(versions),
  };

  Ok(output)
}
