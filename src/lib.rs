pub mod classify;
pub mod config;
pub mod deprecations;
pub mod error;
pub mod evaluate;
pub mod finding;
pub mod fleet;
pub mod helm;
pub mod output;
pub mod report;
pub mod version;

use std::path::PathBuf;

use anstyle::{AnsiColor, Color, Style};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, builder::Styles};
use clap_verbosity_flag::Verbosity;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::info;

pub use error::Error;

use crate::{
  classify::Classifier,
  config::{Config, FailurePolicy},
  evaluate::Settings,
  fleet::OnFleetError,
  helm::HelmCli,
};

fn styles() -> Styles {
  let color = |c: AnsiColor| Some(Color::Ansi(c));

  Styles::styled()
    .header(Style::new().bold().underline().fg_color(color(AnsiColor::Green)))
    .usage(Style::new().bold().fg_color(color(AnsiColor::Green)))
    .literal(Style::new().bold().fg_color(color(AnsiColor::Cyan)))
    .placeholder(Style::new().fg_color(color(AnsiColor::Cyan)))
}

#[derive(Parser, Debug)]
#[command(author, about, version)]
#[command(propagate_version = true)]
#[command(styles = styles())]
pub struct Cli {
  #[command(subcommand)]
  pub commands: Commands,

  #[clap(flatten)]
  pub verbose: Verbosity,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  Scan(Scan),
  ListVersions(ListVersions),
}

/// Render every chart in the fleet and report clusters using removed Kubernetes APIs
#[derive(Args, Debug, Serialize, Deserialize)]
pub struct Scan {
  /// Fleet file describing zones, clusters and their charts
  #[arg(short, long, env = "HELMSCAN_FLEET", default_value = "argocd-apps.yaml")]
  pub fleet: PathBuf,

  /// Where the YAML report is written (overwritten if present)
  #[arg(short, long, env = "HELMSCAN_OUTPUT", default_value = "helmscan-report.yaml")]
  pub output: PathBuf,

  /// Configuration file; defaults to `.helmscan.yaml` when present
  #[arg(short, long, env = "HELMSCAN_CONFIG")]
  pub config: Option<String>,

  /// Scratch directory charts are unpacked into
  #[arg(long, env = "HELMSCAN_WORKDIR")]
  pub workdir: Option<PathBuf>,

  /// Helm repository charts are fetched from
  #[arg(long, env = "HELMSCAN_CHART_REPO")]
  pub chart_repo: Option<String>,

  /// Helm binary to invoke
  #[arg(long, env = "HELMSCAN_HELM")]
  pub helm: Option<String>,

  /// Kubernetes version the charts are evaluated against (e.g. v1.23.0)
  #[arg(short, long, env = "HELMSCAN_TARGET_VERSION")]
  pub target_version: Option<String>,

  /// Which findings fail a cluster
  #[arg(long, value_enum)]
  pub fail_on: Option<FailurePolicy>,

  /// What to do when the fleet file cannot be read or parsed
  #[arg(long, value_enum)]
  pub on_fleet_error: Option<OnFleetError>,

  /// Additional attempts for a failed chart fetch or render
  #[arg(long)]
  pub retries: Option<u32>,

  #[arg(long, value_enum, default_value_t)]
  pub format: output::Format,
}

/// List the deprecated and removed APIs known to helmscan
#[derive(Args, Debug, Serialize, Deserialize)]
pub struct ListVersions {
  /// Configuration file; defaults to `.helmscan.yaml` when present
  #[arg(short, long, env = "HELMSCAN_CONFIG")]
  pub config: Option<String>,

  #[arg(long, value_enum, default_value_t)]
  pub format: output::Format,
}

impl Scan {
  /// Command line flags take precedence over the configuration file
  fn apply(&self, mut config: Config) -> Config {
    if let Some(workdir) = &self.workdir {
      config.workdir = workdir.to_owned();
    }
    if let Some(chart_repo) = &self.chart_repo {
      config.chart_repo = chart_repo.to_owned();
    }
    if let Some(helm) = &self.helm {
      config.helm = helm.to_owned();
    }
    if let Some(target) = &self.target_version {
      config.classifier.target_versions.insert("k8s".to_string(), target.to_owned());
    }
    if let Some(fail_on) = self.fail_on {
      config.fail_on = fail_on;
    }
    if let Some(policy) = self.on_fleet_error {
      config.on_fleet_error = policy;
    }
    if let Some(retries) = self.retries {
      config.retries = retries;
    }

    config
  }
}

fn progress_bar(len: usize) -> ProgressBar {
  let bar = ProgressBar::new(len as u64);
  if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}") {
    bar.set_style(style.progress_chars("=> "));
  }

  bar
}

/// Scan every cluster in the fleet and write the report
pub async fn scan(args: &Scan) -> Result<report::ReportMap> {
  let config = args.apply(config::load(args.config.as_deref())?);

  // All configuration is validated before any chart is fetched
  let classifier = Classifier::from_config(&config.classifier).context("Invalid classifier configuration")?;
  let fleet = fleet::load_with_policy(&args.fleet, config.on_fleet_error)?;

  let client = HelmCli::new(&config.helm, &config.workdir);
  let settings = Settings {
    chart_repo: config.chart_repo.to_owned(),
    fail_on: config.fail_on,
    retries: config.retries,
  };

  let bar = progress_bar(fleet.cluster_count());
  let report = evaluate::scan_fleet(&client, &classifier, &settings, &fleet, |zone, cluster, result| {
    bar.set_message(format!("{zone}/{cluster}: {result}"));
    bar.inc(1);
  })
  .await;
  bar.finish_and_clear();

  report::write(&args.output, &report).with_context(|| format!("Unable to write report {}", args.output.display()))?;
  info!(path = %args.output.display(), clusters = report.len(), "Wrote report");

  let summary = output::summarize(&fleet, &report);
  print!("{}", output::render_summary(&summary, args.format)?);

  Ok(report)
}

/// Print the deprecation data in use
pub fn list_versions(args: &ListVersions) -> Result<()> {
  let config = config::load(args.config.as_deref())?;
  let classifier = Classifier::from_config(&config.classifier)?;

  let versions: Vec<_> = classifier.database().versions().cloned().collect();
  println!("{}", output::render_versions(&versions, args.format)?);

  Ok(())
}
