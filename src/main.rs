use anyhow::Result;
use clap::Parser;
use helmscan::{Cli, Commands};
use tracing_log::AsTrace;

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let subscriber = tracing_subscriber::fmt()
    .with_max_level(cli.verbose.log_level_filter().as_trace())
    .with_writer(std::io::stderr)
    .finish();
  tracing::subscriber::set_global_default(subscriber)?;

  match &cli.commands {
    Commands::Scan(args) => {
      helmscan::scan(args).await?;
    }
    Commands::ListVersions(args) => {
      helmscan::list_versions(args)?;
    }
  }

  Ok(())
}
