mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use distrobuild_lib::consts::DEFAULT_CONFIG_FILE;

use crate::output::OutputFormat;

/// Build per-platform distributions by running an installer over base images
#[derive(Parser)]
#[command(name = "distrobuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the build configuration file
  #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
  config: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build a distribution for every discovered target
  Build {
    /// Number of targets to build at once (overrides the config file)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Installer executable (overrides the config file)
    #[arg(long)]
    installer: Option<PathBuf>,
  },

  /// Show the targets, install units, repositories and installer commands without building
  Plan {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build { jobs, installer } => cmd::cmd_build(&cli.config, jobs, installer),
    Commands::Plan { output } => cmd::cmd_plan(&cli.config, output),
  };

  if let Err(e) = result {
    output::report_error(&format!("{e:#}"));
    std::process::exit(1);
  }
}
