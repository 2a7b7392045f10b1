use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

/// jarlock - reproducible Buck rule generation for third-party JVM libraries
#[derive(Parser)]
#[command(name = "jarlock")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Workspace root: lock file location and base for generated files
  #[arg(short = 'C', long, global = true, default_value = ".")]
  root: PathBuf,

  /// Default Maven repository for libraries without a 'repo' option
  #[arg(long, global = true, default_value = jarlock_lib::mvn::MAVEN_CENTRAL)]
  repo: String,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Re-run include scripts, rewrite the lock file, and regenerate BUCK files
  Update {
    /// Include scripts to run; directories are walked for *.lua files
    #[arg(default_value = "libs.lua")]
    includes: Vec<PathBuf>,
  },

  /// Regenerate BUCK files from the lock file without running include scripts
  Gen,

  /// List the libraries pinned by the lock file
  Status,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Update { includes } => cmd::cmd_update(&cli.root, &cli.repo, &includes),
    Commands::Gen => cmd::cmd_gen(&cli.root, &cli.repo),
    Commands::Status => cmd::cmd_status(&cli.root, &cli.repo),
  }
}
