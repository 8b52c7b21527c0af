//! kiln - staged container-image builds for Rust services.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use cmd::{cmd_build, cmd_gc, cmd_init, cmd_status, cmd_verify};
use output::{OutputFormat, print_error};

/// kiln - staged container-image build pipeline
#[derive(Parser)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the image described by a recipe
  Build {
    /// Path to the recipe file or project directory (default: kiln.toml)
    #[arg(default_value = "kiln.toml")]
    recipe: PathBuf,
  },

  /// Scaffold a new project with a starter recipe
  Init {
    /// Project directory (created if missing)
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// Project name (default: the directory name)
    #[arg(short, long)]
    name: Option<String>,
  },

  /// Show cache entries and store paths
  Status {
    /// Output format
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,
  },

  /// Check an assembled image directory against the minimal-surface rules
  Verify {
    /// Image directory containing rootfs/ and config.json
    image_dir: PathBuf,
  },

  /// Remove stale cache entries and orphaned build directories
  Gc {
    /// Sweep complete cache entries older than this many days
    #[arg(long, default_value_t = 30)]
    max_age_days: u64,

    /// Report what would be removed without deleting anything
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,
  },
}

fn main() {
  let cli = Cli::parse();

  // RUST_LOG wins; --verbose only raises the default
  let default_filter = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build { recipe } => cmd_build(&recipe),
    Commands::Init { dir, name } => cmd_init(&dir, name),
    Commands::Status { output } => cmd_status(cli.verbose, output),
    Commands::Verify { image_dir } => cmd_verify(&image_dir),
    Commands::Gc {
      max_age_days,
      dry_run,
      output,
    } => cmd_gc(max_age_days, dry_run, output),
  };

  if let Err(err) = result {
    print_error(&format!("{:#}", err));
    std::process::exit(1);
  }
}
