//! Implementation of the `kiln build` command.
//!
//! Loads the recipe and drives the full pipeline: dependency stage,
//! application stage, image assembly. Prints a summary with the cache
//! outcome, artifact hash, image path, and timing.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use kiln_lib::pipeline::run_build;
use kiln_lib::recipe::Recipe;

use crate::output::{
  format_bytes, format_duration, print_info, print_stat, print_success, symbols, truncate_hash,
};

pub fn cmd_build(recipe_path: &Path) -> Result<()> {
  let recipe = Recipe::load(recipe_path).context("Failed to load recipe")?;
  debug!(root = %recipe.root.display(), source = %recipe.source.display(), "recipe resolved");

  print_info(&format!("Building {}", recipe.name));

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(run_build(&recipe)).context("Build failed")?;

  println!();
  print_success("Build complete!");
  let deps_state = if report.deps_cache_hit { "cached" } else { "compiled" };
  print_stat(
    "Dependencies",
    &format!("{} ({})", truncate_hash(&report.deps_digest.0), deps_state),
  );
  print_stat(
    "Artifact",
    &format!(
      "{} ({})",
      truncate_hash(&report.artifact_digest.0),
      format_bytes(report.artifact_size_bytes)
    ),
  );
  print_stat("Entry point", &report.entry_point);
  print_stat("Duration", &format_duration(report.elapsed));
  println!();
  println!("  {} {}", symbols::ARROW, report.image_dir.display());

  Ok(())
}
