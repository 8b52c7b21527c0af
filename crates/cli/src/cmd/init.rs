//! Implementation of the `kiln init` command.
//!
//! Scaffolds a starter `kiln.toml` in the given directory and sets up the
//! store structure.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use kiln_lib::init::{InitOptions, init};

use crate::output::symbols;

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if a recipe already exists at the target or if
/// directory creation fails.
pub fn cmd_init(dir: &Path, name: Option<String>) -> Result<()> {
  let options = InitOptions {
    project_path: dir.to_path_buf(),
    name,
  };

  let result = init(&options).context("Failed to initialize project")?;

  println!(
    "{} {}",
    symbols::SUCCESS.green(),
    "Initialized kiln project!".green().bold()
  );
  println!();
  println!(
    "  {} Project directory: {}",
    symbols::INFO.cyan(),
    result.project_dir.display()
  );
  println!(
    "  {} Recipe:            {}",
    symbols::INFO.cyan(),
    result.recipe_path.display()
  );
  println!(
    "  {} Store:             {}",
    symbols::INFO.cyan(),
    result.store_dir.display()
  );
  println!();
  println!("{}", "Next steps:".bold());
  println!(
    "  1. Edit {} to describe your build",
    result.recipe_path.display().to_string().cyan()
  );
  println!(
    "  2. Run: {}",
    format!("kiln build {}", result.recipe_path.display()).cyan()
  );

  Ok(())
}
