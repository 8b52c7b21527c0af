//! Implementation of the `kiln verify` command.
//!
//! Re-checks an already assembled image directory: the rootfs must pass the
//! minimal-surface rules and hold exactly the files `config.json` implies.
//! Violations exit with code 2 so scripts can tell "dirty image" from
//! "verify itself failed".

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use kiln_lib::image::surface::{scan_rootfs, verify_exact_contents};
use kiln_lib::image::{CA_BUNDLE_INSTALL_PATH, ImageConfig};
use kiln_lib::platform::Platform;
use kiln_lib::stage::assemble::{CONFIG_FILE_NAME, ROOTFS_DIR_NAME};

use crate::output::{print_error, print_stat, print_success, print_warning, symbols};

pub fn cmd_verify(image_dir: &Path) -> Result<()> {
  if !image_dir.is_dir() {
    bail!("image directory not found: {}", image_dir.display());
  }
  let image_dir = dunce::canonicalize(image_dir).unwrap_or_else(|_| image_dir.to_path_buf());

  let rootfs = image_dir.join(ROOTFS_DIR_NAME);
  let config_path = image_dir.join(CONFIG_FILE_NAME);
  let mut problems: Vec<String> = Vec::new();

  let config = load_config(&config_path, &mut problems)?;

  if rootfs.is_dir() {
    let violations = scan_rootfs(&rootfs).context("Failed to scan rootfs")?;
    problems.extend(violations.iter().map(|v| v.to_string()));

    if let Some(config) = &config {
      match expected_contents(config) {
        Ok(expected) => {
          let violations =
            verify_exact_contents(&rootfs, &expected).context("Failed to compare rootfs contents")?;
          problems.extend(violations.iter().map(|v| v.to_string()));
        }
        Err(problem) => problems.push(problem),
      }
    }
  } else {
    problems.push(format!("{}/ is missing", ROOTFS_DIR_NAME));
  }

  if let Some(config) = &config
    && let Some(platform) = Platform::current()
    && (config.architecture != platform.arch.as_str() || config.os != platform.os.as_str())
  {
    print_warning(&format!(
      "image targets {}-{}, this host is {}",
      config.architecture, config.os, platform
    ));
  }

  if problems.is_empty() {
    print_success(&format!("Image surface is clean: {}", image_dir.display()));
    if let Some(config) = &config {
      if let Some(entry) = config.config.entrypoint.first() {
        print_stat("Entry point", entry);
      }
      let ports: Vec<&str> = config.config.exposed_ports.keys().map(String::as_str).collect();
      print_stat("Exposed ports", &ports.join(", "));
    }
    return Ok(());
  }

  for problem in &problems {
    println!("  {} {}", symbols::ERROR, problem);
  }
  print_error(&format!("{} violation(s) in {}", problems.len(), image_dir.display()));
  std::process::exit(2);
}

/// Parse `config.json` if present. A missing or garbled config is a
/// violation, not a hard error.
fn load_config(config_path: &Path, problems: &mut Vec<String>) -> Result<Option<ImageConfig>> {
  if !config_path.is_file() {
    problems.push(format!("{} is missing", CONFIG_FILE_NAME));
    return Ok(None);
  }

  let raw = std::fs::read_to_string(config_path)
    .with_context(|| format!("Failed to read {}", config_path.display()))?;
  match serde_json::from_str::<ImageConfig>(&raw) {
    Ok(config) => Ok(Some(config)),
    Err(e) => {
      problems.push(format!("{} does not parse: {}", CONFIG_FILE_NAME, e));
      Ok(None)
    }
  }
}

/// The exact rootfs contents the config commits to: the entry-point binary
/// and the CA bundle.
fn expected_contents(config: &ImageConfig) -> Result<Vec<PathBuf>, String> {
  let entry = config
    .config
    .entrypoint
    .first()
    .ok_or_else(|| format!("{} declares an empty entry point", CONFIG_FILE_NAME))?;
  Ok(vec![
    PathBuf::from(entry.trim_start_matches('/')),
    PathBuf::from(CA_BUNDLE_INSTALL_PATH),
  ])
}
