//! Builder subprocess invocation.
//!
//! Both compile stages run the recipe's builder tool inside a prepared
//! build directory with a controlled environment: everything is cleared,
//! a small allowlist (toolchain discovery) is passed through, scratch and
//! locale variables are pinned, and recipe-specified variables are merged
//! last so a recipe can override any of it.

use std::path::Path;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::recipe::BuilderSpec;

/// Host variables forwarded into the builder. Everything else is dropped.
/// PATH and HOME are how the toolchain is found; CARGO_HOME/RUSTUP_HOME
/// keep the host's registry and toolchain caches usable.
const ENV_PASSTHROUGH: &[&str] = &["PATH", "HOME", "CARGO_HOME", "RUSTUP_HOME"];

/// Pinned timestamp for reproducible builder output (January 1, 1980 UTC).
const SOURCE_DATE_EPOCH: &str = "315532800";

/// How many trailing stderr lines a failure carries back to the operator.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum ExecError {
  #[error("failed to start builder `{command}`: {source}")]
  Spawn { command: String, source: std::io::Error },

  #[error("builder `{command}` failed with exit {}\n{stderr_tail}", exit_label(.code))]
  BuilderFailed {
    command: String,
    code: Option<i32>,
    stderr_tail: String,
  },

  #[error("failed to prepare builder scratch directory: {0}")]
  Scratch(#[source] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("code {code}"),
    None => "signal".to_string(),
  }
}

fn render_command(spec: &BuilderSpec) -> String {
  if spec.args.is_empty() {
    spec.command.clone()
  } else {
    format!("{} {}", spec.command, spec.args.join(" "))
  }
}

fn tail(text: &str, max_lines: usize) -> String {
  let lines: Vec<&str> = text.lines().collect();
  let start = lines.len().saturating_sub(max_lines);
  lines[start..].join("\n")
}

/// Run the builder inside `build_dir`.
///
/// The builder's stdout/stderr are captured; on failure the trailing
/// stderr lines ride along in the error so the diagnostic reaches the
/// operator without scraping logs.
pub async fn run_builder(spec: &BuilderSpec, build_dir: &Path) -> Result<(), ExecError> {
  let rendered = render_command(spec);
  info!(command = %rendered, dir = %build_dir.display(), "running builder");

  let tmp_dir = build_dir.join("tmp");
  tokio::fs::create_dir_all(&tmp_dir).await.map_err(ExecError::Scratch)?;

  let mut command = Command::new(&spec.command);
  command
    .args(&spec.args)
    .current_dir(build_dir)
    .env_clear()
    .env("TMPDIR", &tmp_dir)
    .env("TMP", &tmp_dir)
    .env("TEMP", &tmp_dir)
    .env("TEMPDIR", &tmp_dir)
    // Minimal locale
    .env("LANG", "C")
    .env("LC_ALL", "C")
    .env("SOURCE_DATE_EPOCH", SOURCE_DATE_EPOCH);

  for key in ENV_PASSTHROUGH {
    if let Ok(value) = std::env::var(key) {
      command.env(key, value);
    }
  }

  // Recipe env merges last and wins
  for (key, value) in &spec.env {
    command.env(key, value);
  }

  let output = command.output().await.map_err(|e| ExecError::Spawn {
    command: rendered.clone(),
    source: e,
  })?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    if !stderr.is_empty() {
      debug!(stderr = %stderr, "builder stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "builder stdout");
    }

    return Err(ExecError::BuilderFailed {
      command: rendered,
      code: output.status.code(),
      stderr_tail: tail(&stderr, STDERR_TAIL_LINES),
    });
  }

  debug!(command = %rendered, "builder finished");
  Ok(())
}
