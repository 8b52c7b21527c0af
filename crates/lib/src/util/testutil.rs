//! Test utilities for kiln-lib.
//!
//! Cross-platform helpers for tests that need a stand-in builder command.
//! Real recipes invoke `cargo`; tests substitute small shell scripts so the
//! pipeline can be exercised without a toolchain.

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// A fake builder that concatenates everything under `src/` into the given
/// artifact path. The artifact bytes therefore track the sources that were
/// present at build time, which is what the stale-artifact tests rely on.
#[cfg(unix)]
pub fn concat_builder(artifact: &str) -> (&'static str, Vec<String>) {
  shell_cmd(&format!(
    "mkdir -p \"$(dirname '{artifact}')\" && cat src/*.rs > '{artifact}'"
  ))
}

/// A fake builder that appends one line to the file named by `$BUILD_LOG`
/// before producing the artifact. Tests count lines to count builder runs.
#[cfg(unix)]
pub fn counting_builder(artifact: &str) -> (&'static str, Vec<String>) {
  shell_cmd(&format!(
    "echo run >> \"$BUILD_LOG\" && mkdir -p \"$(dirname '{artifact}')\" && cat src/*.rs > '{artifact}'"
  ))
}
