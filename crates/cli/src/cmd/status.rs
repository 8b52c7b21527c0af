//! Implementation of the `kiln status` command.
//!
//! Lists dependency-cache entries with their age and size, plus the store
//! paths in effect. Takes the store lock in shared mode so a running build
//! is never observed mid-write.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

use kiln_lib::platform::paths::{cache_dir, parent_store_dir, store_dir};
use kiln_lib::store::list_entries;
use kiln_lib::store_lock::{LockMode, StoreLock};

use crate::output::{
  OutputFormat, format_age, format_bytes, print_json, print_stat, print_success, symbols, truncate_hash,
};

pub fn cmd_status(verbose: bool, output: OutputFormat) -> Result<()> {
  let _lock = StoreLock::acquire(LockMode::Shared, "status").context("Failed to acquire store lock")?;

  let store = store_dir();
  let entries = list_entries(&store)?;
  let total_bytes: u64 = entries.iter().map(|e| e.size_bytes).sum();
  let complete = entries.iter().filter(|e| e.complete).count();

  if output.is_json() {
    let json_output = serde_json::json!({
      "store": store,
      "parent_store": parent_store_dir(),
      "scratch": cache_dir().join("builds"),
      "entries": entries,
      "total_bytes": total_bytes,
    });
    return print_json(&json_output);
  }

  print_success(&format!("Store: {}", store.display()));
  if let Some(parent) = parent_store_dir() {
    print_stat("Parent store", &parent.display().to_string());
  }
  print_stat("Scratch", &cache_dir().join("builds").display().to_string());
  println!();
  print_stat("Entries", &format!("{} ({} complete)", entries.len(), complete));
  print_stat("Store usage", &format_bytes(total_bytes));

  if !entries.is_empty() {
    println!();
    println!("Cache entries:");
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    for entry in &entries {
      let symbol = if entry.complete { symbols::INFO } else { symbols::WARNING };
      let age = match entry.created_at_unix {
        Some(created) => format_age(Duration::from_secs(now.saturating_sub(created))),
        None => "incomplete".to_string(),
      };
      println!(
        "  {} {}  {}  {}",
        symbol,
        truncate_hash(&entry.digest),
        format_bytes(entry.size_bytes),
        age
      );
      if verbose {
        println!("      {}", entry.path.display());
      }
    }
  }

  Ok(())
}
