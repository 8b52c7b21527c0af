use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use kiln_lib::gc::{GcOptions, collect_garbage};
use kiln_lib::store_lock::{LockMode, StoreLock};

use crate::output::{
  OutputFormat, format_bytes, format_duration, print_info, print_json, print_stat, print_success,
};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

pub fn cmd_gc(max_age_days: u64, dry_run: bool, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let _lock = StoreLock::acquire(LockMode::Exclusive, "gc").context("Failed to acquire store lock")?;

  let options = GcOptions {
    max_age: Some(Duration::from_secs(max_age_days * SECONDS_PER_DAY)),
    dry_run,
  };
  let result = collect_garbage(&options)?;

  if output.is_json() {
    print_json(&result)?;
  } else {
    println!();
    if dry_run {
      print_info("Dry run - no changes made");
    } else {
      print_success("Garbage collection complete!");
    }
    print_stat("Entries removed", &result.stats.entries_deleted.to_string());
    print_stat("Scratch dirs removed", &result.stats.scratch_deleted.to_string());
    print_stat("Space freed", &format_bytes(result.stats.total_bytes_freed()));
    print_stat("Duration", &format_duration(start.elapsed()));
  }

  Ok(())
}
