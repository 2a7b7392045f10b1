//! Implementation of the `jarlock gen` command.
//!
//! Hydrates the registry from the lock file and regenerates the BUCK files.
//! Include scripts never run here, so the result is exactly what the lock
//! file pins; with a complete lock file no network access happens at all.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use jarlock_lib::buck::BuckEmitter;
use jarlock_lib::checksum::{ChecksumCache, HttpFetch};
use jarlock_lib::mvn::CoordResolver;
use jarlock_lib::registry::Registry;

use crate::output::{format_duration, symbols};

/// Execute the gen command.
///
/// # Errors
///
/// Returns an error when the lock file is missing or unreadable, or when a
/// build file cannot be written.
pub fn cmd_gen(root: &Path, repo: &str) -> Result<()> {
  let start = Instant::now();

  let mut registry = Registry::default();
  let mut cache = ChecksumCache::new(Box::new(HttpFetch::new()));
  let resolver = CoordResolver::new(repo);

  registry
    .prepare(&mut cache, &resolver, root)
    .context("Failed to hydrate libraries from lock file")?;

  let written = registry
    .gen_buckfiles(&BuckEmitter, root)
    .context("Failed to generate build files")?;

  println!(
    "  {} Generated {} BUCK file(s) for {} libraries",
    symbols::SUCCESS.green(),
    written,
    registry.libraries().len()
  );
  println!(
    "  {} Duration: {}",
    symbols::INFO.dimmed(),
    format_duration(start.elapsed()).dimmed()
  );

  Ok(())
}
