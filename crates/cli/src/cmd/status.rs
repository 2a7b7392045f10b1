//! Implementation of the `jarlock status` command.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use jarlock_lib::checksum::{ChecksumCache, HttpFetch};
use jarlock_lib::mvn::CoordResolver;
use jarlock_lib::registry::Registry;

use crate::output::symbols;

/// Execute the status command: list the libraries pinned by the lock file.
pub fn cmd_status(root: &Path, repo: &str) -> Result<()> {
  let mut registry = Registry::default();
  let mut cache = ChecksumCache::new(Box::new(HttpFetch::new()));
  let resolver = CoordResolver::new(repo);

  registry
    .prepare(&mut cache, &resolver, root)
    .context("Failed to hydrate libraries from lock file")?;

  println!("{} libraries", registry.libraries().len());
  for library in registry.libraries() {
    println!("  {} {}", symbols::INFO.dimmed(), library);
  }

  Ok(())
}
