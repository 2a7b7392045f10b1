//! Implementation of the `jarlock update` command.
//!
//! Re-runs the include scripts, rewrites the lock file, and regenerates the
//! BUCK files. This is the only command that writes the lock file.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;
use walkdir::WalkDir;

use jarlock_lib::buck::BuckEmitter;
use jarlock_lib::checksum::{ChecksumCache, HttpFetch};
use jarlock_lib::lock::LOCK_FILENAME;
use jarlock_lib::mvn::CoordResolver;
use jarlock_lib::registry::Registry;

use crate::output::{format_duration, symbols};

/// Execute the update command.
///
/// # Arguments
///
/// * `root` - Workspace root; lock file location and base for generated files.
/// * `repo` - Default repository for libraries without a `repo` option.
/// * `includes` - Include scripts to run. Directories are walked for `*.lua`
///   files in sorted order.
///
/// # Errors
///
/// Returns an error when an include script is missing or fails, when two
/// definitions collide on a target, or when the lock file or a build file
/// cannot be written.
pub fn cmd_update(root: &Path, repo: &str, includes: &[PathBuf]) -> Result<()> {
  let start = Instant::now();

  let registry = Rc::new(RefCell::new(Registry::default()));
  let cache = Rc::new(RefCell::new(ChecksumCache::new(Box::new(HttpFetch::new()))));
  let resolver = Rc::new(CoordResolver::new(repo));

  for script in expand_includes(root, includes)? {
    registry.borrow_mut().include(script);
  }

  Registry::uplock(&registry, &cache, &resolver, root).context("Failed to relock libraries")?;

  let registry = registry.borrow();
  let written = registry
    .gen_buckfiles(&BuckEmitter, root)
    .context("Failed to generate build files")?;

  println!(
    "  {} Locked {} librar{}: {}",
    symbols::ADD.green(),
    registry.libraries().len(),
    if registry.libraries().len() == 1 { "y" } else { "ies" },
    root.join(LOCK_FILENAME).display()
  );
  println!("  {} Generated {} BUCK file(s)", symbols::SUCCESS.green(), written);
  println!(
    "  {} Duration: {}",
    symbols::INFO.dimmed(),
    format_duration(start.elapsed()).dimmed()
  );

  Ok(())
}

/// Turn the include arguments into a flat list of script paths.
///
/// Relative paths are anchored at the workspace root; directories are
/// walked recursively and contribute their `*.lua` files in sorted order.
fn expand_includes(root: &Path, includes: &[PathBuf]) -> Result<Vec<PathBuf>> {
  let mut scripts = Vec::new();

  for include in includes {
    let path = if include.is_absolute() {
      include.clone()
    } else {
      root.join(include)
    };

    if path.is_dir() {
      for entry in WalkDir::new(&path).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "lua") {
          scripts.push(entry.into_path());
        }
      }
    } else if path.is_file() {
      scripts.push(path);
    } else {
      bail!("include script not found: {}", path.display());
    }
  }

  Ok(scripts)
}
