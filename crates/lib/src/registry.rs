//! The library registry and its two initialization paths.
//!
//! The registry is the process-wide collection of committed libraries,
//! indexed by canonical target (unique) and by package path (for output
//! batching). It is populated through exactly one of two paths per run:
//!
//! - [`prepare`](Registry::prepare) hydrates directly from the lock file;
//!   no include scripts execute.
//! - [`uplock`](Registry::uplock) re-runs the include scripts, commits what
//!   they staged, and rewrites the lock file. The previous lock file is
//!   loaded only to seed the checksum cache.
//!
//! Both paths share the same commit primitive, [`add`](Registry::add),
//! which enforces target uniqueness and builds the indexes.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, info};

use crate::buck::{self, BuckEmitter, BUCK_FILENAME, GEN_BANNER};
use crate::checksum::ChecksumCache;
use crate::library::{LibOptions, Library, LibraryError};
use crate::lock::{LockError, LockFile, LOCK_FILENAME};
use crate::lua;
use crate::mvn::CoordResolver;
use crate::ops;

/// Errors that can occur while populating the registry or generating files.
#[derive(Debug, Error)]
pub enum RegistryError {
  /// `uplock` was invoked on a registry that already holds libraries.
  #[error("libraries already defined, refusing to re-run include scripts")]
  AlreadyInitialized,

  /// Two definitions resolved to the same canonical target.
  #[error("duplicate library {target}: new definition {conflicting} conflicts with {existing}")]
  DuplicateTarget {
    target: String,
    existing: String,
    conflicting: String,
  },

  /// Hydration was requested but no lock file exists yet.
  #[error("no {LOCK_FILENAME} in {}; run 'jarlock update' first", dir.display())]
  MissingLock { dir: PathBuf },

  #[error(transparent)]
  Lock(#[from] LockError),

  #[error(transparent)]
  Library(#[from] LibraryError),

  /// An include script failed to execute.
  #[error("include script {} failed: {source}", path.display())]
  Include {
    path: PathBuf,
    #[source]
    source: mlua::Error,
  },

  /// A generated build file could not be written.
  #[error("failed to write {}: {source}", path.display())]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Process-wide collection of library definitions.
#[derive(Default)]
pub struct Registry {
  includes: Vec<PathBuf>,
  staged: Vec<Library>,
  all: Vec<Library>,
  by_target: BTreeMap<String, usize>,
  by_path: BTreeMap<String, Vec<usize>>,
}

impl Registry {
  /// Register an include script to run during [`uplock`](Self::uplock).
  pub fn include(&mut self, path: impl Into<PathBuf>) {
    self.includes.push(path.into());
  }

  /// Construct a library from raw include-script arguments and append it to
  /// the staged set. This is the only operation include scripts can reach.
  pub fn stage(
    &mut self,
    target: &str,
    jars: &[String],
    options: LibOptions,
    resolver: &CoordResolver,
    cache: &mut ChecksumCache,
  ) -> Result<(), LibraryError> {
    let library = Library::from_raw(target, jars, options, resolver, cache)?;
    debug!(library = %library, "staged library");
    self.staged.push(library);
    Ok(())
  }

  /// Commit one library: uniqueness-check its target, then index it.
  ///
  /// The check happens before any mutation, so a duplicate leaves the
  /// registry exactly as it was.
  pub fn add(&mut self, library: Library) -> Result<(), RegistryError> {
    let key = library.target().to_string();
    if let Some(&existing) = self.by_target.get(&key) {
      return Err(RegistryError::DuplicateTarget {
        target: key,
        existing: self.all[existing].to_string(),
        conflicting: library.to_string(),
      });
    }

    let index = self.all.len();
    self.by_target.insert(key, index);
    self.by_path.entry(library.path().to_string()).or_default().push(index);
    self.all.push(library);
    Ok(())
  }

  /// Hydrate the registry from the lock file without running include
  /// scripts. No-op when the registry is already populated.
  ///
  /// The lock file's checksums are installed into the cache first, so
  /// reconstruction does not hit the network for artifacts the lock file
  /// already covers.
  pub fn prepare(
    &mut self,
    cache: &mut ChecksumCache,
    resolver: &CoordResolver,
    root: &Path,
  ) -> Result<(), RegistryError> {
    if !self.all.is_empty() {
      return Ok(());
    }

    let lock_path = root.join(LOCK_FILENAME);
    let lock = LockFile::load(&lock_path)?.ok_or_else(|| RegistryError::MissingLock {
      dir: root.to_path_buf(),
    })?;
    lock.seed_cache(cache);

    for entry in &lock.libraries {
      let library = Library::from_raw(&entry.target, &entry.jars, entry.options.clone(), resolver, cache)?;
      self.add(library)?;
    }

    info!(count = self.all.len(), "hydrated libraries from lock file");
    Ok(())
  }

  /// Re-derive all library definitions from the include scripts and rewrite
  /// the lock file.
  ///
  /// Fails without side effects when the registry is already populated.
  /// Each registered include script runs exactly once with the staging
  /// callback as its only capability; afterwards the staged set is
  /// committed in staging order and the lock file is replaced with the raw
  /// tuples of the committed set plus the checksum-cache snapshot. This is
  /// the only path that writes the lock file.
  pub fn uplock(
    registry: &Rc<RefCell<Registry>>,
    cache: &Rc<RefCell<ChecksumCache>>,
    resolver: &Rc<CoordResolver>,
    root: &Path,
  ) -> Result<(), RegistryError> {
    if !registry.borrow().all.is_empty() {
      return Err(RegistryError::AlreadyInitialized);
    }

    let lock_path = root.join(LOCK_FILENAME);
    if let Some(lock) = LockFile::load(&lock_path)? {
      // Seed known checksums only. The library entries are discarded:
      // include scripts are the source of truth for this pass.
      lock.seed_cache(&mut cache.borrow_mut());
    }

    let includes = std::mem::take(&mut registry.borrow_mut().includes);
    for path in &includes {
      debug!(path = %path.display(), "running include script");
      lua::run_include(path, registry, cache, resolver).map_err(|source| RegistryError::Include {
        path: path.clone(),
        source,
      })?;
    }

    let staged = std::mem::take(&mut registry.borrow_mut().staged);
    info!(count = staged.len(), "committing staged libraries");
    {
      let mut registry = registry.borrow_mut();
      for library in staged {
        registry.add(library)?;
      }
    }

    let registry = registry.borrow();
    LockFile::from_registry(&registry.all, &cache.borrow()).save(&lock_path)?;
    info!(path = %lock_path.display(), "wrote lock file");
    Ok(())
  }

  /// Write one generated build file per package path, then tell Buck its
  /// cached view of the workspace is stale. Returns the number of files
  /// written.
  pub fn gen_buckfiles(&self, emitter: &BuckEmitter, root: &Path) -> Result<usize, RegistryError> {
    for (path, indices) in &self.by_path {
      let mut content = String::from(GEN_BANNER);
      for &index in indices {
        for fragment in self.all[index].to_buck_rules(emitter) {
          content.push_str("\n\n");
          content.push_str(&fragment);
        }
      }
      content.push('\n');

      let file = root.join(path).join(BUCK_FILENAME);
      ops::write(&file, &content).map_err(|source| RegistryError::Write {
        path: file.clone(),
        source,
      })?;
      debug!(path = %file.display(), "wrote build file");
    }

    buck::drop_cache(root);
    Ok(self.by_path.len())
  }

  /// Committed libraries in commit order.
  pub fn libraries(&self) -> &[Library] {
    &self.all
  }

  /// Libraries staged during the current reconcile pass.
  pub fn staged(&self) -> &[Library] {
    &self.staged
  }

  /// Look up a committed library by canonical target string.
  pub fn get(&self, target: &str) -> Option<&Library> {
    self.by_target.get(target).map(|&index| &self.all[index])
  }

  pub fn is_empty(&self) -> bool {
    self.all.is_empty()
  }
}

impl fmt::Display for Registry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Libraries")?;
    for library in &self.all {
      write!(f, "\n\t{library}")?;
    }
    Ok(())
  }
}
