//! Lock file management.
//!
//! The lock file (`jarlock.lock`) pins the committed library definitions and
//! every checksum learned during a run, so that regeneration is reproducible
//! across machines without re-running include scripts or re-fetching
//! checksums. It lives in the workspace root next to the include scripts.
//!
//! # Lock File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "checksums": {
//!     "https://repo1.maven.org/maven2/.../guava-31.1-jre.jar.sha1": "60458f877d055d0c9114d9e1a2efb737b4bc282c"
//!   },
//!   "libraries": [
//!     {
//!       "target": "//thirdparty/guava:guava",
//!       "jars": ["com.google.guava:guava:31.1-jre"],
//!       "options": { "deps": ["//thirdparty/failureaccess"] }
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checksum::ChecksumCache;
use crate::library::{LibOptions, Library};

/// Current lock file format version.
pub const LOCK_VERSION: u32 = 1;

/// Lock file name.
pub const LOCK_FILENAME: &str = "jarlock.lock";

/// A lock file: checksum snapshot plus committed library tuples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockFile {
  /// Lock file format version.
  pub version: u32,

  /// Every checksum known at store time, keyed by URI. Entries for
  /// artifacts no longer referenced are carried forward; they are harmless
  /// and keep history cheap to diff.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub checksums: BTreeMap<String, String>,

  /// Committed libraries in commit order.
  pub libraries: Vec<LockedLibrary>,
}

/// The raw tuple a [`Library`] is reconstructed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedLibrary {
  /// Canonical target string.
  pub target: String,

  /// Raw jar coordinates in declaration order.
  pub jars: Vec<String>,

  /// Options as declared in the include script.
  #[serde(default, skip_serializing_if = "LibOptions::is_empty")]
  pub options: LibOptions,
}

/// Errors that can occur when working with lock files.
#[derive(Debug, Error)]
pub enum LockError {
  /// Failed to read the lock file.
  #[error("failed to read lock file: {0}")]
  Read(#[source] io::Error),

  /// Failed to write the lock file.
  #[error("failed to write lock file: {0}")]
  Write(#[source] io::Error),

  /// Failed to parse the lock file JSON.
  #[error("failed to parse lock file: {0}")]
  Parse(#[source] serde_json::Error),

  /// Failed to serialize the lock file.
  #[error("failed to serialize lock file: {0}")]
  Serialize(#[source] serde_json::Error),

  /// Lock file version is not supported.
  #[error("unsupported lock file version {0}, expected {LOCK_VERSION}")]
  UnsupportedVersion(u32),
}

impl LockFile {
  /// Snapshot the committed libraries and the checksum cache.
  pub fn from_registry(libraries: &[Library], cache: &ChecksumCache) -> Self {
    Self {
      version: LOCK_VERSION,
      checksums: cache.entries().clone(),
      libraries: libraries
        .iter()
        .map(|lib| LockedLibrary {
          target: lib.target().to_string(),
          jars: lib.jars().iter().map(|jar| jar.coords.clone()).collect(),
          options: lib.options().clone(),
        })
        .collect(),
    }
  }

  /// Load a lock file from the given path.
  ///
  /// Returns `Ok(None)` if the file doesn't exist.
  /// Returns `Ok(Some(lock))` if the file exists and was parsed successfully.
  /// Returns `Err` if the file exists but couldn't be read or parsed.
  pub fn load(path: &Path) -> Result<Option<Self>, LockError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(LockError::Read(e)),
    };

    let lock: LockFile = serde_json::from_str(&content).map_err(LockError::Parse)?;

    if lock.version != LOCK_VERSION {
      return Err(LockError::UnsupportedVersion(lock.version));
    }

    Ok(Some(lock))
  }

  /// Save the lock file to the given path, replacing prior content.
  ///
  /// The file is written with pretty-printed JSON for readability.
  pub fn save(&self, path: &Path) -> Result<(), LockError> {
    let content = serde_json::to_string_pretty(self).map_err(LockError::Serialize)?;
    fs::write(path, content).map_err(LockError::Write)?;
    Ok(())
  }

  /// Install every persisted checksum into the cache, so regeneration never
  /// re-fetches a checksum already known to be correct.
  pub fn seed_cache(&self, cache: &mut ChecksumCache) {
    for (uri, checksum) in &self.checksums {
      cache.insert(uri.clone(), checksum.clone());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::checksum::{Fetch, FetchError};
  use tempfile::TempDir;

  struct NoFetch;

  impl Fetch for NoFetch {
    fn fetch(&self, uri: &str) -> Result<String, FetchError> {
      Err(FetchError::Status {
        uri: uri.to_string(),
        status: 404,
      })
    }
  }

  fn sample() -> LockFile {
    LockFile {
      version: LOCK_VERSION,
      checksums: [("https://r/g/a/1/a-1.jar.sha1".to_string(), "abc".to_string())].into(),
      libraries: vec![LockedLibrary {
        target: "//a:x".to_string(),
        jars: vec!["g:a:1".to_string()],
        options: LibOptions::default(),
      }],
    }
  }

  mod lock_file {
    use super::*;

    #[test]
    fn save_and_load_roundtrip() {
      let temp_dir = TempDir::new().unwrap();
      let lock_path = temp_dir.path().join(LOCK_FILENAME);

      let original = sample();
      original.save(&lock_path).unwrap();
      let loaded = LockFile::load(&lock_path).unwrap().unwrap();

      assert_eq!(original, loaded);
    }

    #[test]
    fn load_nonexistent_returns_none() {
      let temp_dir = TempDir::new().unwrap();
      let result = LockFile::load(&temp_dir.path().join("nonexistent.lock")).unwrap();
      assert!(result.is_none());
    }

    #[test]
    fn load_invalid_json_returns_error() {
      let temp_dir = TempDir::new().unwrap();
      let lock_path = temp_dir.path().join(LOCK_FILENAME);

      fs::write(&lock_path, "not valid json").unwrap();

      assert!(matches!(LockFile::load(&lock_path), Err(LockError::Parse(_))));
    }

    #[test]
    fn load_unsupported_version_returns_error() {
      let temp_dir = TempDir::new().unwrap();
      let lock_path = temp_dir.path().join(LOCK_FILENAME);

      fs::write(&lock_path, r#"{"version": 999, "libraries": []}"#).unwrap();

      assert!(matches!(LockFile::load(&lock_path), Err(LockError::UnsupportedVersion(999))));
    }

    #[test]
    fn save_overwrites_prior_content() {
      let temp_dir = TempDir::new().unwrap();
      let lock_path = temp_dir.path().join(LOCK_FILENAME);

      sample().save(&lock_path).unwrap();
      let mut second = sample();
      second.libraries.clear();
      second.save(&lock_path).unwrap();

      let loaded = LockFile::load(&lock_path).unwrap().unwrap();
      assert!(loaded.libraries.is_empty());
    }
  }

  mod seeding {
    use super::*;

    #[test]
    fn seed_cache_installs_all_checksums() {
      let mut cache = ChecksumCache::new(Box::new(NoFetch));
      sample().seed_cache(&mut cache);

      assert_eq!(cache.get("https://r/g/a/1/a-1", ".jar.sha1").unwrap(), "abc");
    }
  }

  mod serialization {
    use super::*;

    #[test]
    fn default_options_are_omitted() {
      let json = serde_json::to_string_pretty(&sample()).unwrap();
      assert!(!json.contains("\"options\""));
    }

    #[test]
    fn json_format_is_stable() {
      let json = serde_json::to_string_pretty(&sample()).unwrap();
      assert!(json.contains(r#""version": 1"#));
      assert!(json.contains(r#""target": "//a:x""#));
      assert!(json.contains(r#""https://r/g/a/1/a-1.jar.sha1": "abc""#));
    }
  }
}
