//! The library entity.
//!
//! A [`Library`] is one declared third-party dependency set: a target, its
//! resolved binary jars, a matching list of source jars, and the options it
//! was declared with. Libraries are immutable once constructed; all
//! derived values (display name, identifier-safe name, symlink
//! destinations) are computed, never stored.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buck::BuckEmitter;
use crate::checksum::{ChecksumCache, FetchError};
use crate::mvn::{self, CoordResolver, CoordsError, Jar};
use crate::target::{Target, TargetError};

/// Directory (relative to the library's package) where fetched artifacts
/// are placed by exterior tooling.
pub const OUT_DIR: &str = ".out";

/// Per-library options from an include script, persisted verbatim in the
/// lockfile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibOptions {
  /// Explicit source artifacts, one per jar. Empty means "derive sources
  /// from the jars themselves".
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub srcs: Vec<String>,

  /// Repository override for every jar of this library.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub repo: Option<String>,

  /// Version override applied uniformly to every jar of this library.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,

  /// Extra Buck deps emitted on the library rule.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub deps: Vec<String>,
}

impl LibOptions {
  pub fn is_empty(&self) -> bool {
    self.srcs.is_empty() && self.repo.is_none() && self.version.is_none() && self.deps.is_empty()
  }
}

/// Errors that can occur while constructing a [`Library`].
#[derive(Debug, Error)]
pub enum LibraryError {
  #[error(transparent)]
  Target(#[from] TargetError),

  #[error(transparent)]
  Coords(#[from] CoordsError),

  /// A library must reference at least one jar.
  #[error("library {target} declares no jars")]
  NoJars { target: String },

  /// `options.srcs`, when given, must pair up with the jars.
  #[error("library {target}: 'srcs' count {srcs} does not match jar count {jars}")]
  SrcsMismatch { target: String, jars: usize, srcs: usize },

  /// A checksum for one of the library's artifacts could not be fetched.
  #[error("library {target}: {source}")]
  Checksum {
    target: String,
    #[source]
    source: FetchError,
  },
}

/// One declared third-party library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
  target: Target,
  jars: Vec<Jar>,
  srcs: Vec<Jar>,
  options: LibOptions,
}

impl Library {
  /// Construct a library from the raw arguments of an include script or a
  /// lockfile tuple.
  ///
  /// Every raw jar spec (and every `options.srcs` entry) is resolved with
  /// the full options bag, so per-library repo/version overrides apply
  /// uniformly. Checksums for http(s) artifacts are resolved through the
  /// cache; when sources are derived from the jars the corresponding
  /// `-sources.jar` checksum is resolved as well.
  ///
  /// # Errors
  ///
  /// Fails with a configuration error naming the target when the target or
  /// a coordinate spec is malformed, when no jars are given, or when a
  /// non-empty `options.srcs` does not match the jar count. Checksum fetch
  /// failures propagate as fatal errors.
  pub fn from_raw(
    target: &str,
    jars: &[String],
    options: LibOptions,
    resolver: &CoordResolver,
    cache: &mut ChecksumCache,
  ) -> Result<Self, LibraryError> {
    let target = Target::parse(target)?;

    let mut resolved: Vec<Jar> = jars
      .iter()
      .map(|raw| resolver.resolve(raw, &options))
      .collect::<Result<_, _>>()?;
    if resolved.is_empty() {
      return Err(LibraryError::NoJars { target: target.to_string() });
    }

    let mut src_jars: Vec<Jar> = options
      .srcs
      .iter()
      .map(|raw| resolver.resolve(raw, &options))
      .collect::<Result<_, _>>()?;

    if !src_jars.is_empty() && src_jars.len() != resolved.len() {
      return Err(LibraryError::SrcsMismatch {
        target: target.to_string(),
        jars: resolved.len(),
        srcs: src_jars.len(),
      });
    }

    let derive_sources = src_jars.is_empty();
    let checksum_err = |source| LibraryError::Checksum {
      target: target.to_string(),
      source,
    };

    for jar in &mut resolved {
      if !jar.is_remote() {
        continue;
      }
      jar.sha1 = Some(cache.get(&jar.remote, mvn::JAR_SHA1).map_err(checksum_err)?);
      if derive_sources {
        jar.src_sha1 = Some(cache.get(&jar.remote, mvn::SOURCES_JAR_SHA1).map_err(checksum_err)?);
      }
    }

    let srcs = if derive_sources {
      resolved.clone()
    } else {
      for src in &mut src_jars {
        if src.is_remote() {
          src.sha1 = Some(cache.get(&src.remote, mvn::JAR_SHA1).map_err(checksum_err)?);
        }
      }
      src_jars
    };

    Ok(Self {
      target,
      jars: resolved,
      srcs,
      options,
    })
  }

  pub fn target(&self) -> &Target {
    &self.target
  }

  pub fn jars(&self) -> &[Jar] {
    &self.jars
  }

  pub fn srcs(&self) -> &[Jar] {
    &self.srcs
  }

  pub fn options(&self) -> &LibOptions {
    &self.options
  }

  /// Package directory this library's rules are generated into.
  pub fn path(&self) -> &str {
    self.target.path()
  }

  /// Canonical display name, abbreviated when possible.
  pub fn name(&self) -> String {
    self.target.abbr()
  }

  /// Identifier-safe variant of [`name`](Self::name) for generated-code
  /// symbols.
  pub fn flat_name(&self) -> String {
    self
      .name()
      .chars()
      .map(|c| if matches!(c, '-' | '.' | ':' | '/') { '_' } else { c })
      .collect()
  }

  /// Destination the given jar's binary artifact is linked to.
  pub fn symlink_jar(&self, jar: &Jar) -> PathBuf {
    Path::new(self.path()).join(OUT_DIR).join(&jar.filename_jar)
  }

  /// Destination the given jar's source artifact is linked to.
  pub fn symlink_src(&self, jar: &Jar) -> PathBuf {
    Path::new(self.path()).join(OUT_DIR).join(&jar.filename_src)
  }

  /// Render this library's Buck rules. All rule-text knowledge lives in the
  /// emitter; the entity only hands over its parts.
  pub fn to_buck_rules(&self, emitter: &BuckEmitter) -> Vec<String> {
    emitter.rules(&self.target, &self.jars, &self.srcs, &self.options)
  }
}

impl fmt::Display for Library {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let jars: Vec<String> = self.jars.iter().map(Jar::to_string).collect();
    write!(f, "{} [{}]", self.name(), jars.join(" "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::checksum::EchoFetch;

  fn cache() -> ChecksumCache {
    ChecksumCache::new(Box::new(EchoFetch))
  }

  fn from_raw(target: &str, jars: &[&str], options: LibOptions) -> Result<Library, LibraryError> {
    let jars: Vec<String> = jars.iter().map(|s| s.to_string()).collect();
    Library::from_raw(target, &jars, options, &CoordResolver::default(), &mut cache())
  }

  mod construction {
    use super::*;

    #[test]
    fn srcs_default_to_jars() {
      let lib = from_raw("//a:x", &["g:a:1", "g:b:1"], LibOptions::default()).unwrap();
      assert_eq!(lib.srcs(), lib.jars());
    }

    #[test]
    fn empty_srcs_option_is_treated_as_unset() {
      let options = LibOptions {
        srcs: Vec::new(),
        ..LibOptions::default()
      };
      let lib = from_raw("//a:x", &["g:a:1"], options).unwrap();
      assert_eq!(lib.srcs(), lib.jars());
    }

    #[test]
    fn explicit_srcs_are_resolved_separately() {
      let options = LibOptions {
        srcs: vec!["g:a:1:sources".to_string()],
        ..LibOptions::default()
      };
      let lib = from_raw("//a:x", &["g:a:1"], options).unwrap();
      assert_eq!(lib.srcs().len(), 1);
      assert_eq!(lib.srcs()[0].filename_jar, "a-1-sources.jar");
      assert!(lib.srcs()[0].sha1.is_some());
      assert!(lib.srcs()[0].src_sha1.is_none());
    }

    #[test]
    fn srcs_count_mismatch_names_the_target() {
      let options = LibOptions {
        srcs: vec!["g:a:1:sources".to_string()],
        ..LibOptions::default()
      };
      let err = from_raw("//a:x", &["g:a:1", "g:b:1"], options).unwrap_err();
      match err {
        LibraryError::SrcsMismatch { target, jars, srcs } => {
          assert_eq!(target, "//a:x");
          assert_eq!(jars, 2);
          assert_eq!(srcs, 1);
        }
        other => panic!("expected SrcsMismatch, got {other:?}"),
      }
    }

    #[test]
    fn no_jars_is_an_error() {
      let err = from_raw("//a:x", &[], LibOptions::default()).unwrap_err();
      assert!(matches!(err, LibraryError::NoJars { .. }));
    }

    #[test]
    fn derived_sources_get_both_checksums() {
      let lib = from_raw("//a:x", &["g:a:1"], LibOptions::default()).unwrap();
      let jar = &lib.jars()[0];
      assert_eq!(jar.sha1.as_deref(), Some("sha1-of-a-1.jar.sha1"));
      assert_eq!(jar.src_sha1.as_deref(), Some("sha1-of-a-1-sources.jar.sha1"));
    }

    #[test]
    fn local_repo_jars_have_no_checksums() {
      let options = LibOptions {
        repo: Some("file:///var/m2".to_string()),
        ..LibOptions::default()
      };
      let lib = from_raw("//a:x", &["g:a:1"], options).unwrap();
      assert!(lib.jars()[0].sha1.is_none());
      assert!(lib.jars()[0].src_sha1.is_none());
    }

    #[test]
    fn malformed_target_propagates() {
      assert!(matches!(
        from_raw("a:x", &["g:a:1"], LibOptions::default()),
        Err(LibraryError::Target(_))
      ));
    }
  }

  mod derived {
    use super::*;

    fn lib() -> Library {
      from_raw("//thirdparty/guava", &["com.google.guava:guava:31.1-jre"], LibOptions::default()).unwrap()
    }

    #[test]
    fn name_is_abbreviated() {
      assert_eq!(lib().name(), "//thirdparty/guava");
    }

    #[test]
    fn flat_name_is_identifier_safe() {
      assert_eq!(lib().flat_name(), "__thirdparty_guava");
    }

    #[test]
    fn symlink_destinations() {
      let lib = lib();
      let jar = &lib.jars()[0];
      assert_eq!(
        lib.symlink_jar(jar),
        PathBuf::from("thirdparty/guava/.out/guava-31.1-jre.jar")
      );
      assert_eq!(
        lib.symlink_src(jar),
        PathBuf::from("thirdparty/guava/.out/guava-31.1-jre-sources.jar")
      );
    }

    #[test]
    fn display_lists_target_and_jars() {
      let lib = from_raw("//a:x", &["g:a:1", "g:b:1"], LibOptions::default()).unwrap();
      assert_eq!(lib.to_string(), "//a:x [g:a:1 g:b:1]");
    }
  }
}
