//! Maven coordinate resolution.
//!
//! Turns a raw `group:artifact:version[:classifier]` spec into a [`Jar`]:
//! the remote base location under a repository's standard directory layout
//! plus the derived binary and source filenames. Only segment splitting is
//! performed here; anything deeper than that is the repository's problem.

use std::fmt;

use thiserror::Error;

use crate::library::LibOptions;

/// Default repository used when a library does not override `repo`.
pub const MAVEN_CENTRAL: &str = "https://repo1.maven.org/maven2";

/// Checksum URI extension for a binary jar.
pub const JAR_SHA1: &str = ".jar.sha1";

/// Checksum URI extension for the sources jar derived from the same artifact.
pub const SOURCES_JAR_SHA1: &str = "-sources.jar.sha1";

/// Errors that can occur while resolving coordinates.
#[derive(Debug, Error)]
pub enum CoordsError {
  /// The spec does not split into group:artifact:version[:classifier].
  #[error("malformed coordinates '{coords}', expected group:artifact:version[:classifier]")]
  Malformed { coords: String },
}

/// A resolved artifact reference.
///
/// `remote` is the location up to the artifact stem, without an extension;
/// appending `.jar`, `.jar.sha1` etc. yields concrete URIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jar {
  /// Raw coordinates as written in the include script.
  pub coords: String,
  /// Remote base location: `<repo>/<group>/<artifact>/<version>/<stem>`.
  pub remote: String,
  /// Filename of the binary jar.
  pub filename_jar: String,
  /// Filename of the derived sources jar.
  pub filename_src: String,
  /// Checksum of the binary jar, when known.
  pub sha1: Option<String>,
  /// Checksum of the derived sources jar, when known.
  pub src_sha1: Option<String>,
}

impl Jar {
  /// Whether the jar lives in an http(s) repository and thus has fetchable
  /// checksums.
  pub fn is_remote(&self) -> bool {
    self.remote.starts_with("http://") || self.remote.starts_with("https://")
  }
}

impl fmt::Display for Jar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.coords)
  }
}

/// Derives [`Jar`]s from raw coordinate specs and the per-library options bag.
#[derive(Debug, Clone)]
pub struct CoordResolver {
  repo: String,
}

impl Default for CoordResolver {
  fn default() -> Self {
    Self::new(MAVEN_CENTRAL)
  }
}

impl CoordResolver {
  /// Create a resolver with the given default repository.
  pub fn new(repo: impl Into<String>) -> Self {
    let mut repo = repo.into();
    while repo.ends_with('/') {
      repo.pop();
    }
    Self { repo }
  }

  /// Resolve one raw spec into a [`Jar`].
  ///
  /// `options.repo` and `options.version` override the repository and the
  /// version segment for every jar of the owning library. Checksums are not
  /// filled in here; they are resolved through the checksum cache during
  /// library construction.
  pub fn resolve(&self, raw: &str, options: &LibOptions) -> Result<Jar, CoordsError> {
    let malformed = || CoordsError::Malformed { coords: raw.to_string() };

    let parts: Vec<&str> = raw.split(':').collect();
    let (group, artifact, version, classifier) = match parts.as_slice() {
      [g, a, v] => (*g, *a, *v, None),
      [g, a, v, c] => (*g, *a, *v, Some(*c)),
      _ => return Err(malformed()),
    };
    if group.is_empty() || artifact.is_empty() || version.is_empty() || classifier == Some("") {
      return Err(malformed());
    }

    let version = options.version.as_deref().unwrap_or(version);
    let repo = match &options.repo {
      Some(repo) => repo.trim_end_matches('/'),
      None => self.repo.as_str(),
    };

    let stem = match classifier {
      Some(classifier) => format!("{artifact}-{version}-{classifier}"),
      None => format!("{artifact}-{version}"),
    };
    let remote = format!("{repo}/{group}/{artifact}/{version}/{stem}", group = group.replace('.', "/"));

    Ok(Jar {
      coords: raw.to_string(),
      remote,
      filename_jar: format!("{stem}.jar"),
      filename_src: format!("{stem}-sources.jar"),
      sha1: None,
      src_sha1: None,
    })
  }
}
