//! Build target identifiers.
//!
//! A [`Target`] names one buildable unit as `//path/to/pkg:name`. The name
//! part may be omitted when it equals the last path segment, so
//! `//thirdparty/guava` and `//thirdparty/guava:guava` identify the same
//! target. Two targets are equal iff their canonical forms are equal.

use std::fmt;

use thiserror::Error;

/// Errors that can occur when parsing a target string.
#[derive(Debug, Error)]
pub enum TargetError {
  /// The string is not a valid target reference.
  #[error("malformed target '{target}', expected //path/to/pkg:name")]
  Malformed { target: String },
}

/// A canonical identifier for a buildable unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
  path: String,
  name: String,
}

impl Target {
  /// Parse a target reference.
  ///
  /// Accepts the full form `//path/to/pkg:name` and the abbreviated form
  /// `//path/to/pkg`, where the name defaults to the last path segment.
  pub fn parse(raw: &str) -> Result<Self, TargetError> {
    let malformed = || TargetError::Malformed { target: raw.to_string() };

    let rest = raw.strip_prefix("//").ok_or_else(malformed)?;

    let (path, name) = match rest.split_once(':') {
      Some((path, name)) => {
        if name.is_empty() || name.contains(':') {
          return Err(malformed());
        }
        (path.to_string(), name.to_string())
      }
      None => {
        let name = rest.rsplit('/').next().unwrap_or("");
        if name.is_empty() {
          return Err(malformed());
        }
        (rest.to_string(), name.to_string())
      }
    };

    if path.starts_with('/') || path.ends_with('/') {
      return Err(malformed());
    }
    if path.is_empty() && name.is_empty() {
      return Err(malformed());
    }

    Ok(Self { path, name })
  }

  /// Directory path of the package this target lives in.
  pub fn path(&self) -> &str {
    &self.path
  }

  /// The target's short name within its package.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Abbreviated display form: `//path` when the name repeats the last path
  /// segment, the canonical form otherwise.
  pub fn abbr(&self) -> String {
    let last = self.path.rsplit('/').next().unwrap_or("");
    if !self.path.is_empty() && last == self.name {
      format!("//{}", self.path)
    } else {
      self.to_string()
    }
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "//{}:{}", self.path, self.name)
  }
}
