//! Filesystem helpers.

use std::fs;
use std::io;
use std::path::Path;

/// Replace the content of `path`, creating parent directories as needed.
pub fn write(path: &Path, content: &str) -> io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::write(path, content)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("a/b/BUCK");

    write(&path, "content").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "content");
  }

  #[test]
  fn replaces_existing_content() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("BUCK");

    write(&path, "first").unwrap();
    write(&path, "second").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "second");
  }
}
