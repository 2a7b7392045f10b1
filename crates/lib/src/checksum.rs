//! Memoizing checksum cache.
//!
//! Repository checksums (`*.sha1` files) are expensive to re-fetch and
//! rarely change, so the cache keeps a flat URI → checksum map for the
//! lifetime of one generation run. Entries are created lazily on [`get`]
//! and can be seeded from a lockfile via [`set`] so that a regeneration
//! never re-fetches a checksum it already knows.
//!
//! [`get`]: ChecksumCache::get
//! [`set`]: ChecksumCache::set

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Errors that can occur while fetching a checksum.
#[derive(Debug, Error)]
pub enum FetchError {
  /// The request could not be performed.
  #[error("failed to fetch {uri}: {source}")]
  Http {
    uri: String,
    #[source]
    source: reqwest::Error,
  },

  /// The server answered with a non-success status.
  #[error("fetching {uri} returned HTTP {status}")]
  Status { uri: String, status: u16 },
}

/// One network GET, returning the response body as text.
///
/// Injected into the cache so that everything above it can be exercised
/// without network access.
pub trait Fetch {
  fn fetch(&self, uri: &str) -> Result<String, FetchError>;
}

/// Production fetcher backed by a blocking HTTP client.
pub struct HttpFetch {
  client: reqwest::blocking::Client,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

impl HttpFetch {
  pub fn new() -> Self {
    let client = reqwest::blocking::Client::builder()
      .connect_timeout(CONNECT_TIMEOUT)
      .build()
      .unwrap_or_default();
    Self { client }
  }
}

impl Default for HttpFetch {
  fn default() -> Self {
    Self::new()
  }
}

impl Fetch for HttpFetch {
  fn fetch(&self, uri: &str) -> Result<String, FetchError> {
    let response = self.client.get(uri).send().map_err(|e| FetchError::Http {
      uri: uri.to_string(),
      source: e,
    })?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status {
        uri: uri.to_string(),
        status: status.as_u16(),
      });
    }

    response.text().map_err(|e| FetchError::Http {
      uri: uri.to_string(),
      source: e,
    })
  }
}

/// Memoizing URI → checksum store.
pub struct ChecksumCache {
  entries: BTreeMap<String, String>,
  fetcher: Box<dyn Fetch>,
}

impl ChecksumCache {
  pub fn new(fetcher: Box<dyn Fetch>) -> Self {
    Self {
      entries: BTreeMap::new(),
      fetcher,
    }
  }

  /// The URI a checksum is keyed by.
  pub fn uri(remote: &str, ext: &str) -> String {
    format!("{remote}{ext}")
  }

  /// Return the cached checksum for `remote` + `ext`, fetching and storing
  /// it on a miss. Repeated calls for the same URI fetch at most once.
  pub fn get(&mut self, remote: &str, ext: &str) -> Result<String, FetchError> {
    let uri = Self::uri(remote, ext);
    if let Some(checksum) = self.entries.get(&uri) {
      return Ok(checksum.clone());
    }

    let checksum = self.fetch(remote, ext)?;
    self.entries.insert(uri, checksum.clone());
    Ok(checksum)
  }

  /// Fetch the checksum for `remote` + `ext` without consulting or updating
  /// the cache. The body is returned with surrounding whitespace trimmed.
  pub fn fetch(&self, remote: &str, ext: &str) -> Result<String, FetchError> {
    let uri = Self::uri(remote, ext);
    debug!(%uri, "fetching checksum");
    Ok(self.fetcher.fetch(&uri)?.trim().to_string())
  }

  /// Install a checksum without fetching. Used to seed the cache from a
  /// previously persisted lockfile.
  pub fn set(&mut self, remote: &str, ext: &str, checksum: &str) {
    self.insert(Self::uri(remote, ext), checksum.to_string());
  }

  /// Install a checksum under an already-formed URI key.
  pub fn insert(&mut self, uri: String, checksum: String) {
    self.entries.insert(uri, checksum);
  }

  /// Snapshot of all known checksums, keyed by URI.
  pub fn entries(&self) -> &BTreeMap<String, String> {
    &self.entries
  }
}

/// Test fetcher answering every checksum request with a digest derived from
/// the last URI segment.
#[cfg(test)]
pub(crate) struct EchoFetch;

#[cfg(test)]
impl Fetch for EchoFetch {
  fn fetch(&self, uri: &str) -> Result<String, FetchError> {
    Ok(format!("sha1-of-{}", uri.rsplit('/').next().unwrap_or(uri)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::Cell;
  use std::collections::BTreeMap;
  use std::rc::Rc;

  /// Fetcher serving canned bodies, counting how often it is called.
  struct MapFetch {
    bodies: BTreeMap<String, String>,
    calls: Rc<Cell<usize>>,
  }

  impl MapFetch {
    fn new(bodies: &[(&str, &str)]) -> (Self, Rc<Cell<usize>>) {
      let calls = Rc::new(Cell::new(0));
      let fetch = Self {
        bodies: bodies.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        calls: calls.clone(),
      };
      (fetch, calls)
    }
  }

  impl Fetch for MapFetch {
    fn fetch(&self, uri: &str) -> Result<String, FetchError> {
      self.calls.set(self.calls.get() + 1);
      self.bodies.get(uri).cloned().ok_or_else(|| FetchError::Status {
        uri: uri.to_string(),
        status: 404,
      })
    }
  }

  mod get {
    use super::*;

    #[test]
    fn fetches_once_per_uri() {
      let (fetch, calls) = MapFetch::new(&[("https://r/a/1/a-1.jar.sha1", "abc123")]);
      let mut cache = ChecksumCache::new(Box::new(fetch));

      let first = cache.get("https://r/a/1/a-1", ".jar.sha1").unwrap();
      let second = cache.get("https://r/a/1/a-1", ".jar.sha1").unwrap();

      assert_eq!(first, "abc123");
      assert_eq!(second, first);
      assert_eq!(calls.get(), 1);
    }

    #[test]
    fn distinct_extensions_are_distinct_entries() {
      let (fetch, calls) = MapFetch::new(&[
        ("https://r/a/1/a-1.jar.sha1", "bin"),
        ("https://r/a/1/a-1-sources.jar.sha1", "src"),
      ]);
      let mut cache = ChecksumCache::new(Box::new(fetch));

      assert_eq!(cache.get("https://r/a/1/a-1", ".jar.sha1").unwrap(), "bin");
      assert_eq!(cache.get("https://r/a/1/a-1", "-sources.jar.sha1").unwrap(), "src");
      assert_eq!(calls.get(), 2);
    }

    #[test]
    fn fetch_failure_propagates() {
      let (fetch, _) = MapFetch::new(&[]);
      let mut cache = ChecksumCache::new(Box::new(fetch));

      let err = cache.get("https://r/a/1/a-1", ".jar.sha1").unwrap_err();
      assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[test]
    fn body_whitespace_is_trimmed() {
      let (fetch, _) = MapFetch::new(&[("https://r/a/1/a-1.jar.sha1", "  abc123\n")]);
      let mut cache = ChecksumCache::new(Box::new(fetch));

      assert_eq!(cache.get("https://r/a/1/a-1", ".jar.sha1").unwrap(), "abc123");
    }
  }

  mod set {
    use super::*;

    #[test]
    fn seeded_value_suppresses_fetch() {
      let (fetch, calls) = MapFetch::new(&[]);
      let mut cache = ChecksumCache::new(Box::new(fetch));

      cache.set("https://r/a/1/a-1", ".jar.sha1", "seeded");

      assert_eq!(cache.get("https://r/a/1/a-1", ".jar.sha1").unwrap(), "seeded");
      assert_eq!(calls.get(), 0);
    }

    #[test]
    fn entries_snapshot_is_keyed_by_uri() {
      let (fetch, _) = MapFetch::new(&[]);
      let mut cache = ChecksumCache::new(Box::new(fetch));

      cache.set("https://r/a/1/a-1", ".jar.sha1", "abc");

      assert_eq!(
        cache.entries().get("https://r/a/1/a-1.jar.sha1").map(String::as_str),
        Some("abc")
      );
    }
  }
}
