//! Buck integration: rule text generation and daemon invalidation.
//!
//! The emitter turns one library into `remote_file` + `prebuilt_jar`
//! declarations. Nothing here talks to the registry; it only sees the parts
//! a library hands over (target, jars, srcs, options).

use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

use crate::library::LibOptions;
use crate::mvn::Jar;
use crate::target::Target;

/// First line of every generated build file.
pub const GEN_BANNER: &str = "# Generated by jarlock, do not edit, manual edits will be overridden";

/// Name of the generated build file in each package directory.
pub const BUCK_FILENAME: &str = "BUCK";

/// Renders libraries as Buck rule text.
#[derive(Debug, Default)]
pub struct BuckEmitter;

impl BuckEmitter {
  /// Produce the ordered rule fragments for one library.
  ///
  /// Each jar/source pair yields a `remote_file` for the binary, a
  /// `remote_file` for the sources, and a `prebuilt_jar` wiring them up.
  /// A multi-jar library additionally gets a `java_library` named after the
  /// target that exports the individual jars; `options.deps` always land on
  /// the rule carrying the target's name.
  pub fn rules(&self, target: &Target, jars: &[Jar], srcs: &[Jar], options: &LibOptions) -> Vec<String> {
    let derived_sources = options.srcs.is_empty();
    let single = jars.len() == 1;
    let mut fragments = Vec::new();

    let mut exported = Vec::new();
    for (jar, src) in jars.iter().zip(srcs) {
      let rule_name = if single {
        target.name().to_string()
      } else {
        let stem = jar.filename_jar.trim_end_matches(".jar");
        format!("{}__{}", target.name(), stem)
      };

      fragments.push(remote_file(
        &format!("{rule_name}__jar"),
        &jar.filename_jar,
        &format!("{}.jar", jar.remote),
        jar.sha1.as_deref(),
      ));

      if derived_sources {
        fragments.push(remote_file(
          &format!("{rule_name}__src"),
          &src.filename_src,
          &format!("{}-sources.jar", src.remote),
          src.src_sha1.as_deref(),
        ));
      } else {
        fragments.push(remote_file(
          &format!("{rule_name}__src"),
          &src.filename_jar,
          &format!("{}.jar", src.remote),
          src.sha1.as_deref(),
        ));
      }

      let deps = if single { options.deps.as_slice() } else { &[] };
      fragments.push(prebuilt_jar(&rule_name, deps));
      exported.push(format!(":{rule_name}"));
    }

    if !single {
      fragments.push(java_library(target.name(), &exported, &options.deps));
    }

    fragments
  }
}

fn remote_file(name: &str, out: &str, url: &str, sha1: Option<&str>) -> String {
  let mut rule = format!(
    "remote_file(\n    name = \"{name}\",\n    out = \"{out}\",\n    url = \"{url}\",\n"
  );
  if let Some(sha1) = sha1 {
    rule.push_str(&format!("    sha1 = \"{sha1}\",\n"));
  }
  rule.push(')');
  rule
}

fn prebuilt_jar(name: &str, deps: &[String]) -> String {
  let mut rule = format!(
    "prebuilt_jar(\n    name = \"{name}\",\n    binary_jar = \":{name}__jar\",\n    source_jar = \":{name}__src\",\n"
  );
  push_list(&mut rule, "deps", deps);
  rule.push_str("    visibility = [\"PUBLIC\"],\n)");
  rule
}

fn java_library(name: &str, exported_deps: &[String], deps: &[String]) -> String {
  let mut rule = format!("java_library(\n    name = \"{name}\",\n");
  push_list(&mut rule, "exported_deps", exported_deps);
  push_list(&mut rule, "deps", deps);
  rule.push_str("    visibility = [\"PUBLIC\"],\n)");
  rule
}

fn push_list(rule: &mut String, attr: &str, values: &[String]) {
  if values.is_empty() {
    return;
  }
  rule.push_str(&format!("    {attr} = [\n"));
  for value in values {
    rule.push_str(&format!("        \"{value}\",\n"));
  }
  rule.push_str("    ],\n");
}

/// Tell Buck that generated files changed on disk.
///
/// The build daemon caches parsed build files, so a running daemon is
/// stopped and left to restart on the next invocation. Buck being absent is
/// only worth a warning; generation itself has already succeeded.
pub fn drop_cache(root: &Path) {
  if !root.join(".buckd").exists() {
    debug!("no .buckd directory, nothing to invalidate");
    return;
  }

  match Command::new("buck").arg("kill").current_dir(root).status() {
    Ok(status) if status.success() => debug!("buck daemon stopped"),
    Ok(status) => warn!(%status, "buck kill exited nonzero"),
    Err(e) => warn!(error = %e, "buck unavailable, skipping daemon invalidation"),
  }
}
