//! The `lib` staging callback and include-script execution.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use mlua::prelude::*;

use super::runtime;
use crate::checksum::ChecksumCache;
use crate::library::LibOptions;
use crate::mvn::CoordResolver;
use crate::registry::Registry;

/// Execute one include script.
///
/// The script runs in a fresh runtime with `lib(target, jars [, options])`
/// as its only jarlock capability; every call stages one library on the
/// shared registry. Construction failures (malformed coordinates, srcs
/// mismatch, checksum fetch failure) abort the script immediately.
pub fn run_include(
  path: &Path,
  registry: &Rc<RefCell<Registry>>,
  cache: &Rc<RefCell<ChecksumCache>>,
  resolver: &Rc<CoordResolver>,
) -> LuaResult<()> {
  let lua = Lua::new();
  register_lib(&lua, registry.clone(), cache.clone(), resolver.clone())?;
  runtime::load_file(&lua, path)
}

/// Register the global `lib` staging function.
fn register_lib(
  lua: &Lua,
  registry: Rc<RefCell<Registry>>,
  cache: Rc<RefCell<ChecksumCache>>,
  resolver: Rc<CoordResolver>,
) -> LuaResult<()> {
  let lib_fn = lua.create_function(move |_, (target, jars, options): (String, LuaValue, Option<LuaTable>)| {
    let jars = parse_jars(&target, jars)?;
    let options = match options {
      Some(table) => parse_options(&target, &table)?,
      None => LibOptions::default(),
    };

    registry
      .borrow_mut()
      .stage(&target, &jars, options, &resolver, &mut cache.borrow_mut())
      .map_err(LuaError::external)
  })?;

  lua.globals().set("lib", lib_fn)
}

/// Accept a single coordinate string or a list of them.
fn parse_jars(target: &str, value: LuaValue) -> LuaResult<Vec<String>> {
  match value {
    LuaValue::String(s) => Ok(vec![s.to_str()?.to_string()]),
    LuaValue::Table(table) => table.sequence_values::<String>().collect(),
    _ => Err(LuaError::external(format!(
      "library '{target}': jars must be a string or a list of strings"
    ))),
  }
}

/// Parse the options table. Unknown keys are configuration errors rather
/// than silently ignored attributes.
fn parse_options(target: &str, table: &LuaTable) -> LuaResult<LibOptions> {
  let mut options = LibOptions::default();

  for pair in table.pairs::<String, LuaValue>() {
    let (key, value) = pair?;
    match key.as_str() {
      "srcs" => options.srcs = parse_string_list(target, "srcs", value)?,
      "repo" => options.repo = Some(parse_string(target, "repo", value)?),
      "version" => options.version = Some(parse_string(target, "version", value)?),
      "deps" => options.deps = parse_string_list(target, "deps", value)?,
      other => {
        return Err(LuaError::external(format!(
          "library '{target}': unknown option '{other}'"
        )));
      }
    }
  }

  Ok(options)
}

fn parse_string(target: &str, option: &str, value: LuaValue) -> LuaResult<String> {
  match value {
    LuaValue::String(s) => Ok(s.to_str()?.to_string()),
    _ => Err(LuaError::external(format!(
      "library '{target}': option '{option}' must be a string"
    ))),
  }
}

fn parse_string_list(target: &str, option: &str, value: LuaValue) -> LuaResult<Vec<String>> {
  match value {
    LuaValue::String(s) => Ok(vec![s.to_str()?.to_string()]),
    LuaValue::Table(table) => table.sequence_values::<String>().collect(),
    _ => Err(LuaError::external(format!(
      "library '{target}': option '{option}' must be a string or a list of strings"
    ))),
  }
}
