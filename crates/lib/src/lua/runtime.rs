//! Lua runtime helpers.

use std::path::Path;

use mlua::prelude::*;

/// Load and execute a Lua file at the given path.
///
/// The chunk is named after the canonical path so Lua errors point at the
/// real file.
pub fn load_file(lua: &Lua, path: &Path) -> LuaResult<()> {
  let canonical = dunce::canonicalize(path)
    .map_err(|e| LuaError::external(format!("cannot canonicalize '{}': {}", path.display(), e)))?;
  let content = std::fs::read_to_string(&canonical)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", canonical.display(), e)))?;

  lua
    .load(&content)
    .set_name(format!("@{}", canonical.display()))
    .exec()
}
