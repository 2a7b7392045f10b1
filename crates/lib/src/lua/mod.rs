//! Include-script execution.
//!
//! Library definitions live in Lua include scripts. Each script runs once,
//! in a fresh runtime whose only jarlock capability is the global `lib`
//! staging callback:
//!
//! ```lua
//! lib("//thirdparty/guava", "com.google.guava:guava:31.1-jre", {
//!   deps = { "//thirdparty/failureaccess" },
//! })
//!
//! lib("//thirdparty/jackson:jackson", {
//!   "com.fasterxml.jackson.core:jackson-core:2.17.1",
//!   "com.fasterxml.jackson.core:jackson-databind:2.17.1",
//! })
//! ```
//!
//! Scripts cannot reach committed registry state; everything they declare
//! is staged and committed by the registry afterwards.

mod include;
pub mod runtime;

pub use include::run_include;
