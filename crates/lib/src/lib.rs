//! jarlock-lib: core types and logic for jarlock
//!
//! This crate provides the fundamental pieces of the generator:
//! - `Registry`: staged/committed collection of library definitions
//! - `Library`: one declared dependency set with resolved jar/source pairs
//! - `ChecksumCache`: memoizing URI → checksum store with injected fetcher
//! - `LockFile`: persisted snapshot enabling deterministic regeneration
//! - `BuckEmitter`: Buck rule text generation
//! - Lua include-script execution exposing the `lib` staging callback

pub mod buck;
pub mod checksum;
pub mod library;
pub mod lock;
pub mod lua;
pub mod mvn;
pub mod ops;
pub mod registry;
pub mod target;
