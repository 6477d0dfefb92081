//! Pure policy layer for the JIT access watcher: the pattern matcher
//! (component C) and the two policy evaluators (component D). Nothing in
//! this crate calls the platform or holds any mutable state; every function
//! here is a deterministic function of its inputs.

#![deny(unsafe_code)]

pub mod evaluators;
pub mod matcher;

pub use evaluators::{ResourceLimit, RoleConflict, Violation};
pub use matcher::{Classification, PatternMatcher};
