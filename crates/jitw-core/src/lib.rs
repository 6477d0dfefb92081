//! Shared data model for the JIT access watcher: the access-request snapshot,
//! frozen configuration, and the abstract platform-client contract.
//!
//! Downstream crates (`jitw-policy`, `jitw-reconcile`, `jitw-platform`,
//! `jitw-watcher`) all build on the types defined here so that the pure
//! evaluation logic never needs to know how requests were fetched or how
//! decisions get dispatched.

#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod request;

pub use client::{Lock, PlatformClient, PlatformError, SettableState};
pub use config::{Config, ConfigError, RawConfig};
pub use request::{group_by_user, sort_newest_first, sort_oldest_first, AccessRequest, RequestState, ResourceRef};
